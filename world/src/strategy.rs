//! Capabilities towers compose to attack and to grow stronger.
//!
//! A tower owns exactly one [`AttackStrategy`] and up to two
//! [`UpgradeStrategy`] values. New tower types are assembled by combining
//! strategy instances instead of introducing new tower types in code.

use std::{fmt, time::Duration};

use glam::Vec2;
use tower_defence_core::{CurrencyLedger, EnemyId, TowerId, UpgradeError};

use crate::enemy::Enemy;

/// Broad family an attack strategy belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttackKind {
    /// Damages one enemy per shot.
    SingleTarget,
    /// Damages the primary target and everything around it.
    Splash,
    /// Damages one enemy and slows it down.
    Slow,
}

/// Tunable numbers owned by an attack strategy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackProfile {
    /// Damage dealt to each enemy struck by a shot.
    pub damage: u32,
    /// Maximum distance from the tower to an enemy's center, in world units.
    pub range: f32,
    /// Minimum simulated time between two shots.
    pub cooldown: Duration,
}

impl AttackProfile {
    /// Creates a profile from its parts.
    #[must_use]
    pub const fn new(damage: u32, range: f32, cooldown: Duration) -> Self {
        Self {
            damage,
            range,
            cooldown,
        }
    }
}

/// Per-tick information a tower hands to its attack strategy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackContext {
    /// Tower performing the attack.
    pub tower: TowerId,
    /// World position the range is measured from.
    pub position: Vec2,
    /// Simulated time since the previous attack pass.
    pub dt: Duration,
}

/// Kill credited to a tower during an attack pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Kill {
    /// Enemy that died.
    pub enemy: EnemyId,
    /// Reward the enemy paid into the ledger.
    pub reward: u32,
}

/// Summary of a single attack pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttackReport {
    /// Number of hits that landed on live enemies.
    pub hits: u32,
    /// Enemies killed by those hits, in the order they died.
    pub kills: Vec<Kill>,
}

/// Selects targets among live enemies and damages them.
pub trait AttackStrategy: fmt::Debug {
    /// Family the strategy belongs to.
    fn kind(&self) -> AttackKind;

    /// Current attack numbers.
    fn profile(&self) -> &AttackProfile;

    /// Mutable access to the attack numbers, used by upgrades.
    fn profile_mut(&mut self) -> &mut AttackProfile;

    /// Runs one attack pass.
    ///
    /// Implementations must skip dead enemies and pick targets
    /// deterministically for a given enemy slice and tower position. Rewards
    /// are paid through `ledger` by [`Enemy::take_hit`].
    fn attack_targets(
        &mut self,
        ctx: &AttackContext,
        enemies: &mut [Enemy],
        ledger: &mut CurrencyLedger,
    ) -> AttackReport;
}

/// Tower fields an upgrade strategy is allowed to mutate.
#[derive(Debug)]
pub struct UpgradeTarget<'a> {
    /// Accumulated value of the tower.
    pub cost: &'a mut u32,
    /// Attack strategy whose profile the upgrade improves.
    pub attack: &'a mut dyn AttackStrategy,
}

/// Record of an applied upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpgradeReceipt {
    /// Level that was applied.
    pub level: u32,
    /// Cost increase charged for the level.
    pub price: u32,
    /// Tower cost after the upgrade.
    pub cost: u32,
}

/// Mutates a tower's cost and attack numbers one level at a time.
///
/// Levels must strictly increase; a rejected call leaves both the tower and
/// the strategy untouched.
pub trait UpgradeStrategy: fmt::Debug {
    /// Highest level applied so far, or zero.
    fn applied_level(&self) -> u32;

    /// Price of `level` for a tower currently worth `current_cost`.
    fn quote(&self, current_cost: u32, level: u32) -> Result<u32, UpgradeError>;

    /// Applies `level` to the tower.
    fn upgrade(
        &mut self,
        target: UpgradeTarget<'_>,
        level: u32,
    ) -> Result<UpgradeReceipt, UpgradeError>;
}
