#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Upgrade strategies that raise a tower's value and attack numbers.
//!
//! Both strategies read their effects from a table keyed by level. Levels
//! must be applied in strictly increasing order, although levels may be
//! skipped; a rejected request leaves the tower and the strategy untouched.

use std::{collections::BTreeMap, time::Duration};

use tower_defence_core::UpgradeError;
use tower_defence_world::{AttackProfile, UpgradeReceipt, UpgradeStrategy, UpgradeTarget};

/// Stat changes granted by a single upgrade level.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StatBonus {
    /// Damage added to every shot.
    pub damage: u32,
    /// Range added, in world units.
    pub range: f32,
    /// Time removed from the cooldown, saturating at zero.
    pub cooldown_reduction: Duration,
}

impl StatBonus {
    /// Bonus that only adds damage.
    #[must_use]
    pub const fn damage(damage: u32) -> Self {
        Self {
            damage,
            range: 0.0,
            cooldown_reduction: Duration::ZERO,
        }
    }

    /// Bonus that only adds range.
    #[must_use]
    pub const fn range(range: f32) -> Self {
        Self {
            damage: 0,
            range,
            cooldown_reduction: Duration::ZERO,
        }
    }

    /// Bonus that only shortens the cooldown.
    #[must_use]
    pub const fn cooldown_reduction(reduction: Duration) -> Self {
        Self {
            damage: 0,
            range: 0.0,
            cooldown_reduction: reduction,
        }
    }

    fn apply(&self, profile: &mut AttackProfile) {
        profile.damage = profile.damage.saturating_add(self.damage);
        profile.range += self.range;
        profile.cooldown = profile.cooldown.saturating_sub(self.cooldown_reduction);
    }
}

/// Level whose price is a fixed amount.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearStep {
    /// Amount added to the tower cost and charged to the player.
    pub cost_increase: u32,
    /// Stat changes granted by the level.
    pub bonus: StatBonus,
}

/// Level whose price is a share of the tower's current cost.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PercentageStep {
    /// Percentage of the current tower cost added and charged.
    pub percent: u32,
    /// Stat changes granted by the level.
    pub bonus: StatBonus,
}

/// Upgrade path with fixed prices per level.
#[derive(Clone, Debug)]
pub struct LinearCost {
    table: LevelTable<LinearStep>,
}

impl LinearCost {
    /// Creates a strategy from `(level, step)` pairs.
    #[must_use]
    pub fn new(steps: impl IntoIterator<Item = (u32, LinearStep)>) -> Self {
        Self {
            table: LevelTable::new(steps),
        }
    }
}

impl UpgradeStrategy for LinearCost {
    fn applied_level(&self) -> u32 {
        self.table.applied
    }

    fn quote(&self, _current_cost: u32, level: u32) -> Result<u32, UpgradeError> {
        self.table.step(level).map(|step| step.cost_increase)
    }

    fn upgrade(
        &mut self,
        target: UpgradeTarget<'_>,
        level: u32,
    ) -> Result<UpgradeReceipt, UpgradeError> {
        let step = *self.table.step(level)?;
        Ok(self
            .table
            .commit(target, level, step.cost_increase, &step.bonus))
    }
}

/// Upgrade path whose prices scale with the tower's current cost.
#[derive(Clone, Debug)]
pub struct PercentageCost {
    table: LevelTable<PercentageStep>,
}

impl PercentageCost {
    /// Creates a strategy from `(level, step)` pairs.
    #[must_use]
    pub fn new(steps: impl IntoIterator<Item = (u32, PercentageStep)>) -> Self {
        Self {
            table: LevelTable::new(steps),
        }
    }
}

impl UpgradeStrategy for PercentageCost {
    fn applied_level(&self) -> u32 {
        self.table.applied
    }

    fn quote(&self, current_cost: u32, level: u32) -> Result<u32, UpgradeError> {
        self.table
            .step(level)
            .map(|step| percentage_of(current_cost, step.percent))
    }

    fn upgrade(
        &mut self,
        target: UpgradeTarget<'_>,
        level: u32,
    ) -> Result<UpgradeReceipt, UpgradeError> {
        let step = *self.table.step(level)?;
        let price = percentage_of(*target.cost, step.percent);
        Ok(self.table.commit(target, level, price, &step.bonus))
    }
}

#[derive(Clone, Debug)]
struct LevelTable<S> {
    steps: BTreeMap<u32, S>,
    applied: u32,
}

impl<S> LevelTable<S> {
    fn new(steps: impl IntoIterator<Item = (u32, S)>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            applied: 0,
        }
    }

    fn step(&self, level: u32) -> Result<&S, UpgradeError> {
        if level == 0 {
            return Err(UpgradeError::InvalidLevel);
        }
        if level <= self.applied {
            return Err(UpgradeError::NonIncreasingLevel {
                requested: level,
                applied: self.applied,
            });
        }
        self.steps
            .get(&level)
            .ok_or(UpgradeError::UnknownLevel(level))
    }

    fn commit(
        &mut self,
        target: UpgradeTarget<'_>,
        level: u32,
        price: u32,
        bonus: &StatBonus,
    ) -> UpgradeReceipt {
        *target.cost = target.cost.saturating_add(price);
        bonus.apply(target.attack.profile_mut());
        self.applied = level;
        UpgradeReceipt {
            level,
            price,
            cost: *target.cost,
        }
    }
}

fn percentage_of(amount: u32, percent: u32) -> u32 {
    let scaled = u64::from(amount) * u64::from(percent) / 100;
    u32::try_from(scaled).unwrap_or(u32::MAX)
}
