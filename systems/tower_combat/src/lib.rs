#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Attack strategies that towers fire with.
//!
//! Every strategy shares the same deterministic target selection: among live
//! enemies whose center lies within range, the one furthest along the path
//! wins, ties go to the lowest remaining health, then to the lowest
//! identifier. Cooldowns are owned by the strategy and charge with the tick
//! delta passed in the [`AttackContext`].

use std::{cmp::Ordering, time::Duration};

use glam::Vec2;
use tower_defence_core::{CombatError, CurrencyLedger};
use tower_defence_world::{
    AttackContext, AttackKind, AttackProfile, AttackReport, AttackStrategy, Enemy, HitOutcome,
    Kill,
};
use tracing::debug;

/// Fires at the single best target in range.
#[derive(Debug)]
pub struct SingleTarget {
    profile: AttackProfile,
    cooldown: Cooldown,
}

impl SingleTarget {
    /// Creates a strategy that is ready to fire immediately.
    #[must_use]
    pub fn new(profile: AttackProfile) -> Self {
        Self {
            profile,
            cooldown: Cooldown::ready(),
        }
    }
}

impl AttackStrategy for SingleTarget {
    fn kind(&self) -> AttackKind {
        AttackKind::SingleTarget
    }

    fn profile(&self) -> &AttackProfile {
        &self.profile
    }

    fn profile_mut(&mut self) -> &mut AttackProfile {
        &mut self.profile
    }

    fn attack_targets(
        &mut self,
        ctx: &AttackContext,
        enemies: &mut [Enemy],
        ledger: &mut CurrencyLedger,
    ) -> AttackReport {
        let mut report = AttackReport::default();
        if !self.cooldown.charge(ctx.dt, self.profile.cooldown) {
            return report;
        }
        let Some(index) = select_target(ctx.position, self.profile.range, enemies) else {
            return report;
        };

        strike(&mut report, &mut enemies[index], self.profile.damage, ledger);
        self.cooldown.fire();
        report
    }
}

/// Fires at the best target and damages every live enemy near it.
#[derive(Debug)]
pub struct Splash {
    profile: AttackProfile,
    radius: f32,
    cooldown: Cooldown,
}

impl Splash {
    /// Creates a strategy whose blast reaches `radius` world units from the
    /// primary target's center.
    #[must_use]
    pub fn new(profile: AttackProfile, radius: f32) -> Self {
        Self {
            profile,
            radius,
            cooldown: Cooldown::ready(),
        }
    }

    /// Blast radius in world units.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }
}

impl AttackStrategy for Splash {
    fn kind(&self) -> AttackKind {
        AttackKind::Splash
    }

    fn profile(&self) -> &AttackProfile {
        &self.profile
    }

    fn profile_mut(&mut self) -> &mut AttackProfile {
        &mut self.profile
    }

    fn attack_targets(
        &mut self,
        ctx: &AttackContext,
        enemies: &mut [Enemy],
        ledger: &mut CurrencyLedger,
    ) -> AttackReport {
        let mut report = AttackReport::default();
        if !self.cooldown.charge(ctx.dt, self.profile.cooldown) {
            return report;
        }
        let Some(primary) = select_target(ctx.position, self.profile.range, enemies) else {
            return report;
        };

        let impact = enemies[primary].center();
        strike(&mut report, &mut enemies[primary], self.profile.damage, ledger);

        for (index, enemy) in enemies.iter_mut().enumerate() {
            if index == primary || enemy.is_dead() {
                continue;
            }
            if enemy.center().distance(impact) <= self.radius {
                strike(&mut report, enemy, self.profile.damage, ledger);
            }
        }

        self.cooldown.fire();
        report
    }
}

/// Fires at the best target and slows it down.
#[derive(Debug)]
pub struct Slow {
    profile: AttackProfile,
    factor: f32,
    duration: Duration,
    cooldown: Cooldown,
}

impl Slow {
    /// Creates a strategy that scales its target's speed by `factor` for
    /// `duration`.
    pub fn new(
        profile: AttackProfile,
        factor: f32,
        duration: Duration,
    ) -> Result<Self, CombatError> {
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(CombatError::InvalidSlowFactor(factor));
        }

        Ok(Self {
            profile,
            factor,
            duration,
            cooldown: Cooldown::ready(),
        })
    }

    /// Speed multiplier applied to struck enemies.
    #[must_use]
    pub const fn factor(&self) -> f32 {
        self.factor
    }

    /// How long the slow lasts.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }
}

impl AttackStrategy for Slow {
    fn kind(&self) -> AttackKind {
        AttackKind::Slow
    }

    fn profile(&self) -> &AttackProfile {
        &self.profile
    }

    fn profile_mut(&mut self) -> &mut AttackProfile {
        &mut self.profile
    }

    fn attack_targets(
        &mut self,
        ctx: &AttackContext,
        enemies: &mut [Enemy],
        ledger: &mut CurrencyLedger,
    ) -> AttackReport {
        let mut report = AttackReport::default();
        if !self.cooldown.charge(ctx.dt, self.profile.cooldown) {
            return report;
        }
        let Some(index) = select_target(ctx.position, self.profile.range, enemies) else {
            return report;
        };

        let target = &mut enemies[index];
        strike(&mut report, target, self.profile.damage, ledger);
        if let Err(error) = target.apply_slow(self.factor, self.duration) {
            debug!(enemy = target.id().get(), %error, "slow rejected");
        }

        self.cooldown.fire();
        report
    }
}

/// Time a strategy has charged toward its next shot.
///
/// The charge is capped at one cooldown period, so a tower that waits for
/// targets does not bank extra shots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cooldown {
    charged: Duration,
}

impl Cooldown {
    const fn ready() -> Self {
        Self {
            charged: Duration::MAX,
        }
    }

    fn charge(&mut self, dt: Duration, period: Duration) -> bool {
        self.charged = self.charged.saturating_add(dt).min(period);
        self.charged >= period
    }

    fn fire(&mut self) {
        self.charged = Duration::ZERO;
    }
}

fn select_target(origin: Vec2, range: f32, enemies: &[Enemy]) -> Option<usize> {
    let mut best: Option<usize> = None;

    for (index, enemy) in enemies.iter().enumerate() {
        if enemy.is_dead() || enemy.center().distance(origin) > range {
            continue;
        }

        best = match best {
            Some(current) if !precedes(enemy, &enemies[current]) => Some(current),
            _ => Some(index),
        };
    }

    best
}

fn precedes(candidate: &Enemy, other: &Enemy) -> bool {
    let by_progress = other
        .distance_traveled()
        .partial_cmp(&candidate.distance_traveled())
        .unwrap_or(Ordering::Equal);

    by_progress
        .then_with(|| candidate.health().cmp(&other.health()))
        .then_with(|| candidate.id().cmp(&other.id()))
        == Ordering::Less
}

fn strike(report: &mut AttackReport, enemy: &mut Enemy, damage: u32, ledger: &mut CurrencyLedger) {
    match enemy.take_hit(damage, ledger) {
        Ok(HitOutcome::Killed { reward, .. }) => {
            report.hits += 1;
            report.kills.push(Kill {
                enemy: enemy.id(),
                reward,
            });
        }
        Ok(HitOutcome::Damaged { .. }) => report.hits += 1,
        Ok(HitOutcome::AlreadyDead) => {}
        Err(error) => debug!(enemy = enemy.id().get(), %error, "strike rejected"),
    }
}
