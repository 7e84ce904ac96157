//! Mobile units that walk the waypoint path and soak tower damage.

use std::{sync::Arc, time::Duration};

use glam::Vec2;
use tower_defence_core::{
    BoundingBox, CombatError, CurrencyLedger, EnemyId, EnemySnapshot, EnemyTemplate, Path,
    SpawnError, Waypoint, GRID_CELL_SIZE,
};

/// Sprites face up by default, so the facing angle is offset by a quarter turn.
const SPRITE_ORIENTATION_OFFSET_DEGREES: f32 = 90.0;

/// Result of a single [`Enemy::advance`] step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The enemy moved toward its target waypoint.
    Moved,
    /// The enemy had no waypoint left and has now escaped.
    ReachedEnd,
    /// The enemy was already dead; nothing happened.
    Inactive,
}

/// Result of a successful [`Enemy::take_hit`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitOutcome {
    /// The enemy survived with the provided health.
    Damaged {
        /// Health left after the hit.
        remaining: i32,
    },
    /// The hit was lethal and the reward was credited.
    Killed {
        /// Currency credited to the ledger.
        reward: u32,
        /// Damage dealt beyond the health the enemy had left.
        overkill: u32,
    },
    /// The enemy was already dead; nothing happened.
    AlreadyDead,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct SlowEffect {
    factor: f32,
    remaining: Duration,
}

/// Enemy walking the path toward the exit.
#[derive(Clone, Debug)]
pub struct Enemy {
    id: EnemyId,
    name: String,
    max_health: i32,
    health: i32,
    speed: f32,
    reward: u32,
    path: Arc<Path>,
    target: Option<usize>,
    position: Vec2,
    bounding_box: BoundingBox,
    facing_degrees: f32,
    is_dead: bool,
    reached_end: bool,
    distance_traveled: f32,
    slow: Option<SlowEffect>,
}

impl Enemy {
    /// Spawns an enemy standing on the first waypoint of `path`.
    ///
    /// The template speed is given in grid cells per second and is converted
    /// to world units with [`GRID_CELL_SIZE`]. The spawn waypoint counts as
    /// already reached, so the enemy heads for the second waypoint.
    pub fn spawn(
        id: EnemyId,
        template: &EnemyTemplate,
        path: Arc<Path>,
    ) -> Result<Self, SpawnError> {
        if template.health <= 0 {
            return Err(SpawnError::NonPositiveHealth(template.health));
        }
        if !template.speed.is_finite() || template.speed < 0.0 {
            return Err(SpawnError::InvalidSpeed(template.speed));
        }

        let spawn = path.first();
        let position = spawn.position();
        let target = spawn.next().map(|waypoint| waypoint.index());

        Ok(Self {
            id,
            name: template.name.clone(),
            max_health: template.health,
            health: template.health,
            speed: template.speed * GRID_CELL_SIZE,
            reward: template.reward,
            target,
            position,
            bounding_box: BoundingBox::square(position, GRID_CELL_SIZE),
            facing_degrees: 0.0,
            is_dead: false,
            reached_end: false,
            distance_traveled: 0.0,
            slow: None,
            path,
        })
    }

    /// Applies `damage` and credits the reward to `ledger` if the hit is lethal.
    ///
    /// Hits on a dead enemy are ignored, so the reward is paid at most once.
    pub fn take_hit(
        &mut self,
        damage: u32,
        ledger: &mut CurrencyLedger,
    ) -> Result<HitOutcome, CombatError> {
        if damage == 0 {
            return Err(CombatError::NonPositiveDamage);
        }
        if self.is_dead {
            return Ok(HitOutcome::AlreadyDead);
        }

        let damage = i32::try_from(damage).unwrap_or(i32::MAX);
        self.health = self.health.saturating_sub(damage);
        if self.health > 0 {
            return Ok(HitOutcome::Damaged {
                remaining: self.health,
            });
        }

        let overkill = self.health.unsigned_abs();
        self.health = 0;
        self.is_dead = true;
        ledger.credit(self.reward);
        Ok(HitOutcome::Killed {
            reward: self.reward,
            overkill,
        })
    }

    /// Slows the enemy to `factor` of its speed for `duration`.
    ///
    /// A stronger slow replaces the active one, as does an equally strong one
    /// that lasts longer. Weaker slows are ignored while the active one lasts.
    pub fn apply_slow(&mut self, factor: f32, duration: Duration) -> Result<(), CombatError> {
        if !(factor > 0.0 && factor <= 1.0) {
            return Err(CombatError::InvalidSlowFactor(factor));
        }
        if self.is_dead || duration.is_zero() {
            return Ok(());
        }

        let incoming = SlowEffect {
            factor,
            remaining: duration,
        };
        self.slow = match self.slow {
            Some(active) if active.factor < factor => Some(active),
            Some(active) if active.factor == factor && active.remaining >= duration => {
                Some(active)
            }
            _ => Some(incoming),
        };
        Ok(())
    }

    /// Moves the enemy toward its target waypoint for `dt` of simulated time.
    pub fn advance(&mut self, dt: Duration) -> AdvanceOutcome {
        if self.is_dead {
            return AdvanceOutcome::Inactive;
        }

        let Some(target) = self.target_waypoint() else {
            self.is_dead = true;
            self.reached_end = true;
            return AdvanceOutcome::ReachedEnd;
        };
        let destination = target.position();
        let following = target.next().map(|waypoint| waypoint.index());

        let direction = (destination - self.position).normalize_or_zero();
        if direction != Vec2::ZERO {
            self.facing_degrees = facing_from(direction);
        }

        let displacement = direction * self.effective_speed() * dt.as_secs_f32();
        self.decay_slow(dt);
        self.move_by(displacement, destination);

        if self.position == destination {
            self.target = following;
        }

        AdvanceOutcome::Moved
    }

    fn move_by(&mut self, displacement: Vec2, destination: Vec2) {
        self.distance_traveled += displacement.length();
        self.position += displacement;

        let overshot = (displacement.x > 0.0 && self.position.x > destination.x)
            || (displacement.x < 0.0 && self.position.x < destination.x)
            || (displacement.y < 0.0 && self.position.y < destination.y)
            || (displacement.y > 0.0 && self.position.y > destination.y);
        if overshot {
            self.position = destination;
        }

        self.bounding_box = self.bounding_box.with_origin(self.position);
    }

    fn decay_slow(&mut self, dt: Duration) {
        if let Some(active) = &mut self.slow {
            active.remaining = active.remaining.saturating_sub(dt);
            if active.remaining.is_zero() {
                self.slow = None;
            }
        }
    }

    /// Identifier assigned at spawn.
    #[must_use]
    pub const fn id(&self) -> EnemyId {
        self.id
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Remaining health; zero once dead by damage.
    #[must_use]
    pub const fn health(&self) -> i32 {
        self.health
    }

    /// Health the enemy spawned with.
    #[must_use]
    pub const fn max_health(&self) -> i32 {
        self.max_health
    }

    /// Base speed in world units per second.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }

    /// Speed after any active slow effect.
    #[must_use]
    pub fn effective_speed(&self) -> f32 {
        self.slow.map_or(self.speed, |active| self.speed * active.factor)
    }

    /// Currency paid when a tower kills the enemy.
    #[must_use]
    pub const fn reward(&self) -> u32 {
        self.reward
    }

    /// World position of the anchor corner.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Center of the bounding box, used for range checks.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.bounding_box.center()
    }

    /// Hit box anchored at the enemy position.
    #[must_use]
    pub const fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    /// Sprite rotation in degrees.
    #[must_use]
    pub const fn facing_degrees(&self) -> f32 {
        self.facing_degrees
    }

    /// Distance covered since spawning, never decreasing.
    #[must_use]
    pub const fn distance_traveled(&self) -> f32 {
        self.distance_traveled
    }

    /// Whether the enemy died or escaped.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.is_dead
    }

    /// Whether the enemy walked past the final waypoint.
    #[must_use]
    pub const fn has_reached_end(&self) -> bool {
        self.reached_end
    }

    /// Whether a slow effect is currently active.
    #[must_use]
    pub const fn is_slowed(&self) -> bool {
        self.slow.is_some()
    }

    /// Waypoint the enemy is currently walking toward.
    #[must_use]
    pub fn target_waypoint(&self) -> Option<Waypoint<'_>> {
        self.target.and_then(|index| self.path.waypoint(index))
    }

    /// Captures a render-facing snapshot of the enemy.
    #[must_use]
    pub fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            name: self.name.clone(),
            position: self.position,
            facing_degrees: self.facing_degrees,
            bounding_box: self.bounding_box,
            health: self.health,
            is_dead: self.is_dead,
            reached_end: self.reached_end,
            distance_traveled: self.distance_traveled,
        }
    }
}

fn facing_from(direction: Vec2) -> f32 {
    let degrees = direction.y.atan2(direction.x).to_degrees();
    let degrees = if degrees < 0.0 { degrees + 360.0 } else { degrees };
    degrees - SPRITE_ORIENTATION_OFFSET_DEGREES
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(points: &[(f32, f32)]) -> Arc<Path> {
        let points = points.iter().map(|&(x, y)| Vec2::new(x, y)).collect();
        Arc::new(Path::new(points).expect("valid path"))
    }

    fn template(health: i32, speed: f32, reward: u32) -> EnemyTemplate {
        EnemyTemplate::new("grunt", health, speed, reward)
    }

    fn spawn(health: i32, speed: f32, reward: u32, points: &[(f32, f32)]) -> Enemy {
        Enemy::spawn(EnemyId::new(0), &template(health, speed, reward), path(points))
            .expect("valid template")
    }

    #[test]
    fn spawn_scales_speed_and_targets_second_waypoint() {
        let enemy = spawn(10, 2.0, 5, &[(32.0, 64.0), (320.0, 64.0)]);

        assert_eq!(enemy.speed(), 64.0);
        assert_eq!(enemy.max_health(), 10);
        assert_eq!(enemy.position(), Vec2::new(32.0, 64.0));
        assert_eq!(enemy.bounding_box().origin(), Vec2::new(32.0, 64.0));
        assert_eq!(enemy.bounding_box().size(), Vec2::splat(GRID_CELL_SIZE));
        let target = enemy.target_waypoint().expect("second waypoint");
        assert_eq!(target.index(), 1);
    }

    #[test]
    fn spawn_rejects_dead_or_invalid_templates() {
        let path = path(&[(0.0, 0.0)]);
        assert_eq!(
            Enemy::spawn(EnemyId::new(0), &template(0, 1.0, 1), Arc::clone(&path)).err(),
            Some(SpawnError::NonPositiveHealth(0))
        );
        assert_eq!(
            Enemy::spawn(EnemyId::new(0), &template(5, -1.0, 1), path).err(),
            Some(SpawnError::InvalidSpeed(-1.0))
        );
    }

    #[test]
    fn lethal_hit_credits_reward_once() {
        let mut ledger = CurrencyLedger::new(0);
        let mut enemy = spawn(10, 1.0, 5, &[(0.0, 0.0), (32.0, 0.0), (64.0, 0.0)]);

        assert_eq!(
            enemy.take_hit(12, &mut ledger),
            Ok(HitOutcome::Killed {
                reward: 5,
                overkill: 2,
            })
        );
        assert!(enemy.is_dead());
        assert_eq!(enemy.health(), 0);
        assert_eq!(ledger.balance(), 5);

        assert_eq!(enemy.take_hit(5, &mut ledger), Ok(HitOutcome::AlreadyDead));
        assert_eq!(ledger.balance(), 5);
        assert!(enemy.is_dead());
    }

    #[test]
    fn exact_damage_kills() {
        let mut ledger = CurrencyLedger::new(0);
        let mut enemy = spawn(10, 1.0, 3, &[(0.0, 0.0), (32.0, 0.0)]);
        assert_eq!(
            enemy.take_hit(10, &mut ledger),
            Ok(HitOutcome::Killed {
                reward: 3,
                overkill: 0,
            })
        );
    }

    #[test]
    fn non_lethal_hit_reduces_health() {
        let mut ledger = CurrencyLedger::new(0);
        let mut enemy = spawn(10, 1.0, 5, &[(0.0, 0.0), (32.0, 0.0)]);
        assert_eq!(
            enemy.take_hit(4, &mut ledger),
            Ok(HitOutcome::Damaged { remaining: 6 })
        );
        assert!(!enemy.is_dead());
        assert_eq!(ledger.balance(), 0);
    }

    #[test]
    fn zero_damage_is_rejected() {
        let mut ledger = CurrencyLedger::new(0);
        let mut enemy = spawn(10, 1.0, 5, &[(0.0, 0.0), (32.0, 0.0)]);
        assert_eq!(
            enemy.take_hit(0, &mut ledger),
            Err(CombatError::NonPositiveDamage)
        );
        assert_eq!(enemy.health(), 10);
    }

    #[test]
    fn displacement_matches_speed_times_cell_size_times_dt() {
        let mut enemy = spawn(10, 2.0, 5, &[(0.0, 0.0), (320.0, 0.0)]);

        assert_eq!(enemy.advance(Duration::from_millis(500)), AdvanceOutcome::Moved);

        assert_eq!(enemy.position(), Vec2::new(32.0, 0.0));
        assert_eq!(enemy.distance_traveled(), 32.0);
        assert_eq!(enemy.bounding_box().origin(), Vec2::new(32.0, 0.0));
    }

    #[test]
    fn overshoot_snaps_onto_waypoint() {
        let mut enemy = spawn(10, 1.0, 5, &[(0.0, 0.0), (0.0, 1.0), (0.0, 100.0)]);

        let _ = enemy.advance(Duration::from_secs(1));

        assert_eq!(enemy.position(), Vec2::new(0.0, 1.0));
        assert_eq!(enemy.target_waypoint().map(|waypoint| waypoint.index()), Some(2));
    }

    #[test]
    fn overshoot_keeps_pre_snap_distance() {
        let mut enemy = spawn(10, 1.0, 5, &[(10.0, 0.0), (0.0, 0.0)]);

        let _ = enemy.advance(Duration::from_secs(1));

        assert_eq!(enemy.position(), Vec2::new(0.0, 0.0));
        assert_eq!(enemy.distance_traveled(), GRID_CELL_SIZE);
    }

    #[test]
    fn overshoot_moving_right_snaps_onto_waypoint() {
        let mut enemy = spawn(10, 1.0, 5, &[(0.0, 0.0), (5.0, 0.0), (50.0, 0.0)]);

        let _ = enemy.advance(Duration::from_secs(1));

        assert_eq!(enemy.position(), Vec2::new(5.0, 0.0));
        assert_eq!(enemy.bounding_box().origin(), Vec2::new(5.0, 0.0));
        assert_eq!(enemy.target_waypoint().map(|waypoint| waypoint.index()), Some(2));
    }

    #[test]
    fn overshoot_moving_down_snaps_onto_waypoint() {
        let mut enemy = spawn(10, 1.0, 5, &[(0.0, 10.0), (0.0, 0.0), (0.0, -100.0)]);

        let _ = enemy.advance(Duration::from_secs(1));

        assert_eq!(enemy.position(), Vec2::new(0.0, 0.0));
        assert_eq!(enemy.distance_traveled(), GRID_CELL_SIZE);
        assert_eq!(enemy.target_waypoint().map(|waypoint| waypoint.index()), Some(2));
    }

    #[test]
    fn facing_is_direction_angle_minus_quarter_turn() {
        let mut right = spawn(10, 1.0, 5, &[(0.0, 0.0), (100.0, 0.0)]);
        let _ = right.advance(Duration::from_millis(10));
        assert!((right.facing_degrees() + 90.0).abs() < 1e-3);

        let mut down = spawn(10, 1.0, 5, &[(0.0, 100.0), (0.0, 0.0)]);
        let _ = down.advance(Duration::from_millis(10));
        assert!((down.facing_degrees() - 180.0).abs() < 1e-3);
    }

    #[test]
    fn zero_dt_still_detects_path_end() {
        let mut enemy = spawn(10, 1.0, 5, &[(0.0, 0.0)]);
        assert!(enemy.target_waypoint().is_none());

        assert_eq!(enemy.advance(Duration::ZERO), AdvanceOutcome::ReachedEnd);

        assert!(enemy.is_dead());
        assert!(enemy.has_reached_end());
        assert_eq!(enemy.position(), Vec2::ZERO);
    }

    #[test]
    fn zero_dt_does_not_move() {
        let mut enemy = spawn(10, 1.0, 5, &[(0.0, 0.0), (64.0, 0.0)]);
        assert_eq!(enemy.advance(Duration::ZERO), AdvanceOutcome::Moved);
        assert_eq!(enemy.position(), Vec2::ZERO);
        assert_eq!(enemy.distance_traveled(), 0.0);
    }

    #[test]
    fn dead_enemies_do_not_move() {
        let mut ledger = CurrencyLedger::new(0);
        let mut enemy = spawn(1, 1.0, 5, &[(0.0, 0.0), (64.0, 0.0)]);
        let _ = enemy.take_hit(1, &mut ledger);

        assert_eq!(enemy.advance(Duration::from_secs(1)), AdvanceOutcome::Inactive);
        assert_eq!(enemy.position(), Vec2::ZERO);
        assert!(!enemy.has_reached_end());
    }

    #[test]
    fn walking_off_the_end_pays_nothing() {
        let mut enemy = spawn(10, 1.0, 5, &[(0.0, 0.0), (32.0, 0.0), (32.0, 32.0)]);
        let mut last_distance = 0.0;
        let mut steps = 0;

        while !enemy.is_dead() {
            let _ = enemy.advance(Duration::from_millis(250));
            assert!(enemy.distance_traveled() >= last_distance);
            last_distance = enemy.distance_traveled();
            steps += 1;
            assert!(steps < 100, "enemy never reached the end");
        }

        assert!(enemy.has_reached_end());
        assert_eq!(enemy.position(), Vec2::new(32.0, 32.0));
        assert_eq!(enemy.health(), 10);
    }

    #[test]
    fn slow_scales_speed_until_it_expires() {
        let mut enemy = spawn(10, 2.0, 5, &[(0.0, 0.0), (1000.0, 0.0)]);
        enemy
            .apply_slow(0.5, Duration::from_millis(500))
            .expect("valid slow");
        assert_eq!(enemy.effective_speed(), 32.0);

        let _ = enemy.advance(Duration::from_millis(500));
        assert_eq!(enemy.position(), Vec2::new(16.0, 0.0));
        assert!(!enemy.is_slowed());
        assert_eq!(enemy.effective_speed(), 64.0);
    }

    #[test]
    fn weaker_slow_does_not_replace_stronger_one() {
        let mut enemy = spawn(10, 1.0, 5, &[(0.0, 0.0), (1000.0, 0.0)]);
        enemy
            .apply_slow(0.25, Duration::from_secs(1))
            .expect("valid slow");
        enemy
            .apply_slow(0.75, Duration::from_secs(5))
            .expect("valid slow");
        assert_eq!(enemy.effective_speed(), 8.0);
    }

    #[test]
    fn equal_slow_with_longer_duration_replaces_active_one() {
        let mut enemy = spawn(10, 1.0, 5, &[(0.0, 0.0), (1000.0, 0.0)]);
        enemy
            .apply_slow(0.5, Duration::from_secs(1))
            .expect("valid slow");
        enemy
            .apply_slow(0.5, Duration::from_secs(3))
            .expect("valid slow");

        let _ = enemy.advance(Duration::from_secs(2));

        assert!(enemy.is_slowed());
        assert_eq!(enemy.effective_speed(), GRID_CELL_SIZE * 0.5);
    }

    #[test]
    fn dead_enemies_ignore_slows() {
        let mut ledger = CurrencyLedger::new(0);
        let mut enemy = spawn(1, 1.0, 5, &[(0.0, 0.0), (1000.0, 0.0)]);
        let _ = enemy.take_hit(1, &mut ledger);

        assert_eq!(enemy.apply_slow(0.5, Duration::from_secs(1)), Ok(()));

        assert!(!enemy.is_slowed());
        assert_eq!(enemy.effective_speed(), enemy.speed());
    }

    #[test]
    fn invalid_slow_factor_is_rejected() {
        let mut enemy = spawn(10, 1.0, 5, &[(0.0, 0.0), (1000.0, 0.0)]);
        assert_eq!(
            enemy.apply_slow(1.5, Duration::from_secs(1)),
            Err(CombatError::InvalidSlowFactor(1.5))
        );
        assert!(!enemy.is_slowed());
    }
}
