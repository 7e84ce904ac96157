//! TOML scenario files describing a headless session.

use std::{fs, path::Path as FsPath, time::Duration};

use anyhow::{bail, Context, Result};
use glam::Vec2;
use serde::Deserialize;
use tower_defence_core::{EnemyTemplate, Path, UpgradeSlot};
use tower_defence_system_tower_combat::{SingleTarget, Slow, Splash};
use tower_defence_system_tower_upgrades::{
    LinearCost, LinearStep, PercentageCost, PercentageStep, StatBonus,
};
use tower_defence_world::{AttackProfile, AttackStrategy, Tower, UpgradeStrategy, WorldConfig};

/// Scenario used when no file is given on the command line.
pub(crate) const DEFAULT_SCENARIO: &str = include_str!("../scenarios/default.toml");

const DEFAULT_TICKS: u64 = 600;
const DEFAULT_DT_MS: u64 = 50;

/// Complete description of a session: the path, the economy, the waves and
/// the player's orders.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    starting_balance: u32,
    #[serde(default = "default_ticks")]
    ticks: u64,
    #[serde(default = "default_dt_ms")]
    dt_ms: u64,
    path: Vec<[f32; 2]>,
    #[serde(default)]
    spawns: Vec<SpawnGroup>,
    #[serde(default)]
    towers: Vec<TowerSpec>,
    #[serde(default)]
    orders: Vec<Order>,
}

fn default_ticks() -> u64 {
    DEFAULT_TICKS
}

fn default_dt_ms() -> u64 {
    DEFAULT_DT_MS
}

fn default_count() -> u32 {
    1
}

impl Scenario {
    /// Parses the scenario bundled with the binary.
    pub(crate) fn builtin() -> Result<Self> {
        Self::from_toml(DEFAULT_SCENARIO).context("built-in scenario is invalid")
    }

    /// Reads and parses a scenario file.
    pub(crate) fn from_file(path: impl AsRef<FsPath>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("failed to load scenario at {}", path.display()))
    }

    /// Parses scenario TOML and checks that orders name existing towers.
    pub(crate) fn from_toml(contents: &str) -> Result<Self> {
        let scenario: Self =
            toml::from_str(contents).context("failed to parse scenario toml contents")?;
        for order in &scenario.orders {
            if order.tower() >= scenario.towers.len() {
                bail!(
                    "order at tick {} names tower {} but only {} towers are defined",
                    order.tick(),
                    order.tower(),
                    scenario.towers.len()
                );
            }
        }
        Ok(scenario)
    }

    /// Number of ticks the scenario asks to run.
    pub(crate) const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Length of a single tick.
    pub(crate) const fn dt(&self) -> Duration {
        Duration::from_millis(self.dt_ms)
    }

    pub(crate) const fn world_config(&self) -> WorldConfig {
        WorldConfig::new(self.starting_balance)
    }

    /// Builds the waypoint path.
    pub(crate) fn path(&self) -> Result<Path> {
        let points = self.path.iter().copied().map(Vec2::from).collect();
        Path::new(points).context("scenario path is invalid")
    }

    /// Builds every tower in declaration order.
    pub(crate) fn towers(&self) -> Result<Vec<Tower>> {
        self.towers
            .iter()
            .enumerate()
            .map(|(index, spec)| {
                spec.build()
                    .with_context(|| format!("tower {index} ({}) is invalid", spec.name))
            })
            .collect()
    }

    /// Enemy templates to spawn, paired with their spawn tick, ordered by tick
    /// and then by declaration.
    pub(crate) fn spawn_schedule(&self) -> Vec<(u64, EnemyTemplate)> {
        let mut schedule: Vec<_> = self
            .spawns
            .iter()
            .flat_map(|group| {
                (0..u64::from(group.count)).map(move |index| {
                    let tick = group.tick.saturating_add(index.saturating_mul(group.interval));
                    (tick, group.template.clone())
                })
            })
            .collect();
        schedule.sort_by_key(|(tick, _)| *tick);
        schedule
    }

    /// Player orders sorted by tick, keeping declaration order within a tick.
    pub(crate) fn orders(&self) -> Vec<Order> {
        let mut orders = self.orders.clone();
        orders.sort_by_key(Order::tick);
        orders
    }
}

#[derive(Debug, Deserialize)]
struct SpawnGroup {
    #[serde(flatten)]
    template: EnemyTemplate,
    tick: u64,
    #[serde(default = "default_count")]
    count: u32,
    #[serde(default)]
    interval: u64,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TowerSpec {
    name: String,
    cost: u32,
    position: [f32; 2],
    attack: AttackSpec,
    #[serde(default)]
    primary: Option<UpgradeSpec>,
    #[serde(default)]
    secondary: Option<UpgradeSpec>,
}

impl TowerSpec {
    fn build(&self) -> Result<Tower> {
        let mut tower = Tower::new(
            self.name.clone(),
            Vec2::from(self.position),
            self.cost,
            self.attack.build()?,
        );
        if let Some(spec) = &self.primary {
            tower = tower.with_primary_upgrade(spec.build());
        }
        if let Some(spec) = &self.secondary {
            tower = tower.with_secondary_upgrade(spec.build());
        }
        Ok(tower)
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
enum AttackSpec {
    SingleTarget {
        damage: u32,
        range: f32,
        cooldown_ms: u64,
    },
    Splash {
        damage: u32,
        range: f32,
        cooldown_ms: u64,
        radius: f32,
    },
    Slow {
        damage: u32,
        range: f32,
        cooldown_ms: u64,
        factor: f32,
        duration_ms: u64,
    },
}

impl AttackSpec {
    fn build(&self) -> Result<Box<dyn AttackStrategy>> {
        let profile = |damage: u32, range: f32, cooldown_ms: u64| {
            AttackProfile::new(damage, range, Duration::from_millis(cooldown_ms))
        };
        Ok(match *self {
            Self::SingleTarget {
                damage,
                range,
                cooldown_ms,
            } => Box::new(SingleTarget::new(profile(damage, range, cooldown_ms))),
            Self::Splash {
                damage,
                range,
                cooldown_ms,
                radius,
            } => Box::new(Splash::new(profile(damage, range, cooldown_ms), radius)),
            Self::Slow {
                damage,
                range,
                cooldown_ms,
                factor,
                duration_ms,
            } => Box::new(
                Slow::new(
                    profile(damage, range, cooldown_ms),
                    factor,
                    Duration::from_millis(duration_ms),
                )
                .context("invalid slow attack")?,
            ),
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
enum UpgradeSpec {
    Linear { levels: Vec<LevelSpec> },
    Percentage { levels: Vec<LevelSpec> },
}

impl UpgradeSpec {
    fn build(&self) -> Box<dyn UpgradeStrategy> {
        match self {
            Self::Linear { levels } => Box::new(LinearCost::new(levels.iter().map(|spec| {
                let step = LinearStep {
                    cost_increase: spec.price,
                    bonus: spec.bonus(),
                };
                (spec.level, step)
            }))),
            Self::Percentage { levels } => {
                Box::new(PercentageCost::new(levels.iter().map(|spec| {
                    let step = PercentageStep {
                        percent: spec.price,
                        bonus: spec.bonus(),
                    };
                    (spec.level, step)
                })))
            }
        }
    }
}

/// One row of an upgrade table.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LevelSpec {
    level: u32,
    /// Flat amount for linear paths, percent of the current cost otherwise.
    price: u32,
    #[serde(default)]
    damage: u32,
    #[serde(default)]
    range: f32,
    #[serde(default)]
    cooldown_reduction_ms: u64,
}

impl LevelSpec {
    fn bonus(&self) -> StatBonus {
        StatBonus {
            damage: self.damage,
            range: self.range,
            cooldown_reduction: Duration::from_millis(self.cooldown_reduction_ms),
        }
    }
}

/// Player action issued at the start of a tick. Towers are named by their
/// position in the scenario's tower list.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", deny_unknown_fields)]
pub(crate) enum Order {
    Upgrade {
        tick: u64,
        tower: usize,
        slot: UpgradeSlot,
        level: u32,
    },
    Sell {
        tick: u64,
        tower: usize,
    },
}

impl Order {
    pub(crate) fn tick(&self) -> u64 {
        match *self {
            Self::Upgrade { tick, .. } | Self::Sell { tick, .. } => tick,
        }
    }

    pub(crate) fn tower(&self) -> usize {
        match *self {
            Self::Upgrade { tower, .. } | Self::Sell { tower, .. } => tower,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        starting_balance = 50
        path = [[0.0, 0.0], [64.0, 0.0]]
    "#;

    #[test]
    fn builtin_scenario_parses_and_builds() {
        let scenario = Scenario::builtin().expect("built-in scenario parses");

        assert_eq!(scenario.world_config().starting_balance(), 400);
        assert_eq!(scenario.dt(), Duration::from_millis(50));
        assert_eq!(scenario.path().expect("valid path").len(), 5);
        let towers = scenario.towers().expect("towers build");
        let names: Vec<_> = towers.iter().map(Tower::name).collect();
        assert_eq!(names, vec!["arrow", "mortar", "frost"]);
        assert_eq!(towers[0].quote_upgrade(UpgradeSlot::Primary, 1).ok(), Some(50));
        assert_eq!(
            towers[1].quote_upgrade(UpgradeSlot::Secondary, 1).ok(),
            Some(37)
        );
    }

    #[test]
    fn omitted_sections_use_defaults() {
        let scenario = Scenario::from_toml(MINIMAL).expect("minimal scenario parses");

        assert_eq!(scenario.ticks(), DEFAULT_TICKS);
        assert_eq!(scenario.dt(), Duration::from_millis(DEFAULT_DT_MS));
        assert!(scenario.spawn_schedule().is_empty());
        assert!(scenario.towers().expect("no towers").is_empty());
        assert!(scenario.orders().is_empty());
    }

    #[test]
    fn spawn_groups_expand_by_interval() {
        let contents = format!(
            "{MINIMAL}\n{}",
            r#"
            [[spawns]]
            name = "brute"
            health = 40
            speed = 0.5
            reward = 10
            tick = 5

            [[spawns]]
            name = "grunt"
            health = 10
            speed = 1
            reward = 2
            tick = 0
            count = 3
            interval = 4
            "#
        );
        let scenario = Scenario::from_toml(&contents).expect("scenario parses");

        let schedule: Vec<_> = scenario
            .spawn_schedule()
            .into_iter()
            .map(|(tick, template)| (tick, template.name))
            .collect();
        assert_eq!(
            schedule,
            vec![
                (0, "grunt".to_owned()),
                (4, "grunt".to_owned()),
                (5, "brute".to_owned()),
                (8, "grunt".to_owned()),
            ]
        );
    }

    #[test]
    fn orders_must_name_defined_towers() {
        let contents = format!(
            "{MINIMAL}\n{}",
            r#"
            [[orders]]
            action = "sell"
            tick = 3
            tower = 0
            "#
        );
        let error = Scenario::from_toml(&contents).expect_err("no towers are defined");
        assert!(error.to_string().contains("names tower 0"));
    }

    #[test]
    fn invalid_slow_factor_is_reported() {
        let contents = format!(
            "{MINIMAL}\n{}",
            r#"
            [[towers]]
            name = "frost"
            cost = 10
            position = [0.0, 0.0]
            attack = { kind = "slow", damage = 1, range = 10.0, cooldown_ms = 100, factor = 1.5, duration_ms = 100 }
            "#
        );
        let scenario = Scenario::from_toml(&contents).expect("scenario parses");
        let error = scenario.towers().expect_err("factor out of range");
        assert!(format!("{error:#}").contains("slow factor 1.5"));
    }

    #[test]
    fn unknown_attack_kinds_are_rejected() {
        let contents = format!(
            "{MINIMAL}\n{}",
            r#"
            [[towers]]
            name = "laser"
            cost = 10
            position = [0.0, 0.0]
            attack = { kind = "beam", damage = 1, range = 10.0, cooldown_ms = 100 }
            "#
        );
        assert!(Scenario::from_toml(&contents).is_err());
    }

    #[test]
    fn empty_path_is_rejected() {
        let scenario = Scenario::from_toml("starting_balance = 0\npath = []")
            .expect("empty path parses");
        assert!(scenario.path().is_err());
    }
}
