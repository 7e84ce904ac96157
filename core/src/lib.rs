#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the tower defence simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and the combat systems. Adapters submit [`Command`]
//! values describing desired mutations, the world executes those commands via
//! its `apply` entry point, and then broadcasts [`Event`] values describing
//! what happened during the tick. The waypoint [`path`] and the shared
//! [`ledger`] live here because every other crate consumes them.

use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod ledger;
pub mod path;

pub use ledger::{CurrencyLedger, LedgerError};
pub use path::{Path, PathError, Waypoint};

/// Side length of a single grid cell measured in world units.
///
/// Enemy speeds are authored in grid cells per second and scaled by this
/// constant when the enemy spawns.
pub const GRID_CELL_SIZE: f32 = 32.0;

/// Commands that express all permissible world mutations.
///
/// Tower purchases are not commands: towers carry boxed strategies and are
/// handed to the world directly.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Spawns a new enemy at the first waypoint of the world's path.
    SpawnEnemy {
        /// Stats applied to the spawned enemy.
        template: EnemyTemplate,
    },
    /// Requests that one of a tower's upgrade strategies be applied.
    UpgradeTower {
        /// Identifier of the tower to upgrade.
        tower: TowerId,
        /// Upgrade strategy slot to apply.
        slot: UpgradeSlot,
        /// Level requested from the upgrade strategy.
        level: u32,
    },
    /// Requests that a tower be sold and removed from the world.
    SellTower {
        /// Identifier of the tower to sell.
        tower: TowerId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that an enemy entered the path.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Name of the template the enemy was created from.
        name: String,
    },
    /// Reports that an enemy template was rejected.
    EnemySpawnRejected {
        /// Name of the rejected template.
        name: String,
        /// Specific reason the spawn failed.
        reason: SpawnError,
    },
    /// Reports that an enemy died to a tower attack and paid out its reward.
    EnemyKilled {
        /// Identifier of the enemy that died.
        enemy: EnemyId,
        /// Tower that landed the killing blow.
        tower: TowerId,
        /// Currency credited to the ledger.
        reward: u32,
    },
    /// Reports that an enemy walked past the final waypoint.
    EnemyEscaped {
        /// Identifier of the enemy that reached the end of the path.
        enemy: EnemyId,
    },
    /// Confirms that a dead enemy was swept from the simulation.
    EnemyRemoved {
        /// Identifier of the removed enemy.
        enemy: EnemyId,
    },
    /// Confirms that a tower was purchased and placed.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Amount debited from the ledger.
        cost: u32,
    },
    /// Reports that a tower purchase was rejected.
    TowerPlacementRejected {
        /// Specific reason the purchase failed.
        reason: PurchaseError,
    },
    /// Confirms that an upgrade was applied to a tower.
    TowerUpgraded {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Slot whose strategy was applied.
        slot: UpgradeSlot,
        /// Level that was applied.
        level: u32,
        /// Amount debited from the ledger.
        price: u32,
    },
    /// Reports that an upgrade request was rejected.
    TowerUpgradeRejected {
        /// Identifier of the tower targeted by the upgrade.
        tower: TowerId,
        /// Slot named in the request.
        slot: UpgradeSlot,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Confirms that a tower was sold.
    TowerSold {
        /// Identifier of the sold tower.
        tower: TowerId,
        /// Amount credited back to the ledger.
        refund: u32,
    },
    /// Reports that a sale request named an unknown tower.
    TowerSaleRejected {
        /// Identifier named in the request.
        tower: TowerId,
    },
}

/// Unique identifier assigned to an enemy in spawn order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower in creation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifies which of a tower's two upgrade strategies a request targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeSlot {
    /// First upgrade path of the tower.
    Primary,
    /// Second upgrade path of the tower.
    Secondary,
}

/// Stats used to spawn an enemy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    /// Display name, also used by renderers to pick a sprite.
    pub name: String,
    /// Starting and maximum health.
    pub health: i32,
    /// Movement speed in grid cells per second.
    pub speed: f32,
    /// Currency credited when a tower kills the enemy.
    pub reward: u32,
}

impl EnemyTemplate {
    /// Creates a new template from its parts.
    #[must_use]
    pub fn new(name: impl Into<String>, health: i32, speed: f32, reward: u32) -> Self {
        Self {
            name: name.into(),
            health,
            speed,
            reward,
        }
    }
}

/// Axis-aligned rectangle anchored at its minimum corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    origin: Vec2,
    size: Vec2,
}

impl BoundingBox {
    /// Creates a box from its minimum corner and size.
    #[must_use]
    pub const fn new(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    /// Creates a square box of the provided side anchored at `origin`.
    #[must_use]
    pub const fn square(origin: Vec2, side: f32) -> Self {
        Self::new(origin, Vec2::new(side, side))
    }

    /// Minimum corner of the box.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Width and height of the box.
    #[must_use]
    pub const fn size(&self) -> Vec2 {
        self.size
    }

    /// Geometric center of the box.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.origin + self.size * 0.5
    }

    /// Returns a copy of the box moved so its minimum corner sits at `origin`.
    #[must_use]
    pub const fn with_origin(self, origin: Vec2) -> Self {
        Self {
            origin,
            size: self.size,
        }
    }

    /// Reports whether the point lies inside the box, edges included.
    #[must_use]
    pub fn contains(&self, point: Vec2) -> bool {
        let max = self.origin + self.size;
        point.x >= self.origin.x && point.x <= max.x && point.y >= self.origin.y && point.y <= max.y
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Display name of the enemy.
    pub name: String,
    /// World position of the enemy's anchor corner.
    pub position: Vec2,
    /// Sprite rotation in degrees.
    pub facing_degrees: f32,
    /// Hit box used for overlap tests.
    pub bounding_box: BoundingBox,
    /// Remaining health.
    pub health: i32,
    /// Whether the enemy died or escaped.
    pub is_dead: bool,
    /// Whether the enemy walked past the final waypoint.
    pub reached_end: bool,
    /// Total distance covered since spawning.
    pub distance_traveled: f32,
}

/// Read-only snapshot describing all enemies on the path.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in spawn order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Display name of the tower.
    pub name: String,
    /// World position of the tower.
    pub position: Vec2,
    /// Accumulated value of the tower, including upgrades.
    pub cost: u32,
    /// Number of enemies the tower has killed.
    pub kill_count: u32,
}

/// Read-only snapshot describing all towers placed in the world.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in creation order.
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Reasons damage could not be applied to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum CombatError {
    /// Damage must be a positive amount.
    #[error("damage must be positive")]
    NonPositiveDamage,
    /// Slow factors must lie in `(0, 1]`.
    #[error("slow factor {0} is outside (0, 1]")]
    InvalidSlowFactor(f32),
}

/// Reasons an enemy template may be rejected at spawn time.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum SpawnError {
    /// Enemies must start alive.
    #[error("starting health {0} is not positive")]
    NonPositiveHealth(i32),
    /// Speeds must be finite and non-negative.
    #[error("speed {0} is negative or not finite")]
    InvalidSpeed(f32),
}

/// Reasons an upgrade request may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum UpgradeError {
    /// Levels start at one.
    #[error("upgrade level must be positive")]
    InvalidLevel,
    /// Levels must strictly increase between successive upgrades.
    #[error("upgrade level {requested} does not exceed applied level {applied}")]
    NonIncreasingLevel {
        /// Level named in the request.
        requested: u32,
        /// Highest level applied so far.
        applied: u32,
    },
    /// The strategy has no table entry for the requested level.
    #[error("upgrade level {0} is not defined")]
    UnknownLevel(u32),
    /// The tower has no strategy in the requested slot.
    #[error("tower has no {0:?} upgrade strategy")]
    MissingStrategy(UpgradeSlot),
    /// No tower with the provided identifier exists.
    #[error("tower {0:?} does not exist")]
    MissingTower(TowerId),
    /// The ledger could not cover the upgrade price.
    #[error(transparent)]
    Funds(#[from] LedgerError),
}

/// Reasons a tower purchase may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum PurchaseError {
    /// The ledger could not cover the tower cost.
    #[error(transparent)]
    Funds(#[from] LedgerError),
    /// The tower position contains a non-finite coordinate.
    #[error("tower position is not finite")]
    InvalidPosition,
}
