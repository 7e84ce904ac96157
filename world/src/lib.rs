#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative simulation state for the tower defence core.
//!
//! The world owns the waypoint path, the live enemies in spawn order, the
//! towers in creation order, and the session's currency ledger. Every tick
//! runs in three fixed phases: enemies advance, towers attack, and dead
//! enemies are swept. An enemy killed by one tower is therefore never struck
//! again by a later tower in the same tick.

use std::{sync::Arc, time::Duration};

use tower_defence_core::{
    Command, CurrencyLedger, EnemyId, EnemyTemplate, Event, Path, PurchaseError, TowerId,
    UpgradeError, UpgradeSlot,
};
use tracing::{debug, trace, warn};

pub mod enemy;
pub mod strategy;
pub mod tower;

pub use enemy::{AdvanceOutcome, Enemy, HitOutcome};
pub use strategy::{
    AttackContext, AttackKind, AttackProfile, AttackReport, AttackStrategy, Kill,
    UpgradeReceipt, UpgradeStrategy, UpgradeTarget,
};
pub use tower::Tower;

use tower::TowerRegistry;

/// Starting balance used by [`WorldConfig::default`].
pub const DEFAULT_STARTING_BALANCE: u32 = 200;

/// Session parameters applied when the world is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldConfig {
    starting_balance: u32,
}

impl WorldConfig {
    /// Creates a configuration with the provided starting balance.
    #[must_use]
    pub const fn new(starting_balance: u32) -> Self {
        Self { starting_balance }
    }

    /// Balance the ledger holds when the session starts.
    #[must_use]
    pub const fn starting_balance(&self) -> u32 {
        self.starting_balance
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::new(DEFAULT_STARTING_BALANCE)
    }
}

/// Represents the authoritative simulation state.
#[derive(Debug)]
pub struct World {
    path: Arc<Path>,
    ledger: CurrencyLedger,
    enemies: Vec<Enemy>,
    towers: TowerRegistry,
    next_enemy_id: EnemyId,
    tick_index: u64,
}

impl World {
    /// Creates a world whose enemies walk `path`.
    #[must_use]
    pub fn new(path: Path, config: WorldConfig) -> Self {
        Self {
            path: Arc::new(path),
            ledger: CurrencyLedger::new(config.starting_balance()),
            enemies: Vec::new(),
            towers: TowerRegistry::new(),
            next_enemy_id: EnemyId::new(0),
            tick_index: 0,
        }
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });

        for enemy in &mut self.enemies {
            match enemy.advance(dt) {
                AdvanceOutcome::ReachedEnd => {
                    debug!(enemy = enemy.id().get(), "enemy escaped");
                    out_events.push(Event::EnemyEscaped { enemy: enemy.id() });
                }
                AdvanceOutcome::Moved => trace!(
                    enemy = enemy.id().get(),
                    x = enemy.position().x,
                    y = enemy.position().y,
                    "enemy advanced"
                ),
                AdvanceOutcome::Inactive => {}
            }
        }

        for (id, tower) in self.towers.iter_mut() {
            let report = tower.attack_targets(id, dt, &mut self.enemies, &mut self.ledger);
            for kill in report.kills {
                debug!(
                    tower = id.get(),
                    enemy = kill.enemy.get(),
                    reward = kill.reward,
                    "enemy killed"
                );
                out_events.push(Event::EnemyKilled {
                    enemy: kill.enemy,
                    tower: id,
                    reward: kill.reward,
                });
            }
        }

        self.enemies.retain(|enemy| {
            if enemy.is_dead() {
                out_events.push(Event::EnemyRemoved { enemy: enemy.id() });
                false
            } else {
                true
            }
        });
    }

    fn spawn_enemy(&mut self, template: EnemyTemplate, out_events: &mut Vec<Event>) {
        let id = self.next_enemy_id;
        match Enemy::spawn(id, &template, Arc::clone(&self.path)) {
            Ok(enemy) => {
                self.next_enemy_id = EnemyId::new(id.get().saturating_add(1));
                debug!(enemy = id.get(), name = %template.name, "enemy spawned");
                self.enemies.push(enemy);
                out_events.push(Event::EnemySpawned {
                    enemy: id,
                    name: template.name,
                });
            }
            Err(reason) => {
                warn!(name = %template.name, %reason, "enemy spawn rejected");
                out_events.push(Event::EnemySpawnRejected {
                    name: template.name,
                    reason,
                });
            }
        }
    }

    fn upgrade_tower(
        &mut self,
        id: TowerId,
        slot: UpgradeSlot,
        level: u32,
    ) -> Result<UpgradeReceipt, UpgradeError> {
        let tower = self
            .towers
            .get_mut(id)
            .ok_or(UpgradeError::MissingTower(id))?;
        let price = tower.quote_upgrade(slot, level)?;
        let _ = self.ledger.debit(price)?;

        tower.upgrade(slot, level).map_err(|error| {
            self.ledger.credit(price);
            error
        })
    }

    fn sell_tower(&mut self, id: TowerId, out_events: &mut Vec<Event>) {
        let Some(tower) = self.towers.remove(id) else {
            warn!(tower = id.get(), "sale rejected: unknown tower");
            out_events.push(Event::TowerSaleRejected { tower: id });
            return;
        };

        let refund = tower.sale_value();
        self.ledger.credit(refund);
        debug!(tower = id.get(), refund, "tower sold");
        out_events.push(Event::TowerSold { tower: id, refund });
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => world.tick(dt, out_events),
        Command::SpawnEnemy { template } => world.spawn_enemy(template, out_events),
        Command::UpgradeTower { tower, slot, level } => {
            match world.upgrade_tower(tower, slot, level) {
                Ok(receipt) => {
                    debug!(
                        tower = tower.get(),
                        ?slot,
                        level,
                        price = receipt.price,
                        cost = receipt.cost,
                        "tower upgraded"
                    );
                    out_events.push(Event::TowerUpgraded {
                        tower,
                        slot,
                        level,
                        price: receipt.price,
                    });
                }
                Err(reason) => {
                    warn!(tower = tower.get(), ?slot, level, %reason, "upgrade rejected");
                    out_events.push(Event::TowerUpgradeRejected {
                        tower,
                        slot,
                        reason,
                    });
                }
            }
        }
        Command::SellTower { tower } => world.sell_tower(tower, out_events),
    }
}

/// Purchases `tower`, debiting its cost, and places it after every existing tower.
pub fn place_tower(
    world: &mut World,
    tower: Tower,
    out_events: &mut Vec<Event>,
) -> Result<TowerId, PurchaseError> {
    let result = purchase(world, tower);
    match &result {
        Ok(id) => {
            let cost = world.towers.get(*id).map_or(0, Tower::cost);
            let kind = world.towers.get(*id).map(|tower| tower.attack().kind());
            debug!(tower = id.get(), cost, ?kind, "tower placed");
            out_events.push(Event::TowerPlaced { tower: *id, cost });
        }
        Err(reason) => {
            warn!(%reason, "tower placement rejected");
            out_events.push(Event::TowerPlacementRejected { reason: *reason });
        }
    }
    result
}

fn purchase(world: &mut World, tower: Tower) -> Result<TowerId, PurchaseError> {
    if !tower.position().is_finite() {
        return Err(PurchaseError::InvalidPosition);
    }
    let _ = world.ledger.debit(tower.cost())?;
    Ok(world.towers.insert(tower))
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use tower_defence_core::{EnemyView, Path, TowerId, TowerView};

    use super::{Enemy, Tower, World};

    /// Current ledger balance.
    #[must_use]
    pub fn balance(world: &World) -> u32 {
        world.ledger.balance()
    }

    /// Path enemies walk.
    #[must_use]
    pub fn path(world: &World) -> &Path {
        &world.path
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Live enemies in spawn order.
    #[must_use]
    pub fn enemies(world: &World) -> &[Enemy] {
        &world.enemies
    }

    /// Captures a render-facing view of the live enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(world.enemies.iter().map(Enemy::snapshot).collect())
    }

    /// Captures a view of the placed towers in creation order.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(world.towers.snapshots())
    }

    /// Looks up a placed tower.
    #[must_use]
    pub fn tower(world: &World, id: TowerId) -> Option<&Tower> {
        world.towers.get(id)
    }
}
