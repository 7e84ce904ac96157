//! Headless session driver that replays a scenario against the world.

use std::{collections::VecDeque, fmt, time::Duration};

use anyhow::Result;
use tower_defence_core::{Command, Event, TowerId, TowerSnapshot};
use tower_defence_world::{self as world, query, World};
use tracing::{debug, info, warn};

use crate::scenario::{Order, Scenario};

/// Tick count and step length for a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RunOptions {
    pub(crate) ticks: u64,
    pub(crate) dt: Duration,
}

/// Totals gathered from the event stream of a finished run.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct RunSummary {
    pub(crate) ticks: u64,
    pub(crate) spawned: u32,
    pub(crate) killed: u32,
    pub(crate) escaped: u32,
    pub(crate) rewards: u32,
    pub(crate) rejected: u32,
    pub(crate) still_alive: usize,
    pub(crate) balance: u32,
    pub(crate) towers: Vec<TowerSnapshot>,
}

impl RunSummary {
    fn record(&mut self, event: &Event) {
        match event {
            Event::EnemySpawned { .. } => self.spawned = self.spawned.saturating_add(1),
            Event::EnemyKilled { reward, .. } => {
                self.killed = self.killed.saturating_add(1);
                self.rewards = self.rewards.saturating_add(*reward);
            }
            Event::EnemyEscaped { .. } => self.escaped = self.escaped.saturating_add(1),
            Event::EnemySpawnRejected { .. }
            | Event::TowerPlacementRejected { .. }
            | Event::TowerUpgradeRejected { .. }
            | Event::TowerSaleRejected { .. } => {
                self.rejected = self.rejected.saturating_add(1);
            }
            Event::TimeAdvanced { .. }
            | Event::EnemyRemoved { .. }
            | Event::TowerPlaced { .. }
            | Event::TowerUpgraded { .. }
            | Event::TowerSold { .. } => {}
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ticks: {}", self.ticks)?;
        writeln!(
            f,
            "enemies: {} spawned, {} killed, {} escaped, {} still on the path",
            self.spawned, self.killed, self.escaped, self.still_alive
        )?;
        writeln!(f, "rewards: {}", self.rewards)?;
        writeln!(f, "rejected commands: {}", self.rejected)?;
        writeln!(f, "balance: {}", self.balance)?;
        for tower in &self.towers {
            writeln!(
                f,
                "tower {} {}: cost {}, kills {}",
                tower.id.get(),
                tower.name,
                tower.cost,
                tower.kill_count
            )?;
        }
        Ok(())
    }
}

/// Builds the scenario's world, places its towers and runs it for
/// `options.ticks` ticks. Spawns and orders due on a tick are applied before
/// that tick advances the simulation.
pub(crate) fn run(scenario: &Scenario, options: RunOptions) -> Result<RunSummary> {
    let mut world = World::new(scenario.path()?, scenario.world_config());
    let mut summary = RunSummary::default();
    let mut events = Vec::new();

    let placed: Vec<Option<TowerId>> = scenario
        .towers()?
        .into_iter()
        .map(|tower| world::place_tower(&mut world, tower, &mut events).ok())
        .collect();
    for event in events.drain(..) {
        summary.record(&event);
    }

    let mut spawns: VecDeque<_> = scenario.spawn_schedule().into();
    let mut orders: VecDeque<_> = scenario.orders().into();
    info!(
        ticks = options.ticks,
        dt = ?options.dt,
        path_length = query::path(&world).total_length(),
        towers = placed.iter().flatten().count(),
        spawns = spawns.len(),
        "scenario started"
    );

    for tick in 0..options.ticks {
        for (_, template) in take_due(&mut spawns, tick, |(due, _)| *due) {
            world::apply(&mut world, Command::SpawnEnemy { template }, &mut events);
        }
        for order in take_due(&mut orders, tick, Order::tick) {
            dispatch(&mut world, &placed, order, &mut events);
        }
        world::apply(&mut world, Command::Tick { dt: options.dt }, &mut events);

        for event in events.drain(..) {
            summary.record(&event);
        }
    }

    summary.ticks = query::tick_index(&world);
    summary.still_alive = query::enemies(&world).len();
    summary.balance = query::balance(&world);
    summary.towers = query::tower_view(&world).into_vec();
    info!(
        killed = summary.killed,
        escaped = summary.escaped,
        balance = summary.balance,
        "scenario finished"
    );
    Ok(summary)
}

fn dispatch(world: &mut World, placed: &[Option<TowerId>], order: Order, out: &mut Vec<Event>) {
    let Some(tower) = placed.get(order.tower()).copied().flatten() else {
        warn!(
            tick = order.tick(),
            tower = order.tower(),
            "order skipped: tower was never placed"
        );
        return;
    };

    let command = match order {
        Order::Upgrade { slot, level, .. } => Command::UpgradeTower { tower, slot, level },
        Order::Sell { .. } => Command::SellTower { tower },
    };
    debug!(tick = order.tick(), ?command, "dispatching order");
    world::apply(world, command, out);
}

/// Removes the leading entries of `queue` that are due at or before `tick`.
fn take_due<T>(queue: &mut VecDeque<T>, tick: u64, due: impl Fn(&T) -> u64) -> Vec<T> {
    let ready = queue.iter().take_while(|item| due(item) <= tick).count();
    queue.drain(..ready).collect()
}
