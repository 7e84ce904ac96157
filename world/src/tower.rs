//! Stationary towers and the registry that stores them.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use tower_defence_core::{CurrencyLedger, TowerId, TowerSnapshot, UpgradeError, UpgradeSlot};

use crate::{
    enemy::Enemy,
    strategy::{
        AttackContext, AttackReport, AttackStrategy, UpgradeReceipt, UpgradeStrategy,
        UpgradeTarget,
    },
};

/// Tower assembled from an attack strategy and optional upgrade strategies.
///
/// The tower holds no combat or upgrade logic of its own; it forwards to the
/// strategies it owns and keeps the bookkeeping shared by every tower type.
#[derive(Debug)]
pub struct Tower {
    name: String,
    position: Vec2,
    cost: u32,
    kill_count: u32,
    attack: Box<dyn AttackStrategy>,
    primary: Option<Box<dyn UpgradeStrategy>>,
    secondary: Option<Box<dyn UpgradeStrategy>>,
}

impl Tower {
    /// Creates a tower without upgrade strategies.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        position: Vec2,
        cost: u32,
        attack: Box<dyn AttackStrategy>,
    ) -> Self {
        Self {
            name: name.into(),
            position,
            cost,
            kill_count: 0,
            attack,
            primary: None,
            secondary: None,
        }
    }

    /// Installs the strategy used by [`Tower::upgrade_primary`].
    #[must_use]
    pub fn with_primary_upgrade(mut self, strategy: Box<dyn UpgradeStrategy>) -> Self {
        self.primary = Some(strategy);
        self
    }

    /// Installs the strategy used by [`Tower::upgrade_secondary`].
    #[must_use]
    pub fn with_secondary_upgrade(mut self, strategy: Box<dyn UpgradeStrategy>) -> Self {
        self.secondary = Some(strategy);
        self
    }

    /// Runs one attack pass and counts the kills it produced.
    pub fn attack_targets(
        &mut self,
        id: TowerId,
        dt: Duration,
        enemies: &mut [Enemy],
        ledger: &mut CurrencyLedger,
    ) -> AttackReport {
        let ctx = AttackContext {
            tower: id,
            position: self.position,
            dt,
        };
        let report = self.attack.attack_targets(&ctx, enemies, ledger);
        let kills = u32::try_from(report.kills.len()).unwrap_or(u32::MAX);
        self.kill_count = self.kill_count.saturating_add(kills);
        report
    }

    /// Applies `level` of the first upgrade strategy.
    pub fn upgrade_primary(&mut self, level: u32) -> Result<UpgradeReceipt, UpgradeError> {
        self.upgrade(UpgradeSlot::Primary, level)
    }

    /// Applies `level` of the second upgrade strategy.
    pub fn upgrade_secondary(&mut self, level: u32) -> Result<UpgradeReceipt, UpgradeError> {
        self.upgrade(UpgradeSlot::Secondary, level)
    }

    /// Applies `level` of the strategy installed in `slot`.
    pub fn upgrade(
        &mut self,
        slot: UpgradeSlot,
        level: u32,
    ) -> Result<UpgradeReceipt, UpgradeError> {
        let Self {
            cost,
            attack,
            primary,
            secondary,
            ..
        } = self;
        let strategy = match slot {
            UpgradeSlot::Primary => primary,
            UpgradeSlot::Secondary => secondary,
        }
        .as_mut()
        .ok_or(UpgradeError::MissingStrategy(slot))?;

        strategy.upgrade(
            UpgradeTarget {
                cost,
                attack: attack.as_mut(),
            },
            level,
        )
    }

    /// Price of `level` in `slot` without applying it.
    pub fn quote_upgrade(&self, slot: UpgradeSlot, level: u32) -> Result<u32, UpgradeError> {
        let strategy = match slot {
            UpgradeSlot::Primary => &self.primary,
            UpgradeSlot::Secondary => &self.secondary,
        }
        .as_ref()
        .ok_or(UpgradeError::MissingStrategy(slot))?;
        strategy.quote(self.cost, level)
    }

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// World position the tower measures range from.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Accumulated value of the tower, including upgrades.
    #[must_use]
    pub const fn cost(&self) -> u32 {
        self.cost
    }

    /// Number of enemies the tower has killed.
    #[must_use]
    pub const fn kill_count(&self) -> u32 {
        self.kill_count
    }

    /// Attack strategy the tower fires with.
    #[must_use]
    pub fn attack(&self) -> &dyn AttackStrategy {
        self.attack.as_ref()
    }

    /// Amount credited back when the tower is sold.
    #[must_use]
    pub const fn sale_value(&self) -> u32 {
        self.cost / 2
    }

    fn snapshot(&self, id: TowerId) -> TowerSnapshot {
        TowerSnapshot {
            id,
            name: self.name.clone(),
            position: self.position,
            cost: self.cost,
            kill_count: self.kill_count,
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
///
/// Iteration follows identifier order, which is creation order.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, Tower>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Stores `tower` under a freshly allocated identifier.
    pub(crate) fn insert(&mut self, tower: Tower) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(id, tower);
        id
    }

    pub(crate) fn remove(&mut self, id: TowerId) -> Option<Tower> {
        self.entries.remove(&id)
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&Tower> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (TowerId, &mut Tower)> {
        self.entries.iter_mut().map(|(id, tower)| (*id, tower))
    }

    pub(crate) fn snapshots(&self) -> Vec<TowerSnapshot> {
        self.entries
            .iter()
            .map(|(id, tower)| tower.snapshot(*id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::{AttackKind, AttackProfile};

    #[derive(Debug)]
    struct Inert {
        profile: AttackProfile,
    }

    impl AttackStrategy for Inert {
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
            _ctx: &AttackContext,
            _enemies: &mut [Enemy],
            _ledger: &mut CurrencyLedger,
        ) -> AttackReport {
            AttackReport::default()
        }
    }

    #[derive(Debug, Default)]
    struct Doubling {
        applied: u32,
    }

    impl UpgradeStrategy for Doubling {
        fn applied_level(&self) -> u32 {
            self.applied
        }

        fn quote(&self, current_cost: u32, level: u32) -> Result<u32, UpgradeError> {
            if level <= self.applied {
                return Err(UpgradeError::NonIncreasingLevel {
                    requested: level,
                    applied: self.applied,
                });
            }
            Ok(current_cost)
        }

        fn upgrade(
            &mut self,
            target: UpgradeTarget<'_>,
            level: u32,
        ) -> Result<UpgradeReceipt, UpgradeError> {
            let price = self.quote(*target.cost, level)?;
            *target.cost += price;
            target.attack.profile_mut().damage *= 2;
            self.applied = level;
            Ok(UpgradeReceipt {
                level,
                price,
                cost: *target.cost,
            })
        }
    }

    fn tower() -> Tower {
        let attack = Inert {
            profile: AttackProfile::new(5, 64.0, Duration::from_secs(1)),
        };
        Tower::new("arrow", Vec2::new(10.0, 10.0), 40, Box::new(attack))
    }

    #[test]
    fn upgrade_mutates_the_tower_it_belongs_to() {
        let mut tower = tower().with_primary_upgrade(Box::<Doubling>::default());

        let receipt = tower.upgrade_primary(1).expect("upgrade applies");

        assert_eq!(receipt.price, 40);
        assert_eq!(tower.cost(), 80);
        assert_eq!(tower.attack().profile().damage, 10);
    }

    #[test]
    fn empty_slot_is_reported() {
        let mut tower = tower();
        assert_eq!(
            tower.upgrade_secondary(1),
            Err(UpgradeError::MissingStrategy(UpgradeSlot::Secondary))
        );
        assert_eq!(
            tower.quote_upgrade(UpgradeSlot::Primary, 1),
            Err(UpgradeError::MissingStrategy(UpgradeSlot::Primary))
        );
    }

    #[test]
    fn slots_are_independent() {
        let mut tower = tower()
            .with_primary_upgrade(Box::<Doubling>::default())
            .with_secondary_upgrade(Box::<Doubling>::default());

        let _ = tower.upgrade_primary(1).expect("primary applies");
        let _ = tower.upgrade_secondary(1).expect("secondary applies");

        assert_eq!(tower.cost(), 160);
        assert_eq!(tower.attack().profile().damage, 20);
    }

    #[test]
    fn registry_allocates_identifiers_in_creation_order() {
        let mut registry = TowerRegistry::new();
        let first = registry.insert(tower());
        let second = registry.insert(tower());
        let _ = registry.remove(first);
        let third = registry.insert(tower());

        assert_eq!(first, TowerId::new(0));
        assert_eq!(second, TowerId::new(1));
        assert_eq!(third, TowerId::new(2));
        let ids: Vec<_> = registry.iter_mut().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![second, third]);
        assert!(registry.get(first).is_none());
    }

    #[test]
    fn sale_value_is_half_the_cost() {
        assert_eq!(tower().sale_value(), 20);
    }
}
