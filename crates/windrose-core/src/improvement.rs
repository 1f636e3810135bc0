use serde::{Deserialize, Serialize};
use windrose_protocol::{Coord, ErrandKind, ImprovementKind, KnowledgeBranch, TraderId, UnitKind, Yield};

use crate::{EntityStore, Registry, ResourceStore, Trader};

/// What an errand is producing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum ErrandOption {
    Construction(ImprovementKind),
    UnitTraining(UnitKind),
    Research(KnowledgeBranch),
}

impl ErrandOption {
    pub fn kind(self) -> ErrandKind {
        match self {
            ErrandOption::Construction(_) => ErrandKind::Construction,
            ErrandOption::UnitTraining(_) => ErrandKind::UnitTraining,
            ErrandOption::Research(_) => ErrandKind::Research,
        }
    }
}

/// Work in progress at an improvement.
///
/// The errand shares its host improvement's resource store; the store's
/// capacity is raised to the errand cost while the errand is live and
/// restored to the improvement's default on completion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorkErrand {
    pub option: ErrandOption,
    pub cost: Yield,
    pub stored_this_turn: Yield,
    pub completed: bool,
    pub location: Option<Coord>,
}

impl WorkErrand {
    pub fn new(option: ErrandOption, cost: Yield, location: Option<Coord>) -> Self {
        Self {
            option,
            cost,
            stored_this_turn: Yield::zero(),
            completed: false,
            location,
        }
    }

    pub fn kind(&self) -> ErrandKind {
        self.option.kind()
    }
}

/// A structure occupying a tile: yields resources each turn, stores them,
/// and can host one errand at a time.
///
/// `consumers` are traders drawing from this improvement's store;
/// `suppliers` are traders delivering into it. Both hold handles into the
/// map's trader arena, never references.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Improvement {
    pub kind: ImprovementKind,
    pub pillaged: bool,
    /// The hosting tile's baseline, folded in at construction and preserved
    /// when an errand replaces this improvement with another.
    pub base_yield: Yield,
    pub store: ResourceStore,
    pub errand: Option<WorkErrand>,
    pub consumers: Vec<TraderId>,
    pub suppliers: Vec<TraderId>,
}

impl Improvement {
    pub fn new(kind: ImprovementKind, base_yield: Yield, registry: &Registry) -> Self {
        Self {
            kind,
            pillaged: false,
            base_yield,
            store: ResourceStore::new(registry.improvement(kind).store_capacity),
            errand: None,
            consumers: Vec::new(),
            suppliers: Vec::new(),
        }
    }

    pub fn is_natural(&self, registry: &Registry) -> bool {
        registry.improvement(self.kind).natural
    }

    /// Per-turn output. Natural improvements contribute only the tile's
    /// baseline; pillaged ones contribute nothing.
    pub fn yields(&self, registry: &Registry) -> Yield {
        if self.pillaged {
            return Yield::zero();
        }
        let spec = registry.improvement(self.kind);
        if spec.natural {
            self.base_yield
        } else {
            self.base_yield + spec.yields
        }
    }

    /// Begin an errand. Refused while another errand is live; preemption is
    /// deliberately not supported.
    pub fn start_errand(&mut self, errand: WorkErrand) -> bool {
        if self.errand.is_some() {
            return false;
        }
        self.store.raise_capacity_to(errand.cost);
        self.errand = Some(errand);
        true
    }

    /// Whether this improvement can feed a trade route for `requirement`.
    pub fn can_supply(&self, requirement: &Yield) -> bool {
        !self.pillaged && self.errand.is_none() && self.store.fulfills(requirement)
    }

    /// One turn of economic work:
    /// 1. a fully-funded errand is marked complete, its suppliers expire,
    ///    and the cost leaves the store (capacity reverts to the default);
    /// 2. the errand's per-turn intake counter resets;
    /// 3. consumers each load their share of the store;
    /// 4. the improvement's own yield lands in the store;
    /// 5. the store is clamped to capacity.
    ///
    /// The completed errand stays attached; the map turn takes it and runs
    /// its completion effect.
    pub fn work(&mut self, registry: &Registry, traders: &mut EntityStore<Trader>) {
        if let Some(errand) = self.errand.as_mut() {
            if !errand.completed && self.store.fulfills(&errand.cost) {
                errand.completed = true;
                for id in self.suppliers.drain(..) {
                    if let Some(trader) = traders.get_mut(id) {
                        trader.expired = true;
                    }
                }
                self.store.decr(errand.cost);
                self.store
                    .set_capacity(registry.improvement(self.kind).store_capacity);
            }
            errand.stored_this_turn = Yield::zero();
        }

        let live: Vec<TraderId> = self
            .consumers
            .iter()
            .copied()
            .filter(|&id| traders.get(id).is_some_and(|t| !t.expired))
            .collect();
        let mut remaining = live.len() as i32;
        for id in &live {
            let Some(trader) = traders.get_mut(*id) else {
                remaining -= 1;
                continue;
            };
            let share = self.store.value().div_floor(remaining);
            let surplus = trader.store(share);
            self.store.decr(share.saturating_sub(surplus));
            remaining -= 1;
        }
        self.consumers
            .retain(|&id| traders.get(id).is_some_and(|t| !t.expired));

        let gain = self.yields(registry);
        self.store.incr(gain);
        if let Some(errand) = self.errand.as_mut() {
            errand.stored_this_turn += gain;
        }

        self.store.cap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use windrose_protocol::CivId;

    use crate::trader::{Route, TRADER_CAPACITY};
    use windrose_protocol::Coord;

    fn registry() -> Registry {
        Registry::standard()
    }

    fn worksite(base: Yield, registry: &Registry) -> Improvement {
        Improvement::new(ImprovementKind::Worksite, base, registry)
    }

    #[test]
    fn errand_completes_once_store_covers_cost() {
        let registry = registry();
        let mut traders = EntityStore::default();
        let mut site = worksite(Yield::food(2), &registry);
        assert!(site.start_errand(WorkErrand::new(
            ErrandOption::Construction(ImprovementKind::Farm),
            Yield::food(5),
            None,
        )));
        // Capacity was raised to fit the cost.
        assert!(site.store.capacity().fulfills(&Yield::food(5)));

        site.work(&registry, &mut traders); // store 2
        site.work(&registry, &mut traders); // store 4
        assert!(!site.errand.as_ref().unwrap().completed);
        site.work(&registry, &mut traders); // store 6
        site.work(&registry, &mut traders); // 6 >= 5: completed, cost subtracted
        let errand = site.errand.as_ref().unwrap();
        assert!(errand.completed);
        assert!(site.store.value().food >= 0);
        // Capacity restored to the worksite default.
        assert_eq!(
            site.store.capacity(),
            registry.improvement(ImprovementKind::Worksite).store_capacity
        );
    }

    #[test]
    fn second_errand_is_refused_while_one_is_live() {
        let registry = registry();
        let mut site = worksite(Yield::zero(), &registry);
        assert!(site.start_errand(WorkErrand::new(
            ErrandOption::Research(KnowledgeBranch::Masonry),
            Yield::science(6),
            None,
        )));
        assert!(!site.start_errand(WorkErrand::new(
            ErrandOption::UnitTraining(UnitKind::Scout),
            Yield::production(5),
            None,
        )));
    }

    #[test]
    fn consumers_split_the_store_and_surplus_stays() {
        let registry = registry();
        let mut traders = EntityStore::default();
        let route = Route {
            path: vec![Coord::new(0, 0), Coord::new(1, 0)],
            distance: 1,
        };
        let a = traders.insert(Trader::new(CivId(0), route.clone(), 0, 1, Yield::food(2)));
        let b = traders.insert(Trader::new(CivId(0), route, 0, 1, TRADER_CAPACITY));

        let mut farm = Improvement::new(ImprovementKind::Farm, Yield::food(2), &registry);
        farm.consumers = vec![a, b];
        farm.store.incr(Yield::food(8));

        farm.work(&registry, &mut traders);

        // First trader takes 2 of its 4-share; second takes the rest of its share.
        assert_eq!(traders.get(a).unwrap().carried, Yield::food(2));
        assert_eq!(traders.get(b).unwrap().carried, Yield::food(6));
        // 8 - 2 - 6 = 0 left, plus the farm's own yield (base 2 + farm 3).
        assert_eq!(farm.store.value(), Yield::food(5));
    }

    #[test]
    fn completion_expires_suppliers() {
        let registry = registry();
        let mut traders = EntityStore::default();
        let route = Route {
            path: vec![Coord::new(0, 0), Coord::new(1, 0)],
            distance: 1,
        };
        let supplier = traders.insert(Trader::new(CivId(0), route, 0, 1, TRADER_CAPACITY));

        let mut site = worksite(Yield::zero(), &registry);
        site.suppliers.push(supplier);
        site.start_errand(WorkErrand::new(
            ErrandOption::Construction(ImprovementKind::Farm),
            Yield::food(5),
            None,
        ));
        site.store.incr(Yield::food(5));

        site.work(&registry, &mut traders);

        assert!(site.errand.as_ref().unwrap().completed);
        assert!(site.suppliers.is_empty());
        assert!(traders.get(supplier).unwrap().expired);
    }

    #[test]
    fn pillaged_improvements_neither_yield_nor_supply() {
        let registry = registry();
        let mut farm = Improvement::new(ImprovementKind::Farm, Yield::food(1), &registry);
        farm.store.incr(Yield::food(9));
        farm.pillaged = true;
        assert_eq!(farm.yields(&registry), Yield::zero());
        assert!(!farm.can_supply(&Yield::food(1)));
    }
}
