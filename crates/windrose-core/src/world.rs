use std::collections::BTreeMap;

use thiserror::Error;
use windrose_protocol::{
    CityId, CivData, CivId, Coord, ImprovementKind, KnowledgeBranch, MovementClass, UnitId,
    UnitKind, Yield,
};

use crate::improvement::{ErrandOption, WorkErrand};
use crate::map::TRADE_ROUTE_RANGE;
use crate::{City, Civilization, EntityStore, Map, Registry, Unit};

/// Radius every unit re-lights at turn start, independent of its vision
/// stat (movement and placement use the stat itself).
pub const TURN_VISION_RADIUS: i32 = 3;

/// A rejected player action. The session logs these and drops the action;
/// nothing was mutated, because every handler gates before touching state.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("tile is outside the map")]
    UnknownTile,
    #[error("unknown civ")]
    UnknownCiv,
    #[error("tile cannot host a settlement")]
    NotSettleable,
    #[error("tile cannot host an improvement")]
    NotBuildable,
    #[error("tile does not belong to the acting civ")]
    NotTileOwner,
    #[error("no improvement on this tile")]
    NoImprovement,
    #[error("improvement kind cannot be constructed")]
    NotConstructible,
    #[error("an errand is already in progress here")]
    ErrandInProgress,
    #[error("unknown unit")]
    UnknownUnit,
    #[error("unit does not belong to the acting civ")]
    NotYourUnit,
    #[error("unit has not been placed")]
    UnitNotPlaced,
    #[error("destination tile is occupied")]
    TileOccupied,
    #[error("destination is out of range")]
    OutOfRange,
    #[error("terrain is impassable for this unit")]
    Impassable,
}

/// The authoritative simulation: map, civs, entity arenas and the turn
/// sequence. All mutation happens on one logical thread; handlers validate
/// in full, then mutate, pushing tile change notices as they go.
#[derive(Clone, Debug)]
pub struct World {
    pub registry: Registry,
    pub map: Map,
    pub civs: Vec<Civilization>,
    pub units: EntityStore<Unit>,
    pub cities: EntityStore<City>,
    pub turn: u32,
}

impl World {
    pub fn new(map: Map, registry: Registry) -> Self {
        let civs = (0..map.civ_count())
            .map(|i| Civilization::new(CivId(i as u8)))
            .collect();
        Self {
            registry,
            map,
            civs,
            units: EntityStore::default(),
            cities: EntityStore::default(),
            turn: 0,
        }
    }

    pub fn civ(&self, civ: CivId) -> Result<&Civilization, ActionError> {
        self.civs.get(civ.index()).ok_or(ActionError::UnknownCiv)
    }

    /// Public civ facts for the `civData` broadcast.
    pub fn civ_catalog(&self) -> BTreeMap<CivId, CivData> {
        self.civs
            .iter()
            .map(|civ| {
                (
                    civ.id,
                    CivData {
                        id: civ.id,
                        color: civ.color.clone(),
                    },
                )
            })
            .collect()
    }

    /// Current positions of a civ's placed units, roster order.
    pub fn unit_positions(&self, civ: CivId) -> Vec<Coord> {
        let Ok(civilization) = self.civ(civ) else {
            return Vec::new();
        };
        civilization
            .units
            .iter()
            .filter_map(|&id| self.units.get(id))
            .filter_map(|unit| unit.coords)
            .collect()
    }

    fn tile_owner_civ(&self, at: Coord) -> Option<CivId> {
        let tile = self.map.get(at)?;
        let city = self.cities.get(tile.owner?)?;
        Some(city.owner)
    }

    fn require_owned_by(&self, civ: CivId, at: Coord) -> Result<(), ActionError> {
        if self.map.get(at).is_none() {
            return Err(ActionError::UnknownTile);
        }
        if self.tile_owner_civ(at) != Some(civ) {
            return Err(ActionError::NotTileOwner);
        }
        Ok(())
    }

    /// Found a city at `at`: claims the center and its settleable ring,
    /// and raises the settlement improvement on the center tile.
    pub fn settle_city(
        &mut self,
        civ: CivId,
        at: Coord,
        name: String,
    ) -> Result<CityId, ActionError> {
        self.civ(civ)?;
        let center = self.map.normalize(at).ok_or(ActionError::UnknownTile)?;
        if !self.map.can_settle_on(center) {
            return Err(ActionError::NotSettleable);
        }

        let city_id = self.cities.insert(City::new(name, civ, center));

        let mut claimed = Vec::new();
        if self.map.set_tile_owner(center, city_id, false) {
            claimed.push(center);
        }
        let ring: Vec<Coord> = self.map.neighbors(center).collect();
        for neighbor in ring {
            if self.map.can_settle_on(neighbor) && self.map.set_tile_owner(neighbor, city_id, false)
            {
                claimed.push(neighbor);
            }
        }
        if let Some(city) = self.cities.get_mut(city_id) {
            for c in &claimed {
                if let Some(index) = self.map.index_of(*c) {
                    city.claim_index(index);
                }
            }
        }

        self.map
            .build_improvement_at(center, ImprovementKind::Settlement, &self.registry);
        Ok(city_id)
    }

    /// Place an improvement directly, replacing any prior one.
    pub fn build_improvement(
        &mut self,
        civ: CivId,
        at: Coord,
        kind: ImprovementKind,
    ) -> Result<(), ActionError> {
        self.civ(civ)?;
        self.require_owned_by(civ, at)?;
        if !self.map.can_build_on(at) {
            return Err(ActionError::NotBuildable);
        }
        self.map.build_improvement_at(at, kind, &self.registry);
        Ok(())
    }

    /// Raise a worksite whose errand will become `target`, and route
    /// traders from nearby owned improvements to fund it.
    pub fn start_construction(
        &mut self,
        civ: CivId,
        at: Coord,
        target: ImprovementKind,
    ) -> Result<(), ActionError> {
        self.civ(civ)?;
        self.require_owned_by(civ, at)?;
        if !self.map.can_build_on(at) {
            return Err(ActionError::NotBuildable);
        }
        let cost = self
            .registry
            .improvement(target)
            .build_cost
            .ok_or(ActionError::NotConstructible)?;
        if self
            .map
            .get(at)
            .and_then(|tile| tile.improvement.as_ref())
            .and_then(|imp| imp.errand.as_ref())
            .is_some()
        {
            return Err(ActionError::ErrandInProgress);
        }

        if let Some(worksite) =
            self.map
                .build_improvement_at(at, ImprovementKind::Worksite, &self.registry)
        {
            worksite.start_errand(WorkErrand::new(ErrandOption::Construction(target), cost, None));
        }
        self.map.create_trade_routes(
            civ,
            at,
            cost,
            TRADE_ROUTE_RANGE,
            MovementClass::Land,
            &self.registry,
            &self.cities,
        );
        Ok(())
    }

    /// Queue unit training at an existing improvement.
    pub fn train_unit(&mut self, civ: CivId, at: Coord, kind: UnitKind) -> Result<(), ActionError> {
        self.civ(civ)?;
        self.require_owned_by(civ, at)?;
        let cost = self.registry.unit(kind).train_cost;
        self.start_errand_at(civ, at, ErrandOption::UnitTraining(kind), cost)
    }

    /// Queue research at an existing improvement; completion credits the
    /// branch's points to the hosting tile.
    pub fn start_research(
        &mut self,
        civ: CivId,
        at: Coord,
        branch: KnowledgeBranch,
    ) -> Result<(), ActionError> {
        self.civ(civ)?;
        self.require_owned_by(civ, at)?;
        let cost = self.registry.knowledge(branch).research_cost;
        self.start_errand_at(civ, at, ErrandOption::Research(branch), cost)
    }

    fn start_errand_at(
        &mut self,
        civ: CivId,
        at: Coord,
        option: ErrandOption,
        cost: Yield,
    ) -> Result<(), ActionError> {
        {
            let improvement = self
                .map
                .get_mut(at)
                .ok_or(ActionError::UnknownTile)?
                .improvement
                .as_mut()
                .ok_or(ActionError::NoImprovement)?;
            if !improvement.start_errand(WorkErrand::new(option, cost, None)) {
                return Err(ActionError::ErrandInProgress);
            }
        }
        self.map.tile_update(at);
        self.map.create_trade_routes(
            civ,
            at,
            cost,
            TRADE_ROUTE_RANGE,
            MovementClass::Land,
            &self.registry,
            &self.cities,
        );
        Ok(())
    }

    /// Create a unit and place it, lighting its surroundings for its owner.
    pub fn spawn_unit(&mut self, civ: CivId, kind: UnitKind, at: Coord) -> Result<UnitId, ActionError> {
        self.civ(civ)?;
        let at = self.map.normalize(at).ok_or(ActionError::UnknownTile)?;
        let index = self.map.index_of(at).ok_or(ActionError::UnknownTile)?;
        let tile = self.map.tile(index).ok_or(ActionError::UnknownTile)?;
        if tile.unit.is_some() {
            return Err(ActionError::TileOccupied);
        }
        let mode = self.registry.unit(kind).movement;
        if self.registry.movement_cost(tile.terrain, mode).is_none() {
            return Err(ActionError::Impassable);
        }

        let mut unit = Unit::new(kind, civ, &self.registry);
        unit.coords = Some(at);
        let id = self.units.insert(unit);
        self.civs[civ.index()].units.push(id);
        if let Some(tile) = self.map.tile_mut(index) {
            tile.unit = Some(id);
        }
        self.map.tile_update(at);

        let lit = self.map.unit_visible_coords(
            self.units.get(id).ok_or(ActionError::UnknownUnit)?,
            &self.registry,
            false,
        );
        self.map.light(civ, &lit, true);
        Ok(id)
    }

    /// Move a unit along the cheapest path to `to`, spending movement and
    /// relocating its vision cone (light off at the old position, light on
    /// at the new).
    pub fn move_unit(&mut self, civ: CivId, unit_id: UnitId, to: Coord) -> Result<(), ActionError> {
        self.civ(civ)?;
        let unit = self.units.get(unit_id).ok_or(ActionError::UnknownUnit)?;
        if unit.owner != civ {
            return Err(ActionError::NotYourUnit);
        }
        let from = unit.coords.ok_or(ActionError::UnitNotPlaced)?;
        let to = self.map.normalize(to).ok_or(ActionError::UnknownTile)?;
        if to == from {
            return Ok(());
        }
        let to_index = self.map.index_of(to).ok_or(ActionError::UnknownTile)?;
        if self
            .map
            .tile(to_index)
            .ok_or(ActionError::UnknownTile)?
            .unit
            .is_some()
        {
            return Err(ActionError::TileOccupied);
        }
        let mode = unit.movement_class(&self.registry);
        let tree = self
            .map
            .path_tree(from, unit.moves_left, mode, &self.registry);
        let cost = *tree.dist.get(&to_index).ok_or(ActionError::OutOfRange)?;

        // All gates passed; mutate.
        let darkened = self.map.unit_visible_coords(unit, &self.registry, false);
        self.map.light(civ, &darkened, false);

        let from_index = self.map.index_of(from).ok_or(ActionError::UnknownTile)?;
        if let Some(tile) = self.map.tile_mut(from_index) {
            tile.unit = None;
        }
        self.map.tile_update(from);

        if let Some(unit) = self.units.get_mut(unit_id) {
            unit.coords = Some(to);
            unit.moves_left -= cost;
        }
        if let Some(tile) = self.map.tile_mut(to_index) {
            tile.unit = Some(unit_id);
        }
        self.map.tile_update(to);

        let lit = self.map.unit_visible_coords(
            self.units.get(unit_id).ok_or(ActionError::UnknownUnit)?,
            &self.registry,
            false,
        );
        self.map.light(civ, &lit, true);
        Ok(())
    }

    /// Turn start for one civ: refresh unit movement and rebuild its
    /// visibility refcounts from scratch.
    pub fn begin_turn(&mut self, civ: CivId) -> Result<(), ActionError> {
        self.civ(civ)?;
        let roster = self.civs[civ.index()].units.clone();
        for id in &roster {
            if let Some(unit) = self.units.get_mut(*id) {
                unit.refresh(&self.registry);
            }
        }
        let sources: Vec<Coord> = roster
            .iter()
            .filter_map(|&id| self.units.get(id))
            .filter_map(|unit| unit.coords)
            .collect();
        self.map
            .rebuild_civ_visibility(civ, &sources, TURN_VISION_RADIUS, &self.registry);
        Ok(())
    }

    /// The global end-of-turn tick: every improvement works (completed
    /// errands resolve immediately), knowledge spills, traders advance and
    /// the expired ones are reaped.
    pub fn run_turn(&mut self) {
        for index in 0..self.map.len() {
            if let Some(errand) = self.map.work_tile(index, &self.registry) {
                self.apply_completed_errand(index, errand);
            }
        }
        self.map.spill_knowledge(&self.registry);
        self.map.advance_traders();
        self.map.reap_traders();
        self.turn += 1;
    }

    fn apply_completed_errand(&mut self, index: usize, errand: WorkErrand) {
        let Some(at) = self.map.coord_at(index) else {
            return;
        };
        match errand.option {
            ErrandOption::Construction(kind) => {
                self.map.build_improvement_at(at, kind, &self.registry);
            }
            ErrandOption::UnitTraining(kind) => {
                let spawn_at = errand.location.unwrap_or(at);
                if let Some(owner) = self.tile_owner_civ(at) {
                    // Placement can fail (occupied slot); the errand's output
                    // is forfeit in that case rather than poisoning the turn.
                    let _ = self.spawn_unit(owner, kind, spawn_at);
                }
            }
            ErrandOption::Research(branch) => {
                let spec = *self.registry.knowledge(branch);
                if let Some(tile) = self.map.tile_mut(index) {
                    tile.knowledge
                        .add(branch, spec.completion_points, 0.0, spec.max_points);
                }
                self.map.tile_update(at);
            }
        }
    }
}
