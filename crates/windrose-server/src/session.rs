//! The game session: one authoritative world, its seats, and the message
//! flow between them.
//!
//! All mutation runs on the caller's thread, one action at a time; the
//! transport feeds actions in whatever order they arrive and the session
//! serializes them against the single simulation state. Every action is
//! validated in full before any mutation, so a rejected action sends
//! nothing and changes nothing.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, info, warn};
use windrose_core::{generate_terrain, Map, Registry, World};
use windrose_protocol::{wire, Action, CivId, Coord, Event, UnitKind};

use crate::config::ServerConfig;
use crate::seats::{ClientSink, JoinError, SeatTable};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StartError {
    #[error("game already started")]
    AlreadyStarted,
    #[error("need at least {need} civs, have {have}")]
    NotEnoughCivs { have: usize, need: usize },
    #[error("map has no room for {need} starting positions")]
    NoStartPositions { need: usize },
}

/// One running game: seats, world, and round bookkeeping.
pub struct GameSession {
    config: ServerConfig,
    seats: SeatTable,
    world: Option<World>,
    ended_round: HashSet<CivId>,
    pub meta: serde_json::Value,
    has_started: bool,
}

impl GameSession {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            seats: SeatTable::new(),
            world: None,
            ended_round: HashSet::new(),
            meta: serde_json::Value::Null,
            has_started: false,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn has_started(&self) -> bool {
        self.has_started
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn world_mut(&mut self) -> Option<&mut World> {
        self.world.as_mut()
    }

    pub fn seats(&self) -> &SeatTable {
        &self.seats
    }

    pub fn add_human(&mut self, name: String, sink: Box<dyn ClientSink>) -> Result<CivId, JoinError> {
        self.seats.add_human(name, sink, self.config.max_civs)
    }

    pub fn add_ai(&mut self, name: String) -> Result<CivId, JoinError> {
        self.seats.add_ai(name, self.config.max_civs)
    }

    /// Install an imported world. The seat table must already match the
    /// world's civ roster; used by snapshot restore.
    pub(crate) fn restore_world(&mut self, world: World, has_started: bool) {
        self.world = Some(world);
        self.has_started = has_started;
    }

    /// Convert a disconnected player's seat to AI. No in-flight action is
    /// rolled back and the civ keeps being ticked.
    pub fn disconnect(&mut self, civ: CivId) {
        self.seats.disconnect(civ);
        // A vacated seat must not stall the round.
        if self.has_started {
            self.ended_round.insert(civ);
            self.maybe_advance_round();
        }
    }

    /// Generate the world, place starting units, and run the first turn
    /// start for every civ.
    pub fn start(&mut self) -> Result<(), StartError> {
        if self.has_started {
            return Err(StartError::AlreadyStarted);
        }
        let civ_count = self.seats.len();
        if civ_count < self.config.min_civs as usize {
            return Err(StartError::NotEnoughCivs {
                have: civ_count,
                need: self.config.min_civs as usize,
            });
        }

        let registry = Registry::standard();
        let terrain = generate_terrain(&self.config.map);
        let map = Map::new(
            self.config.map.width,
            self.config.map.height,
            civ_count,
            terrain,
            &registry,
        );
        let mut world = World::new(map, registry);

        let starts = pick_start_positions(&world.map, civ_count)
            .ok_or(StartError::NoStartPositions { need: civ_count })?;
        for (index, &start) in starts.iter().enumerate() {
            let civ = CivId(index as u8);
            let _ = world.spawn_unit(civ, UnitKind::Settler, start);
            let scout_at = world
                .map
                .neighbors(start)
                .find(|&c| world.map.can_settle_on(c));
            if let Some(scout_at) = scout_at {
                let _ = world.spawn_unit(civ, UnitKind::Scout, scout_at);
            }
        }
        // Placement lit tiles before any client view exists; the initial
        // setMap carries that state instead.
        world.map.take_updates();

        let size = (self.config.map.width, self.config.map.height);
        let civ_catalog = world.civ_catalog();
        self.world = Some(world);
        self.has_started = true;

        info!(civs = civ_count, width = size.0, height = size.1, "game started");

        let opening = [
            Event::BeginGame {
                size,
                civ_count: civ_count as u32,
            },
            Event::CivData {
                civs: civ_catalog,
            },
        ];
        let civs: Vec<CivId> = self.seats.civs().collect();
        for civ in &civs {
            self.send_events(*civ, &opening);
        }
        for civ in civs {
            self.begin_turn_for(civ);
        }
        Ok(())
    }

    /// Apply one player action. Gate failures are logged and dropped; any
    /// tile change notices the action produced are broadcast afterwards.
    pub fn handle_action(&mut self, civ: CivId, action: Action) {
        if !self.has_started {
            return;
        }
        let Some(world) = self.world.as_mut() else {
            return;
        };

        let mut extra: HashMap<CivId, Vec<Event>> = HashMap::new();
        let result = match action {
            Action::SettleCity { at, name } => world.settle_city(civ, at, name).map(|_| ()),
            Action::BuildImprovement { at, kind } => world.build_improvement(civ, at, kind),
            Action::StartConstruction { at, target } => world.start_construction(civ, at, target),
            Action::TrainUnit { at, kind } => world.train_unit(civ, at, kind),
            Action::StartResearch { at, branch } => world.start_research(civ, at, branch),
            Action::MoveUnit { unit, to } => {
                let moved = world.move_unit(civ, unit, to);
                if moved.is_ok() {
                    extra.insert(
                        civ,
                        vec![Event::UnitPositions {
                            coords: world.unit_positions(civ),
                        }],
                    );
                }
                moved
            }
            Action::EndTurn => {
                self.ended_round.insert(civ);
                self.flush_updates(&mut extra);
                self.maybe_advance_round();
                return;
            }
        };

        if let Err(err) = result {
            debug!(civ = civ.0, %err, "action rejected");
        }
        self.flush_updates(&mut extra);
    }

    fn maybe_advance_round(&mut self) {
        let humans = self.seats.human_civs();
        if humans.iter().all(|civ| self.ended_round.contains(civ)) {
            self.advance_round();
        }
    }

    /// The global end-of-round sequence: notify humans, tick the world,
    /// then open the next turn for every civ. A civ's `beginTurn` is always
    /// preceded by any pending tile updates addressed to it.
    pub fn advance_round(&mut self) {
        if !self.has_started {
            return;
        }
        for civ in self.seats.human_civs() {
            self.send_events(civ, &[Event::EndTurn]);
        }

        // AI decision-making would run here; it is not part of the core.

        if let Some(world) = self.world.as_mut() {
            world.run_turn();
        }
        self.flush_updates(&mut HashMap::new());

        let civs: Vec<CivId> = self.seats.civs().collect();
        for civ in civs {
            self.begin_turn_for(civ);
        }
        self.ended_round.clear();

        if let Some(world) = self.world.as_ref() {
            info!(turn = world.turn, "round advanced");
        }
    }

    fn begin_turn_for(&mut self, civ: CivId) {
        if let Some(world) = self.world.as_mut() {
            let _ = world.begin_turn(civ);
        }
        self.flush_updates(&mut HashMap::new());

        if !self.seats.is_human(civ) {
            return;
        }
        let Some(world) = self.world.as_ref() else {
            return;
        };
        let tiles = world
            .map
            .civ_map_view(civ, &world.registry, &world.units, &world.cities);
        self.send_events(civ, &[Event::SetMap { tiles }, Event::BeginTurn]);
    }

    /// Drain the map's update queue and deliver each civ its own view of
    /// every changed tile, in mutation order, as one envelope per civ.
    fn flush_updates(&mut self, extra: &mut HashMap<CivId, Vec<Event>>) {
        let Some(world) = self.world.as_mut() else {
            return;
        };
        let changed = world.map.take_updates();
        if changed.is_empty() && extra.is_empty() {
            return;
        }

        let civs: Vec<CivId> = self.seats.civs().collect();
        let mut outbound: Vec<(CivId, Vec<Event>)> = Vec::new();
        for civ in civs {
            let world = self.world.as_ref().expect("checked above");
            let mut events: Vec<Event> = changed
                .iter()
                .filter_map(|&at| {
                    let index = world.map.index_of(at)?;
                    Some(Event::TileUpdate {
                        at,
                        tile: world.map.civ_tile_view(
                            civ,
                            index,
                            &world.registry,
                            &world.units,
                            &world.cities,
                        ),
                    })
                })
                .collect();
            if let Some(mut extra_events) = extra.remove(&civ) {
                events.append(&mut extra_events);
            }
            if !events.is_empty() {
                outbound.push((civ, events));
            }
        }
        for (civ, events) in outbound {
            self.send_events(civ, &events);
        }
    }

    /// Serialize and deliver one `{update: [...]}` envelope. AI seats drop
    /// the message silently; a civ with no seat at all is logged and
    /// skipped.
    fn send_events(&mut self, civ: CivId, events: &[Event]) {
        if !self.seats.is_human(civ) {
            if self.seats.civs().all(|c| c != civ) {
                warn!(civ = civ.0, "no seat for civ; message skipped");
            }
            return;
        }
        match wire::serialize_update(events) {
            Ok(message) => {
                if !self.seats.send_to(civ, &message) {
                    warn!(civ = civ.0, "seat vanished mid-send");
                }
            }
            Err(err) => warn!(civ = civ.0, %err, "failed to encode update"),
        }
    }
}

/// Spread start positions over settleable ground, greedily enforcing a
/// spacing floor and relaxing it only if the map is too crowded.
fn pick_start_positions(map: &Map, civ_count: usize) -> Option<Vec<Coord>> {
    let mut candidates: Vec<Coord> = Vec::new();
    for index in 0..map.len() {
        let coord = map.coord_at(index)?;
        if map.can_settle_on(coord) {
            candidates.push(coord);
        }
    }
    if candidates.len() < civ_count {
        return None;
    }

    let spacing = ((map.width().min(map.height()) as i32) / (civ_count as i32 + 1)).max(3);
    let mut picked: Vec<Coord> = Vec::new();
    for &candidate in &candidates {
        if picked.len() == civ_count {
            break;
        }
        if picked
            .iter()
            .all(|&p| offset_distance(p, candidate) >= spacing)
        {
            picked.push(candidate);
        }
    }
    for &candidate in &candidates {
        if picked.len() == civ_count {
            break;
        }
        if !picked.contains(&candidate) {
            picked.push(candidate);
        }
    }
    (picked.len() == civ_count).then_some(picked)
}

/// Hex distance between two offset coords, ignoring the east/west wrap —
/// good enough for spreading starts.
fn offset_distance(a: Coord, b: Coord) -> i32 {
    let axial = |c: Coord| {
        let q = c.x;
        let r = c.y - (c.x - c.x.rem_euclid(2)) / 2;
        (q, r)
    };
    let (aq, ar) = axial(a);
    let (bq, br) = axial(b);
    let dq = aq - bq;
    let dr = ar - br;
    (dq.abs() + dr.abs() + (dq + dr).abs()) / 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_distance_matches_neighbor_steps() {
        let center = Coord::new(4, 4);
        for neighbor in center.neighbors() {
            assert_eq!(offset_distance(center, neighbor), 1, "{neighbor:?}");
        }
        assert_eq!(offset_distance(center, Coord::new(4, 2)), 2);
        assert_eq!(offset_distance(center, center), 0);
    }

    #[test]
    fn start_positions_are_spread_and_settleable() {
        let registry = Registry::standard();
        let terrain = vec![windrose_protocol::Terrain::Grassland; 400];
        let map = Map::new(20, 20, 4, terrain, &registry);
        let starts = pick_start_positions(&map, 4).unwrap();
        assert_eq!(starts.len(), 4);
        for pair in starts.windows(2) {
            assert!(offset_distance(pair[0], pair[1]) >= 3);
        }
    }
}
