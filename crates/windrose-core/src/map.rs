use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use windrose_protocol::{
    CityId, CivId, Coord, ImprovementData, ImprovementKind, MovementClass, Terrain, TileData,
    TraderId, UnitData, Yield, DIRECTION_COUNT,
};

use crate::{
    City, EntityStore, Improvement, Registry, Trader, TraderStop, Unit, WorkErrand, SPILLOVER_DECAY,
};
use crate::trader::{Route, TRADER_CAPACITY};

/// Default search range for trade-route discovery.
pub const TRADE_ROUTE_RANGE: i32 = 5;

/// Tuning knobs for the line-of-sight raycast.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct VisionParams {
    /// How many steps a wedge's spine ray walks between spawning its
    /// left/right branch rays. 1 produces a dense filled wedge.
    pub step_length: i32,
}

impl Default for VisionParams {
    fn default() -> Self {
        Self { step_length: 1 }
    }
}

/// Parent/distance tables from a cost-aware breadth-first expansion,
/// keyed by flat tile index. Parents point one step back toward `origin`.
#[derive(Clone, Debug)]
pub struct PathTree {
    pub origin: Coord,
    pub parent: HashMap<usize, Coord>,
    pub dist: HashMap<usize, i32>,
}

/// The hex map: tile storage, spatial queries, per-civ visibility
/// bookkeeping, the tile-update queue, and the trader arena.
///
/// Columns wrap east/west (toroidal); rows do not. The flat index of a
/// coord is `y * width + x.rem_euclid(width)`.
#[derive(Clone, Debug)]
pub struct Map {
    width: u32,
    height: u32,
    civ_count: usize,
    tiles: Vec<crate::Tile>,
    pub traders: EntityStore<Trader>,
    updates: Vec<Coord>,
}

impl Map {
    pub fn new(
        width: u32,
        height: u32,
        civ_count: usize,
        terrain: Vec<Terrain>,
        registry: &Registry,
    ) -> Self {
        assert_eq!(
            terrain.len(),
            (width as usize) * (height as usize),
            "terrain grid must be width * height"
        );
        let tiles = terrain
            .into_iter()
            .map(|t| crate::Tile::new(t, civ_count, registry))
            .collect();
        Self {
            width,
            height,
            civ_count,
            tiles,
            traders: EntityStore::default(),
            updates: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn civ_count(&self) -> usize {
        self.civ_count
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Wrap `x` and bounds-check `y`.
    pub fn normalize(&self, c: Coord) -> Option<Coord> {
        if c.y < 0 || c.y >= self.height as i32 {
            return None;
        }
        Some(Coord::new(c.x.rem_euclid(self.width as i32), c.y))
    }

    pub fn index_of(&self, c: Coord) -> Option<usize> {
        let c = self.normalize(c)?;
        Some((c.y as usize) * (self.width as usize) + (c.x as usize))
    }

    pub fn coord_at(&self, index: usize) -> Option<Coord> {
        if index >= self.tiles.len() {
            return None;
        }
        Some(Coord::new(
            (index % self.width as usize) as i32,
            (index / self.width as usize) as i32,
        ))
    }

    pub fn get(&self, c: Coord) -> Option<&crate::Tile> {
        self.index_of(c).map(|i| &self.tiles[i])
    }

    pub fn get_mut(&mut self, c: Coord) -> Option<&mut crate::Tile> {
        self.index_of(c).map(move |i| &mut self.tiles[i])
    }

    pub fn tile(&self, index: usize) -> Option<&crate::Tile> {
        self.tiles.get(index)
    }

    pub fn tile_mut(&mut self, index: usize) -> Option<&mut crate::Tile> {
        self.tiles.get_mut(index)
    }

    /// Wrap-aware step: the parity offset is taken on the wrapped column.
    pub fn step_in_direction(&self, c: Coord, direction: u8) -> Option<Coord> {
        let c = self.normalize(c)?;
        self.normalize(c.step(direction))
    }

    /// The in-bounds neighbors of `c`, in direction order.
    pub fn neighbors(&self, c: Coord) -> impl Iterator<Item = Coord> + '_ {
        (0..DIRECTION_COUNT).filter_map(move |d| self.step_in_direction(c, d))
    }

    /// Every coord reachable within `range` hex steps of `center`,
    /// excluding `center` itself. Order is expansion order; callers must
    /// not rely on it being ring order.
    pub fn neighbors_within(&self, center: Coord, range: i32) -> Vec<Coord> {
        self.neighbors_within_by(center, range, |_| true)
    }

    /// Filtered variant: `filter` gates both inclusion of a tile and
    /// expansion through it.
    ///
    /// Expansion memoizes the best remaining range per tile and re-expands
    /// only on strict improvement, so overlapping branches terminate.
    pub fn neighbors_within_by(
        &self,
        center: Coord,
        range: i32,
        mut filter: impl FnMut(&crate::Tile) -> bool,
    ) -> Vec<Coord> {
        let Some(start) = self.normalize(center) else {
            return Vec::new();
        };
        let Some(start_index) = self.index_of(start) else {
            return Vec::new();
        };

        let mut best_remaining = vec![-1_i32; self.tiles.len()];
        best_remaining[start_index] = range;
        let mut out = Vec::new();
        let mut stack = vec![(start, range)];

        while let Some((coord, remaining)) = stack.pop() {
            if remaining <= 0 {
                continue;
            }
            for d in 0..DIRECTION_COUNT {
                let Some(next) = self.step_in_direction(coord, d) else {
                    continue;
                };
                let index = self
                    .index_of(next)
                    .expect("normalized coord always indexes");
                if index == start_index {
                    continue;
                }
                if !filter(&self.tiles[index]) {
                    continue;
                }
                if best_remaining[index] >= remaining - 1 {
                    continue;
                }
                if best_remaining[index] < 0 {
                    out.push(next);
                }
                best_remaining[index] = remaining - 1;
                stack.push((next, remaining - 1));
            }
        }

        out
    }

    /// Cost to enter the tile at `index` for `mode`, or `None` when
    /// impassable. Air ignores terrain entirely.
    fn entry_cost(&self, index: usize, mode: MovementClass, registry: &Registry) -> Option<i32> {
        registry.movement_cost(self.tiles[index].terrain, mode)
    }

    /// Cost-aware breadth-first expansion from `origin`, capped at `range`.
    ///
    /// Per-step costs are small nonnegative integers, so a FIFO queue that
    /// relaxes on strict improvement settles to shortest distances.
    pub fn path_tree(
        &self,
        origin: Coord,
        range: i32,
        mode: MovementClass,
        registry: &Registry,
    ) -> PathTree {
        let mut tree = PathTree {
            origin,
            parent: HashMap::new(),
            dist: HashMap::new(),
        };
        let Some(start) = self.normalize(origin) else {
            return tree;
        };
        let start_index = self.index_of(start).expect("normalized coord indexes");
        tree.origin = start;
        tree.dist.insert(start_index, 0);

        let mut queue = VecDeque::new();
        queue.push_back(start);

        while let Some(coord) = queue.pop_front() {
            let here = self.index_of(coord).expect("normalized coord indexes");
            let base = tree.dist[&here];
            for d in 0..DIRECTION_COUNT {
                let Some(next) = self.step_in_direction(coord, d) else {
                    continue;
                };
                let index = self.index_of(next).expect("normalized coord indexes");
                let Some(cost) = self.entry_cost(index, mode, registry) else {
                    continue;
                };
                let total = base + cost;
                if total > range {
                    continue;
                }
                match tree.dist.get(&index) {
                    Some(&known) if known <= total => continue,
                    _ => {}
                }
                tree.dist.insert(index, total);
                tree.parent.insert(index, coord);
                queue.push_back(next);
            }
        }

        tree
    }

    /// Walk parent pointers from `src_pos` until the parent is
    /// `target`, returning the coords from the first hop through the
    /// target. `None` when `src_pos` is not connected through `target`.
    pub fn find_path(&self, tree: &PathTree, src_pos: usize, target: Coord) -> Option<Vec<Coord>> {
        let target = self.normalize(target)?;
        let mut path = Vec::new();
        let mut cursor = src_pos;
        loop {
            let parent = *tree.parent.get(&cursor)?;
            path.push(parent);
            if parent == target {
                return Some(path);
            }
            cursor = self.index_of(parent)?;
        }
    }

    /// Full route from `src` to `target` through `tree` (which must be
    /// rooted at `target`): the source coord plus every hop. Verifies both
    /// ends resolve to the requested tiles; `None` on any mismatch.
    pub fn find_route(&self, tree: &PathTree, src: Coord, target: Coord) -> Option<Route> {
        let src = self.normalize(src)?;
        let src_index = self.index_of(src)?;
        let hops = self.find_path(tree, src_index, target)?;

        let mut path = Vec::with_capacity(hops.len() + 1);
        path.push(src);
        path.extend(hops);

        let first = self.index_of(*path.first()?)?;
        let last = self.index_of(*path.last()?)?;
        if first != src_index || Some(last) != self.index_of(target) {
            return None;
        }

        let distance = *tree.dist.get(&src_index)?;
        Some(Route { path, distance })
    }

    /// Line of sight from `origin`: six wedges, each a spine ray that
    /// spawns left/right branch rays every `step_length` steps.
    ///
    /// Every ray carries a running elevation ceiling and a per-step slope.
    /// A tile is seen when its total elevation reaches the ceiling; a tile
    /// rising above the ceiling becomes the new blocker, raising the slope
    /// by its overshoot. Rays pass over blockers rather than stopping.
    pub fn visible_coords_from(
        &self,
        origin: Coord,
        range: i32,
        registry: &Registry,
        params: VisionParams,
    ) -> Vec<Coord> {
        struct Ray {
            coord: Coord,
            direction: u8,
            remaining: i32,
            ceiling: i32,
            slope: i32,
            branching: bool,
        }

        let Some(start) = self.normalize(origin) else {
            return Vec::new();
        };
        let start_index = self.index_of(start).expect("normalized coord indexes");

        let mut seen = vec![false; self.tiles.len()];
        let mut out = Vec::new();
        seen[start_index] = true;
        out.push(start);

        let step_length = params.step_length.max(1);
        let mut rays: Vec<Ray> = (0..DIRECTION_COUNT)
            .map(|direction| Ray {
                coord: start,
                direction,
                remaining: range,
                ceiling: 0,
                slope: 0,
                branching: true,
            })
            .collect();

        while let Some(mut ray) = rays.pop() {
            let mut since_branch = 0;
            while ray.remaining > 0 {
                let Some(next) = self.step_in_direction(ray.coord, ray.direction) else {
                    break;
                };
                let index = self.index_of(next).expect("normalized coord indexes");

                ray.ceiling += ray.slope;
                ray.remaining -= 1;
                ray.coord = next;
                since_branch += 1;

                let elevation = self.tiles[index].elevation(registry);
                if elevation >= ray.ceiling && !seen[index] {
                    seen[index] = true;
                    out.push(next);
                }
                if elevation > ray.ceiling {
                    ray.slope = ray.slope.max(elevation - ray.ceiling);
                }

                if ray.branching && since_branch >= step_length && ray.remaining > 0 {
                    since_branch = 0;
                    for turn in [1, DIRECTION_COUNT - 1] {
                        rays.push(Ray {
                            coord: ray.coord,
                            direction: (ray.direction + turn) % DIRECTION_COUNT,
                            remaining: ray.remaining,
                            ceiling: ray.ceiling,
                            slope: ray.slope,
                            branching: false,
                        });
                    }
                }
            }
        }

        out
    }

    /// What `unit` can see from where it stands. With `is_attack`, the
    /// unit's attack range replaces its vision range (no range → nothing).
    pub fn unit_visible_coords(
        &self,
        unit: &Unit,
        registry: &Registry,
        is_attack: bool,
    ) -> Vec<Coord> {
        let Some(origin) = unit.coords else {
            return Vec::new();
        };
        let range = if is_attack {
            match unit.attack_range(registry) {
                Some(range) => range,
                None => return Vec::new(),
            }
        } else {
            unit.vision_range(registry)
        };
        self.visible_coords_from(origin, range, registry, VisionParams::default())
    }

    /// Adjust one tile's visibility refcount for `civ`, queueing a tile
    /// update when the published view changes.
    pub fn set_tile_visibility(&mut self, civ: CivId, c: Coord, on: bool) {
        let Some(index) = self.index_of(c) else {
            return;
        };
        let tile = &mut self.tiles[index];
        let before = (tile.discovered_by(civ), tile.visible_to(civ));
        tile.set_visibility(civ, on);
        let after = (tile.discovered_by(civ), tile.visible_to(civ));
        if before != after {
            self.tile_update(c);
        }
    }

    /// Light (or unlight) a batch of coords for `civ`.
    pub fn light(&mut self, civ: CivId, coords: &[Coord], on: bool) {
        for &c in coords {
            self.set_tile_visibility(civ, c, on);
        }
    }

    /// Rebuild one civ's visibility refcounts from scratch: clear every
    /// counter, then re-light from each source coord. Used at turn start;
    /// no tile updates are queued because a full map view follows.
    pub fn rebuild_civ_visibility(
        &mut self,
        civ: CivId,
        sources: &[Coord],
        range: i32,
        registry: &Registry,
    ) {
        for tile in &mut self.tiles {
            tile.clear_visibility(civ);
        }
        for &source in sources {
            for c in self.visible_coords_from(source, range, registry, VisionParams::default()) {
                if let Some(index) = self.index_of(c) {
                    self.tiles[index].set_visibility(civ, true);
                }
            }
        }
    }

    /// Queue a change notice for the tile at `c`. Notices are drained once
    /// per flush, in mutation order.
    pub fn tile_update(&mut self, c: Coord) {
        if let Some(c) = self.normalize(c) {
            self.updates.push(c);
        }
    }

    /// Drain the pending tile updates.
    pub fn take_updates(&mut self) -> Vec<Coord> {
        std::mem::take(&mut self.updates)
    }

    pub fn has_pending_updates(&self) -> bool {
        !self.updates.is_empty()
    }

    /// One civ's view of one tile: `None` until discovered, a full
    /// snapshot while visible, a redacted snapshot (no unit) otherwise.
    pub fn civ_tile_view(
        &self,
        civ: CivId,
        index: usize,
        registry: &Registry,
        units: &EntityStore<Unit>,
        cities: &EntityStore<City>,
    ) -> Option<TileData> {
        let tile = self.tiles.get(index)?;
        if !tile.discovered_by(civ) {
            return None;
        }
        let visible = tile.visible_to(civ);

        let owner = tile
            .owner
            .and_then(|city| cities.get(city))
            .map(|city| city.owner);
        let improvement = tile.improvement.as_ref().map(|imp| ImprovementData {
            kind: imp.kind,
            pillaged: imp.pillaged,
        });
        let unit = if visible {
            tile.unit.and_then(|id| {
                let unit = units.get(id)?;
                Some(UnitData {
                    id,
                    kind: unit.kind,
                    owner: unit.owner,
                    coords: unit.coords?,
                    hp: unit.hp,
                    movement_left: unit.moves_left,
                })
            })
        } else {
            None
        };

        Some(TileData {
            terrain: tile.terrain,
            elevation: tile.elevation(registry),
            yields: tile.yields(registry),
            owner,
            improvement,
            unit,
            visible,
        })
    }

    /// Row-major per-civ view of the whole map, `None` for undiscovered
    /// tiles.
    pub fn civ_map_view(
        &self,
        civ: CivId,
        registry: &Registry,
        units: &EntityStore<Unit>,
        cities: &EntityStore<City>,
    ) -> Vec<Option<TileData>> {
        (0..self.tiles.len())
            .map(|index| self.civ_tile_view(civ, index, registry, units, cities))
            .collect()
    }

    pub fn can_settle_on(&self, c: Coord) -> bool {
        self.get(c)
            .is_some_and(|tile| tile.terrain.is_settleable() && tile.owner.is_none())
    }

    pub fn can_build_on(&self, c: Coord) -> bool {
        self.get(c).is_some_and(|tile| tile.terrain.is_buildable())
    }

    /// Claim a tile for a city. Ownership requires settleable ground, and
    /// an existing owner is kept unless `overwrite` is set.
    pub fn set_tile_owner(&mut self, c: Coord, city: CityId, overwrite: bool) -> bool {
        let Some(index) = self.index_of(c) else {
            return false;
        };
        let tile = &mut self.tiles[index];
        if !tile.terrain.is_settleable() {
            return false;
        }
        if tile.owner.is_some() && !overwrite {
            return false;
        }
        tile.owner = Some(city);
        self.tile_update(c);
        true
    }

    /// Place an improvement, replacing any prior one. The tile's baseline
    /// yield is folded into the improvement.
    pub fn build_improvement_at(
        &mut self,
        c: Coord,
        kind: ImprovementKind,
        registry: &Registry,
    ) -> Option<&mut Improvement> {
        let index = self.index_of(c)?;
        let base_yield = self.tiles[index].base_yield;
        self.tiles[index].improvement = Some(Improvement::new(kind, base_yield, registry));
        self.tile_update(c);
        self.tiles[index].improvement.as_mut()
    }

    /// Spawn traders feeding `requirement` into the improvement at
    /// `sink_coords`, one per owned improvement within `range` that can
    /// supply it, nearest first. Candidates whose route cannot be verified
    /// are skipped.
    pub fn create_trade_routes(
        &mut self,
        civ: CivId,
        sink_coords: Coord,
        requirement: Yield,
        range: i32,
        mode: MovementClass,
        registry: &Registry,
        cities: &EntityStore<City>,
    ) -> Vec<TraderId> {
        let mut created = Vec::new();
        let Some(sink_index) = self.index_of(sink_coords) else {
            return created;
        };
        if self.tiles[sink_index].improvement.is_none() {
            return created;
        }

        let tree = self.path_tree(sink_coords, range, mode, registry);
        let mut candidates: Vec<(i32, usize)> = tree
            .dist
            .iter()
            .filter(|&(&index, _)| index != sink_index)
            .map(|(&index, &d)| (d, index))
            .collect();
        candidates.sort_unstable();

        for (_, index) in candidates {
            let tile = &self.tiles[index];
            let owned_by_civ = tile
                .owner
                .and_then(|city| cities.get(city))
                .is_some_and(|city| city.owner == civ);
            if !owned_by_civ {
                continue;
            }
            let Some(improvement) = tile.improvement.as_ref() else {
                continue;
            };
            if !improvement.can_supply(&requirement) {
                continue;
            }
            let src = self.coord_at(index).expect("index in bounds");
            let Some(route) = self.find_route(&tree, src, sink_coords) else {
                continue;
            };

            let capacity = TRADER_CAPACITY.min(requirement);
            let id = self
                .traders
                .insert(Trader::new(civ, route, index, sink_index, capacity));
            if let Some(imp) = self.tiles[index].improvement.as_mut() {
                imp.consumers.push(id);
            }
            if let Some(imp) = self.tiles[sink_index].improvement.as_mut() {
                imp.suppliers.push(id);
            }
            created.push(id);
        }

        created
    }

    /// Run one economic step for the tile at `index`. Returns a completed
    /// errand for the caller to resolve, if the improvement finished one.
    pub fn work_tile(&mut self, index: usize, registry: &Registry) -> Option<WorkErrand> {
        let Map { tiles, traders, .. } = self;
        let improvement = tiles.get_mut(index)?.improvement.as_mut()?;
        improvement.work(registry, traders);
        if improvement.errand.as_ref().is_some_and(|e| e.completed) {
            improvement.errand.take()
        } else {
            None
        }
    }

    /// Knowledge spillover: every tile branch still short of its maximum
    /// radiates a decayed share to its six neighbors. Emissions are
    /// snapshotted first so the pass is order-independent.
    pub fn spill_knowledge(&mut self, registry: &Registry) {
        let mut emissions: Vec<(usize, windrose_protocol::KnowledgeBranch, i32)> = Vec::new();
        for index in 0..self.tiles.len() {
            let tile = &self.tiles[index];
            if tile.knowledge.is_empty() {
                continue;
            }
            let coord = self.coord_at(index).expect("index in bounds");
            for (branch, points) in tile.knowledge.iter() {
                if points <= 0 || points >= registry.knowledge(branch).max_points {
                    continue;
                }
                for neighbor in self.neighbors(coord) {
                    let neighbor_index = self.index_of(neighbor).expect("normalized");
                    emissions.push((neighbor_index, branch, points));
                }
            }
        }
        for (index, branch, points) in emissions {
            let max_points = registry.knowledge(branch).max_points;
            self.tiles[index]
                .knowledge
                .add(branch, points, SPILLOVER_DECAY, max_points);
        }
    }

    /// Advance every live trader, offloading at sinks, then flag the ones
    /// whose endpoints no longer justify them.
    pub fn advance_traders(&mut self) {
        let ids: Vec<TraderId> = self.traders.iter_ordered().map(|(id, _)| id).collect();
        for id in ids {
            let Map { tiles, traders, .. } = self;
            let Some(trader) = traders.get_mut(id) else {
                continue;
            };
            if trader.expired {
                continue;
            }

            for _ in 0..trader.speed {
                if trader.step() == Some(TraderStop::Sink) {
                    let sink_improvement = tiles
                        .get_mut(trader.sink)
                        .and_then(|tile| tile.improvement.as_mut());
                    if let Some(improvement) = sink_improvement {
                        let delivered = std::mem::replace(&mut trader.carried, Yield::zero());
                        let rejected = improvement.store.deposit(delivered);
                        if let Some(errand) = improvement.errand.as_mut() {
                            errand.stored_this_turn +=
                                delivered.saturating_sub(rejected);
                        }
                        trader.carried = rejected;
                    }
                }
            }

            let producer_gone = tiles
                .get(trader.producer)
                .map_or(true, |tile| tile.improvement.is_none());
            let sink_satisfied = tiles
                .get(trader.sink)
                .and_then(|tile| tile.improvement.as_ref())
                .map_or(true, |imp| {
                    imp.errand.as_ref().map_or(true, |e| e.completed)
                });
            if producer_gone || sink_satisfied {
                trader.expired = true;
            }
        }
    }

    /// Remove expired traders and scrub their handles from the endpoint
    /// improvements.
    pub fn reap_traders(&mut self) {
        let expired: Vec<TraderId> = self
            .traders
            .iter_ordered()
            .filter(|(_, trader)| trader.expired)
            .map(|(id, _)| id)
            .collect();
        for id in expired {
            let Some(trader) = self.traders.remove(id) else {
                continue;
            };
            for endpoint in [trader.producer, trader.sink] {
                if let Some(improvement) = self
                    .tiles
                    .get_mut(endpoint)
                    .and_then(|tile| tile.improvement.as_mut())
                {
                    improvement.consumers.retain(|&t| t != id);
                    improvement.suppliers.retain(|&t| t != id);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(width: u32, height: u32, civs: usize) -> (Map, Registry) {
        let registry = Registry::standard();
        let terrain = vec![Terrain::Grassland; (width * height) as usize];
        let map = Map::new(width, height, civs, terrain, &registry);
        (map, registry)
    }

    #[test]
    fn east_west_wraps_north_south_does_not() {
        let (map, _) = flat(10, 10, 1);
        assert_eq!(
            map.normalize(Coord::new(-1, 5)),
            Some(Coord::new(9, 5))
        );
        assert_eq!(map.normalize(Coord::new(13, 5)), Some(Coord::new(3, 5)));
        assert_eq!(map.normalize(Coord::new(4, -1)), None);
        assert_eq!(map.normalize(Coord::new(4, 10)), None);
    }

    #[test]
    fn neighbors_within_crosses_the_seam() {
        let (map, _) = flat(10, 10, 1);
        let ring = map.neighbors_within(Coord::new(0, 5), 1);
        assert_eq!(ring.len(), 6);
        assert!(ring.iter().any(|c| c.x == 9));
        assert!(!ring.contains(&Coord::new(0, 5)));
    }

    #[test]
    fn neighbors_within_two_counts_eighteen() {
        let (map, _) = flat(12, 12, 1);
        let coords = map.neighbors_within(Coord::new(6, 6), 2);
        assert_eq!(coords.len(), 18);
    }

    #[test]
    fn filter_gates_traversal_not_just_inclusion() {
        let (mut map, registry) = flat(12, 12, 1);
        // A wall of mountains between center and the far side.
        for y in 0..12 {
            map.get_mut(Coord::new(8, y)).unwrap().terrain = Terrain::Mountain;
        }
        let passable = map.neighbors_within_by(Coord::new(6, 6), 4, |tile| {
            registry
                .movement_cost(tile.terrain, MovementClass::Land)
                .is_some()
        });
        assert!(passable.iter().all(|c| c.x != 8));
        // Nothing directly east of the wall is reachable within 4 steps.
        assert!(!passable.contains(&Coord::new(9, 6)));
    }

    #[test]
    fn path_tree_respects_impassable_and_cost() {
        let (mut map, registry) = flat(12, 12, 1);
        map.get_mut(Coord::new(7, 6)).unwrap().terrain = Terrain::Hills;
        map.get_mut(Coord::new(5, 6)).unwrap().terrain = Terrain::Mountain;

        let tree = map.path_tree(Coord::new(6, 6), 2, MovementClass::Land, &registry);
        let hills = map.index_of(Coord::new(7, 6)).unwrap();
        let mountain = map.index_of(Coord::new(5, 6)).unwrap();
        assert_eq!(tree.dist.get(&hills), Some(&2));
        assert!(!tree.dist.contains_key(&mountain));
        // Every reported distance is within range.
        assert!(tree.dist.values().all(|&d| d <= 2));
    }

    #[test]
    fn air_mode_crosses_everything_at_unit_cost() {
        let (mut map, registry) = flat(8, 8, 1);
        map.get_mut(Coord::new(4, 4)).unwrap().terrain = Terrain::Mountain;
        let tree = map.path_tree(Coord::new(3, 4), 1, MovementClass::Air, &registry);
        let peak = map.index_of(Coord::new(4, 4)).unwrap();
        assert_eq!(tree.dist.get(&peak), Some(&1));
    }

    #[test]
    fn find_route_runs_source_to_target() {
        let (map, registry) = flat(10, 10, 1);
        let sink = Coord::new(5, 5);
        let tree = map.path_tree(sink, 5, MovementClass::Land, &registry);
        let route = map.find_route(&tree, Coord::new(8, 5), sink).unwrap();
        assert_eq!(route.path.first(), Some(&Coord::new(8, 5)));
        assert_eq!(route.path.last(), Some(&sink));
        assert_eq!(route.distance, 3);
        // Consecutive hops are adjacent.
        for pair in route.path.windows(2) {
            assert!(map.neighbors(pair[0]).any(|n| n == pair[1]));
        }
    }

    #[test]
    fn flat_ground_vision_fills_the_disk() {
        let (map, registry) = flat(20, 20, 1);
        let seen = map.visible_coords_from(
            Coord::new(10, 10),
            2,
            &registry,
            VisionParams::default(),
        );
        assert_eq!(seen.len(), 19); // origin + ring1 (6) + ring2 (12)
    }

    #[test]
    fn ridges_hide_what_lies_behind() {
        let (mut map, registry) = flat(20, 20, 1);
        // A mountain due north of the observer.
        map.get_mut(Coord::new(10, 9)).unwrap().terrain = Terrain::Mountain;
        map.get_mut(Coord::new(10, 9)).unwrap().height = 3;

        let seen = map.visible_coords_from(
            Coord::new(10, 10),
            3,
            &registry,
            VisionParams::default(),
        );
        // The ridge itself is visible; the tiles straight behind it are not.
        assert!(seen.contains(&Coord::new(10, 9)));
        assert!(!seen.contains(&Coord::new(10, 8)));
        assert!(!seen.contains(&Coord::new(10, 7)));
    }

    #[test]
    fn visibility_updates_queue_only_on_published_change() {
        let (mut map, _) = flat(8, 8, 2);
        let civ = CivId(0);
        let c = Coord::new(3, 3);

        map.set_tile_visibility(civ, c, true); // undiscovered -> visible
        map.set_tile_visibility(civ, c, true); // refcount 1 -> 2, no change
        map.set_tile_visibility(civ, c, false); // 2 -> 1, still visible
        map.set_tile_visibility(civ, c, false); // 1 -> 0, now hidden
        assert_eq!(map.take_updates(), vec![c, c]);
        assert!(!map.has_pending_updates());
    }
}
