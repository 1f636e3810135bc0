use serde::{Deserialize, Serialize};
use windrose_protocol::{CityId, CivId, Terrain, UnitId, Yield};

use crate::{Improvement, Registry, TileKnowledge};

/// One hex cell. Created at map construction, never destroyed.
///
/// Per-civ perception is tracked tile-side: `seen_by` is a monotone
/// discovery bitmask, `watchers` reference-counts active vision cones so
/// that overlapping units keep a tile lit until the last one leaves. The
/// counter may dip negative transiently while a move's light-off/light-on
/// pair is in flight; at rest it is nonnegative.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tile {
    pub terrain: Terrain,
    /// Terrain height; improvements add theirs on top (see [`Tile::elevation`]).
    pub height: i32,
    pub base_yield: Yield,
    pub owner: Option<CityId>,
    pub unit: Option<UnitId>,
    pub improvement: Option<Improvement>,
    pub knowledge: TileKnowledge,
    seen_by: u32,
    watchers: Vec<i32>,
}

impl Tile {
    pub fn new(terrain: Terrain, civ_count: usize, registry: &Registry) -> Self {
        let spec = registry.terrain(terrain);
        Self {
            terrain,
            height: spec.height,
            base_yield: spec.base_yield,
            owner: None,
            unit: None,
            improvement: None,
            knowledge: TileKnowledge::default(),
            seen_by: 0,
            watchers: vec![0; civ_count],
        }
    }

    /// Total elevation: terrain height plus the improvement's, if any.
    pub fn elevation(&self, registry: &Registry) -> i32 {
        let improvement = self
            .improvement
            .as_ref()
            .map_or(0, |imp| registry.improvement(imp.kind).height);
        self.height + improvement
    }

    /// What this tile produces per turn, improvement included.
    pub fn yields(&self, registry: &Registry) -> Yield {
        match &self.improvement {
            Some(imp) => imp.yields(registry),
            None => self.base_yield,
        }
    }

    /// Adjust the visibility refcount for `civ`. Crossing into positive
    /// marks the tile discovered — discovery never clears.
    pub fn set_visibility(&mut self, civ: CivId, on: bool) {
        let Some(counter) = self.watchers.get_mut(civ.index()) else {
            return;
        };
        *counter += if on { 1 } else { -1 };
        if *counter > 0 {
            self.seen_by |= 1 << civ.index();
        }
    }

    pub fn visible_to(&self, civ: CivId) -> bool {
        self.watchers.get(civ.index()).copied().unwrap_or(0) > 0
    }

    pub fn discovered_by(&self, civ: CivId) -> bool {
        self.seen_by & (1 << civ.index()) != 0
    }

    pub fn visibility_count(&self, civ: CivId) -> i32 {
        self.watchers.get(civ.index()).copied().unwrap_or(0)
    }

    /// Zero one civ's refcount ahead of a from-scratch rebuild. Discovery
    /// is untouched.
    pub fn clear_visibility(&mut self, civ: CivId) {
        if let Some(counter) = self.watchers.get_mut(civ.index()) {
            *counter = 0;
        }
    }

    pub(crate) fn visibility_state(&self) -> (u32, &[i32]) {
        (self.seen_by, &self.watchers)
    }

    pub(crate) fn restore_visibility(&mut self, seen_by: u32, watchers: Vec<i32>) {
        self.seen_by = seen_by;
        self.watchers = watchers;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use windrose_protocol::ImprovementKind;

    #[test]
    fn discovery_is_monotone_under_refcounting() {
        let registry = Registry::standard();
        let mut tile = Tile::new(Terrain::Plains, 2, &registry);
        let civ = CivId(1);

        assert!(!tile.discovered_by(civ));
        tile.set_visibility(civ, true);
        tile.set_visibility(civ, true);
        assert_eq!(tile.visibility_count(civ), 2);
        tile.set_visibility(civ, false);
        assert!(tile.visible_to(civ));
        tile.set_visibility(civ, false);
        assert!(!tile.visible_to(civ));
        assert!(tile.discovered_by(civ));
        assert_eq!(tile.visibility_count(civ), 0);
    }

    #[test]
    fn elevation_includes_the_improvement() {
        let registry = Registry::standard();
        let mut tile = Tile::new(Terrain::Hills, 1, &registry);
        assert_eq!(tile.elevation(&registry), 1);
        tile.improvement = Some(Improvement::new(
            ImprovementKind::Forest,
            tile.base_yield,
            &registry,
        ));
        assert_eq!(tile.elevation(&registry), 3);
    }
}
