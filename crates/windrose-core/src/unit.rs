use serde::{Deserialize, Serialize};
use windrose_protocol::{CivId, Coord, MovementClass, PromotionClass, UnitKind};

use crate::Registry;

/// A mobile piece on the map. At most one unit occupies a tile, and a
/// placed unit's `coords` always match the tile slot referencing it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    pub kind: UnitKind,
    pub owner: CivId,
    /// Absent until the unit has been placed on the map.
    pub coords: Option<Coord>,
    pub hp: i32,
    pub moves_left: i32,
}

impl Unit {
    pub fn new(kind: UnitKind, owner: CivId, registry: &Registry) -> Self {
        let spec = registry.unit(kind);
        Self {
            kind,
            owner,
            coords: None,
            hp: spec.hp,
            moves_left: spec.moves,
        }
    }

    /// Restore per-turn movement.
    pub fn refresh(&mut self, registry: &Registry) {
        self.moves_left = registry.unit(self.kind).moves;
    }

    pub fn promotion_class(&self, registry: &Registry) -> PromotionClass {
        registry.unit(self.kind).promotion
    }

    pub fn movement_class(&self, registry: &Registry) -> MovementClass {
        registry.unit(self.kind).movement
    }

    pub fn vision_range(&self, registry: &Registry) -> i32 {
        registry.unit(self.kind).vision_range
    }

    pub fn attack_range(&self, registry: &Registry) -> Option<i32> {
        registry.unit(self.kind).attack_range
    }
}
