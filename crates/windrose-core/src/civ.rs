use serde::{Deserialize, Serialize};
use windrose_protocol::{CivId, Coord, UnitId};

/// Display colors handed out by seat order.
pub const CIV_COLORS: [&str; 8] = [
    "#e63946", "#457b9d", "#2a9d8f", "#e9c46a", "#9b5de5", "#f4a261", "#588157", "#bc6c25",
];

/// A settlement anchoring a civ's territory. Tiles are owned through the
/// city; the claim set holds sorted flat tile indices for stable iteration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub owner: CivId,
    pub center: Coord,
    claimed: Vec<u32>,
}

impl City {
    pub fn new(name: String, owner: CivId, center: Coord) -> Self {
        Self {
            name,
            owner,
            center,
            claimed: Vec::new(),
        }
    }

    pub fn claims_index(&self, tile_index: usize) -> bool {
        self.claimed.binary_search(&(tile_index as u32)).is_ok()
    }

    pub fn claim_index(&mut self, tile_index: usize) {
        let tile_index = tile_index as u32;
        if let Err(pos) = self.claimed.binary_search(&tile_index) {
            self.claimed.insert(pos, tile_index);
        }
    }

    pub fn claimed_indices(&self) -> &[u32] {
        &self.claimed
    }
}

/// A player-owned faction: its unit roster and public color. Units
/// themselves live in the world's unit arena; the roster holds handles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Civilization {
    pub id: CivId,
    pub color: String,
    pub units: Vec<UnitId>,
}

impl Civilization {
    pub fn new(id: CivId) -> Self {
        let color = CIV_COLORS[id.index() % CIV_COLORS.len()].to_string();
        Self {
            id,
            color,
            units: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_stay_sorted_and_deduped() {
        let mut city = City::new("Harborfall".to_string(), CivId(0), Coord::new(4, 4));
        city.claim_index(9);
        city.claim_index(3);
        city.claim_index(9);
        assert_eq!(city.claimed_indices(), &[3, 9]);
        assert!(city.claims_index(3));
        assert!(!city.claims_index(4));
    }

    #[test]
    fn civ_colors_cycle_by_seat() {
        assert_eq!(Civilization::new(CivId(0)).color, CIV_COLORS[0]);
        assert_eq!(Civilization::new(CivId(3)).color, CIV_COLORS[3]);
    }
}
