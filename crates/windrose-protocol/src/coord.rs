use serde::{Deserialize, Serialize};

/// Odd-x offset coordinates on a hex grid: `x` is the column, `y` the row.
///
/// Columns with odd `x` sit half a hex lower than even columns, so the
/// offsets to a hex's six neighbors depend on the parity of `x`. East/west
/// wrapping and bounds checks are the map's concern, not the coordinate's.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

/// Neighbor offsets for even columns, indexed by [`Direction`].
const EVEN_OFFSETS: [(i32, i32); 6] = [(0, -1), (1, -1), (1, 0), (0, 1), (-1, 0), (-1, -1)];

/// Neighbor offsets for odd columns, indexed by [`Direction`].
const ODD_OFFSETS: [(i32, i32); 6] = [(0, -1), (1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0)];

/// The six hex directions in index order: N, NE, SE, S, SW, NW.
/// `d` and `(d + 3) % 6` are opposite directions.
pub type Direction = u8;

pub const DIRECTION_COUNT: u8 = 6;

impl Coord {
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Raw (unwrapped) neighbor in direction `d`; `d` is taken modulo 6.
    pub fn step(self, d: Direction) -> Coord {
        let offsets = if self.x.rem_euclid(2) == 0 {
            &EVEN_OFFSETS
        } else {
            &ODD_OFFSETS
        };
        let (dx, dy) = offsets[(d % DIRECTION_COUNT) as usize];
        Coord::new(self.x + dx, self.y + dy)
    }

    /// The six raw neighbors in direction order.
    pub fn neighbors(self) -> impl Iterator<Item = Coord> {
        (0..DIRECTION_COUNT).map(move |d| self.step(d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_and_odd_columns_disagree_on_diagonals() {
        let even: Vec<Coord> = Coord::new(2, 2).neighbors().collect();
        let odd: Vec<Coord> = Coord::new(3, 2).neighbors().collect();

        assert!(even.contains(&Coord::new(3, 1)));
        assert!(even.contains(&Coord::new(1, 1)));
        assert!(odd.contains(&Coord::new(4, 3)));
        assert!(odd.contains(&Coord::new(2, 3)));
    }

    #[test]
    fn opposite_directions_round_trip() {
        for x in 0..4 {
            for y in 0..4 {
                let c = Coord::new(x, y);
                for d in 0..DIRECTION_COUNT {
                    assert_eq!(c.step(d).step((d + 3) % 6), c, "from {c:?} dir {d}");
                }
            }
        }
    }

    #[test]
    fn every_hex_has_six_distinct_neighbors() {
        let c = Coord::new(5, 5);
        let mut seen: Vec<Coord> = c.neighbors().collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 6);
        assert!(!seen.contains(&c));
    }
}
