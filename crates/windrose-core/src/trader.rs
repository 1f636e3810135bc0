use serde::{Deserialize, Serialize};
use windrose_protocol::{CivId, Coord, Yield};

/// Tiles per turn a trader walks.
pub const TRADER_SPEED: i32 = 1;

/// Per-key ceiling on what a single trader can carry.
pub const TRADER_CAPACITY: Yield = Yield {
    food: 10,
    production: 10,
    gold: 10,
    science: 10,
};

/// An ordered path of coords from producer to sink, with its total
/// movement-cost distance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub path: Vec<Coord>,
    pub distance: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heading {
    /// Walking toward the sink end of the route.
    Outbound,
    /// Walking back toward the producer end.
    Inbound,
}

/// Where a step landed a trader, when it landed anywhere notable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraderStop {
    Sink,
    Producer,
}

/// A resource carrier shuttling between a producer improvement and a sink
/// improvement along a fixed route.
///
/// Movement is a round trip: producer → sink → producer → …, offloading the
/// carried load on each sink arrival and reloading at the producer through
/// the producer's per-turn share-out. A trader expires when its producer is
/// released, when the errand it feeds completes, or when the sink no longer
/// needs resources; expired traders are reaped at the end of the map turn.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Trader {
    pub owner: CivId,
    pub route: Route,
    /// Flat tile index of the producer (route start).
    pub producer: usize,
    /// Flat tile index of the sink (route end).
    pub sink: usize,
    pub speed: i32,
    pub capacity: Yield,
    pub carried: Yield,
    pub expired: bool,
    position: usize,
    heading: Heading,
}

impl Trader {
    pub fn new(owner: CivId, route: Route, producer: usize, sink: usize, capacity: Yield) -> Self {
        debug_assert!(route.path.len() >= 2, "route must span two tiles");
        Self {
            owner,
            route,
            producer,
            sink,
            speed: TRADER_SPEED,
            capacity,
            carried: Yield::zero(),
            expired: false,
            position: 0,
            heading: Heading::Outbound,
        }
    }

    pub fn coords(&self) -> Coord {
        self.route.path[self.position]
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn position(&self) -> usize {
        self.position
    }

    /// Restore progress from a save.
    pub fn restore_progress(&mut self, position: usize, heading: Heading) {
        self.position = position.min(self.route.path.len().saturating_sub(1));
        self.heading = heading;
    }

    /// Load up to the remaining carrying room from `offer`; the surplus is
    /// returned to the caller.
    pub fn store(&mut self, offer: Yield) -> Yield {
        let room = self.capacity.saturating_sub(self.carried);
        let accepted = offer.min(room);
        self.carried += accepted;
        offer.saturating_sub(accepted)
    }

    /// Walk one tile along the route, turning around at either end.
    pub fn step(&mut self) -> Option<TraderStop> {
        let last = self.route.path.len() - 1;
        match self.heading {
            Heading::Outbound => {
                self.position += 1;
                if self.position >= last {
                    self.position = last;
                    self.heading = Heading::Inbound;
                    return Some(TraderStop::Sink);
                }
            }
            Heading::Inbound => {
                self.position = self.position.saturating_sub(1);
                if self.position == 0 {
                    self.heading = Heading::Outbound;
                    return Some(TraderStop::Producer);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(len: usize) -> Route {
        Route {
            path: (0..len as i32).map(|x| Coord::new(x, 0)).collect(),
            distance: len as i32 - 1,
        }
    }

    #[test]
    fn round_trip_touches_both_ends() {
        let mut trader = Trader::new(CivId(0), route(3), 0, 2, TRADER_CAPACITY);
        assert_eq!(trader.step(), None);
        assert_eq!(trader.step(), Some(TraderStop::Sink));
        assert_eq!(trader.coords(), Coord::new(2, 0));
        assert_eq!(trader.step(), None);
        assert_eq!(trader.step(), Some(TraderStop::Producer));
        assert_eq!(trader.coords(), Coord::new(0, 0));
        assert_eq!(trader.heading(), Heading::Outbound);
    }

    #[test]
    fn two_tile_route_alternates_every_step() {
        let mut trader = Trader::new(CivId(0), route(2), 0, 1, TRADER_CAPACITY);
        assert_eq!(trader.step(), Some(TraderStop::Sink));
        assert_eq!(trader.step(), Some(TraderStop::Producer));
        assert_eq!(trader.step(), Some(TraderStop::Sink));
    }

    #[test]
    fn store_returns_surplus_above_capacity() {
        let mut trader = Trader::new(CivId(0), route(2), 0, 1, Yield::food(5));
        let surplus = trader.store(Yield::food(8) + Yield::production(2));
        assert_eq!(trader.carried, Yield::food(5));
        assert_eq!(surplus, Yield::food(3) + Yield::production(2));
    }
}
