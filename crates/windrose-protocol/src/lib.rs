//! Shared wire vocabulary for the Windrose game server: coordinates, ids,
//! yields, the closed-set catalogs, client actions, server events, and the
//! JSON wire helpers. Everything here is plain data — the simulation lives
//! in `windrose-core`.

mod catalog;
mod command;
mod coord;
mod data;
mod event;
mod ids;
pub mod wire;
mod yields;

pub use catalog::*;
pub use command::Action;
pub use coord::{Coord, Direction, DIRECTION_COUNT};
pub use data::{CivData, ImprovementData, TileData, UnitData};
pub use event::Event;
pub use ids::{CityId, CivId, EntityId, TraderId, UnitId};
pub use wire::WireError;
pub use yields::Yield;
