//! The Windrose simulation core: the hex map and its queries, the
//! tile/improvement/errand/trader economy, per-civ visibility, and the turn
//! orchestration that composes them. Transport and session concerns live in
//! `windrose-server`; shared wire types in `windrose-protocol`.

mod civ;
mod entities;
mod improvement;
mod knowledge;
pub mod map;
pub mod mapgen;
mod registry;
mod rng;
pub mod save;
mod store;
mod tile;
mod trader;
mod unit;
mod world;

pub use civ::{City, Civilization, CIV_COLORS};
pub use entities::EntityStore;
pub use improvement::{ErrandOption, Improvement, WorkErrand};
pub use knowledge::{TileKnowledge, SPILLOVER_DECAY};
pub use map::{Map, PathTree, VisionParams, TRADE_ROUTE_RANGE};
pub use mapgen::{generate_terrain, MapGenConfig};
pub use registry::{ImprovementSpec, KnowledgeSpec, Registry, TerrainSpec, UnitSpec};
pub use rng::GameRng;
pub use save::{export_world, import_world, SaveError, WorldExport};
pub use store::ResourceStore;
pub use tile::Tile;
pub use trader::{Heading, Route, Trader, TraderStop, TRADER_CAPACITY, TRADER_SPEED};
pub use unit::Unit;
pub use world::{ActionError, World, TURN_VISION_RADIUS};
