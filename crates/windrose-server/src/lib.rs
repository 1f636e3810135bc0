//! Windrose game server: seats, session orchestration and snapshot
//! persistence around the `windrose-core` simulation.
//!
//! Transport is deliberately absent — a connected player is anything with
//! a `send(String)` sink, and the session is driven by calling
//! [`GameSession::handle_action`] from whatever loop owns the sockets.

pub mod config;
pub mod persist;
pub mod seats;
pub mod session;

pub use config::ServerConfig;
pub use persist::{
    read_save, restore_session, snapshot_session, world_checksum, write_save, GameSave,
    PersistError, PlayerRecord,
};
pub use seats::{ClientSink, JoinError, Seat, SeatState, SeatTable};
pub use session::{GameSession, StartError};
