//! Snapshot persistence: the on-disk game shape and the save directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use windrose_core::{export_world, import_world, Registry, SaveError, WorldExport};
use windrose_protocol::{wire, CivId};

use crate::config::ServerConfig;
use crate::session::GameSession;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupt snapshot: {0}")]
    Corrupt(#[from] SaveError),
    #[error("snapshot checksum mismatch (expected {expected:016x}, found {found:016x})")]
    ChecksumMismatch { expected: u64, found: u64 },
    #[error("session has no world to save")]
    NotStarted,
}

/// The complete on-disk snapshot of a game.
///
/// `checksum` fingerprints the exported world (FNV-1a over its JSON form)
/// and is verified on load; 0 means unfingerprinted.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSave {
    pub world: WorldExport,
    pub players: Vec<PlayerRecord>,
    pub player_count: u32,
    pub meta_data: serde_json::Value,
    pub has_started: bool,
    #[serde(default)]
    pub checksum: u64,
}

/// Deterministic fingerprint of an exported world.
pub fn world_checksum(world: &WorldExport) -> Result<u64, PersistError> {
    let bytes = serde_json::to_vec(world)?;
    Ok(wire::hash_bytes_fnv1a64(&bytes))
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub civ: CivId,
    pub name: String,
    pub is_ai: bool,
}

/// Capture a running session as a snapshot.
pub fn snapshot_session(session: &GameSession) -> Result<GameSave, PersistError> {
    let world = session.world().ok_or(PersistError::NotStarted)?;
    let players = session
        .seats()
        .civs()
        .map(|civ| PlayerRecord {
            civ,
            name: session
                .seats()
                .name_of(civ)
                .unwrap_or_default()
                .to_string(),
            is_ai: !session.seats().is_human(civ),
        })
        .collect::<Vec<_>>();
    let world = export_world(world);
    let checksum = world_checksum(&world)?;
    Ok(GameSave {
        world,
        player_count: players.len() as u32,
        players,
        meta_data: session.meta.clone(),
        has_started: session.has_started(),
        checksum,
    })
}

/// Rebuild a session from a snapshot. Every seat comes back as AI; humans
/// reattach through the lobby, which is outside the core.
pub fn restore_session(config: ServerConfig, save: GameSave) -> Result<GameSession, PersistError> {
    let world = import_world(save.world, Registry::standard())?;
    let mut session = GameSession::new(config);
    for player in &save.players {
        let _ = session.add_ai(player.name.clone());
    }
    session.meta = save.meta_data;
    session.restore_world(world, save.has_started);
    Ok(session)
}

pub fn save_path(dir: &Path, slot: &str) -> PathBuf {
    dir.join(format!("{slot}.json"))
}

pub fn write_save(save: &GameSave, dir: &Path, slot: &str) -> Result<PathBuf, PersistError> {
    fs::create_dir_all(dir)?;
    let path = save_path(dir, slot);
    let json = serde_json::to_string(save)?;
    fs::write(&path, json)?;
    info!(path = %path.display(), checksum = save.checksum, "snapshot written");
    Ok(path)
}

/// Read a snapshot back, verifying its world fingerprint. No partial state
/// escapes a corrupt file.
pub fn read_save(dir: &Path, slot: &str) -> Result<GameSave, PersistError> {
    let json = fs::read_to_string(save_path(dir, slot))?;
    let save: GameSave = serde_json::from_str(&json)?;
    if save.checksum != 0 {
        let found = world_checksum(&save.world)?;
        if found != save.checksum {
            return Err(PersistError::ChecksumMismatch {
                expected: save.checksum,
                found,
            });
        }
    }
    Ok(save)
}

#[cfg(test)]
mod tests {
    use super::*;
    use windrose_core::MapGenConfig;

    fn tiny_config(dir: &Path) -> ServerConfig {
        ServerConfig {
            save_dir: dir.to_path_buf(),
            map: MapGenConfig {
                width: 16,
                height: 12,
                seed: 5,
                ..MapGenConfig::default()
            },
            ..ServerConfig::default()
        }
    }

    #[test]
    fn snapshot_survives_disk_and_restore() {
        let dir = tempfile::tempdir().unwrap();
        let config = tiny_config(dir.path());

        let mut session = GameSession::new(config.clone());
        session.add_ai("a".into()).unwrap();
        session.add_ai("b".into()).unwrap();
        session.start().unwrap();
        session.advance_round();

        let save = snapshot_session(&session).unwrap();
        assert_ne!(save.checksum, 0);
        write_save(&save, dir.path(), "slot0").unwrap();
        let loaded = read_save(dir.path(), "slot0").unwrap();
        assert_eq!(loaded.player_count, 2);
        assert_eq!(loaded.checksum, save.checksum);
        assert!(loaded.has_started);

        let restored = restore_session(config, loaded).unwrap();
        let restored_save = snapshot_session(&restored).unwrap();
        assert_eq!(
            serde_json::to_value(&save.world).unwrap(),
            serde_json::to_value(&restored_save.world).unwrap()
        );
    }

    #[test]
    fn tampered_world_fails_the_checksum() {
        let dir = tempfile::tempdir().unwrap();
        let config = tiny_config(dir.path());

        let mut session = GameSession::new(config);
        session.add_ai("a".into()).unwrap();
        session.add_ai("b".into()).unwrap();
        session.start().unwrap();

        let mut save = snapshot_session(&session).unwrap();
        save.world.turn += 1; // drift the world without refreshing the fingerprint
        write_save(&save, dir.path(), "slot1").unwrap();

        assert!(matches!(
            read_save(dir.path(), "slot1"),
            Err(PersistError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn unstarted_sessions_cannot_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let session = GameSession::new(tiny_config(dir.path()));
        assert!(matches!(
            snapshot_session(&session),
            Err(PersistError::NotStarted)
        ));
    }
}
