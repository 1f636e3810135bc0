//! Server configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use windrose_core::MapGenConfig;

/// Session-level configuration. The save directory is the only external
/// filesystem touchpoint; everything else shapes the generated game.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Where snapshots are written.
    pub save_dir: PathBuf,
    /// Minimum civs to start (2-8).
    pub min_civs: u8,
    /// Maximum civs allowed (2-8).
    pub max_civs: u8,
    /// Map generation parameters for new games.
    pub map: MapGenConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            save_dir: PathBuf::from("saves"),
            min_civs: 2,
            max_civs: 8,
            map: MapGenConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_serializable() {
        let config = ServerConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_civs, 8);
        assert_eq!(back.map.width, config.map.width);
    }
}
