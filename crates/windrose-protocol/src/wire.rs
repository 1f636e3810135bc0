use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Action, Event};

#[derive(Debug, Error)]
pub enum WireError {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outbound message envelope: `{ "update": [[name, args], ...] }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdateEnvelope {
    pub update: Vec<Event>,
}

#[derive(Serialize)]
struct UpdateRef<'a> {
    update: &'a [Event],
}

pub fn serialize_update(events: &[Event]) -> Result<String, WireError> {
    Ok(serde_json::to_string(&UpdateRef { update: events })?)
}

pub fn deserialize_update(json: &str) -> Result<Vec<Event>, WireError> {
    let envelope: UpdateEnvelope = serde_json::from_str(json)?;
    Ok(envelope.update)
}

pub fn serialize_action(action: &Action) -> Result<String, WireError> {
    Ok(serde_json::to_string(action)?)
}

pub fn deserialize_action(json: &str) -> Result<Action, WireError> {
    Ok(serde_json::from_str(json)?)
}

/// Deterministic, stable 64-bit hash for raw bytes (FNV-1a). Used to
/// fingerprint exported worlds in game snapshots, verified on load.
pub fn hash_bytes_fnv1a64(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    let mut hash = OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_round_trips() {
        let events = vec![Event::BeginTurn, Event::EndTurn];
        let json = serialize_update(&events).unwrap();
        assert_eq!(json, "{\"update\":[[\"beginTurn\",[]],[\"endTurn\",[]]]}");
        assert_eq!(deserialize_update(&json).unwrap(), events);
    }

    #[test]
    fn fnv_matches_reference_vector() {
        // FNV-1a("a") from the published test vectors.
        assert_eq!(hash_bytes_fnv1a64(b"a"), 0xaf63dc4c8601ec8c);
    }
}
