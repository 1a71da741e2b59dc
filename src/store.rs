//! Per-room snapshot persistence: one JSON file per room under a namespaced
//! file name. Reads are guarded; anything malformed degrades to "no saved
//! game" so the driver can treat it as a fresh start.

use crate::types::{GameState, RoomId, SCHEMA_VERSION};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Namespace prefix so room files can share a directory with anything else.
const ROOM_FILE_PREFIX: &str = "partydeck.room.";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encoding: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Minimal structural check shared with the sync bus: schema version tag,
/// a room id, a phase, and a players collection must be present.
pub fn validate_snapshot(value: &Value) -> bool {
    value.get("schema_version").and_then(Value::as_u64) == Some(SCHEMA_VERSION as u64)
        && value
            .get("room_id")
            .and_then(Value::as_str)
            .map(|s| !s.is_empty())
            .unwrap_or(false)
        && value.get("phase").map(Value::is_string).unwrap_or(false)
        && value.get("players").map(Value::is_array).unwrap_or(false)
}

/// Decode an untrusted snapshot value, or nothing.
pub fn decode_snapshot(value: Value) -> Option<GameState> {
    if !validate_snapshot(&value) {
        return None;
    }
    serde_json::from_value(value).ok()
}

pub struct RoomStore {
    dir: PathBuf,
}

impl RoomStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Mint a fresh room and persist its empty state.
    pub fn create_room(&self) -> Result<GameState, StoreError> {
        let state = GameState::new(ulid::Ulid::new().to_string());
        self.save(&state)?;
        tracing::info!(room = %state.room_id, "room created");
        Ok(state)
    }

    pub fn save(&self, state: &GameState) -> Result<(), StoreError> {
        let json = serde_json::to_string(state)?;
        fs::write(self.path_for(&state.room_id), json)?;
        Ok(())
    }

    /// Load a room's snapshot. Missing file, bad JSON, or a payload that
    /// fails the structural check all read as "not found".
    pub fn load(&self, room_id: &str) -> Option<GameState> {
        let raw = match fs::read_to_string(self.path_for(room_id)) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(room = %room_id, error = %e, "failed to read snapshot");
                return None;
            }
        };
        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(room = %room_id, error = %e, "snapshot is not valid json");
                return None;
            }
        };
        let state = decode_snapshot(value);
        if state.is_none() {
            tracing::warn!(room = %room_id, "snapshot failed structural validation");
        }
        state
    }

    /// Remove a room's snapshot. Deleting a room that was never saved is
    /// not an error.
    pub fn delete(&self, room_id: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(room_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_rooms(&self) -> Vec<RoomId> {
        let mut rooms = Vec::new();
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(_) => return rooms,
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(room) = name
                .strip_prefix(ROOM_FILE_PREFIX)
                .and_then(|rest| rest.strip_suffix(".json"))
            {
                rooms.push(room.to_string());
            }
        }
        rooms.sort();
        rooms
    }

    fn path_for(&self, room_id: &str) -> PathBuf {
        self.dir.join(format!("{}{}.json", ROOM_FILE_PREFIX, room_id))
    }
}
