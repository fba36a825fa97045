//! Snapshot export/import and simple file persistence.
//!
//! The snapshot holds everything worth keeping across restarts: the event
//! state, guests, rooms and the legacy score log. Live connections and the
//! award catalog are runtime-only and are never part of it.

use super::AppState;
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::atomic::Ordering;

/// Schema version for snapshot compatibility
pub const EXPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed snapshot: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid snapshot: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateExport {
    pub schema_version: u32,
    /// Export timestamp (ISO8601)
    pub exported_at: String,
    #[serde(default)]
    pub event: EventState,
    #[serde(default)]
    pub guests: Vec<Guest>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    #[serde(default)]
    pub scores: Vec<ScoreEntry>,
}

impl StateExport {
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.schema_version > EXPORT_SCHEMA_VERSION {
            return Err(SnapshotError::Invalid(format!(
                "schema version {} is newer than supported version {}",
                self.schema_version, EXPORT_SCHEMA_VERSION
            )));
        }

        let mut guest_ids = HashSet::new();
        for guest in &self.guests {
            if !guest_ids.insert(guest.id) {
                return Err(SnapshotError::Invalid(format!(
                    "duplicate guest id {}",
                    guest.id
                )));
            }
        }

        let mut room_ids = HashSet::new();
        let mut room_codes = HashSet::new();
        for room in &self.rooms {
            if !room_ids.insert(room.id) {
                return Err(SnapshotError::Invalid(format!("duplicate room id {}", room.id)));
            }
            if !room_codes.insert(room.code.to_lowercase()) {
                return Err(SnapshotError::Invalid(format!(
                    "duplicate room code '{}'",
                    room.code
                )));
            }
        }

        Ok(())
    }
}

impl AppState {
    pub async fn export_state(&self) -> StateExport {
        StateExport {
            schema_version: EXPORT_SCHEMA_VERSION,
            exported_at: chrono::Utc::now().to_rfc3339(),
            event: self.event.snapshot().await,
            guests: self.guests.read().await.values().cloned().collect(),
            rooms: self.rooms.read().await.values().cloned().collect(),
            scores: self.score_log.read().await.clone(),
        }
    }

    /// Replace all records and the event state with a snapshot
    pub async fn import_state(&self, export: StateExport) -> Result<(), SnapshotError> {
        export.validate()?;

        let guests: BTreeMap<_, _> = export.guests.into_iter().map(|g| (g.id, g)).collect();
        let rooms: BTreeMap<_, _> = export.rooms.into_iter().map(|r| (r.id, r)).collect();

        // Readers score guests against the event state while holding the
        // guest lock, so both are swapped under it.
        let mut guest_table = self.guests.write().await;
        let mut room_table = self.rooms.write().await;
        let mut score_log = self.score_log.write().await;

        if let Some(max) = guests.keys().next_back() {
            self.next_guest_id.fetch_max(max + 1, Ordering::SeqCst);
        }
        if let Some(max) = rooms.keys().next_back() {
            self.next_room_id.fetch_max(max + 1, Ordering::SeqCst);
        }

        *guest_table = guests;
        *room_table = rooms;
        *score_log = export.scores;
        self.event.replace(export.event).await;

        tracing::info!("Imported snapshot from {}", export.exported_at);
        Ok(())
    }

    /// Write the current snapshot to the configured file, if any.
    ///
    /// Failures are logged; in-memory state stays authoritative.
    pub async fn persist(&self) {
        let Some(path) = self.snapshot_path.as_ref() else {
            return;
        };
        if let Err(e) = self.save_to(path).await {
            tracing::warn!("Failed to persist snapshot to {}: {}", path.display(), e);
        }
    }

    pub async fn save_to(&self, path: &Path) -> Result<(), SnapshotError> {
        let _guard = self.persist_lock.lock().await;
        let json = serde_json::to_vec_pretty(&self.export_state().await)?;

        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }

    /// Load a snapshot from `path`. A missing file is not an error.
    pub async fn load_from(&self, path: &Path) -> Result<bool, SnapshotError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        let export: StateExport = serde_json::from_slice(&bytes)?;
        self.import_state(export).await?;
        Ok(true)
    }
}
