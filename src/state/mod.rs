mod event;
pub mod export;
mod guest;
mod ledger;
mod score;

pub use event::EventStore;
pub use score::score;

use crate::broadcast::{ConnectionRegistry, DEFAULT_OUTBOUND_BUFFER};
use crate::types::*;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Errors from the guest/room record store
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("Guest {0} not found")]
    GuestNotFound(GuestId),

    #[error("Room {0} not found")]
    RoomNotFound(RoomId),

    #[error("Room code '{0}' already exists")]
    DuplicateRoomCode(String),

    #[error("Room code must not be empty")]
    EmptyRoomCode,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Live event state (lock flag, current award, winners)
    pub event: EventStore,
    /// Open real-time connections
    pub connections: ConnectionRegistry,
    pub guests: Arc<RwLock<BTreeMap<GuestId, Guest>>>,
    pub rooms: Arc<RwLock<BTreeMap<RoomId, Room>>>,
    /// Next ids to hand out; never reused within a process, even after deletes
    next_guest_id: Arc<AtomicU64>,
    next_room_id: Arc<AtomicU64>,
    /// Entries written by the legacy `setScore` message
    pub score_log: Arc<RwLock<Vec<ScoreEntry>>>,
    /// Read-only award catalog
    pub catalog: Arc<Vec<Award>>,
    /// Queue length per connection before it counts as stalled
    pub outbound_buffer: usize,
    /// Snapshot file, when persistence is enabled
    snapshot_path: Option<PathBuf>,
    /// Serializes snapshot writes
    persist_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_catalog(Vec::new())
    }

    pub fn with_catalog(catalog: Vec<Award>) -> Self {
        Self {
            event: EventStore::new(),
            connections: ConnectionRegistry::new(),
            guests: Arc::new(RwLock::new(BTreeMap::new())),
            rooms: Arc::new(RwLock::new(BTreeMap::new())),
            next_guest_id: Arc::new(AtomicU64::new(1)),
            next_room_id: Arc::new(AtomicU64::new(1)),
            score_log: Arc::new(RwLock::new(Vec::new())),
            catalog: Arc::new(catalog),
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            snapshot_path: None,
            persist_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Enable snapshot persistence to `path`
    pub fn with_snapshot_path(mut self, path: PathBuf) -> Self {
        self.snapshot_path = Some(path);
        self
    }

    pub fn with_outbound_buffer(mut self, size: usize) -> Self {
        self.outbound_buffer = size.max(1);
        self
    }

    pub fn snapshot_path(&self) -> Option<&PathBuf> {
        self.snapshot_path.as_ref()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
