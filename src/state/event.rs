use crate::types::{CategoryId, EventState, SelectionId};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Handle to the authoritative event state.
///
/// The whole record sits behind one lock, so every operation is a single
/// critical section and `snapshot` never sees fields from two different writes.
#[derive(Clone, Default)]
pub struct EventStore {
    inner: Arc<RwLock<EventState>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_state(state: EventState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    pub async fn lock(&self, locked: bool) {
        self.inner.write().await.locked = locked;
    }

    pub async fn set_current_category(&self, category: Option<CategoryId>) {
        self.inner.write().await.current_category = category;
    }

    /// Upsert the winner for a category. Last write wins.
    pub async fn set_winner(&self, category: CategoryId, selection: SelectionId) {
        self.inner.write().await.winners.insert(category, selection);
    }

    /// Returns whether a winner was removed
    pub async fn clear_winner(&self, category: CategoryId) -> bool {
        self.inner.write().await.winners.remove(&category).is_some()
    }

    pub async fn reset(&self) {
        *self.inner.write().await = EventState::default();
    }

    /// Replace the whole record (used by snapshot import)
    pub async fn replace(&self, state: EventState) {
        *self.inner.write().await = state;
    }

    pub async fn snapshot(&self) -> EventState {
        self.inner.read().await.clone()
    }
}
