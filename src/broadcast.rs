//! Registry of live connections and fan-out to them.
//!
//! Every connection owns a bounded FIFO queue drained by its writer task.
//! Broadcasting pushes into each queue without waiting; a queue that is closed
//! (writer gone) or full (client stalled) counts as a disconnect and the
//! connection is dropped from the registry.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

pub type ConnectionId = ulid::Ulid;
pub type Outbound = mpsc::Sender<String>;

pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;

#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<RwLock<HashMap<ConnectionId, Outbound>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, sender: Outbound) -> ConnectionId {
        let id = ulid::Ulid::new();
        self.connections.write().await.insert(id, sender);
        tracing::debug!("Registered connection {}", id);
        id
    }

    /// Returns false if the connection was already gone
    pub async fn unregister(&self, id: &ConnectionId) -> bool {
        let removed = self.connections.write().await.remove(id).is_some();
        if removed {
            tracing::debug!("Unregistered connection {}", id);
        }
        removed
    }

    /// Deliver `message` to every registered connection.
    ///
    /// Returns the number of connections that accepted it. Connections whose
    /// queue rejects the message are removed.
    pub async fn broadcast(&self, message: &str) -> usize {
        // Hold the write lock for the whole pass so concurrent broadcasts
        // land in every queue in the same order.
        let mut connections = self.connections.write().await;
        let before = connections.len();

        connections.retain(|id, sender| match sender.try_send(message.to_string()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!("Connection {} is stalled, dropping it", id);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::info!("Connection {} went away during broadcast", id);
                false
            }
        });

        let delivered = connections.len();
        if delivered < before {
            tracing::debug!(
                "Broadcast delivered to {} connection(s), dropped {}",
                delivered,
                before - delivered
            );
        }
        delivered
    }

    /// Deliver `message` to a single connection through its queue
    pub async fn send_to(&self, id: &ConnectionId, message: &str) -> bool {
        let mut connections = self.connections.write().await;
        let Some(sender) = connections.get(id) else {
            return false;
        };
        if sender.try_send(message.to_string()).is_ok() {
            true
        } else {
            tracing::info!("Connection {} unreachable, dropping it", id);
            connections.remove(id);
            false
        }
    }

    pub async fn len(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.connections.read().await.is_empty()
    }

    pub async fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.read().await.contains_key(id)
    }
}
