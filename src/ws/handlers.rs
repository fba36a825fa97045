//! Inbound message dispatch
//!
//! Every frame is classified, its state effect applied, and then the original
//! text is re-broadcast to all connections. The heartbeat is the exception: it
//! is answered on the originating connection only.

use crate::broadcast::ConnectionId;
use crate::protocol::{Command, InboundMessage, ProtocolError, PONG};
use crate::state::AppState;
use std::sync::Arc;

/// What happened to a dispatched frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Raw frame fanned out; number of connections that accepted it
    Broadcast { delivered: usize },
    /// Heartbeat answered on the originating connection
    Pong { delivered: bool },
}

/// Handle one inbound frame from `origin`.
///
/// A malformed frame changes nothing and is not broadcast.
pub async fn handle_message(
    raw: &str,
    origin: &ConnectionId,
    state: &Arc<AppState>,
) -> Result<Dispatch, ProtocolError> {
    let msg = InboundMessage::parse(raw)?;

    if msg.command == Command::Ping {
        let delivered = state.connections.send_to(origin, PONG).await;
        return Ok(Dispatch::Pong { delivered });
    }

    if apply(state, &msg.command).await {
        state.persist().await;
    }

    let delivered = state.connections.broadcast(&msg.raw).await;
    Ok(Dispatch::Broadcast { delivered })
}

/// Apply the state effect of a command. Returns whether anything was written.
async fn apply(state: &AppState, command: &Command) -> bool {
    match command {
        Command::SetScore { args } => state.record_score(args).await.is_some(),
        Command::LockPredictions => {
            tracing::info!("Predictions locked");
            state.event.lock(true).await;
            true
        }
        Command::UnlockPredictions => {
            tracing::info!("Predictions unlocked");
            state.event.lock(false).await;
            true
        }
        Command::SetCurrentAward { category } => {
            tracing::info!("Current award: {:?}", category);
            state.event.set_current_category(*category).await;
            true
        }
        Command::SelectWinner {
            category,
            selection,
        } => {
            tracing::info!("Winner for award {}: nominee {}", category, selection);
            state.event.set_winner(*category, *selection).await;
            true
        }
        Command::Ping | Command::PassThrough => false,
    }
}
