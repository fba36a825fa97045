pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::state::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Everything sent to this client goes through its queue, drained here in order
    let (tx, mut rx) = mpsc::channel::<String>(state.outbound_buffer);
    let conn_id = state.connections.register(tx).await;
    tracing::info!(
        "WebSocket connected: {} ({} open)",
        conn_id,
        state.connections.len().await
    );

    let mut writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sender.send(Message::Text(text.into())).await.is_err() {
                tracing::debug!("Write to {} failed, stopping writer", conn_id);
                break;
            }
        }
        let _ = sender.close().await;
    });

    loop {
        tokio::select! {
            // Writer ended: the socket is dead or the registry dropped us
            _ = &mut writer => break,

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received from {}: {}", conn_id, text.as_str());
                        if let Err(e) = handlers::handle_message(text.as_str(), &conn_id, &state).await {
                            tracing::warn!("Dropped message from {}: {}", conn_id, e);
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket {} closed by client", conn_id);
                        break;
                    }
                    // Protocol-level ping/pong is answered by the websocket layer
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!("WebSocket {} error: {}", conn_id, e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    state.connections.unregister(&conn_id).await;
    writer.abort();
    tracing::info!("WebSocket connection closed: {}", conn_id);
}
