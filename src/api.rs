//! HTTP query interface.
//!
//! Reads and writes the same state as the real-time channel but never
//! broadcasts; clients that change state here announce it themselves.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::state::export::StateExport;
use crate::state::{AppState, RecordError};
use crate::types::*;

impl IntoResponse for RecordError {
    fn into_response(self) -> Response {
        let status = match self {
            RecordError::GuestNotFound(_) | RecordError::RoomNotFound(_) => StatusCode::NOT_FOUND,
            RecordError::DuplicateRoomCode(_) => StatusCode::CONFLICT,
            RecordError::EmptyRoomCode => StatusCode::BAD_REQUEST,
        };
        (status, self.to_string()).into_response()
    }
}

/// All `/data` and `/api` routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/data/awards", get(get_awards))
        .route("/data/app_state", get(get_app_state))
        .route("/data/app_state/lock", post(set_lock))
        .route("/data/app_state/current_award", post(set_current_award))
        .route("/data/app_state/winner", post(set_winner))
        .route("/data/app_state/winner/{award_id}", delete(clear_winner))
        .route("/data/app_state/reset", post(reset_app_state))
        .route(
            "/data/guests",
            get(list_guests).post(create_guest).delete(clear_guests),
        )
        .route("/data/guests_with_scores", get(list_guests_with_scores))
        .route(
            "/data/guests/{guest_id}",
            get(get_guest).put(update_guest).delete(delete_guest),
        )
        .route("/data/rooms", get(list_rooms).post(create_room))
        // GET looks rooms up by code, DELETE by numeric id
        .route(
            "/data/rooms/{key}",
            get(get_room_by_code).delete(delete_room),
        )
        .route("/data/scores", get(list_scores).delete(clear_scores))
        .route("/api/state/export", get(export_state))
        .route("/api/state/import", post(import_state))
}

#[derive(Debug, Deserialize)]
pub struct RoomFilter {
    pub room: Option<String>,
}

impl RoomFilter {
    fn code(&self) -> Option<&str> {
        self.room.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct LockRequest {
    pub locked: bool,
}

#[derive(Debug, Deserialize)]
pub struct CurrentAwardRequest {
    pub award_id: Option<CategoryId>,
}

#[derive(Debug, Deserialize)]
pub struct WinnerRequest {
    pub award_id: CategoryId,
    pub nominee_id: SelectionId,
}

#[derive(Debug, Deserialize)]
pub struct RoomRequest {
    pub name: String,
    pub code: String,
}

/// GET /data/awards
pub async fn get_awards(State(state): State<Arc<AppState>>) -> Json<Vec<Award>> {
    Json(state.catalog.as_ref().clone())
}

/// GET /data/app_state
pub async fn get_app_state(State(state): State<Arc<AppState>>) -> Json<EventState> {
    Json(state.event.snapshot().await)
}

/// POST /data/app_state/lock
pub async fn set_lock(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LockRequest>,
) -> StatusCode {
    state.event.lock(req.locked).await;
    state.persist().await;
    StatusCode::OK
}

/// POST /data/app_state/current_award
pub async fn set_current_award(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CurrentAwardRequest>,
) -> StatusCode {
    state.event.set_current_category(req.award_id).await;
    state.persist().await;
    StatusCode::OK
}

/// POST /data/app_state/winner
pub async fn set_winner(
    State(state): State<Arc<AppState>>,
    Json(req): Json<WinnerRequest>,
) -> StatusCode {
    state.event.set_winner(req.award_id, req.nominee_id).await;
    state.persist().await;
    StatusCode::OK
}

/// DELETE /data/app_state/winner/{award_id}
///
/// Clearing an award without a winner is not an error.
pub async fn clear_winner(
    State(state): State<Arc<AppState>>,
    Path(award_id): Path<CategoryId>,
) -> StatusCode {
    if state.event.clear_winner(award_id).await {
        state.persist().await;
    }
    StatusCode::NO_CONTENT
}

/// POST /data/app_state/reset
pub async fn reset_app_state(State(state): State<Arc<AppState>>) -> StatusCode {
    tracing::info!("Event state reset");
    state.event.reset().await;
    state.persist().await;
    StatusCode::OK
}

/// GET /data/guests?room=code
pub async fn list_guests(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<RoomFilter>,
) -> Json<Vec<Guest>> {
    Json(state.list_guests(filter.code()).await)
}

/// GET /data/guests_with_scores?room=code
pub async fn list_guests_with_scores(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<RoomFilter>,
) -> Json<Vec<ScoredGuest>> {
    Json(state.guests_with_scores(filter.code()).await)
}

/// GET /data/guests/{guest_id}
pub async fn get_guest(
    State(state): State<Arc<AppState>>,
    Path(guest_id): Path<GuestId>,
) -> Result<Json<ScoredGuest>, RecordError> {
    state
        .get_guest_with_score(guest_id)
        .await
        .map(Json)
        .ok_or(RecordError::GuestNotFound(guest_id))
}

/// POST /data/guests
pub async fn create_guest(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewGuest>,
) -> Json<Guest> {
    let guest = state.create_guest(new).await;
    state.persist().await;
    Json(guest)
}

/// PUT /data/guests/{guest_id}
pub async fn update_guest(
    State(state): State<Arc<AppState>>,
    Path(guest_id): Path<GuestId>,
    Json(update): Json<GuestUpdate>,
) -> Result<Json<Guest>, RecordError> {
    let guest = state.update_guest(guest_id, update).await?;
    state.persist().await;
    Ok(Json(guest))
}

/// DELETE /data/guests/{guest_id}
pub async fn delete_guest(
    State(state): State<Arc<AppState>>,
    Path(guest_id): Path<GuestId>,
) -> Result<StatusCode, RecordError> {
    state.delete_guest(guest_id).await?;
    state.persist().await;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /data/guests
pub async fn clear_guests(State(state): State<Arc<AppState>>) -> StatusCode {
    state.clear_guests().await;
    state.persist().await;
    StatusCode::NO_CONTENT
}

/// GET /data/rooms
pub async fn list_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<Room>> {
    Json(state.list_rooms().await)
}

/// GET /data/rooms/{key}
pub async fn get_room_by_code(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Response {
    match state.get_room_by_code(&code).await {
        Some(room) => Json(room).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// POST /data/rooms
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RoomRequest>,
) -> Result<Json<Room>, RecordError> {
    let room = state.create_room(req.name, &req.code).await?;
    state.persist().await;
    Ok(Json(room))
}

/// DELETE /data/rooms/{key}
pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<RoomId>,
) -> Result<StatusCode, RecordError> {
    state.delete_room(room_id).await?;
    state.persist().await;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /data/scores
pub async fn list_scores(State(state): State<Arc<AppState>>) -> Json<Vec<ScoreEntry>> {
    Json(state.list_scores().await)
}

/// DELETE /data/scores
pub async fn clear_scores(State(state): State<Arc<AppState>>) -> StatusCode {
    state.clear_scores().await;
    state.persist().await;
    StatusCode::NO_CONTENT
}

/// GET /api/state/export
pub async fn export_state(State(state): State<Arc<AppState>>) -> Json<StateExport> {
    Json(state.export_state().await)
}

/// POST /api/state/import
///
/// Replaces guests, rooms, score log and event state. Connected clients are
/// not notified.
pub async fn import_state(
    State(state): State<Arc<AppState>>,
    Json(export): Json<StateExport>,
) -> Response {
    match state.import_state(export).await {
        Ok(()) => {
            state.persist().await;
            (StatusCode::OK, "State imported successfully").into_response()
        }
        Err(e) => {
            tracing::error!("State import failed: {}", e);
            (StatusCode::BAD_REQUEST, format!("Import failed: {}", e)).into_response()
        }
    }
}
