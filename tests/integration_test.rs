use awardnight::broadcast::ConnectionId;
use awardnight::state::AppState;
use awardnight::types::{EventState, GuestId, NewGuest};
use awardnight::ws::handlers::{handle_message, Dispatch};
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use futures::{SinkExt, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tower::ServiceExt;

async fn connect(state: &AppState, buffer: usize) -> (ConnectionId, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(buffer);
    (state.connections.register(tx).await, rx)
}

fn drain(rx: &mut mpsc::Receiver<String>) -> Vec<String> {
    let mut out = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        out.push(msg);
    }
    out
}

async fn score_of(state: &AppState, id: GuestId) -> u32 {
    state.get_guest_with_score(id).await.unwrap().score
}

/// Lock, reveal two winners, reset: every client sees every frame and the
/// guest's score follows the revealed winners.
#[tokio::test]
async fn test_reveal_night_flow() {
    let state = Arc::new(AppState::new());
    let (admin, mut admin_rx) = connect(&state, 32).await;
    let (_screen, mut screen_rx) = connect(&state, 32).await;
    let (_guest_conn, mut guest_rx) = connect(&state, 32).await;

    let guest = state
        .create_guest(NewGuest {
            name: "Ada".to_string(),
            predictions: [(3, 7), (4, 2)].into_iter().collect(),
            ..NewGuest::default()
        })
        .await;

    assert_eq!(state.event.snapshot().await, EventState::default());

    let result = handle_message("lockPredictions", &admin, &state).await;
    assert_eq!(result, Ok(Dispatch::Broadcast { delivered: 3 }));
    assert!(state.event.snapshot().await.locked);

    handle_message("selectWinner+++3+++7", &admin, &state)
        .await
        .unwrap();
    assert_eq!(state.event.snapshot().await.winners.get(&3), Some(&7));
    assert_eq!(score_of(&state, guest.id).await, 1);

    handle_message("selectWinner+++4+++2", &admin, &state)
        .await
        .unwrap();
    assert_eq!(score_of(&state, guest.id).await, 2);

    state.event.reset().await;
    assert!(state.event.snapshot().await.winners.is_empty());
    assert_eq!(score_of(&state, guest.id).await, 0);

    let expected = vec![
        "lockPredictions".to_string(),
        "selectWinner+++3+++7".to_string(),
        "selectWinner+++4+++2".to_string(),
    ];
    assert_eq!(drain(&mut admin_rx), expected);
    assert_eq!(drain(&mut screen_rx), expected);
    assert_eq!(drain(&mut guest_rx), expected);
}

#[tokio::test]
async fn test_fan_out_order_survives_one_failing_connection() {
    let state = Arc::new(AppState::new());
    let (admin, mut admin_rx) = connect(&state, 64).await;
    let mut others = Vec::new();
    for _ in 0..4 {
        others.push(connect(&state, 64).await);
    }

    let frames: Vec<String> = (0..20)
        .map(|i| format!("setCurrentAward+++{}", i))
        .collect();
    for (i, frame) in frames.iter().enumerate() {
        if i == 7 {
            // One display disappears mid-sequence
            let (_, rx) = others.remove(2);
            drop(rx);
        }
        handle_message(frame, &admin, &state).await.unwrap();
    }

    assert_eq!(state.connections.len().await, 4);
    assert_eq!(drain(&mut admin_rx), frames);
    for (_, rx) in others.iter_mut() {
        assert_eq!(drain(rx), frames);
    }
    assert_eq!(state.event.snapshot().await.current_category, Some(19));
}

#[tokio::test]
async fn test_ping_is_point_to_point() {
    let state = Arc::new(AppState::new());
    let (a, mut a_rx) = connect(&state, 8).await;
    let (_b, mut b_rx) = connect(&state, 8).await;

    handle_message("guestSubmitted+++1+++Ada", &a, &state)
        .await
        .unwrap();
    handle_message("__ping__", &a, &state).await.unwrap();

    assert_eq!(
        drain(&mut a_rx),
        vec!["guestSubmitted+++1+++Ada".to_string(), "__pong__".to_string()]
    );
    assert_eq!(drain(&mut b_rx), vec!["guestSubmitted+++1+++Ada".to_string()]);
}

#[tokio::test]
async fn test_concurrent_admins_last_write_wins() {
    let state = Arc::new(AppState::new());
    let (admin, _rx) = connect(&state, 512).await;

    let mut handles = Vec::new();
    for category in 0..20i64 {
        let state = state.clone();
        handles.push(tokio::spawn(async move {
            let frame = format!("selectWinner+++{}+++{}", category, category + 100);
            handle_message(&frame, &admin, &state).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let winners = state.event.snapshot().await.winners;
    assert_eq!(winners.len(), 20);
    assert!(winners.iter().all(|(c, s)| *s == c + 100));
}

// HTTP query interface

fn app(state: Arc<AppState>) -> axum::Router {
    awardnight::app(state, Path::new("static"))
}

fn request(method: Method, uri: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(
    state: &Arc<AppState>,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let response = app(state.clone())
        .oneshot(request(method, uri, body))
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_query_interface_shares_state_and_stays_silent() {
    let state = Arc::new(AppState::new());
    let (admin, mut rx) = connect(&state, 8).await;

    let (status, _) = send(
        &state,
        Method::POST,
        "/data/app_state/winner",
        Some(serde_json::json!({"award_id": 3, "nominee_id": 7})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(
        &state,
        Method::POST,
        "/data/app_state/lock",
        Some(serde_json::json!({"locked": true})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Visible to the real-time path, but nothing was broadcast
    assert_eq!(state.event.snapshot().await.winners.get(&3), Some(&7));
    assert!(drain(&mut rx).is_empty());

    // Real-time mutation is visible to the query path
    handle_message("setCurrentAward+++3", &admin, &state)
        .await
        .unwrap();
    let (_, body) = send(&state, Method::GET, "/data/app_state", None).await;
    assert_eq!(body["predictions_locked"], true);
    assert_eq!(body["current_award_id"], 3);
    assert_eq!(body["winners"]["3"], 7);

    let (status, _) = send(&state, Method::DELETE, "/data/app_state/winner/3", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    // Clearing again is still fine
    let (status, _) = send(&state, Method::DELETE, "/data/app_state/winner/3", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&state, Method::POST, "/data/app_state/reset", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(state.event.snapshot().await, EventState::default());
}

#[tokio::test]
async fn test_guests_with_scores_by_room() {
    let state = Arc::new(AppState::new());

    let (status, ada) = send(
        &state,
        Method::POST,
        "/data/guests",
        Some(serde_json::json!({
            "name": "Ada",
            "predictions": {"3": 7, "4": 2},
            "rooms": ["Den"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    send(
        &state,
        Method::POST,
        "/data/guests",
        Some(serde_json::json!({"name": "Bob", "predictions": {"3": 8}})),
    )
    .await;

    state.event.set_winner(3, 7).await;

    let (_, all) = send(&state, Method::GET, "/data/guests_with_scores", None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
    assert_eq!(all[0]["score"], 1);
    assert_eq!(all[1]["score"], 0);

    let (_, den) = send(&state, Method::GET, "/data/guests_with_scores?room=den", None).await;
    assert_eq!(den.as_array().unwrap().len(), 1);
    assert_eq!(den[0]["name"], "Ada");

    let uri = format!("/data/guests/{}", ada["id"]);
    let (status, _) = send(
        &state,
        Method::PUT,
        &uri,
        Some(serde_json::json!({"predictions": {"3": 8}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (_, ada) = send(&state, Method::GET, &uri, None).await;
    assert_eq!(ada["score"], 0);
    assert_eq!(ada["rooms"][0], "Den");

    let (status, _) = send(&state, Method::GET, "/data/guests/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rooms() {
    let state = Arc::new(AppState::new());

    let (status, room) = send(
        &state,
        Method::POST,
        "/data/rooms",
        Some(serde_json::json!({"name": "Den", "code": "DEN"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["code"], "den");

    let (status, _) = send(
        &state,
        Method::POST,
        "/data/rooms",
        Some(serde_json::json!({"name": "Other", "code": "den"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, found) = send(&state, Method::GET, "/data/rooms/den", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["name"], "Den");

    let (status, _) = send(&state, Method::GET, "/data/rooms/attic", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/data/rooms/{}", room["id"]);
    let (status, _) = send(&state, Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, rooms) = send(&state, Method::GET, "/data/rooms", None).await;
    assert!(rooms.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_export_import_roundtrip_over_http() {
    let source = Arc::new(AppState::new());
    source.event.set_winner(1, 10).await;
    source
        .create_guest(NewGuest {
            name: "Ada".to_string(),
            predictions: [(1, 10)].into_iter().collect(),
            ..NewGuest::default()
        })
        .await;
    let (_, export) = send(&source, Method::GET, "/api/state/export", None).await;
    assert_eq!(export["schema_version"], 1);

    let target = Arc::new(AppState::new());
    let (status, _) = send(&target, Method::POST, "/api/state/import", Some(export)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(target.guests_with_scores(None).await[0].score, 1);

    let (status, _) = send(
        &target,
        Method::POST,
        "/api/state/import",
        Some(serde_json::json!({"schema_version": 99, "exported_at": "later"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_legacy_scores_endpoint() {
    let state = Arc::new(AppState::new());
    let (conn, _rx) = connect(&state, 8).await;
    handle_message("setScore+++Ada+++Task 1+++4", &conn, &state)
        .await
        .unwrap();

    let (_, scores) = send(&state, Method::GET, "/data/scores", None).await;
    assert_eq!(scores[0]["contestant"], "Ada");
    assert_eq!(scores[0]["points"], "4");

    let (status, _) = send(&state, Method::DELETE, "/data/scores", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(state.list_scores().await.is_empty());
}

// Live WebSocket path

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

const TIMEOUT: Duration = Duration::from_secs(5);

async fn serve(state: Arc<AppState>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app(state)).await.unwrap();
    });
    format!("ws://{addr}/ws")
}

async fn open_socket(url: &str) -> WsStream {
    let (ws, _) = connect_async(url).await.unwrap();
    ws
}

async fn next_text(ws: &mut WsStream) -> String {
    loop {
        let msg = timeout(TIMEOUT, ws.next())
            .await
            .expect("timeout waiting for frame")
            .expect("stream closed")
            .expect("ws error");
        if let Message::Text(text) = msg {
            return text.as_str().to_string();
        }
    }
}

/// Registration happens after the handshake completes, so poll for it
async fn wait_for_open(state: &AppState, expected: usize) {
    timeout(TIMEOUT, async {
        while state.connections.len().await != expected {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("expected {expected} open connections"));
}

#[tokio::test]
async fn test_live_socket_broadcast_pong_and_close() {
    let state = Arc::new(AppState::new());
    let url = serve(state.clone()).await;

    let mut admin = open_socket(&url).await;
    let mut screen = open_socket(&url).await;
    wait_for_open(&state, 2).await;

    admin
        .send(Message::text("selectWinner+++3+++7"))
        .await
        .unwrap();
    assert_eq!(next_text(&mut admin).await, "selectWinner+++3+++7");
    assert_eq!(next_text(&mut screen).await, "selectWinner+++3+++7");
    assert_eq!(state.event.snapshot().await.winners.get(&3), Some(&7));

    admin.send(Message::text("__ping__")).await.unwrap();
    assert_eq!(next_text(&mut admin).await, "__pong__");

    // The screen's next frame is its own broadcast, never the admin's pong
    screen.send(Message::text("lockPredictions")).await.unwrap();
    assert_eq!(next_text(&mut screen).await, "lockPredictions");
    assert_eq!(next_text(&mut admin).await, "lockPredictions");

    admin.close(None).await.unwrap();
    wait_for_open(&state, 1).await;

    screen.send(Message::text("unlockPredictions")).await.unwrap();
    assert_eq!(next_text(&mut screen).await, "unlockPredictions");
    assert!(!state.event.snapshot().await.locked);
}
