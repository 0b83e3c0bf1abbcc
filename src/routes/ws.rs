//! WebSocket handler: the session gateway.
//!
//! DESIGN
//! ======
//! On upgrade, generates a connection ID and enters a `select!` loop:
//! - Incoming client frames: validate + dispatch by event name
//! - Broadcast frames from board peers: forward to the client
//!
//! Handler functions validate, call the engine services, and return an
//! `Outcome` for everything addressed to the sender (acks, `board:init`,
//! `board:not-found`). Stroke and history operations are the exception:
//! they multicast to the room while the board lock is still held, so every
//! member observes the same per-board order of mutations.
//!
//! ERROR HANDLING
//! ==============
//! Malformed frames (bad JSON, missing or empty required fields) are logged
//! and dropped; nothing a client sends can crash its connection. Operations
//! on unknown boards answer `board:not-found` to the sender only.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade: send `session:connected` with the connection ID
//! 2. Client frames: dispatch, apply outcome
//! 3. Close: rooms left, membership drained (occupancy decrements, vacancy
//!    checks armed), presence dropped with `users:update` per affected
//!    board

use std::collections::HashSet;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::frame::{Data, Frame};
use crate::services::{history, stroke_log};
use crate::state::{AppState, BoardState, Stroke};

/// Outbound capacity per connection; slow clients drop frames past this.
const CLIENT_CHANNEL_CAPACITY: usize = 256;

// =============================================================================
// OUTCOME
// =============================================================================

/// Result returned by handler functions for sender-directed traffic. Room
/// multicast for stroke and history operations happens inside the handlers,
/// under the board lock (see module docs).
enum Outcome {
    /// Ack the request with this payload.
    Ack(Data),
    /// Send an event frame to the sender only.
    Send(Frame),
    /// Nothing for the sender: invalid frame (logged) or a quiet no-op.
    Silent,
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4();

    // Per-connection channel for receiving broadcast frames from peers.
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(CLIENT_CHANNEL_CAPACITY);

    let welcome = Frame::event("session:connected", Data::new())
        .with_data("connectionId", connection_id.to_string());
    if send_frame(&mut socket, &welcome).await.is_err() {
        return;
    }

    info!(%connection_id, "ws: client connected");

    // Rooms this connection has entered, for transport-level cleanup.
    let mut joined_rooms: HashSet<String> = HashSet::new();

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let replies =
                            process_inbound_text(&state, connection_id, &client_tx, &mut joined_rooms, &text).await;
                        for frame in replies {
                            let _ = send_frame(&mut socket, &frame).await;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    disconnect(&state, connection_id, &joined_rooms).await;
    info!(%connection_id, "ws: client disconnected");
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame; returns frames for the sender.
///
/// Split from the socket loop so tests can exercise dispatch end-to-end
/// without a live websocket.
async fn process_inbound_text(
    state: &AppState,
    connection_id: Uuid,
    client_tx: &mpsc::Sender<Frame>,
    joined_rooms: &mut HashSet<String>,
    text: &str,
) -> Vec<Frame> {
    let req: Frame = match serde_json::from_str(text) {
        Ok(req) => req,
        Err(e) => {
            warn!(%connection_id, error = %e, "ws: dropping invalid inbound frame");
            return Vec::new();
        }
    };

    info!(%connection_id, id = %req.id, event = %req.event, "ws: recv frame");

    let outcome = match req.event.as_str() {
        "board:create" => handle_board_create(state, &req).await,
        "board:check" => handle_board_check(state, &req).await,
        "join-board" => handle_join_board(state, connection_id, client_tx, joined_rooms, &req).await,
        "drawing:event" => handle_drawing_event(state, connection_id, &req).await,
        "drawing:delete" => handle_drawing_delete(state, &req).await,
        "drawing:undo" => handle_history(state, &req, history::undo).await,
        "drawing:redo" => handle_history(state, &req, history::redo).await,
        "board:destroy" => handle_board_destroy(state, &req).await,
        "presence:join" => handle_presence_join(state, connection_id, client_tx, joined_rooms, &req).await,
        other => {
            warn!(%connection_id, event = other, "ws: dropping unknown event");
            Outcome::Silent
        }
    };

    match outcome {
        Outcome::Ack(data) => vec![req.ack(data)],
        Outcome::Send(frame) => vec![frame],
        Outcome::Silent => Vec::new(),
    }
}

// =============================================================================
// BOARD HANDLERS
// =============================================================================

async fn handle_board_create(state: &AppState, req: &Frame) -> Outcome {
    let Some(board_id) = required_board_id(req) else {
        return Outcome::Silent;
    };

    let mut data = Data::new();
    match state.registry.create(board_id).await {
        Ok(()) => {
            data.insert("success".into(), serde_json::json!(true));
        }
        Err(e) => {
            data.insert("success".into(), serde_json::json!(false));
            data.insert("error".into(), serde_json::json!(e.to_string()));
        }
    }
    Outcome::Ack(data)
}

async fn handle_board_check(state: &AppState, req: &Frame) -> Outcome {
    let Some(board_id) = required_board_id(req) else {
        return Outcome::Silent;
    };

    let mut data = Data::new();
    data.insert("exists".into(), serde_json::json!(state.registry.exists(board_id).await));
    Outcome::Ack(data)
}

async fn handle_join_board(
    state: &AppState,
    connection_id: Uuid,
    client_tx: &mpsc::Sender<Frame>,
    joined_rooms: &mut HashSet<String>,
    req: &Frame,
) -> Outcome {
    let Some(board_id) = required_board_id(req) else {
        return Outcome::Silent;
    };

    let Ok(handle) = state.registry.get(board_id).await else {
        return Outcome::Send(not_found(board_id));
    };

    // Room entry and the log snapshot happen under the board lock, so the
    // snapshot and subsequent peer broadcasts neither overlap nor gap.
    let board = handle.lock().await;
    state.rooms.join(board_id, connection_id, client_tx.clone()).await;
    joined_rooms.insert(board_id.to_string());
    let strokes = stroke_log::read(&board);
    drop(board);

    if state.membership.join(connection_id, board_id) {
        // Newly joined board; a destroy racing in here answers NotFound.
        if state.registry.increment_occupancy(board_id).await.is_err() {
            return Outcome::Send(not_found(board_id));
        }
    }

    let mut data = Data::new();
    data.insert("strokes".into(), serde_json::to_value(&strokes).unwrap_or_default());
    Outcome::Send(Frame::event("board:init", data).with_board_id(board_id))
}

async fn handle_board_destroy(state: &AppState, req: &Frame) -> Outcome {
    let Some(board_id) = required_board_id(req) else {
        return Outcome::Silent;
    };

    if !state.registry.exists(board_id).await {
        return Outcome::Send(not_found(board_id));
    }

    // Tell the room before the state disappears.
    let notice = Frame::event("board:destroyed", Data::new()).with_board_id(board_id);
    state.rooms.broadcast(board_id, &notice, None).await;
    state.registry.destroy(board_id).await;
    Outcome::Silent
}

// =============================================================================
// DRAWING HANDLERS
// =============================================================================

async fn handle_drawing_event(state: &AppState, connection_id: Uuid, req: &Frame) -> Outcome {
    let Some(board_id) = required_board_id(req) else {
        return Outcome::Silent;
    };
    let Some(stroke_value) = req.data.get("stroke").cloned() else {
        warn!(event = %req.event, "ws: dropping frame without stroke");
        return Outcome::Silent;
    };
    let stroke: Stroke = match serde_json::from_value(stroke_value) {
        Ok(stroke) => stroke,
        Err(e) => {
            warn!(event = %req.event, error = %e, "ws: dropping malformed stroke");
            return Outcome::Silent;
        }
    };
    if stroke.id.is_empty() {
        warn!(event = %req.event, "ws: dropping stroke without id");
        return Outcome::Silent;
    }

    let Ok(handle) = state.registry.get(board_id).await else {
        return Outcome::Send(not_found(board_id));
    };

    let mut board = handle.lock().await;
    stroke_log::append(&mut board, stroke.clone());

    let mut data = Data::new();
    data.insert("stroke".into(), serde_json::to_value(&stroke).unwrap_or_default());
    let frame = Frame::event("drawing:event", data).with_board_id(board_id);
    // Multicast under the board lock: broadcast order must match apply order.
    state.rooms.broadcast(board_id, &frame, Some(connection_id)).await;
    Outcome::Silent
}

async fn handle_drawing_delete(state: &AppState, req: &Frame) -> Outcome {
    let Some(board_id) = required_board_id(req) else {
        return Outcome::Silent;
    };
    let Some(stroke_id) = required_str(req, "strokeId") else {
        return Outcome::Silent;
    };

    let Ok(handle) = state.registry.get(board_id).await else {
        return Outcome::Send(not_found(board_id));
    };

    let mut board = handle.lock().await;
    // Deletion changes state beyond what peers predicted; resync the whole
    // room, the deleting client included. An absent stroke means a racing
    // delete already won, and there is nothing to announce.
    if let Some(strokes) = stroke_log::remove(&mut board, stroke_id) {
        let frame = sync_frame(board_id, &strokes);
        state.rooms.broadcast(board_id, &frame, None).await;
    }
    Outcome::Silent
}

async fn handle_history(
    state: &AppState,
    req: &Frame,
    apply: fn(&mut BoardState) -> Option<Vec<Stroke>>,
) -> Outcome {
    let Some(board_id) = required_board_id(req) else {
        return Outcome::Silent;
    };

    let Ok(handle) = state.registry.get(board_id).await else {
        return Outcome::Send(not_found(board_id));
    };

    let mut board = handle.lock().await;
    if let Some(strokes) = apply(&mut board) {
        let frame = sync_frame(board_id, &strokes);
        state.rooms.broadcast(board_id, &frame, None).await;
    }
    // Empty stack: nothing to restore, nothing to announce.
    Outcome::Silent
}

// =============================================================================
// PRESENCE HANDLER
// =============================================================================

async fn handle_presence_join(
    state: &AppState,
    connection_id: Uuid,
    client_tx: &mpsc::Sender<Frame>,
    joined_rooms: &mut HashSet<String>,
    req: &Frame,
) -> Outcome {
    let Some(board_id) = required_board_id(req) else {
        return Outcome::Silent;
    };
    let Some(username) = required_str(req, "username") else {
        return Outcome::Silent;
    };

    state.rooms.join(board_id, connection_id, client_tx.clone()).await;
    joined_rooms.insert(board_id.to_string());

    let users = state.presence.join(board_id, connection_id, username);
    let frame = users_update(board_id, &users);
    state.rooms.broadcast(board_id, &frame, None).await;
    Outcome::Silent
}

// =============================================================================
// DISCONNECT
// =============================================================================

async fn disconnect(state: &AppState, connection_id: Uuid, joined_rooms: &HashSet<String>) {
    // Transport first: stop delivering to this connection.
    for room in joined_rooms {
        state.rooms.leave(room, connection_id).await;
    }

    // Exactly one occupancy decrement per joined board; boards already
    // reclaimed through another path are skipped.
    for board_id in state.membership.leave_all(connection_id) {
        match state.registry.decrement_occupancy(&board_id).await {
            Ok(true) => state.reclaimer.arm_vacancy_check(board_id),
            Ok(false) | Err(_) => {}
        }
    }

    // One roster update per board this connection actually occupied.
    for (board_id, users) in state.presence.leave(connection_id) {
        let frame = users_update(&board_id, &users);
        state.rooms.broadcast(&board_id, &frame, None).await;
    }
}

// =============================================================================
// HELPERS
// =============================================================================

/// Board ID from the envelope or payload. Logs and yields `None` when the
/// frame carries no usable ID.
fn required_board_id(req: &Frame) -> Option<&str> {
    match req.board_ref() {
        Some(board_id) if !board_id.is_empty() => Some(board_id),
        _ => {
            warn!(event = %req.event, "ws: dropping frame without boardId");
            None
        }
    }
}

/// Non-empty string field from the payload, logging the drop otherwise.
fn required_str<'a>(req: &'a Frame, key: &str) -> Option<&'a str> {
    match req.data.get(key).and_then(serde_json::Value::as_str) {
        Some(value) if !value.is_empty() => Some(value),
        _ => {
            warn!(event = %req.event, key, "ws: dropping frame without required field");
            None
        }
    }
}

fn not_found(board_id: &str) -> Frame {
    Frame::event("board:not-found", Data::new())
        .with_board_id(board_id)
        .with_data("boardId", board_id)
}

fn sync_frame(board_id: &str, strokes: &[Stroke]) -> Frame {
    let mut data = Data::new();
    data.insert("strokes".into(), serde_json::to_value(strokes).unwrap_or_default());
    Frame::event("board:sync", data).with_board_id(board_id)
}

fn users_update(board_id: &str, users: &[String]) -> Frame {
    let mut data = Data::new();
    data.insert("users".into(), serde_json::json!(users));
    Frame::event("users:update", data).with_board_id(board_id)
}

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), ()> {
    let json = match serde_json::to_string(frame) {
        Ok(json) => json,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    info!(id = %frame.id, event = %frame.event, status = ?frame.status, "ws: send frame");
    socket.send(Message::Text(json.into())).await.map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;
