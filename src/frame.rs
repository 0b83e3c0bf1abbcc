//! Frame: the universal message type for inkboard.
//!
//! ARCHITECTURE
//! ============
//! Every communication is a Frame. Clients send request frames over
//! WebSocket, the gateway dispatches by event name, and outbound traffic
//! flows back as ack frames (correlated via `parent_id`) or event frames
//! (`board:init`, `board:sync`, `users:update`, ...).
//!
//! DESIGN
//! ======
//! - Flat data: payload is always `Map<String, Value>`, never nested.
//! - Acks correlate to requests via `parent_id`.
//! - The gateway routes on the full event name and never inspects `data`.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// TYPES
// =============================================================================

/// Flat key-value payload. Alias to reduce noise in signatures.
pub type Data = HashMap<String, serde_json::Value>;

/// Position of a frame in the protocol.
///
/// Clients send `request` frames; the server answers with `ack` frames for
/// request/response operations and pushes `event` frames for everything the
/// room needs to observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Request,
    Ack,
    Event,
}

/// The universal message type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    /// Milliseconds since Unix epoch. Set automatically at construction.
    pub ts: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_id: Option<String>,
    pub event: String,
    pub status: Status,
    pub data: Data,
}

// =============================================================================
// CONSTRUCTORS
// =============================================================================

/// Current time as milliseconds since Unix epoch.
fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

impl Frame {
    /// Create a request frame. Entry point for every client operation.
    pub fn request(event: impl Into<String>, data: Data) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent_id: None,
            ts: now_ms(),
            board_id: None,
            event: event.into(),
            status: Status::Request,
            data,
        }
    }

    /// Create a server-originated event frame.
    pub fn event(event: impl Into<String>, data: Data) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent_id: None,
            ts: now_ms(),
            board_id: None,
            event: event.into(),
            status: Status::Event,
            data,
        }
    }

    /// Create the ack for this request. Inherits `board_id` and `event`,
    /// points `parent_id` back at the request.
    #[must_use]
    pub fn ack(&self, data: Data) -> Self {
        Self {
            id: Uuid::new_v4(),
            parent_id: Some(self.id),
            ts: now_ms(),
            board_id: self.board_id.clone(),
            event: self.event.clone(),
            status: Status::Ack,
            data,
        }
    }
}

// =============================================================================
// BUILDERS
// =============================================================================

impl Frame {
    #[must_use]
    pub fn with_board_id(mut self, board_id: impl Into<String>) -> Self {
        self.board_id = Some(board_id.into());
        self
    }

    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// ACCESSORS
// =============================================================================

impl Frame {
    /// Board reference from the envelope, falling back to the payload's
    /// `boardId` field.
    #[must_use]
    pub fn board_ref(&self) -> Option<&str> {
        self.board_id
            .as_deref()
            .or_else(|| self.data.get("boardId").and_then(serde_json::Value::as_str))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[path = "frame_test.rs"]
mod tests;
