//! Shared application state and the board data model.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! wires the engine services together: the board registry (stroke logs,
//! history, occupancy), the membership tracker, the presence roster, the
//! transport rooms, and the reclaimer. Each board's live state sits behind
//! its own lock inside the registry, so boards are independent of each
//! other.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::rooms::Rooms;
use crate::services::membership::Membership;
use crate::services::presence::Presence;
use crate::services::reclaim::Reclaimer;
use crate::services::registry::Registry;

// =============================================================================
// STROKE
// =============================================================================

/// Tool that produced a stroke. Closed set; anything else fails to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Pen,
    Rect,
    Circle,
    Text,
    Eraser,
}

/// One atomic drawable unit, identified by a client-generated ID.
///
/// Geometry fields are tool-specific and mirror the wire shape: `points`
/// carries a flattened coordinate list for pen paths, `x`/`y` plus
/// `width`/`height` describe shapes, and `x`/`y` plus `text` place a text
/// body. Strokes are immutable once appended; removal is a logical delete
/// from the log, never an edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stroke {
    pub id: String,
    pub tool: Tool,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

// =============================================================================
// BOARD STATE
// =============================================================================

/// Per-board live state. Owned exclusively by the `Registry`; all access
/// goes through the board's lock.
pub struct BoardState {
    /// Ordered stroke log.
    pub strokes: Vec<Stroke>,
    /// Snapshots available to undo, most recent last.
    pub undo: Vec<Vec<Stroke>>,
    /// Snapshots available to redo. Cleared by every fresh mutation.
    pub redo: Vec<Vec<Stroke>>,
    /// Count of live connections currently joined.
    pub occupancy: usize,
    pub created_at: Instant,
    pub last_activity: Instant,
    /// When occupancy last reached zero. `None` while occupied.
    pub vacant_since: Option<Instant>,
}

impl BoardState {
    #[must_use]
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            strokes: Vec::new(),
            undo: Vec::new(),
            redo: Vec::new(),
            occupancy: 0,
            created_at: now,
            last_activity: now,
            vacant_since: Some(now),
        }
    }

    /// Refresh the last-activity timestamp.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped or Clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Registry,
    pub membership: Membership,
    pub presence: Presence,
    pub rooms: Rooms,
    pub reclaimer: Reclaimer,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let registry = Registry::new();
        let rooms = Rooms::new();
        let reclaimer = Reclaimer::new(registry.clone(), rooms.clone(), config.reclaim);
        Self {
            config,
            registry,
            membership: Membership::new(),
            presence: Presence::new(),
            rooms,
            reclaimer,
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================


#[cfg(test)]
#[path = "state_test.rs"]
mod tests;
