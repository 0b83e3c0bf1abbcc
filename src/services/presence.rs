//! Presence roster: active display names per board.
//!
//! DESIGN
//! ======
//! Roster state is independent of board content and keeps its own lock
//! scope. A connection holds at most one entry per board; re-joining
//! replaces the old entry and moves it to the end, so the latest name
//! wins.
//!
//! Disconnect sweeps every roster the connection appears in. This is the
//! one deliberate cross-board scan in the system; rosters are small.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

#[derive(Debug, Clone)]
struct PresenceEntry {
    connection_id: Uuid,
    username: String,
}

#[derive(Clone)]
pub struct Presence {
    inner: Arc<Mutex<HashMap<String, Vec<PresenceEntry>>>>,
}

impl Presence {
    #[must_use]
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Upsert the connection's entry on a board and return the roster.
    pub fn join(&self, board_id: &str, connection_id: Uuid, username: &str) -> Vec<String> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let roster = inner.entry(board_id.to_string()).or_default();
        roster.retain(|entry| entry.connection_id != connection_id);
        roster.push(PresenceEntry { connection_id, username: username.to_string() });
        roster.iter().map(|entry| entry.username.clone()).collect()
    }

    /// Drop the connection from every roster it appears in. Returns only
    /// the boards whose roster actually changed, with their updated name
    /// lists, so untouched boards see no redundant broadcast. Emptied
    /// rosters are removed from the map.
    pub fn leave(&self, connection_id: Uuid) -> Vec<(String, Vec<String>)> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut changed = Vec::new();
        inner.retain(|board_id, roster| {
            let before = roster.len();
            roster.retain(|entry| entry.connection_id != connection_id);
            if roster.len() != before {
                changed.push((
                    board_id.clone(),
                    roster.iter().map(|entry| entry.username.clone()).collect(),
                ));
            }
            !roster.is_empty()
        });
        changed
    }
}

impl Default for Presence {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "presence_test.rs"]
mod tests;
