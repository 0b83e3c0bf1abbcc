//! Membership tracker: which boards each connection has joined.
//!
//! DESIGN
//! ======
//! One map, connection to joined board IDs, consulted only on disconnect.
//! Cleanup never scans boards; the tracker is the single source for "what
//! does this connection occupy".

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use uuid::Uuid;

#[derive(Clone)]
pub struct Membership {
    inner: Arc<Mutex<HashMap<Uuid, HashSet<String>>>>,
}

impl Membership {
    #[must_use]
    pub fn new() -> Self {
        Self { inner: Arc::new(Mutex::new(HashMap::new())) }
    }

    /// Record a joined board. Returns `true` only for a newly recorded
    /// pair; occupancy accounting relies on this to stay balanced with the
    /// single decrement on disconnect.
    pub fn join(&self, connection_id: Uuid, board_id: &str) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.entry(connection_id).or_default().insert(board_id.to_string())
    }

    /// Return and clear every board the connection had joined.
    pub fn leave_all(&self, connection_id: Uuid) -> Vec<String> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner
            .remove(&connection_id)
            .map(|boards| boards.into_iter().collect())
            .unwrap_or_default()
    }
}

impl Default for Membership {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "membership_test.rs"]
mod tests;
