//! Board registry: authoritative catalog of boards and their lifecycle.
//!
//! DESIGN
//! ======
//! The registry owns every board: an outer `RwLock` map from board ID to a
//! per-board `Mutex`. The map lock is held only to look up, insert, or
//! remove entries; all state mutation happens under the board's own lock,
//! so operations on different boards run in parallel while operations on
//! one board apply in a single total order.
//!
//! Boards exist only after an explicit `create`. Lookups on unknown IDs
//! return `NotFound` and never materialize state, which keeps "board not
//! found" meaningful for mistyped or stale links.
//!
//! LOCK ORDER
//! ==========
//! registry map, then board, then rooms. Nothing acquires an earlier lock
//! while holding a later one.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::state::BoardState;

// =============================================================================
// TYPES
// =============================================================================

/// Shared handle to one board's state. Callers hold the lock for the whole
/// read-modify-broadcast sequence to keep per-board ordering.
pub type BoardHandle = Arc<Mutex<BoardState>>;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("board already exists: {0}")]
    AlreadyExists(String),
    #[error("board not found: {0}")]
    NotFound(String),
}

#[derive(Clone)]
pub struct Registry {
    boards: Arc<RwLock<HashMap<String, BoardHandle>>>,
}

// =============================================================================
// LIFECYCLE
// =============================================================================

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self { boards: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Register a new board with an empty log and history.
    ///
    /// # Errors
    ///
    /// `AlreadyExists` when the ID is already a valid board. An expected
    /// outcome the caller branches on, not a fault.
    pub async fn create(&self, board_id: &str) -> Result<(), RegistryError> {
        let mut boards = self.boards.write().await;
        if boards.contains_key(board_id) {
            return Err(RegistryError::AlreadyExists(board_id.to_string()));
        }
        boards.insert(board_id.to_string(), Arc::new(Mutex::new(BoardState::new())));
        info!(%board_id, "board created");
        Ok(())
    }

    /// Pure existence query, no side effects.
    pub async fn exists(&self, board_id: &str) -> bool {
        self.boards.read().await.contains_key(board_id)
    }

    /// Look up a board's handle. Never creates implicitly.
    ///
    /// # Errors
    ///
    /// `NotFound` for boards never created or already destroyed.
    pub async fn get(&self, board_id: &str) -> Result<BoardHandle, RegistryError> {
        self.boards
            .read()
            .await
            .get(board_id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(board_id.to_string()))
    }

    /// Remove a board unconditionally. Idempotent; returns whether anything
    /// was removed.
    pub async fn destroy(&self, board_id: &str) -> bool {
        let removed = self.boards.write().await.remove(board_id).is_some();
        if removed {
            info!(%board_id, "board destroyed");
        }
        removed
    }
}

// =============================================================================
// OCCUPANCY
// =============================================================================

impl Registry {
    /// Record one more live connection on a board.
    ///
    /// # Errors
    ///
    /// `NotFound` when the board does not exist; joining a destroyed or
    /// never-created board is an error.
    pub async fn increment_occupancy(&self, board_id: &str) -> Result<usize, RegistryError> {
        let handle = self.get(board_id).await?;
        let mut board = handle.lock().await;
        board.occupancy += 1;
        board.vacant_since = None;
        board.touch();
        Ok(board.occupancy)
    }

    /// Drop one live connection from a board. Clamped at zero because
    /// disconnect races can double-report. Returns `true` when this call
    /// made the board vacant, so the caller can arm the grace-window check.
    ///
    /// # Errors
    ///
    /// `NotFound` when the board was already destroyed; callers treat this
    /// as a no-op.
    pub async fn decrement_occupancy(&self, board_id: &str) -> Result<bool, RegistryError> {
        let handle = self.get(board_id).await?;
        let mut board = handle.lock().await;
        if board.occupancy == 0 {
            return Ok(false);
        }
        board.occupancy -= 1;
        board.touch();
        if board.occupancy == 0 {
            board.vacant_since = Some(Instant::now());
            return Ok(true);
        }
        Ok(false)
    }
}

// =============================================================================
// RECLAMATION CHECKS
// =============================================================================

impl Registry {
    /// Destroy the board if it is still vacant and has been for at least
    /// `grace`. A re-join during the window makes this a no-op, as does the
    /// board having been destroyed through another path.
    pub async fn reclaim_vacant(&self, board_id: &str, grace: Duration) -> bool {
        self.reclaim_vacant_at(board_id, Instant::now(), grace).await
    }

    pub(crate) async fn reclaim_vacant_at(&self, board_id: &str, now: Instant, grace: Duration) -> bool {
        let mut boards = self.boards.write().await;
        let Some(handle) = boards.get(board_id) else {
            return false;
        };

        let board = handle.lock().await;
        let expired = board.occupancy == 0
            && board
                .vacant_since
                .is_some_and(|since| now.saturating_duration_since(since) >= grace);
        let lived_secs = now.saturating_duration_since(board.created_at).as_secs();
        drop(board);

        if !expired {
            return false;
        }
        boards.remove(board_id);
        info!(%board_id, lived_secs, "vacant board reclaimed");
        true
    }

    /// Destroy every board idle past `ceiling`, regardless of occupancy.
    /// Returns the destroyed IDs so the caller can notify their rooms.
    pub async fn sweep_idle(&self, ceiling: Duration) -> Vec<String> {
        self.sweep_idle_at(Instant::now(), ceiling).await
    }

    pub(crate) async fn sweep_idle_at(&self, now: Instant, ceiling: Duration) -> Vec<String> {
        let mut boards = self.boards.write().await;

        let mut expired = Vec::new();
        for (board_id, handle) in boards.iter() {
            let board = handle.lock().await;
            if now.saturating_duration_since(board.last_activity) >= ceiling {
                expired.push(board_id.clone());
            }
        }

        for board_id in &expired {
            boards.remove(board_id);
            info!(%board_id, "idle board reclaimed");
        }
        expired
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
