//! Transport-level rooms: connection groups for multicast delivery.
//!
//! DESIGN
//! ======
//! One room per board ID. Each member is a bounded `mpsc::Sender` draining
//! into that connection's websocket task. Delivery is best-effort
//! (`try_send`): a slow client loses frames rather than stalling the board.
//!
//! Room membership is transport state, independent of the board registry.
//! A destroyed board's room simply drains as its members leave or
//! disconnect.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::frame::Frame;

#[derive(Clone)]
pub struct Rooms {
    inner: Arc<RwLock<HashMap<String, HashMap<Uuid, mpsc::Sender<Frame>>>>>,
}

impl Rooms {
    #[must_use]
    pub fn new() -> Self {
        Self { inner: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Add a connection to a room. Re-joining replaces the stored sender.
    pub async fn join(&self, room: &str, connection_id: Uuid, tx: mpsc::Sender<Frame>) {
        let mut rooms = self.inner.write().await;
        rooms.entry(room.to_string()).or_default().insert(connection_id, tx);
    }

    /// Remove a connection from a room. Empty rooms are dropped.
    pub async fn leave(&self, room: &str, connection_id: Uuid) {
        let mut rooms = self.inner.write().await;
        if let Some(members) = rooms.get_mut(room) {
            members.remove(&connection_id);
            if members.is_empty() {
                rooms.remove(room);
            }
        }
    }

    /// Send a frame to every member of a room, optionally excluding one.
    pub async fn broadcast(&self, room: &str, frame: &Frame, exclude: Option<Uuid>) {
        let rooms = self.inner.read().await;
        let Some(members) = rooms.get(room) else {
            return;
        };

        for (connection_id, tx) in members {
            if exclude == Some(*connection_id) {
                continue;
            }
            // Best-effort: if a client's channel is full, skip it.
            let _ = tx.try_send(frame.clone());
        }
    }
}

impl Default for Rooms {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "rooms_test.rs"]
mod tests;
