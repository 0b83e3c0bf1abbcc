//! Reclamation: frees board memory once a board is no longer needed.
//!
//! DESIGN
//! ======
//! Two independent triggers:
//! - A one-shot vacancy check armed exactly when occupancy transitions to
//!   zero. It sleeps the grace window and re-reads occupancy at fire time,
//!   so a re-join during the window cancels the destruction implicitly.
//! - A recurring sweep destroying boards idle past the inactivity ceiling
//!   regardless of occupancy. Swept rooms are told `board:destroyed`.
//!
//! Either path tolerates the board having already been destroyed by the
//! other. Both run outside board locks except for the brief check.

use tokio::task::JoinHandle;
use tracing::info;

use crate::config::ReclaimConfig;
use crate::frame::{Data, Frame};
use crate::rooms::Rooms;
use crate::services::registry::Registry;

#[derive(Clone)]
pub struct Reclaimer {
    registry: Registry,
    rooms: Rooms,
    config: ReclaimConfig,
}

impl Reclaimer {
    #[must_use]
    pub fn new(registry: Registry, rooms: Rooms, config: ReclaimConfig) -> Self {
        Self { registry, rooms, config }
    }

    /// Arm the one-shot vacancy check for a board that just became vacant.
    pub fn arm_vacancy_check(&self, board_id: String) {
        let registry = self.registry.clone();
        let grace = self.config.grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            registry.reclaim_vacant(&board_id, grace).await;
        });
    }

    /// Spawn the recurring idle sweep. Returns a handle for shutdown.
    #[must_use]
    pub fn spawn_sweep_task(&self) -> JoinHandle<()> {
        let reclaimer = self.clone();
        info!(
            sweep_interval_secs = reclaimer.config.sweep_interval.as_secs(),
            idle_ceiling_secs = reclaimer.config.idle_ceiling.as_secs(),
            grace_secs = reclaimer.config.grace.as_secs(),
            "board reclamation configured"
        );
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(reclaimer.config.sweep_interval).await;
                reclaimer.sweep_once().await;
            }
        })
    }

    /// One sweep pass: destroy idle boards and notify their rooms.
    pub async fn sweep_once(&self) {
        let destroyed = self.registry.sweep_idle(self.config.idle_ceiling).await;
        for board_id in destroyed {
            let notice = Frame::event("board:destroyed", Data::new()).with_board_id(board_id.clone());
            self.rooms.broadcast(&board_id, &notice, None).await;
        }
    }
}

#[cfg(test)]
#[path = "reclaim_test.rs"]
mod tests;
