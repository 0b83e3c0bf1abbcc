use super::*;
use crate::services::stroke_log;
use crate::state::test_helpers::pen_stroke;

const GRACE: Duration = Duration::from_secs(300);
const CEILING: Duration = Duration::from_secs(1800);

#[tokio::test]
async fn create_then_create_reports_conflict() {
    let registry = Registry::new();
    registry.create("retro").await.expect("first create should succeed");

    // Put some state on the board to prove the conflict leaves it alone.
    {
        let handle = registry.get("retro").await.unwrap();
        let mut board = handle.lock().await;
        stroke_log::append(&mut board, pen_stroke("s-1"));
    }

    let second = registry.create("retro").await;
    assert!(matches!(second, Err(RegistryError::AlreadyExists(_))));

    let handle = registry.get("retro").await.unwrap();
    let board = handle.lock().await;
    assert_eq!(board.strokes.len(), 1);
    assert_eq!(board.strokes[0].id, "s-1");
}

#[tokio::test]
async fn get_never_created_is_not_found_without_side_effect() {
    let registry = Registry::new();

    let result = registry.get("never-created").await;
    assert!(matches!(result, Err(RegistryError::NotFound(_))));

    // The failed lookup must not have fabricated a board.
    assert!(!registry.exists("never-created").await);
}

#[tokio::test]
async fn exists_tracks_create_and_destroy() {
    let registry = Registry::new();
    assert!(!registry.exists("demo").await);

    registry.create("demo").await.unwrap();
    assert!(registry.exists("demo").await);

    registry.destroy("demo").await;
    assert!(!registry.exists("demo").await);
}

#[tokio::test]
async fn destroy_is_idempotent() {
    let registry = Registry::new();
    registry.create("demo").await.unwrap();

    assert!(registry.destroy("demo").await);
    assert!(!registry.destroy("demo").await);
    assert!(!registry.destroy("never-created").await);
}

#[tokio::test]
async fn increment_on_missing_board_is_not_found() {
    let registry = Registry::new();
    let result = registry.increment_occupancy("ghost").await;
    assert!(matches!(result, Err(RegistryError::NotFound(_))));
}

#[tokio::test]
async fn decrement_clamps_at_zero() {
    let registry = Registry::new();
    registry.create("demo").await.unwrap();

    // Double-reported disconnects must not drive occupancy negative, and a
    // clamped decrement is not a fresh vacancy transition.
    assert!(!registry.decrement_occupancy("demo").await.unwrap());

    let handle = registry.get("demo").await.unwrap();
    assert_eq!(handle.lock().await.occupancy, 0);
}

#[tokio::test]
async fn decrement_to_zero_reports_vacancy() {
    let registry = Registry::new();
    registry.create("demo").await.unwrap();

    assert_eq!(registry.increment_occupancy("demo").await.unwrap(), 1);
    {
        let handle = registry.get("demo").await.unwrap();
        assert!(handle.lock().await.vacant_since.is_none());
    }

    assert!(registry.decrement_occupancy("demo").await.unwrap());
    let handle = registry.get("demo").await.unwrap();
    assert!(handle.lock().await.vacant_since.is_some());
}

#[tokio::test]
async fn reclaim_vacant_waits_out_the_grace_window() {
    let registry = Registry::new();
    registry.create("demo").await.unwrap();
    registry.increment_occupancy("demo").await.unwrap();
    registry.decrement_occupancy("demo").await.unwrap();

    // Inside the window: nothing happens.
    assert!(!registry.reclaim_vacant_at("demo", Instant::now(), GRACE).await);
    assert!(registry.exists("demo").await);

    // Past the window: the board is gone.
    assert!(registry.reclaim_vacant_at("demo", Instant::now() + GRACE, GRACE).await);
    assert!(!registry.exists("demo").await);
}

#[tokio::test]
async fn rejoin_cancels_pending_reclaim() {
    let registry = Registry::new();
    registry.create("demo").await.unwrap();
    registry.increment_occupancy("demo").await.unwrap();
    registry.decrement_occupancy("demo").await.unwrap();

    // Someone came back before the check fired.
    registry.increment_occupancy("demo").await.unwrap();

    assert!(!registry.reclaim_vacant_at("demo", Instant::now() + GRACE * 2, GRACE).await);
    assert!(registry.exists("demo").await);
}

#[tokio::test]
async fn reclaim_on_destroyed_board_is_noop() {
    let registry = Registry::new();
    registry.create("demo").await.unwrap();
    registry.destroy("demo").await;

    assert!(!registry.reclaim_vacant_at("demo", Instant::now() + GRACE, GRACE).await);
}

#[tokio::test]
async fn sweep_destroys_idle_boards_and_keeps_active_ones() {
    let registry = Registry::new();
    registry.create("stale").await.unwrap();
    registry.create("busy").await.unwrap();

    let later = Instant::now() + CEILING;
    {
        let handle = registry.get("busy").await.unwrap();
        handle.lock().await.last_activity = later;
    }

    let destroyed = registry.sweep_idle_at(later, CEILING).await;
    assert_eq!(destroyed, vec!["stale".to_string()]);
    assert!(!registry.exists("stale").await);
    assert!(registry.exists("busy").await);
}

#[tokio::test]
async fn sweep_ignores_occupancy() {
    let registry = Registry::new();
    registry.create("abandoned").await.unwrap();
    registry.increment_occupancy("abandoned").await.unwrap();

    // Occupied but idle past the ceiling: still reclaimed.
    let destroyed = registry.sweep_idle_at(Instant::now() + CEILING, CEILING).await;
    assert_eq!(destroyed, vec!["abandoned".to_string()]);
    assert!(!registry.exists("abandoned").await);
}
