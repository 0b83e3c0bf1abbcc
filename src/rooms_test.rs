use super::*;
use crate::frame::{Data, Frame};
use tokio::time::{Duration, timeout};

async fn recv_frame(rx: &mut mpsc::Receiver<Frame>) -> Frame {
    timeout(Duration::from_millis(200), rx.recv())
        .await
        .expect("frame receive timed out")
        .expect("channel closed")
}

async fn assert_channel_empty(rx: &mut mpsc::Receiver<Frame>) {
    assert!(
        timeout(Duration::from_millis(80), rx.recv()).await.is_err(),
        "expected channel to remain empty"
    );
}

#[tokio::test]
async fn broadcast_reaches_all_except_excluded() {
    let rooms = Rooms::new();
    let (conn_a, conn_b, conn_c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let (tx_a, mut rx_a) = mpsc::channel(8);
    let (tx_b, mut rx_b) = mpsc::channel(8);
    let (tx_c, mut rx_c) = mpsc::channel(8);

    rooms.join("demo", conn_a, tx_a).await;
    rooms.join("demo", conn_b, tx_b).await;
    rooms.join("demo", conn_c, tx_c).await;

    let frame = Frame::event("drawing:event", Data::new()).with_board_id("demo");
    rooms.broadcast("demo", &frame, Some(conn_b)).await;

    assert_eq!(recv_frame(&mut rx_a).await.event, "drawing:event");
    assert_eq!(recv_frame(&mut rx_c).await.event, "drawing:event");
    assert_channel_empty(&mut rx_b).await;
}

#[tokio::test]
async fn broadcast_to_missing_room_is_noop() {
    let rooms = Rooms::new();
    let frame = Frame::event("board:sync", Data::new()).with_board_id("ghost");
    rooms.broadcast("ghost", &frame, None).await;
}

#[tokio::test]
async fn leave_stops_delivery() {
    let rooms = Rooms::new();
    let conn = Uuid::new_v4();
    let (tx, mut rx) = mpsc::channel(8);

    rooms.join("demo", conn, tx).await;
    rooms.leave("demo", conn).await;

    let frame = Frame::event("board:sync", Data::new()).with_board_id("demo");
    rooms.broadcast("demo", &frame, None).await;
    assert_channel_empty(&mut rx).await;
}

#[tokio::test]
async fn rejoin_replaces_sender() {
    let rooms = Rooms::new();
    let conn = Uuid::new_v4();
    let (tx_old, mut rx_old) = mpsc::channel(8);
    let (tx_new, mut rx_new) = mpsc::channel(8);

    rooms.join("demo", conn, tx_old).await;
    rooms.join("demo", conn, tx_new).await;

    let frame = Frame::event("users:update", Data::new()).with_board_id("demo");
    rooms.broadcast("demo", &frame, None).await;

    assert_eq!(recv_frame(&mut rx_new).await.event, "users:update");
    assert_channel_empty(&mut rx_old).await;
}
