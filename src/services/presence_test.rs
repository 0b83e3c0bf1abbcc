use super::*;

#[test]
fn join_returns_roster_in_join_order() {
    let presence = Presence::new();
    let (conn_a, conn_b) = (Uuid::new_v4(), Uuid::new_v4());

    assert_eq!(presence.join("retro", conn_a, "alice"), ["alice"]);
    assert_eq!(presence.join("retro", conn_b, "bob"), ["alice", "bob"]);
}

#[test]
fn rejoin_replaces_name() {
    let presence = Presence::new();
    let (conn_a, conn_b) = (Uuid::new_v4(), Uuid::new_v4());
    presence.join("retro", conn_a, "alice");
    presence.join("retro", conn_b, "bob");

    // The latest name wins and the entry moves to the end.
    let roster = presence.join("retro", conn_a, "alicia");
    assert_eq!(roster, ["bob", "alicia"]);
}

#[test]
fn leave_returns_only_affected_boards() {
    let presence = Presence::new();
    let (conn, bystander) = (Uuid::new_v4(), Uuid::new_v4());
    presence.join("p", conn, "alice");
    presence.join("q", conn, "alice");
    presence.join("p", bystander, "bob");
    presence.join("r", bystander, "bob");

    let mut changed = presence.leave(conn);
    changed.sort_by(|a, b| a.0.cmp(&b.0));

    assert_eq!(changed.len(), 2, "board r was never joined by this connection");
    assert_eq!(changed[0], ("p".to_string(), vec!["bob".to_string()]));
    assert_eq!(changed[1], ("q".to_string(), Vec::new()));
}

#[test]
fn leave_unknown_connection_changes_nothing() {
    let presence = Presence::new();
    presence.join("retro", Uuid::new_v4(), "alice");
    assert!(presence.leave(Uuid::new_v4()).is_empty());
}

#[test]
fn emptied_roster_is_dropped() {
    let presence = Presence::new();
    let conn = Uuid::new_v4();
    presence.join("retro", conn, "alice");
    presence.leave(conn);

    // A later join starts a fresh roster rather than resurrecting the old one.
    assert_eq!(presence.join("retro", Uuid::new_v4(), "carol"), ["carol"]);
}
