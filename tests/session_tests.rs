//! Tests for session state, the turn arbiter, and the token registry

use fourup::game::{GameError, Player};
use fourup::server::{ClientConnection, Role, Session, SessionError, SessionRegistry};
use serde_json::{json, Value};
use tokio::sync::mpsc;

/// A connection handle whose outbound queue we can inspect
fn test_conn(role: Role) -> (ClientConnection, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(64);
    (ClientConnection::new(role, tx), rx)
}

fn next_event(rx: &mut mpsc::Receiver<String>) -> Value {
    serde_json::from_str(&rx.try_recv().expect("Expected a queued event")).unwrap()
}

fn assert_no_event(rx: &mut mpsc::Receiver<String>) {
    assert!(rx.try_recv().is_err(), "Expected no queued event");
}

#[test]
fn test_new_session_is_empty_and_timestamped() {
    let session = Session::new();
    assert_eq!(session.connection_count(), 0);
    assert!(session.created_at() <= chrono::Utc::now());
}

#[test]
fn test_move_requires_second_player() {
    let mut session = Session::new();
    let (initiator, mut rx) = test_conn(Role::Initiator);
    session.add_connection(initiator);

    let result = session.play(Player::Red, 3);
    assert_eq!(result, Err(SessionError::NoSecondPlayer));
    assert_no_event(&mut rx);
}

#[test]
fn test_turn_checked_before_the_game_sees_the_move() {
    let mut session = Session::new();
    let (p1, mut rx1) = test_conn(Role::Initiator);
    let (p2, _rx2) = test_conn(Role::SecondPlayer);
    session.add_connection(p1);
    session.add_connection(p2);

    // Yellow may not open the game.
    assert_eq!(session.play(Player::Yellow, 0), Err(SessionError::NotYourTurn));
    assert_no_event(&mut rx1);

    session.play(Player::Red, 0).unwrap();
    let _ = rx1.try_recv().unwrap();

    // Red may not move twice in a row.
    assert_eq!(session.play(Player::Red, 0), Err(SessionError::NotYourTurn));
    assert_no_event(&mut rx1);
}

#[test]
fn test_accepted_move_fans_out_to_everyone() {
    let mut session = Session::new();
    let (p1, mut rx1) = test_conn(Role::Initiator);
    let (p2, mut rx2) = test_conn(Role::SecondPlayer);
    let (watcher, mut rx3) = test_conn(Role::Spectator);
    session.add_connection(p1);
    session.add_connection(p2);
    session.add_connection(watcher);

    session.play(Player::Red, 3).unwrap();

    let expected = json!({"type": "play", "player": "red", "column": 3, "row": 0});
    assert_eq!(next_event(&mut rx1), expected);
    assert_eq!(next_event(&mut rx2), expected);
    assert_eq!(next_event(&mut rx3), expected);
}

#[test]
fn test_game_rejection_reaches_nobody() {
    let mut session = Session::new();
    let (p1, mut rx1) = test_conn(Role::Initiator);
    let (p2, mut rx2) = test_conn(Role::SecondPlayer);
    session.add_connection(p1);
    session.add_connection(p2);

    let result = session.play(Player::Red, 99);
    assert_eq!(result, Err(SessionError::Game(GameError::OutOfBounds)));
    assert_no_event(&mut rx1);
    assert_no_event(&mut rx2);
}

#[test]
fn test_winning_move_broadcasts_play_then_win() {
    let mut session = Session::new();
    let (p1, mut rx1) = test_conn(Role::Initiator);
    let (p2, _rx2) = test_conn(Role::SecondPlayer);
    session.add_connection(p1);
    session.add_connection(p2);

    for _ in 0..3 {
        session.play(Player::Red, 0).unwrap();
        session.play(Player::Yellow, 1).unwrap();
    }
    session.play(Player::Red, 0).unwrap();

    let mut events = Vec::new();
    while let Ok(text) = rx1.try_recv() {
        events.push(serde_json::from_str::<Value>(&text).unwrap());
    }
    assert_eq!(events.len(), 8);
    assert_eq!(events[6], json!({"type": "play", "player": "red", "column": 0, "row": 3}));
    assert_eq!(events[7], json!({"type": "win", "player": "red"}));
}

#[test]
fn test_replay_is_ordered_and_private() {
    let mut session = Session::new();
    let (p1, _rx1) = test_conn(Role::Initiator);
    let (p2, mut rx2) = test_conn(Role::SecondPlayer);
    session.add_connection(p1);
    session.add_connection(p2);

    session.play(Player::Red, 3).unwrap();
    session.play(Player::Yellow, 3).unwrap();
    let _ = rx2.try_recv();
    let _ = rx2.try_recv();

    let (late, mut rx_late) = test_conn(Role::Spectator);
    session.replay(&late);

    assert_eq!(
        next_event(&mut rx_late),
        json!({"type": "play", "player": "red", "column": 3, "row": 0})
    );
    assert_eq!(
        next_event(&mut rx_late),
        json!({"type": "play", "player": "yellow", "column": 3, "row": 1})
    );
    assert_no_event(&mut rx_late);

    // Replay alone does not subscribe; nothing else was broadcast to p2.
    assert_no_event(&mut rx2);
}

#[test]
fn test_role_to_player_mapping() {
    assert_eq!(Role::Initiator.player(), Some(Player::Red));
    assert_eq!(Role::SecondPlayer.player(), Some(Player::Yellow));
    assert_eq!(Role::Spectator.player(), None);
}

#[tokio::test]
async fn test_registry_lookup_and_release() {
    let registry = SessionRegistry::new();
    let (join, watch, _session) = registry.create().await;

    assert_ne!(join, watch);
    assert!(registry.lookup_join(&join).await.is_some());
    assert!(registry.lookup_watch(&watch).await.is_some());
    assert!(registry.lookup_join("bogus").await.is_none());
    assert!(registry.lookup_watch(&join).await.is_none());
    assert_eq!(registry.joinable_count().await, 1);

    registry.release_join(&join).await;
    assert!(registry.lookup_join(&join).await.is_none());
    assert!(registry.lookup_watch(&watch).await.is_some());
    assert_eq!(registry.joinable_count().await, 0);
}

#[tokio::test]
async fn test_registry_tokens_are_unique_per_session() {
    let registry = SessionRegistry::new();
    let (join_a, watch_a, _a) = registry.create().await;
    let (join_b, watch_b, _b) = registry.create().await;

    assert_ne!(join_a, join_b);
    assert_ne!(watch_a, watch_b);
    assert_eq!(registry.joinable_count().await, 2);
}
