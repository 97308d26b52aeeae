//! Tests for the JSON wire protocol

use fourup::game::Player;
use fourup::protocol::{deserialize, serialize, ClientMessage, ServerMessage};
use serde_json::json;

#[test]
fn test_play_event_wire_shape() {
    let msg = ServerMessage::Play {
        player: Player::Red,
        column: 3,
        row: 0,
    };

    let encoded = serialize(&msg).expect("serialize failed");
    let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();

    assert_eq!(
        value,
        json!({"type": "play", "player": "red", "column": 3, "row": 0})
    );
}

#[test]
fn test_init_event_wire_shape() {
    let msg = ServerMessage::Init {
        join: "abc".to_string(),
        watch: "def".to_string(),
    };

    let encoded = serialize(&msg).expect("serialize failed");
    let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();

    assert_eq!(value, json!({"type": "init", "join": "abc", "watch": "def"}));
}

#[test]
fn test_win_and_error_wire_shapes() {
    let win = serialize(&ServerMessage::Win {
        player: Player::Yellow,
    })
    .unwrap();
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&win).unwrap(),
        json!({"type": "win", "player": "yellow"})
    );

    let err = serialize(&ServerMessage::error("It isn't your turn.")).unwrap();
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(&err).unwrap(),
        json!({"type": "error", "message": "It isn't your turn."})
    );
}

#[test]
fn test_init_request_token_variants() {
    // Bare init starts a new session.
    let msg: ClientMessage = deserialize(r#"{"type": "init"}"#).expect("deserialize failed");
    match msg {
        ClientMessage::Init { join, watch } => {
            assert!(join.is_none());
            assert!(watch.is_none());
        }
        _ => panic!("Expected Init, got {:?}", msg),
    }

    let msg: ClientMessage = deserialize(r#"{"type": "init", "join": "tok"}"#).unwrap();
    match msg {
        ClientMessage::Init { join, watch } => {
            assert_eq!(join.as_deref(), Some("tok"));
            assert!(watch.is_none());
        }
        _ => panic!("Expected Init, got {:?}", msg),
    }

    let msg: ClientMessage = deserialize(r#"{"type": "init", "watch": "tok"}"#).unwrap();
    match msg {
        ClientMessage::Init { watch, .. } => assert_eq!(watch.as_deref(), Some("tok")),
        _ => panic!("Expected Init, got {:?}", msg),
    }
}

#[test]
fn test_play_request_roundtrip() {
    let msg: ClientMessage = deserialize(r#"{"type": "play", "column": 5}"#).unwrap();
    match msg {
        ClientMessage::Play { column } => assert_eq!(column, 5),
        _ => panic!("Expected Play, got {:?}", msg),
    }

    let encoded = serialize(&ClientMessage::Play { column: 5 }).unwrap();
    let decoded: ClientMessage = deserialize(&encoded).unwrap();
    assert_eq!(format!("{:?}", msg), format!("{:?}", decoded));
}

#[test]
fn test_unknown_discriminator_rejected() {
    assert!(deserialize::<ClientMessage>(r#"{"type": "chat", "text": "hi"}"#).is_err());
    assert!(deserialize::<ClientMessage>("not json at all").is_err());
    assert!(deserialize::<ClientMessage>(r#"{"column": 3}"#).is_err());
}
