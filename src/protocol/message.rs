//! Message types for the fourup wire protocol

use crate::game::Player;
use serde::{Deserialize, Serialize};

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    /// First message on a connection; selects the connection's role.
    ///
    /// At most one of `join` / `watch` may be present: `join` attaches as
    /// the second player, `watch` attaches as a spectator, neither starts
    /// a new game as the initiator.
    Init {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        join: Option<String>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        watch: Option<String>,
    },

    /// Drop a checker in a column (players only).
    Play { column: usize },
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    /// Session tokens, sent to the initiator only.
    Init { join: String, watch: String },

    /// An accepted move; also used verbatim for history replay.
    Play {
        player: Player,
        column: usize,
        row: usize,
    },

    /// The game has been won.
    Win { player: Player },

    /// Error response, delivered to the offending connection only.
    Error { message: String },
}

impl ServerMessage {
    /// Error event carrying `message` as its text.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}
