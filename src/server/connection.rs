//! Client connection handling

use crate::game::Player;
use crate::protocol::{serialize, ServerMessage};
use anyhow::{anyhow, Result};
use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;
use uuid::Uuid;

/// Outbound half of an accepted WebSocket.
pub type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;

/// Bound on each connection's outbound queue. A full game is 42 moves, so
/// replay plus live traffic never comes close; only a dead or stalled peer
/// hits the limit.
pub const OUTBOUND_QUEUE_SIZE: usize = 256;

/// What a connection is allowed to do, fixed at attach time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Started the session; plays red.
    Initiator,

    /// Joined via the join token; plays yellow.
    SecondPlayer,

    /// Attached via the watch token; receives events, never moves.
    Spectator,
}

impl Role {
    /// The checker color this role plays, if it plays at all.
    pub fn player(&self) -> Option<Player> {
        match self {
            Role::Initiator => Some(Player::Red),
            Role::SecondPlayer => Some(Player::Yellow),
            Role::Spectator => None,
        }
    }
}

/// Represents a connected client
#[derive(Clone)]
pub struct ClientConnection {
    /// Unique client identifier
    id: Uuid,

    /// Fixed role assigned by the first message
    role: Role,

    /// Queue of serialized messages bound for this client
    sender: mpsc::Sender<String>,
}

impl ClientConnection {
    /// Create a new client connection
    pub fn new(role: Role, sender: mpsc::Sender<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            sender,
        }
    }

    /// Get client ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Get the connection's role
    pub fn role(&self) -> Role {
        self.role
    }

    /// Send a message to the client, waiting for queue space.
    pub async fn send(&self, msg: &ServerMessage) -> Result<()> {
        let json = serialize(msg)?;
        self.sender
            .send(json)
            .await
            .map_err(|_| anyhow!("Failed to send message to client"))
    }

    /// Enqueue an already-serialized message without waiting. Used on
    /// broadcast and replay paths so one slow or dead recipient cannot
    /// hold up the rest of the session.
    pub fn send_nowait(&self, json: String) {
        if self.sender.try_send(json).is_err() {
            tracing::warn!("Dropping event for client {}: queue unavailable", self.id);
        }
    }
}

/// Task to write outgoing messages to the client
pub async fn client_writer_task(mut sink: WsSink, mut receiver: mpsc::Receiver<String>) {
    while let Some(json) = receiver.recv().await {
        if let Err(e) = sink.send(Message::Text(json)).await {
            tracing::debug!("Failed to write message to client: {}", e);
            break;
        }
    }

    let _ = sink.close().await;
    tracing::debug!("Client writer task finished");
}
