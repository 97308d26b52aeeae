//! Session state - one game plus the connections watching it
//!
//! All move validation funnels through [`Session::play`]: presence of the
//! second player, turn ownership, then the game itself. The connection set
//! is only ever touched by the resolver's attach/detach paths.

use super::connection::ClientConnection;
use crate::game::{Connect4, GameError, Player};
use crate::protocol::{serialize, ServerMessage};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Why a move request was turned away before or by the game.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("The second player has not joined yet.")]
    NoSecondPlayer,

    #[error("It isn't your turn.")]
    NotYourTurn,

    #[error(transparent)]
    Game(#[from] GameError),
}

/// Active session state
pub struct Session {
    /// The game, owned exclusively by this session
    game: Connect4,

    /// Connections currently subscribed to this session's events
    connections: HashMap<Uuid, ClientConnection>,

    /// When the session was created
    created_at: DateTime<Utc>,
}

impl Session {
    /// Create a new session with an empty board
    pub fn new() -> Self {
        Self {
            game: Connect4::new(),
            connections: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// When the session was created
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Number of connections currently subscribed
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Subscribe a connection to this session's events
    pub fn add_connection(&mut self, conn: ClientConnection) {
        self.connections.insert(conn.id(), conn);
    }

    /// Remove a connection from this session
    pub fn remove_connection(&mut self, id: &Uuid) {
        self.connections.remove(id);
    }

    /// Attempt a move on behalf of `player`.
    ///
    /// Rejected requests never reach the board: first the second player
    /// must be present, then it must be `player`'s turn as derived from the
    /// game's own last-mover bookkeeping. An accepted move is broadcast to
    /// every subscribed connection, followed by a `win` event if it ended
    /// the game.
    pub fn play(&mut self, player: Player, column: usize) -> Result<(), SessionError> {
        if self.connections.len() < 2 {
            return Err(SessionError::NoSecondPlayer);
        }
        if player == self.game.last_player() {
            return Err(SessionError::NotYourTurn);
        }

        let row = self.game.play(player, column)?;
        self.broadcast(&ServerMessage::Play {
            player,
            column,
            row,
        });

        if self.game.last_player_won() {
            tracing::info!("Player {} won after {} moves", player, self.game.moves().len());
            self.broadcast(&ServerMessage::Win { player });
        }

        Ok(())
    }

    /// Broadcast an event to every subscribed connection.
    ///
    /// The event is serialized once and enqueued per connection without
    /// waiting; a recipient whose queue is gone or full only loses its own
    /// delivery.
    pub fn broadcast(&self, msg: &ServerMessage) {
        let json = match serialize(msg) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize broadcast event: {}", e);
                return;
            }
        };
        for conn in self.connections.values() {
            conn.send_nowait(json.clone());
        }
    }

    /// Replay the full move history to one connection, in play order.
    ///
    /// Called before the connection is added to the set, so its stream is
    /// exactly: history, then every later live event.
    pub fn replay(&self, conn: &ClientConnection) {
        for mv in self.game.moves() {
            match serialize(&ServerMessage::Play {
                player: mv.player,
                column: mv.column,
                row: mv.row,
            }) {
                Ok(json) => conn.send_nowait(json),
                Err(e) => tracing::error!("Failed to serialize replay event: {}", e),
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
