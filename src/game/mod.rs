//! Connect Four rules engine
//!
//! Owns the board, the ordered move history, and turn bookkeeping. The
//! server treats this as an opaque collaborator: it calls [`Connect4::play`]
//! and reads back the history, the last mover, and the winner.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of columns on the board.
pub const COLUMNS: usize = 7;

/// Number of rows in each column.
pub const ROWS: usize = 6;

/// The two checker colors. Red always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Player {
    Red,
    Yellow,
}

impl Player {
    /// The opposing player.
    pub fn other(self) -> Self {
        match self {
            Player::Red => Player::Yellow,
            Player::Yellow => Player::Red,
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Player::Red => write!(f, "red"),
            Player::Yellow => write!(f, "yellow"),
        }
    }
}

/// One accepted move. Immutable once recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub player: Player,
    pub column: usize,
    pub row: usize,
}

/// Reasons a move attempt is rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Move is out of bounds.")]
    OutOfBounds,

    #[error("This slot is full.")]
    SlotFull,

    #[error("The game is over.")]
    GameOver,
}

/// A Connect Four game.
pub struct Connect4 {
    /// Accepted moves, in play order. Append-only.
    moves: Vec<Move>,

    /// Number of checkers stacked in each column.
    heights: [usize; COLUMNS],

    /// Set once a winning move is played, never cleared.
    winner: Option<Player>,
}

impl Connect4 {
    /// Create an empty board.
    pub fn new() -> Self {
        Self {
            moves: Vec::new(),
            heights: [0; COLUMNS],
            winner: None,
        }
    }

    /// Player who played the most recent move.
    ///
    /// Before the first move this reports [`Player::Yellow`], so that red
    /// (the initiator's color) is the one allowed to open the game.
    pub fn last_player(&self) -> Player {
        match self.moves.last() {
            Some(mv) => mv.player,
            None => Player::Yellow,
        }
    }

    /// Whether the most recent move won the game.
    pub fn last_player_won(&self) -> bool {
        self.winner.is_some()
    }

    /// The winning player, if any.
    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    /// Accepted moves in play order.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Drop a checker in a column. Returns the row where it lands.
    ///
    /// Turn order is not checked here; the caller decides who may move.
    pub fn play(&mut self, player: Player, column: usize) -> Result<usize, GameError> {
        if self.winner.is_some() {
            return Err(GameError::GameOver);
        }
        if column >= COLUMNS {
            return Err(GameError::OutOfBounds);
        }

        let row = self.heights[column];
        if row == ROWS {
            return Err(GameError::SlotFull);
        }

        self.moves.push(Move {
            player,
            column,
            row,
        });
        self.heights[column] += 1;

        if self.connects_four(player, column, row) {
            self.winner = Some(player);
        }

        Ok(row)
    }

    /// Checker at (column, row), if one has been played there.
    fn checker_at(&self, column: isize, row: isize) -> Option<Player> {
        if column < 0 || row < 0 {
            return None;
        }
        let (column, row) = (column as usize, row as usize);
        if column >= COLUMNS || row >= ROWS {
            return None;
        }
        self.moves
            .iter()
            .find(|mv| mv.column == column && mv.row == row)
            .map(|mv| mv.player)
    }

    /// Whether the checker just placed at (column, row) completes a line of
    /// four for `player` in any of the four directions.
    fn connects_four(&self, player: Player, column: usize, row: usize) -> bool {
        const DIRECTIONS: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

        DIRECTIONS.iter().any(|&(dc, dr)| {
            let mut run = 1;
            for sign in [-1isize, 1] {
                let mut c = column as isize + sign * dc;
                let mut r = row as isize + sign * dr;
                while self.checker_at(c, r) == Some(player) {
                    run += 1;
                    c += sign * dc;
                    r += sign * dr;
                }
            }
            run >= 4
        })
    }
}

impl Default for Connect4 {
    fn default() -> Self {
        Self::new()
    }
}
