//! fourup - A real-time Connect Four session server over WebSockets
//!
//! This crate provides the core functionality for fourup, including:
//! - The Connect Four rules engine (board, move history, win detection)
//! - The JSON wire protocol shared with the browser client
//! - Session coordination (tokens, roles, turn order, broadcast, replay)
//!
//! # Architecture
//!
//! fourup runs as two processes:
//! - The game server (`fourup`) coordinates sessions over WebSockets
//! - The asset server (`fourup-web`) serves the client UI on its own port
//!
//! A connection's first message selects its role: starting a session hands
//! back a join token (for the opponent) and a watch token (for spectators);
//! every accepted move is fanned out to the whole session, and late joiners
//! get the full history replayed before live events.

pub mod config;
pub mod game;
pub mod protocol;
pub mod server;
