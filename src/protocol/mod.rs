//! Protocol definitions for client-server communication
//!
//! One JSON object per WebSocket text frame, discriminated by a `type`
//! field. The transport preserves message boundaries, so no framing is
//! layered on top.

mod message;

pub use message::{ClientMessage, ServerMessage};

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Protocol-specific errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Unexpected message: {0}")]
    UnexpectedMessage(String),
}

/// Serialize a message to its JSON wire form
pub fn serialize<T: Serialize>(msg: &T) -> Result<String> {
    Ok(serde_json::to_string(msg)?)
}

/// Deserialize a message from its JSON wire form
pub fn deserialize<'a, T: Deserialize<'a>>(text: &'a str) -> Result<T> {
    serde_json::from_str(text).map_err(|e| {
        anyhow!(ProtocolError::MalformedMessage(format!(
            "Failed to deserialize: {}",
            e
        )))
    })
}
