//! Server module - WebSocket listener, sessions, and the token registry

mod connection;
mod listener;
mod registry;
mod session;

pub use connection::{ClientConnection, Role};
pub use listener::ServerListener;
pub use registry::{SessionHandle, SessionRegistry};
pub use session::{Session, SessionError};
