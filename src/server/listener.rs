//! WebSocket listener and per-connection role resolution
//!
//! Each accepted socket gets one task running the connection state machine:
//! exactly one `init` message selects the role (start / join / watch), then
//! players enter the move loop and spectators wait for the peer to go away.
//! Cleanup runs on every exit path: the connection leaves its session's set
//! and, for the initiator, the join token is released so the session stops
//! admitting a second player.

use super::connection::{client_writer_task, ClientConnection, Role, OUTBOUND_QUEUE_SIZE};
use super::registry::{SessionHandle, SessionRegistry};
use crate::game::Player;
use crate::protocol::{deserialize, serialize, ClientMessage, ProtocolError, ServerMessage};
use anyhow::{anyhow, Result};
use futures_util::stream::SplitStream;
use futures_util::StreamExt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

/// Inbound half of an accepted WebSocket.
type WsReader = SplitStream<WebSocketStream<TcpStream>>;

/// How long to let the writer flush queued events after the read side is
/// done, before giving up on the peer.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// WebSocket server listener
pub struct ServerListener {
    listener: TcpListener,
    registry: Arc<SessionRegistry>,
}

impl ServerListener {
    /// Bind the listening socket
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            registry: Arc::new(SessionRegistry::new()),
        })
    }

    /// The address actually bound (useful when binding port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Run the server
    ///
    /// The shutdown signal stops accepting new connections; connections
    /// already established are left alone until they close themselves.
    pub async fn run(self, mut shutdown_rx: mpsc::Receiver<()>) -> Result<()> {
        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                // Handle shutdown signal
                _ = shutdown_rx.recv() => {
                    tracing::info!("Shutdown signal received");
                    break;
                }

                // Reap finished connection tasks
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}

                // Accept new connections
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            let registry = Arc::clone(&self.registry);
                            tasks.spawn(async move {
                                if let Err(e) = handle_client(stream, registry).await {
                                    tracing::error!("Client error ({}): {}", addr, e);
                                }
                            });
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                        }
                    }
                }
            }
        }

        // Stop accepting; drain the connections still running.
        drop(self.listener);
        while tasks.join_next().await.is_some() {}
        tracing::info!("All connections closed");

        Ok(())
    }
}

/// Handle a single client connection
async fn handle_client(stream: TcpStream, registry: Arc<SessionRegistry>) -> Result<()> {
    let ws = accept_async(stream).await?;
    let (sink, mut reader) = ws.split();

    // Outbound path: bounded queue drained by a dedicated writer task.
    let (tx, rx) = mpsc::channel::<String>(OUTBOUND_QUEUE_SIZE);
    let mut writer_handle = tokio::spawn(client_writer_task(sink, rx));

    let result = resolve_and_serve(&mut reader, tx, &registry).await;

    // Every sender is gone now, so the writer flushes what is queued (the
    // farewell error event included) and closes the socket.
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, &mut writer_handle)
        .await
        .is_err()
    {
        writer_handle.abort();
    }

    result
}

/// Run a connection from role selection to close.
///
/// Consumes `tx`; when this returns, no sender for the outbound queue
/// remains and the writer task winds down on its own.
async fn resolve_and_serve(
    reader: &mut WsReader,
    tx: mpsc::Sender<String>,
    registry: &SessionRegistry,
) -> Result<()> {
    // AwaitingInit: the first message must be an init event.
    let first = match next_text(reader).await? {
        Some(text) => text,
        None => return Ok(()), // closed before selecting a role
    };

    let (join, watch) = match deserialize::<ClientMessage>(&first) {
        Ok(ClientMessage::Init { join, watch }) => (join, watch),
        Ok(other) => {
            send_error(&tx, "First message must be an init event.").await;
            return Err(anyhow!(ProtocolError::UnexpectedMessage(format!(
                "{:?} before init",
                other
            ))));
        }
        Err(e) => {
            send_error(&tx, "Invalid init message.").await;
            return Err(e);
        }
    };

    match (join, watch) {
        // Start a new session as the initiator
        (None, None) => start_session(reader, tx, registry).await,

        // Join an existing session as the second player
        (Some(token), None) => match registry.lookup_join(&token).await {
            Some(session) => {
                let conn = attach(&session, Role::SecondPlayer, tx).await;
                tracing::info!("Second player joined: {}", conn.id());
                let result = player_loop(reader, &conn, &session).await;
                detach(&session, &conn).await;
                result
            }
            None => {
                send_error(&tx, "Game not found.").await;
                Ok(())
            }
        },

        // Attach as a spectator
        (None, Some(token)) => match registry.lookup_watch(&token).await {
            Some(session) => {
                let conn = attach(&session, Role::Spectator, tx).await;
                tracing::info!("Spectator attached: {}", conn.id());
                let result = spectator_loop(reader).await;
                detach(&session, &conn).await;
                result
            }
            None => {
                send_error(&tx, "Game not found.").await;
                Ok(())
            }
        },

        (Some(_), Some(_)) => {
            send_error(&tx, "Init carries both join and watch tokens.").await;
            Err(anyhow!(ProtocolError::UnexpectedMessage(
                "init with two tokens".into()
            )))
        }
    }
}

/// Initiator path: create the session, hand back the tokens, play.
async fn start_session(
    reader: &mut WsReader,
    tx: mpsc::Sender<String>,
    registry: &SessionRegistry,
) -> Result<()> {
    let (join_token, watch_token, session) = registry.create().await;
    let conn = ClientConnection::new(Role::Initiator, tx);

    // The join token goes to the initiator and nobody else.
    let init = ServerMessage::Init {
        join: join_token.clone(),
        watch: watch_token,
    };
    if let Err(e) = conn.send(&init).await {
        registry.release_join(&join_token).await;
        return Err(e);
    }

    {
        let mut session = session.lock().await;
        session.add_connection(conn.clone());
    }
    tracing::info!("Initiator started a session: {}", conn.id());

    let result = player_loop(reader, &conn, &session).await;

    detach(&session, &conn).await;
    registry.release_join(&join_token).await;
    tracing::info!(
        "Initiator left; session no longer joinable ({} still are)",
        registry.joinable_count().await
    );

    result
}

/// Replay history to a late joiner, then subscribe it to live events.
///
/// Both happen under the session lock, so the connection's stream is the
/// full ordered history followed by every later event, with no gap and no
/// duplicate.
async fn attach(session: &SessionHandle, role: Role, tx: mpsc::Sender<String>) -> ClientConnection {
    let conn = ClientConnection::new(role, tx);
    let mut session = session.lock().await;
    session.replay(&conn);
    session.add_connection(conn.clone());
    tracing::debug!(
        "{:?} connection {} subscribed, {} in session",
        conn.role(),
        conn.id(),
        session.connection_count()
    );
    conn
}

/// Remove a connection from its session's set
async fn detach(session: &SessionHandle, conn: &ClientConnection) {
    let mut session = session.lock().await;
    session.remove_connection(&conn.id());
    tracing::debug!(
        "Connection {} detached, {} remain",
        conn.id(),
        session.connection_count()
    );
}

/// Receive loop for player connections.
///
/// Rejected moves produce an error event for this connection only and the
/// loop keeps going; only transport failure or close ends it.
async fn player_loop(
    reader: &mut WsReader,
    conn: &ClientConnection,
    session: &SessionHandle,
) -> Result<()> {
    // The requester's identity comes from its role, never from traffic.
    let player: Player = conn
        .role()
        .player()
        .ok_or_else(|| anyhow!("Connection {} has no player role", conn.id()))?;

    while let Some(text) = next_text(reader).await? {
        match deserialize::<ClientMessage>(&text) {
            Ok(ClientMessage::Play { column }) => {
                let outcome = { session.lock().await.play(player, column) };
                if let Err(e) = outcome {
                    tracing::debug!("Rejected move from {}: {}", conn.id(), e);
                    conn.send(&ServerMessage::error(e.to_string())).await?;
                }
            }
            Ok(ClientMessage::Init { .. }) => {
                conn.send(&ServerMessage::error("Already in a session."))
                    .await?;
            }
            Err(e) => {
                conn.send(&ServerMessage::error(format!("Invalid message: {}", e)))
                    .await?;
            }
        }
    }

    tracing::info!("Player disconnected: {}", conn.id());
    Ok(())
}

/// Receive loop for spectators: nothing to do but notice the close.
async fn spectator_loop(reader: &mut WsReader) -> Result<()> {
    while let Some(text) = next_text(reader).await? {
        tracing::debug!("Ignoring {} bytes from spectator", text.len());
    }
    Ok(())
}

/// Next text payload from the socket, or `None` once it is closed.
async fn next_text(reader: &mut WsReader) -> Result<Option<String>> {
    while let Some(frame) = reader.next().await {
        match frame? {
            Message::Text(text) => return Ok(Some(text)),
            Message::Close(_) => return Ok(None),
            Message::Binary(_) => {
                return Err(anyhow!(ProtocolError::UnexpectedMessage(
                    "binary frame".into()
                )))
            }
            // Control frames are the transport's business.
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
        }
    }
    Ok(None)
}

/// Best-effort error event on a connection that has no role yet.
async fn send_error(tx: &mpsc::Sender<String>, message: &str) {
    if let Ok(json) = serialize(&ServerMessage::error(message)) {
        let _ = tx.send(json).await;
    }
}
