//! Process-wide session registry
//!
//! Maps the two kinds of secret tokens to live sessions. The join entry is
//! released when the initiator's connection goes away; the watch entry
//! lives for the rest of the process, which is an accepted bounded leak
//! for a single-process service.

use super::session::Session;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

/// Shared handle to one session's state.
pub type SessionHandle = Arc<Mutex<Session>>;

#[derive(Default)]
struct RegistryInner {
    /// Sessions still accepting a second player
    join: HashMap<String, SessionHandle>,

    /// Sessions accepting spectators
    watch: HashMap<String, SessionHandle>,
}

/// Token-to-session store shared by every connection task.
#[derive(Default)]
pub struct SessionRegistry {
    inner: RwLock<RegistryInner>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session and register it under fresh join and watch tokens.
    ///
    /// Tokens are v4 UUIDs in simple form: 122 bits from the OS CSPRNG,
    /// hex-encoded, URL-safe, never reused.
    pub async fn create(&self) -> (String, String, SessionHandle) {
        let join_token = new_token();
        let watch_token = new_token();
        let session: SessionHandle = Arc::new(Mutex::new(Session::new()));

        let mut inner = self.inner.write().await;
        inner.join.insert(join_token.clone(), Arc::clone(&session));
        inner.watch.insert(watch_token.clone(), Arc::clone(&session));

        tracing::info!("Session created ({} watchable)", inner.watch.len());
        (join_token, watch_token, session)
    }

    /// Look up a session still accepting its second player
    pub async fn lookup_join(&self, token: &str) -> Option<SessionHandle> {
        self.inner.read().await.join.get(token).cloned()
    }

    /// Look up a session for spectating
    pub async fn lookup_watch(&self, token: &str) -> Option<SessionHandle> {
        self.inner.read().await.watch.get(token).cloned()
    }

    /// Stop admitting a second player through this token.
    ///
    /// Called when the initiator's connection exits; the session itself and
    /// its watch token stay alive.
    pub async fn release_join(&self, token: &str) {
        self.inner.write().await.join.remove(token);
    }

    /// Number of sessions still accepting a second player
    pub async fn joinable_count(&self) -> usize {
        self.inner.read().await.join.len()
    }
}

fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}
