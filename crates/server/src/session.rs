//! Server-side sessions keyed by an opaque cookie value.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderValue};
use catalog_core::domain::principal::Principal;
use tokio::sync::RwLock;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "catalog_session";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn start(&self, principal: Principal) -> SessionId;

    async fn get(&self, id: &SessionId) -> Option<Principal>;

    /// Invalidates the session. Lookups afterwards return `None`; ending an
    /// unknown session does nothing.
    async fn end(&self, id: &SessionId);
}

struct SessionEntry {
    principal: Principal,
    last_seen: Instant,
}

/// Sessions idle for `ttl` are treated as ended and dropped.
#[derive(Clone)]
pub struct InMemorySessionStore {
    ttl: Duration,
    sessions: Arc<RwLock<HashMap<SessionId, SessionEntry>>>,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, sessions: Arc::default() }
    }

    fn is_expired(&self, entry: &SessionEntry) -> bool {
        entry.last_seen.elapsed() >= self.ttl
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn start(&self, principal: Principal) -> SessionId {
        let id = SessionId::generate();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, entry| !self.is_expired(entry));
        sessions.insert(id.clone(), SessionEntry { principal, last_seen: Instant::now() });
        id
    }

    async fn get(&self, id: &SessionId) -> Option<Principal> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        if self.is_expired(entry) {
            sessions.remove(id);
            return None;
        }
        entry.last_seen = Instant::now();
        Some(entry.principal.clone())
    }

    async fn end(&self, id: &SessionId) {
        self.sessions.write().await.remove(id);
    }
}

/// Reads the session id from the `Cookie` request headers, if any.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| SessionId(value.to_string()))
}

pub fn session_cookie(id: &SessionId) -> HeaderValue {
    // uuid text is always a valid header value
    HeaderValue::from_str(&format!("{SESSION_COOKIE}={id}; HttpOnly; Path=/; SameSite=Lax"))
        .unwrap_or_else(|_| clear_session_cookie())
}

pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("catalog_session=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
}
