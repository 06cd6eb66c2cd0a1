//! The process-wide session cell and its change listeners.

use crate::credential::UserId;
use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, ReentrantMutex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// An authenticated backend session.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSession {
    pub user_id: UserId,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    /// Identity provider the session was established with (`apple.com`,
    /// `google.com`, `custom`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
}

impl BackendSession {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// True when the id token expires within `margin` of `now`.
    pub fn expires_within(&self, now: DateTime<Utc>, margin: Duration) -> bool {
        self.expires_at <= now + margin
    }
}

impl fmt::Debug for BackendSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSession")
            .field("user_id", &self.user_id)
            .field("id_token_len", &self.id_token.len())
            .field("refresh_token_len", &self.refresh_token.len())
            .field("expires_at", &self.expires_at)
            .field("provider_id", &self.provider_id)
            .finish()
    }
}

/// Session change handler. Receives the current user id, `None` when signed out.
pub type SessionListener = Arc<dyn Fn(Option<UserId>) + Send + Sync>;

/// Registration token returned by `add_listener`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerHandle(u64);

struct Inner {
    session: Option<BackendSession>,
    listeners: BTreeMap<u64, SessionListener>,
    next_id: u64,
}

/// Single authoritative session value plus its listener registry.
///
/// Listeners run outside the state lock, so a listener may read the state or
/// register and remove listeners. Notifications are serialized: listeners
/// observe changes in the order they were applied.
pub struct SessionState {
    inner: Mutex<Inner>,
    notify_lock: ReentrantMutex<()>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                session: None,
                listeners: BTreeMap::new(),
                next_id: 1,
            }),
            notify_lock: ReentrantMutex::new(()),
        }
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.inner
            .lock()
            .session
            .as_ref()
            .map(|session| session.user_id.clone())
    }

    pub fn session(&self) -> Option<BackendSession> {
        self.inner.lock().session.clone()
    }

    /// Install a new session and notify every listener.
    pub fn set_session(&self, session: BackendSession) {
        let _serial = self.notify_lock.lock();
        let user_id = session.user_id.clone();
        let listeners = {
            let mut inner = self.inner.lock();
            inner.session = Some(session);
            inner.listeners.values().cloned().collect::<Vec<_>>()
        };
        tracing::debug!(user_id = %user_id, listeners = listeners.len(), "session set");
        for listener in listeners {
            listener(Some(user_id.clone()));
        }
    }

    /// Replace tokens of the current session without notifying.
    ///
    /// Used after a refresh for the same user. Ignored when the user differs
    /// or there is no session.
    pub fn update_tokens(&self, session: BackendSession) -> bool {
        let mut inner = self.inner.lock();
        match inner.session.as_ref() {
            Some(current) if current.user_id == session.user_id => {
                inner.session = Some(session);
                true
            }
            _ => false,
        }
    }

    /// Drop the session. Listeners are notified only if one existed.
    pub fn clear(&self) -> bool {
        let _serial = self.notify_lock.lock();
        let listeners = {
            let mut inner = self.inner.lock();
            if inner.session.take().is_none() {
                return false;
            }
            inner.listeners.values().cloned().collect::<Vec<_>>()
        };
        tracing::debug!(listeners = listeners.len(), "session cleared");
        for listener in listeners {
            listener(None);
        }
        true
    }

    /// Register `listener` and immediately call it with the current state.
    pub fn add_listener(&self, listener: SessionListener) -> ListenerHandle {
        let _serial = self.notify_lock.lock();
        let (handle, current) = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.listeners.insert(id, listener.clone());
            (
                ListenerHandle(id),
                inner.session.as_ref().map(|s| s.user_id.clone()),
            )
        };
        listener(current);
        handle
    }

    pub fn remove_listener(&self, handle: ListenerHandle) -> bool {
        self.inner.lock().listeners.remove(&handle.0).is_some()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("SessionState")
            .field("session", &inner.session)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}
