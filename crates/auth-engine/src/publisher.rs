//! Session state publisher.
//!
//! Holds exactly one backend session-change subscription while started and
//! fans every change out to its handlers on the UI thread. The backend stays
//! the single source of truth: no user value is cached here.

use crate::backend::{AuthBackend, ListenerHandle};
use crate::credential::UserId;
use crate::dispatch::MainThread;
use parking_lot::{Mutex, ReentrantMutex};
use std::sync::Arc;
use tracing::{debug, info};

/// Receives the current user id, `None` when signed out.
pub type SessionHandler = Arc<dyn Fn(Option<UserId>) + Send + Sync>;

pub struct SessionPublisher {
    backend: Arc<dyn AuthBackend>,
    main: Arc<dyn MainThread>,
    handlers: Arc<Mutex<Vec<SessionHandler>>>,
    /// Held while a user value is read and dispatched, by both the
    /// forwarding listener and a late `observe`, so handlers never end on a
    /// stale value.
    delivery: Arc<ReentrantMutex<()>>,
    /// Serializes start/stop so there is never more than one subscription.
    lifecycle: Mutex<()>,
    subscription: Mutex<Option<ListenerHandle>>,
}

impl SessionPublisher {
    pub fn new(backend: Arc<dyn AuthBackend>, main: Arc<dyn MainThread>) -> Self {
        Self {
            backend,
            main,
            handlers: Arc::new(Mutex::new(Vec::new())),
            delivery: Arc::new(ReentrantMutex::new(())),
            lifecycle: Mutex::new(()),
            subscription: Mutex::new(None),
        }
    }

    /// Subscribe to the backend. Handlers receive the state at subscription
    /// time first. Returns `false` if already started.
    pub fn start(&self) -> bool {
        let _lifecycle = self.lifecycle.lock();
        if self.is_started() {
            return false;
        }

        let handlers = self.handlers.clone();
        let delivery = self.delivery.clone();
        let main = self.main.clone();
        let handle = self
            .backend
            .add_session_change_listener(Arc::new(move |user: Option<UserId>| {
                let _delivery = delivery.lock();
                let snapshot: Vec<SessionHandler> = handlers.lock().clone();
                debug!(user_id = ?user, handlers = snapshot.len(), "publishing session change");
                main.dispatch(Box::new(move || {
                    for handler in &snapshot {
                        handler(user.clone());
                    }
                }));
            }));

        *self.subscription.lock() = Some(handle);
        info!("session publisher started");
        true
    }

    /// Drop the backend subscription. Safe to call any number of times.
    /// Returns `false` if it was not started.
    pub fn stop(&self) -> bool {
        let _lifecycle = self.lifecycle.lock();
        let handle = self.subscription.lock().take();
        match handle {
            Some(handle) => {
                self.backend.remove_session_change_listener(handle);
                info!("session publisher stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_started(&self) -> bool {
        self.subscription.lock().is_some()
    }

    /// Register a handler. When already started it is sent the current user
    /// right away, then every later change.
    pub fn observe<F>(&self, handler: F)
    where
        F: Fn(Option<UserId>) + Send + Sync + 'static,
    {
        let handler: SessionHandler = Arc::new(handler);
        let _delivery = self.delivery.lock();
        self.handlers.lock().push(handler.clone());

        if self.is_started() {
            let current = self.backend.current_user();
            self.main.dispatch(Box::new(move || handler(current)));
        }
    }

    /// Side-effect-free snapshot of the current user.
    pub fn current_user(&self) -> Option<UserId> {
        self.backend.current_user()
    }
}

impl Drop for SessionPublisher {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for SessionPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionPublisher")
            .field("started", &self.is_started())
            .field("handlers", &self.handlers.lock().len())
            .finish()
    }
}
