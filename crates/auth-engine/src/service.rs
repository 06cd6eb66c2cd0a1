//! Host-facing entry point.

use crate::backend::AuthBackend;
use crate::credential::UserId;
use crate::error::{AuthError, AuthOutcome, AuthResult};
use crate::orchestrator::{AttemptId, AuthOrchestrator, OutcomeCallback};
use crate::provider::{PresentationContext, Provider};
use crate::publisher::SessionPublisher;
use crate::url_router::{UrlCallbackRouter, UrlRouting};
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

/// Bundles the orchestrator, session publisher, account actions and URL
/// routing behind one object owned by the host UI.
pub struct AuthService {
    orchestrator: AuthOrchestrator,
    publisher: SessionPublisher,
    backend: Arc<dyn AuthBackend>,
    router: UrlCallbackRouter,
}

impl AuthService {
    pub fn new(
        orchestrator: AuthOrchestrator,
        publisher: SessionPublisher,
        backend: Arc<dyn AuthBackend>,
        router: UrlCallbackRouter,
    ) -> Self {
        Self {
            orchestrator,
            publisher,
            backend,
            router,
        }
    }

    pub fn orchestrator(&self) -> &AuthOrchestrator {
        &self.orchestrator
    }

    pub fn publisher(&self) -> &SessionPublisher {
        &self.publisher
    }

    pub fn authenticate(
        &self,
        provider: Provider,
        context: PresentationContext,
        on_outcome: OutcomeCallback,
    ) -> AttemptId {
        self.orchestrator.authenticate(provider, context, on_outcome)
    }

    pub async fn authenticate_async(
        &self,
        provider: Provider,
        context: PresentationContext,
    ) -> AuthOutcome {
        self.orchestrator.authenticate_async(provider, context).await
    }

    /// Start publishing session changes.
    pub fn start(&self) -> bool {
        self.publisher.start()
    }

    pub fn stop(&self) -> bool {
        self.publisher.stop()
    }

    pub fn observe<F>(&self, handler: F)
    where
        F: Fn(Option<UserId>) + Send + Sync + 'static,
    {
        self.publisher.observe(handler);
    }

    pub fn current_user(&self) -> Option<UserId> {
        self.publisher.current_user()
    }

    /// Sign out. The publisher forwards the cleared session.
    pub fn logout(&self) -> AuthResult<()> {
        let user_id = self.backend.current_user();
        match self.backend.sign_out() {
            Ok(()) => {
                info!(user_id = ?user_id, "logged out");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "logout failed");
                Err(e)
            }
        }
    }

    /// Irreversibly delete the signed-in account.
    ///
    /// Fails with `UserNotFound` without any network call when signed out.
    pub async fn delete_account(&self) -> AuthResult<()> {
        let user_id = self.backend.current_user().ok_or(AuthError::UserNotFound)?;
        info!(user_id = %user_id, "deleting account");

        self.backend.delete_current_user().await.map_err(|e| {
            warn!(user_id = %user_id, error = %e, "account deletion failed");
            e
        })
    }

    pub fn handle_url(&self, url: &Url) -> UrlRouting {
        self.router.route(url)
    }

    pub fn handle_url_str(&self, raw: &str) -> UrlRouting {
        self.router.route_str(raw)
    }
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("orchestrator", &self.orchestrator)
            .field("publisher", &self.publisher)
            .field("router", &self.router)
            .finish()
    }
}
