//! Session authenticator: one authoritative sign-in call, no retry.

use crate::backend::AuthBackend;
use crate::credential::{BackendSessionToken, NativeAssertion, UserId};
use crate::error::AuthResult;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct SessionAuthenticator {
    backend: Arc<dyn AuthBackend>,
}

impl SessionAuthenticator {
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &Arc<dyn AuthBackend> {
        &self.backend
    }

    /// Sign in with a backend-minted session token.
    ///
    /// Does not touch session state itself; the backend's change notification
    /// carries the new user.
    pub async fn sign_in(&self, token: &BackendSessionToken) -> AuthResult<UserId> {
        match self.backend.sign_in_with_custom_token(token).await {
            Ok(user_id) => {
                info!(user_id = %user_id, "backend sign-in succeeded");
                Ok(user_id)
            }
            Err(e) => {
                warn!(kind = ?e.kind(), error = %e, "backend sign-in failed");
                Err(e)
            }
        }
    }

    /// Sign in with a natively recognized provider assertion.
    pub async fn sign_in_with_assertion(&self, assertion: &NativeAssertion) -> AuthResult<UserId> {
        let provider = assertion.provider();
        match self.backend.sign_in_with_assertion(assertion).await {
            Ok(user_id) => {
                info!(provider = %provider, user_id = %user_id, "backend sign-in succeeded");
                Ok(user_id)
            }
            Err(e) => {
                warn!(provider = %provider, kind = ?e.kind(), error = %e, "backend sign-in failed");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for SessionAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionAuthenticator").finish_non_exhaustive()
    }
}
