//! REST connector for an Identity Toolkit style auth backend.
//!
//! Endpoints used:
//! - `accounts:signInWithCustomToken` for tokens minted by the exchange
//! - `accounts:signInWithIdp` for Apple and Google assertions
//! - `accounts:update` to set the display name Apple returns on first sign-in
//! - `accounts:delete`
//! - secure token `token` endpoint for the startup refresh

use super::session_state::{BackendSession, ListenerHandle, SessionListener, SessionState};
use super::storage::SessionVault;
use super::AuthBackend;
use crate::claims;
use crate::credential::{BackendSessionToken, NativeAssertion, UserId};
use crate::error::{AuthError, AuthResult};
use crate::http::{error_detail, summarize_response_body};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeDelta, Utc};
use client_config_and_utils::BackendConfig;
use serde::de::DeserializeOwned;
use parking_lot::ReentrantMutex;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Redirect URI the IdP endpoint requires even for native assertions.
const IDP_REQUEST_URI: &str = "http://localhost";

/// Result of [`IdentityToolkitBackend::validate_session_on_startup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupValidation {
    /// Nothing persisted.
    NoSession,
    /// The backend accepted the stored refresh token.
    Valid(UserId),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    #[serde(default)]
    local_id: Option<String>,
    #[serde(default)]
    provider_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    id_token: String,
    refresh_token: String,
    expires_in: String,
    user_id: String,
}

pub struct IdentityToolkitBackend {
    http_client: reqwest::Client,
    auth_base_url: String,
    token_base_url: String,
    api_key: String,
    state: Arc<SessionState>,
    vault: SessionVault,
    /// Held across a vault write and the matching state change so the
    /// persisted session is always the published one.
    persist_lock: ReentrantMutex<()>,
}

impl IdentityToolkitBackend {
    pub fn new(config: &BackendConfig, vault: SessionVault) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            auth_base_url: config.auth_base_url.trim_end_matches('/').to_string(),
            token_base_url: config.token_base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            state: Arc::new(SessionState::new()),
            vault,
            persist_lock: ReentrantMutex::new(()),
        }
    }

    /// The session cell this backend writes to.
    pub fn state(&self) -> Arc<SessionState> {
        self.state.clone()
    }

    fn accounts_url(&self, method: &str) -> String {
        format!("{}/v1/accounts:{}?key={}", self.auth_base_url, method, self.api_key)
    }

    fn token_url(&self) -> String {
        format!("{}/v1/token?key={}", self.token_base_url, self.api_key)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        url: &str,
        body: &serde_json::Value,
    ) -> AuthResult<T> {
        let response = self
            .http_client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(AuthError::transport)?;
        self.read_reply(operation, response).await
    }

    async fn read_reply<T: DeserializeOwned>(
        &self,
        operation: &str,
        response: reqwest::Response,
    ) -> AuthResult<T> {
        let status = response.status();
        let body = response.text().await.map_err(AuthError::transport)?;

        if !status.is_success() {
            let detail = error_detail(&body).unwrap_or_else(|| summarize_response_body(&body));
            warn!(operation, status = %status, detail = %detail, "backend rejected request");
            return Err(AuthError::AuthFailed(format!(
                "{} rejected: HTTP {}: {}",
                operation, status, detail
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            warn!(operation, body_summary = %summarize_response_body(&body), "malformed backend reply");
            AuthError::AuthFailed(format!("{} returned a malformed reply: {}", operation, e))
        })
    }

    fn session_from(
        &self,
        operation: &str,
        reply: SignInResponse,
        provider_id: Option<String>,
    ) -> AuthResult<BackendSession> {
        let user_id = reply
            .local_id
            .filter(|id| !id.is_empty())
            .or_else(|| claims::string_claim(&reply.id_token, "user_id"))
            .or_else(|| claims::string_claim(&reply.id_token, "sub"))
            .ok_or_else(|| {
                AuthError::AuthFailed(format!("{} reply carries no user id", operation))
            })?;

        Ok(BackendSession {
            user_id,
            expires_at: expiry_from_now(operation, &reply.expires_in)?,
            id_token: reply.id_token,
            refresh_token: reply.refresh_token,
            provider_id: reply.provider_id.or(provider_id),
        })
    }

    /// Persist then publish. A persistence failure does not undo the sign-in.
    fn install(&self, session: BackendSession) -> UserId {
        let _persist = self.persist_lock.lock();
        if let Err(e) = self.vault.save(&session) {
            warn!(error = %e, "failed to persist session, continuing with in-memory session");
        }
        let user_id = session.user_id.clone();
        self.state.set_session(session);
        user_id
    }

    async fn set_display_name(&self, id_token: &str, display_name: &str) -> AuthResult<()> {
        let _: serde_json::Value = self
            .post_json(
                "accounts:update",
                &self.accounts_url("update"),
                &serde_json::json!({
                    "idToken": id_token,
                    "displayName": display_name,
                    "returnSecureToken": false,
                }),
            )
            .await?;
        Ok(())
    }

    async fn refresh(&self, session: &BackendSession) -> AuthResult<BackendSession> {
        let response = self
            .http_client
            .post(self.token_url())
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", session.refresh_token.as_str()),
            ])
            .send()
            .await
            .map_err(AuthError::transport)?;
        let reply: RefreshResponse = self.read_reply("token refresh", response).await?;

        Ok(BackendSession {
            user_id: reply.user_id,
            expires_at: expiry_from_now("token refresh", &reply.expires_in)?,
            id_token: reply.id_token,
            refresh_token: reply.refresh_token,
            provider_id: session.provider_id.clone(),
        })
    }

    /// Load a persisted session into the session cell. Listeners see the
    /// restored user.
    pub fn restore_session(&self) -> AuthResult<Option<UserId>> {
        let stored = self
            .vault
            .load()
            .map_err(|e| AuthError::AuthFailed(format!("failed to read stored session: {}", e)))?;

        match stored {
            Some(session) => {
                let _persist = self.persist_lock.lock();
                info!(user_id = %session.user_id, "restored stored session");
                let user_id = session.user_id.clone();
                self.state.set_session(session);
                Ok(Some(user_id))
            }
            None => {
                debug!("no stored session");
                Ok(None)
            }
        }
    }

    /// Restore the stored session and confirm it with one refresh call.
    ///
    /// A rejection is treated as backend-driven invalidation: the session is
    /// cleared and listeners are told. A transport failure keeps the session.
    pub async fn validate_session_on_startup(&self) -> AuthResult<StartupValidation> {
        if self.state.session().is_none() && self.restore_session()?.is_none() {
            return Ok(StartupValidation::NoSession);
        }
        let session = match self.state.session() {
            Some(session) => session,
            None => return Ok(StartupValidation::NoSession),
        };

        match self.refresh(&session).await {
            Ok(refreshed) if refreshed.user_id == session.user_id => {
                let _persist = self.persist_lock.lock();
                if let Err(e) = self.vault.save(&refreshed) {
                    warn!(error = %e, "failed to persist refreshed session");
                }
                self.state.update_tokens(refreshed);
                info!(user_id = %session.user_id, "session validated on startup");
                Ok(StartupValidation::Valid(session.user_id))
            }
            Ok(refreshed) => {
                warn!(
                    stored = %session.user_id,
                    returned = %refreshed.user_id,
                    "refresh returned a different user, clearing session"
                );
                self.invalidate();
                Err(AuthError::AuthFailed("refresh returned a different user".into()))
            }
            Err(AuthError::AuthFailed(reason)) => {
                warn!(user_id = %session.user_id, reason = %reason, "stored session rejected, clearing");
                self.invalidate();
                Err(AuthError::AuthFailed(reason))
            }
            Err(e) => {
                warn!(error = %e, "could not reach backend to validate session");
                Err(e)
            }
        }
    }

    fn invalidate(&self) {
        let _persist = self.persist_lock.lock();
        if let Err(e) = self.vault.clear() {
            warn!(error = %e, "failed to clear stored session");
        }
        self.state.clear();
    }
}

fn parse_expires_in(operation: &str, value: &str) -> AuthResult<TimeDelta> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|seconds| *seconds >= 0)
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(|| {
            AuthError::AuthFailed(format!("{} returned an invalid expiresIn: {:?}", operation, value))
        })
}

fn expiry_after(operation: &str, value: &str, now: DateTime<Utc>) -> AuthResult<DateTime<Utc>> {
    now.checked_add_signed(parse_expires_in(operation, value)?)
        .ok_or_else(|| {
            AuthError::AuthFailed(format!("{} returned an out of range expiresIn: {:?}", operation, value))
        })
}

fn expiry_from_now(operation: &str, value: &str) -> AuthResult<DateTime<Utc>> {
    expiry_after(operation, value, Utc::now())
}

fn idp_post_body(assertion: &NativeAssertion) -> (String, &'static str) {
    let mut form = url::form_urlencoded::Serializer::new(String::new());
    let provider_id = match assertion {
        NativeAssertion::Apple {
            id_token,
            raw_nonce,
            ..
        } => {
            form.append_pair("id_token", id_token)
                .append_pair("nonce", raw_nonce)
                .append_pair("providerId", "apple.com");
            "apple.com"
        }
        NativeAssertion::Google {
            id_token,
            access_token,
        } => {
            form.append_pair("id_token", id_token)
                .append_pair("access_token", access_token)
                .append_pair("providerId", "google.com");
            "google.com"
        }
    };
    (form.finish(), provider_id)
}

#[async_trait]
impl AuthBackend for IdentityToolkitBackend {
    async fn sign_in_with_custom_token(&self, token: &BackendSessionToken) -> AuthResult<UserId> {
        debug!(token_len = token.as_str().len(), "signing in with custom token");

        let reply: SignInResponse = self
            .post_json(
                "accounts:signInWithCustomToken",
                &self.accounts_url("signInWithCustomToken"),
                &serde_json::json!({
                    "token": token.as_str(),
                    "returnSecureToken": true,
                }),
            )
            .await?;

        let session = self.session_from("accounts:signInWithCustomToken", reply, Some("custom".into()))?;
        let user_id = self.install(session);
        info!(user_id = %user_id, "signed in with custom token");
        Ok(user_id)
    }

    async fn sign_in_with_assertion(&self, assertion: &NativeAssertion) -> AuthResult<UserId> {
        let (post_body, provider_id) = idp_post_body(assertion);
        debug!(provider_id, "signing in with identity provider assertion");

        let reply: SignInResponse = self
            .post_json(
                "accounts:signInWithIdp",
                &self.accounts_url("signInWithIdp"),
                &serde_json::json!({
                    "postBody": post_body,
                    "requestUri": IDP_REQUEST_URI,
                    "returnSecureToken": true,
                    "returnIdpCredential": true,
                }),
            )
            .await?;

        let session = self.session_from("accounts:signInWithIdp", reply, Some(provider_id.into()))?;

        if let NativeAssertion::Apple {
            full_name: Some(name),
            ..
        } = assertion
        {
            if let Some(display_name) = name.display_name() {
                if let Err(e) = self.set_display_name(&session.id_token, &display_name).await {
                    warn!(error = %e, "failed to set display name from apple full name");
                }
            }
        }

        let user_id = self.install(session);
        info!(user_id = %user_id, provider_id, "signed in with identity provider");
        Ok(user_id)
    }

    fn sign_out(&self) -> AuthResult<()> {
        let _persist = self.persist_lock.lock();
        self.vault
            .clear()
            .map_err(|e| AuthError::AuthFailed(format!("failed to clear stored session: {}", e)))?;
        let had_session = self.state.clear();
        info!(had_session, "signed out");
        Ok(())
    }

    async fn delete_current_user(&self) -> AuthResult<()> {
        let mut session = self.state.session().ok_or(AuthError::UserNotFound)?;

        if session.expires_within(Utc::now(), Duration::seconds(60)) {
            debug!(user_id = %session.user_id, "id token near expiry, refreshing before delete");
            let refreshed = self.refresh(&session).await?;
            if refreshed.user_id != session.user_id {
                warn!(
                    signed_in = %session.user_id,
                    returned = %refreshed.user_id,
                    "refresh before delete returned a different user, clearing session"
                );
                self.invalidate();
                return Err(AuthError::AuthFailed("refresh returned a different user".into()));
            }
            self.state.update_tokens(refreshed.clone());
            session = refreshed;
        }

        let _: serde_json::Value = self
            .post_json(
                "accounts:delete",
                &self.accounts_url("delete"),
                &serde_json::json!({ "idToken": session.id_token }),
            )
            .await?;

        info!(user_id = %session.user_id, "user deleted");
        self.invalidate();
        Ok(())
    }

    fn add_session_change_listener(&self, listener: SessionListener) -> ListenerHandle {
        self.state.add_listener(listener)
    }

    fn remove_session_change_listener(&self, handle: ListenerHandle) -> bool {
        self.state.remove_listener(handle)
    }

    fn current_user(&self) -> Option<UserId> {
        self.state.current_user()
    }
}

impl std::fmt::Debug for IdentityToolkitBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityToolkitBackend")
            .field("auth_base_url", &self.auth_base_url)
            .field("token_base_url", &self.token_base_url)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
