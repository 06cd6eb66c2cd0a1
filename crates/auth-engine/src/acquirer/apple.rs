//! Sign in with Apple.

use super::{CredentialAcquirer, CredentialCompletion, SdkError};
use crate::claims;
use crate::credential::{PersonName, ProviderCredential};
use crate::error::AuthError;
use crate::nonce::{random_nonce, sha256_hex, NONCE_LENGTH};
use crate::provider::{PresentationContext, Provider};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppleScope {
    FullName,
    Email,
}

/// Authorization request handed to the native Apple flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppleIdRequest {
    pub scopes: Vec<AppleScope>,
    /// SHA-256 hex of the raw nonce. The raw value never leaves the engine.
    pub nonce_sha256: String,
}

/// What the native flow hands back on success.
#[derive(Clone, Default)]
pub struct AppleIdCredential {
    /// UTF-8 bytes of the signed identity token.
    pub identity_token: Option<Vec<u8>>,
    /// Present on first authorization only.
    pub full_name: Option<PersonName>,
}

impl fmt::Debug for AppleIdCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppleIdCredential")
            .field(
                "identity_token_len",
                &self.identity_token.as_ref().map(Vec::len),
            )
            .field("full_name", &self.full_name)
            .finish()
    }
}

pub type AppleAuthorizationCallback =
    Box<dyn FnOnce(Result<AppleIdCredential, SdkError>) + Send + 'static>;

/// Native Apple authorization controller.
pub trait AppleAuthorizationSdk: Send + Sync {
    fn perform_request(
        &self,
        request: AppleIdRequest,
        context: &PresentationContext,
        callback: AppleAuthorizationCallback,
    );
}

type NonceSource = Arc<dyn Fn() -> String + Send + Sync>;

pub struct AppleAcquirer {
    sdk: Arc<dyn AppleAuthorizationSdk>,
    nonce_source: NonceSource,
}

impl AppleAcquirer {
    pub fn new(sdk: Arc<dyn AppleAuthorizationSdk>) -> Self {
        Self {
            sdk,
            nonce_source: Arc::new(|| random_nonce(NONCE_LENGTH)),
        }
    }

    /// Replace the random nonce generator.
    pub fn with_nonce_source<F>(mut self, source: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.nonce_source = Arc::new(source);
        self
    }
}

/// Check the returned credential against the nonce this attempt generated.
fn verify_credential(
    credential: AppleIdCredential,
    raw_nonce: String,
) -> Result<ProviderCredential, AuthError> {
    if raw_nonce.is_empty() {
        return Err(AuthError::InvalidCredential(
            "apple request was sent without a nonce".into(),
        ));
    }

    let token_bytes = credential.identity_token.ok_or_else(|| {
        AuthError::InvalidCredential("apple returned no identity token".into())
    })?;
    let identity_token = String::from_utf8(token_bytes).map_err(|_| {
        AuthError::InvalidCredential("apple identity token is not valid UTF-8".into())
    })?;
    if identity_token.is_empty() {
        return Err(AuthError::InvalidCredential(
            "apple returned an empty identity token".into(),
        ));
    }

    let expected = sha256_hex(&raw_nonce);
    match claims::string_claim(&identity_token, "nonce") {
        Some(actual) if actual == expected => {}
        Some(_) => {
            return Err(AuthError::InvalidCredential(
                "apple identity token nonce does not match the request".into(),
            ))
        }
        None => {
            return Err(AuthError::InvalidCredential(
                "apple identity token carries no nonce".into(),
            ))
        }
    }

    Ok(ProviderCredential::Apple {
        identity_token,
        raw_nonce,
        full_name: credential.full_name,
    })
}

impl CredentialAcquirer for AppleAcquirer {
    fn provider(&self) -> Provider {
        Provider::Apple
    }

    fn acquire(&self, context: &PresentationContext, completion: CredentialCompletion) {
        let raw_nonce = (self.nonce_source)();
        let request = AppleIdRequest {
            scopes: vec![AppleScope::FullName, AppleScope::Email],
            nonce_sha256: sha256_hex(&raw_nonce),
        };

        debug!(window = %context.window_id(), "requesting apple authorization");

        self.sdk.perform_request(
            request,
            context,
            Box::new(move |result| match result {
                Ok(credential) => match verify_credential(credential, raw_nonce) {
                    Ok(credential) => completion.succeed(credential),
                    Err(error) => {
                        warn!(error = %error, "apple credential rejected");
                        completion.fail(error);
                    }
                },
                Err(sdk_error) => {
                    warn!(code = %sdk_error.code, "apple authorization failed");
                    completion.fail(sdk_error.into_auth_error(Provider::Apple));
                }
            }),
        );
    }
}
