//! Authentication error taxonomy.
//!
//! Every failure inside the engine is classified into exactly one
//! [`AuthError`] variant at the layer where it happens and is forwarded
//! unchanged from there. Upper layers never re-classify.

use crate::provider::Provider;
use std::fmt;
use thiserror::Error;

/// Detail of a provider-native failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkFailure {
    /// The provider flow completed but handed back no access token.
    FailedToGetToken,
    /// The provider SDK reported an error of its own.
    Native { code: String, message: String },
    /// The provider SDK released its completion without ever calling it.
    CallbackDropped,
}

impl fmt::Display for SdkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdkFailure::FailedToGetToken => write!(f, "failed to get token"),
            SdkFailure::Native { code, message } => write!(f, "{} ({})", message, code),
            SdkFailure::CallbackDropped => write!(f, "completion dropped without a result"),
        }
    }
}

/// Authentication error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Provider returned no usable token/assertion, or the presentation context is unsuitable
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),

    /// No acquirer is wired for this provider
    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(Provider),

    /// The action requires an authenticated session and there is none
    #[error("Not logged in")]
    UserNotFound,

    /// Passthrough of a provider-native error
    #[error("{provider} SDK error: {failure}")]
    ProviderSdk {
        provider: Provider,
        failure: SdkFailure,
    },

    /// Transport failure: no structured response was received
    #[error("Network error: {0}")]
    Network(String),

    /// Transport succeeded but the payload is not in the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Payload is well-formed but the session token field is absent or empty
    #[error("Token missing from exchange response")]
    MissingToken,

    /// The backend auth layer rejected sign-in, sign-out, or delete
    #[error("Authentication failed: {0}")]
    AuthFailed(String),
}

/// Fieldless view of [`AuthError`] for matching on the class only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    InvalidCredential,
    UnsupportedProvider,
    UserNotFound,
    ProviderSdk,
    Network,
    InvalidResponse,
    MissingToken,
    AuthFailed,
}

impl AuthError {
    /// The class of this error.
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AuthError::InvalidCredential(_) => AuthErrorKind::InvalidCredential,
            AuthError::UnsupportedProvider(_) => AuthErrorKind::UnsupportedProvider,
            AuthError::UserNotFound => AuthErrorKind::UserNotFound,
            AuthError::ProviderSdk { .. } => AuthErrorKind::ProviderSdk,
            AuthError::Network(_) => AuthErrorKind::Network,
            AuthError::InvalidResponse(_) => AuthErrorKind::InvalidResponse,
            AuthError::MissingToken => AuthErrorKind::MissingToken,
            AuthError::AuthFailed(_) => AuthErrorKind::AuthFailed,
        }
    }

    /// Shorthand for a provider SDK failure.
    pub fn sdk(provider: Provider, failure: SdkFailure) -> Self {
        AuthError::ProviderSdk { provider, failure }
    }

    /// Classify a reqwest failure that happened before any response arrived.
    pub(crate) fn transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            AuthError::Network(format!("request timed out: {}", error))
        } else if error.is_connect() {
            AuthError::Network(format!("connection failed: {}", error))
        } else {
            AuthError::Network(error.to_string())
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

/// Final result of one authentication attempt.
///
/// Every call to `authenticate` resolves to exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success,
    Failure(AuthError),
}

impl AuthOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success)
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&AuthError> {
        match self {
            AuthOutcome::Success => None,
            AuthOutcome::Failure(error) => Some(error),
        }
    }

    /// The failure class, if any.
    pub fn error_kind(&self) -> Option<AuthErrorKind> {
        self.error().map(AuthError::kind)
    }
}

impl From<AuthResult<()>> for AuthOutcome {
    fn from(result: AuthResult<()>) -> Self {
        match result {
            Ok(()) => AuthOutcome::Success,
            Err(error) => AuthOutcome::Failure(error),
        }
    }
}
