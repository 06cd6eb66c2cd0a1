//! Values that flow through one authentication attempt.
//!
//! None of these are persisted by the engine. `Debug` output never includes
//! token material, only lengths.

use crate::provider::{Provider, ProviderPath};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Backend user identifier.
pub type UserId = String;

/// Name components Apple returns on first authorization only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonName {
    pub given_name: Option<String>,
    pub family_name: Option<String>,
}

impl PersonName {
    /// "Given Family", skipping absent parts. `None` when both are absent.
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" "))
        }
    }
}

/// Raw result of a Naver login request.
#[derive(Clone, PartialEq, Eq)]
pub struct NaverLoginResult {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for NaverLoginResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NaverLoginResult")
            .field("access_token_len", &self.access_token.len())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Opaque bearer value(s) obtained from a provider's native flow.
#[derive(Clone, PartialEq, Eq)]
pub enum ProviderCredential {
    /// Signed identity token plus the raw (unhashed) nonce it was requested with.
    Apple {
        identity_token: String,
        raw_nonce: String,
        full_name: Option<PersonName>,
    },
    Google {
        id_token: String,
        access_token: String,
    },
    Kakao {
        access_token: String,
    },
    Naver(NaverLoginResult),
}

/// Where a credential goes next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialRoute {
    /// Straight to the backend auth layer.
    Direct(NativeAssertion),
    /// Through the token exchange first.
    Indirect(ExchangeRequest),
}

impl ProviderCredential {
    pub fn provider(&self) -> Provider {
        match self {
            ProviderCredential::Apple { .. } => Provider::Apple,
            ProviderCredential::Google { .. } => Provider::Google,
            ProviderCredential::Kakao { .. } => Provider::Kakao,
            ProviderCredential::Naver(_) => Provider::Naver,
        }
    }

    /// Split the credential into the direct or indirect path.
    pub fn into_route(self) -> CredentialRoute {
        match self {
            ProviderCredential::Apple {
                identity_token,
                raw_nonce,
                full_name,
            } => CredentialRoute::Direct(NativeAssertion::Apple {
                id_token: identity_token,
                raw_nonce,
                full_name,
            }),
            ProviderCredential::Google {
                id_token,
                access_token,
            } => CredentialRoute::Direct(NativeAssertion::Google {
                id_token,
                access_token,
            }),
            ProviderCredential::Kakao { access_token } => {
                CredentialRoute::Indirect(ExchangeRequest::new(access_token, Provider::Kakao))
            }
            ProviderCredential::Naver(login) => CredentialRoute::Indirect(ExchangeRequest::new(
                login.access_token,
                Provider::Naver,
            )),
        }
    }
}

impl fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderCredential::Apple {
                identity_token,
                full_name,
                ..
            } => f
                .debug_struct("Apple")
                .field("identity_token_len", &identity_token.len())
                .field("has_full_name", &full_name.is_some())
                .finish(),
            ProviderCredential::Google {
                id_token,
                access_token,
            } => f
                .debug_struct("Google")
                .field("id_token_len", &id_token.len())
                .field("access_token_len", &access_token.len())
                .finish(),
            ProviderCredential::Kakao { access_token } => f
                .debug_struct("Kakao")
                .field("access_token_len", &access_token.len())
                .finish(),
            ProviderCredential::Naver(login) => f.debug_tuple("Naver").field(login).finish(),
        }
    }
}

/// A provider identity assertion the backend auth layer accepts natively.
#[derive(Clone, PartialEq, Eq)]
pub enum NativeAssertion {
    Apple {
        id_token: String,
        raw_nonce: String,
        full_name: Option<PersonName>,
    },
    Google {
        id_token: String,
        access_token: String,
    },
}

impl NativeAssertion {
    pub fn provider(&self) -> Provider {
        match self {
            NativeAssertion::Apple { .. } => Provider::Apple,
            NativeAssertion::Google { .. } => Provider::Google,
        }
    }
}

impl fmt::Debug for NativeAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeAssertion")
            .field("provider", &self.provider())
            .finish_non_exhaustive()
    }
}

/// Parameters of one token exchange call: `{accessToken, provider}`.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRequest {
    pub access_token: String,
    pub provider: Provider,
}

impl ExchangeRequest {
    pub fn new(access_token: impl Into<String>, provider: Provider) -> Self {
        Self {
            access_token: access_token.into(),
            provider,
        }
    }
}

impl fmt::Debug for ExchangeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExchangeRequest")
            .field("access_token_len", &self.access_token.len())
            .field("provider", &self.provider)
            .finish()
    }
}

/// Short-lived backend-minted credential. Never empty.
#[derive(Clone, PartialEq, Eq)]
pub struct BackendSessionToken(String);

impl BackendSessionToken {
    /// `None` for an empty or whitespace-only token.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BackendSessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BackendSessionToken(len={})", self.0.len())
    }
}

impl CredentialRoute {
    pub fn path(&self) -> ProviderPath {
        match self {
            CredentialRoute::Direct(_) => ProviderPath::Direct,
            CredentialRoute::Indirect(_) => ProviderPath::Indirect,
        }
    }
}
