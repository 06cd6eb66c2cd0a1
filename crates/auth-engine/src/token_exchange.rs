//! Provider token → backend session token exchange.
//!
//! One call to the `socialLogin` callable. Each stage logs enough to tell the
//! three failure classes apart in the field:
//!
//! | stage | failure |
//! |---|---|
//! | call | `Network`: nothing structured came back |
//! | parse | `InvalidResponse`: a reply arrived but is not the expected object |
//! | extract | `MissingToken`: the object has no usable `customToken` |

use crate::callable::{json_type, CallableClient};
use crate::credential::{BackendSessionToken, ExchangeRequest};
use crate::error::{AuthError, AuthResult};
use crate::provider::{Provider, ProviderPath};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info, warn};

/// Callable function name of the exchange endpoint.
pub const SOCIAL_LOGIN_FUNCTION: &str = "socialLogin";

/// Trades a provider access token for a backend-minted session token.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    async fn exchange(&self, request: ExchangeRequest) -> AuthResult<BackendSessionToken>;
}

/// [`TokenExchange`] backed by the `socialLogin` callable function.
#[derive(Debug, Clone)]
pub struct TokenExchangeClient {
    callable: CallableClient,
}

impl TokenExchangeClient {
    pub fn new(callable: CallableClient) -> Self {
        Self { callable }
    }

    fn extract_token(result: &serde_json::Map<String, Value>) -> AuthResult<BackendSessionToken> {
        match result.get("customToken") {
            Some(Value::String(token)) => BackendSessionToken::new(token.as_str()).ok_or_else(|| {
                warn!("customToken present but empty");
                AuthError::MissingToken
            }),
            Some(other) => {
                warn!(found = json_type(other), "customToken is not a string");
                Err(AuthError::MissingToken)
            }
            None => {
                let fields: Vec<&str> = result.keys().map(String::as_str).collect();
                warn!(fields = ?fields, "customToken missing from exchange response");
                Err(AuthError::MissingToken)
            }
        }
    }
}

#[async_trait]
impl TokenExchange for TokenExchangeClient {
    async fn exchange(&self, request: ExchangeRequest) -> AuthResult<BackendSessionToken> {
        let provider = request.provider;

        if provider.path() != ProviderPath::Indirect {
            warn!(provider = %provider, "token exchange requested for a direct-path provider");
            return Err(AuthError::UnsupportedProvider(provider));
        }

        info!(
            function = SOCIAL_LOGIN_FUNCTION,
            provider = %provider,
            access_token_len = request.access_token.len(),
            "calling token exchange"
        );

        let data = serde_json::to_value(&request).map_err(|e| {
            AuthError::InvalidCredential(format!("could not encode exchange request: {}", e))
        })?;

        let result = match self.callable.call(SOCIAL_LOGIN_FUNCTION, data).await {
            Ok(result) => result,
            Err(e) => {
                error!(provider = %provider, kind = ?e.kind(), error = %e, "token exchange failed");
                return Err(e);
            }
        };

        info!(provider = %provider, fields = result.len(), "token exchange response parsed");

        let token = Self::extract_token(&result)?;
        info!(provider = %provider, token_len = token.as_str().len(), "backend session token received");
        Ok(token)
    }
}

/// Exchange stage for diagnostics output.
pub fn failure_stage(error: &AuthError) -> &'static str {
    match error {
        AuthError::Network(_) => "transport",
        AuthError::InvalidResponse(_) => "parse",
        AuthError::MissingToken => "token-extraction",
        _ => "pre-call",
    }
}

/// Indirect providers only; echoed to the endpoint as the `provider` field.
pub fn exchange_providers() -> impl Iterator<Item = Provider> {
    Provider::ALL
        .into_iter()
        .filter(|p| p.path() == ProviderPath::Indirect)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(value: Value) -> serde_json::Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_extract_token() {
        let token =
            TokenExchangeClient::extract_token(&object(serde_json::json!({ "customToken": "ctk_123" })))
                .unwrap();
        assert_eq!(token.as_str(), "ctk_123");
    }

    #[test]
    fn test_extract_token_missing_or_empty() {
        for body in [
            serde_json::json!({}),
            serde_json::json!({ "customToken": "" }),
            serde_json::json!({ "customToken": null }),
            serde_json::json!({ "customToken": 42 }),
        ] {
            assert_eq!(
                TokenExchangeClient::extract_token(&object(body)),
                Err(AuthError::MissingToken)
            );
        }
    }

    #[test]
    fn test_exchange_providers_are_indirect() {
        let providers: Vec<Provider> = exchange_providers().collect();
        assert_eq!(providers, vec![Provider::Kakao, Provider::Naver]);
    }

    #[test]
    fn test_failure_stage() {
        assert_eq!(failure_stage(&AuthError::Network("x".into())), "transport");
        assert_eq!(failure_stage(&AuthError::InvalidResponse("x".into())), "parse");
        assert_eq!(failure_stage(&AuthError::MissingToken), "token-extraction");
    }

    #[tokio::test]
    async fn test_direct_provider_is_rejected_without_a_call() {
        // Unroutable address: a request would surface as Network, not UnsupportedProvider.
        let client = TokenExchangeClient::new(CallableClient::new("http://127.0.0.1:9"));
        let error = client
            .exchange(ExchangeRequest::new("tok", Provider::Apple))
            .await
            .unwrap_err();
        assert_eq!(error, AuthError::UnsupportedProvider(Provider::Apple));
    }
}
