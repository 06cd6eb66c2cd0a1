//! Provider credential acquirers.
//!
//! One acquirer per provider wraps that provider's native SDK behind
//! [`CredentialAcquirer`]. The SDKs themselves are host collaborators and are
//! modelled as callback traits; acquisition stays callback-based end to end
//! because the native flows can outlive an app switch.

mod apple;
mod google;
mod kakao;
mod naver;

pub use apple::{
    AppleAcquirer, AppleAuthorizationCallback, AppleAuthorizationSdk, AppleIdCredential,
    AppleIdRequest, AppleScope,
};
pub use google::{GoogleAcquirer, GoogleSignInCallback, GoogleSignInSdk, GoogleUser};
pub use kakao::{KakaoAcquirer, KakaoLoginCallback, KakaoLoginPath, KakaoOAuthToken, KakaoSdk};
pub use naver::{NaverAcquirer, NaverLoginBehavior, NaverLoginCallback, NaverSdk};

use crate::credential::ProviderCredential;
use crate::error::{AuthError, AuthResult, SdkFailure};
use crate::provider::{PresentationContext, Provider};
use std::fmt;

/// Error reported by a native provider SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SdkError {
    pub code: String,
    pub message: String,
}

impl SdkError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Pass the native error through unchanged.
    pub fn into_auth_error(self, provider: Provider) -> AuthError {
        AuthError::sdk(
            provider,
            SdkFailure::Native {
                code: self.code,
                message: self.message,
            },
        )
    }
}

impl fmt::Display for SdkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

/// Callback receiving the result of one acquisition.
pub type CredentialCallback = Box<dyn FnOnce(AuthResult<ProviderCredential>) + Send + 'static>;

/// Exactly-once completion for an acquisition.
///
/// Consumed by [`CredentialCompletion::complete`]. If it is dropped without
/// being completed (for example a provider SDK that released its callback),
/// the callback still fires with `ProviderSdk(CallbackDropped)`.
pub struct CredentialCompletion {
    provider: Provider,
    callback: Option<CredentialCallback>,
}

impl CredentialCompletion {
    pub fn new(provider: Provider, callback: CredentialCallback) -> Self {
        Self {
            provider,
            callback: Some(callback),
        }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn complete(mut self, result: AuthResult<ProviderCredential>) {
        if let Some(callback) = self.callback.take() {
            callback(result);
        }
    }

    pub fn succeed(self, credential: ProviderCredential) {
        self.complete(Ok(credential));
    }

    pub fn fail(self, error: AuthError) {
        self.complete(Err(error));
    }
}

impl Drop for CredentialCompletion {
    fn drop(&mut self) {
        if let Some(callback) = self.callback.take() {
            tracing::warn!(provider = %self.provider, "credential completion dropped without a result");
            callback(Err(AuthError::sdk(self.provider, SdkFailure::CallbackDropped)));
        }
    }
}

impl fmt::Debug for CredentialCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCompletion")
            .field("provider", &self.provider)
            .field("pending", &self.callback.is_some())
            .finish()
    }
}

/// Obtains a [`ProviderCredential`] from one provider's native flow.
///
/// `acquire` is always invoked on the UI-owning thread. The completion may be
/// fired from any thread, synchronously or later.
pub trait CredentialAcquirer: Send + Sync {
    fn provider(&self) -> Provider;

    fn acquire(&self, context: &PresentationContext, completion: CredentialCompletion);
}
