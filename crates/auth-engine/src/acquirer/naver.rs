//! Naver login.

use super::{CredentialAcquirer, CredentialCompletion, SdkError};
use crate::credential::{NaverLoginResult, ProviderCredential};
use crate::error::{AuthError, SdkFailure};
use crate::provider::{PresentationContext, Provider};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// How the Naver SDK presents its login.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaverLoginBehavior {
    App,
    InAppBrowser,
    /// Naver app when installed, embedded browser otherwise.
    AppPreferredWithInAppBrowserFallback,
}

pub type NaverLoginCallback =
    Box<dyn FnOnce(Result<NaverLoginResult, SdkError>) + Send + 'static>;

/// Native Naver (NidOAuth) SDK surface.
pub trait NaverSdk: Send + Sync {
    fn set_login_behavior(&self, behavior: NaverLoginBehavior);

    fn request_login(&self, callback: NaverLoginCallback);

    /// Claim a Naver login return URL. Returns `true` when handled.
    fn handle_url(&self, url: &Url) -> bool;
}

pub struct NaverAcquirer {
    sdk: Arc<dyn NaverSdk>,
}

impl NaverAcquirer {
    pub fn new(sdk: Arc<dyn NaverSdk>) -> Self {
        Self { sdk }
    }
}

impl CredentialAcquirer for NaverAcquirer {
    fn provider(&self) -> Provider {
        Provider::Naver
    }

    fn acquire(&self, _context: &PresentationContext, completion: CredentialCompletion) {
        self.sdk
            .set_login_behavior(NaverLoginBehavior::AppPreferredWithInAppBrowserFallback);
        debug!("requesting naver login");

        self.sdk.request_login(Box::new(move |result| match result {
            Ok(login) if !login.access_token.is_empty() => {
                info!(token_len = login.access_token.len(), "naver login succeeded");
                completion.succeed(ProviderCredential::Naver(login));
            }
            Ok(_) => {
                warn!("naver login returned an empty access token");
                completion.fail(AuthError::sdk(Provider::Naver, SdkFailure::FailedToGetToken));
            }
            Err(sdk_error) => {
                warn!(code = %sdk_error.code, "naver login failed");
                completion.fail(sdk_error.into_auth_error(Provider::Naver));
            }
        }));
    }
}
