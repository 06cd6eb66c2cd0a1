//! Kakao login.
//!
//! KakaoTalk app-to-app login when the companion app is installed, web
//! account login otherwise. Both stay callback-based.

use super::{CredentialAcquirer, CredentialCompletion, SdkError};
use crate::credential::ProviderCredential;
use crate::error::{AuthError, SdkFailure};
use crate::provider::{PresentationContext, Provider};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// OAuth token returned by either Kakao login path.
#[derive(Clone, Default)]
pub struct KakaoOAuthToken {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl fmt::Debug for KakaoOAuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KakaoOAuthToken")
            .field("has_access_token", &self.access_token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KakaoLoginPath {
    /// App-to-app login through KakaoTalk.
    Talk,
    /// Web-based Kakao account login.
    Account,
}

pub type KakaoLoginCallback = Box<dyn FnOnce(Result<KakaoOAuthToken, SdkError>) + Send + 'static>;

/// Native Kakao SDK surface.
pub trait KakaoSdk: Send + Sync {
    /// Whether KakaoTalk is installed and can handle app-to-app login.
    fn is_talk_login_available(&self) -> bool;

    fn login_with_talk(&self, callback: KakaoLoginCallback);

    fn login_with_account(&self, callback: KakaoLoginCallback);

    /// Claim a KakaoTalk login return URL. Returns `true` when handled.
    fn handle_open_url(&self, url: &Url) -> bool;
}

pub struct KakaoAcquirer {
    sdk: Arc<dyn KakaoSdk>,
}

impl KakaoAcquirer {
    pub fn new(sdk: Arc<dyn KakaoSdk>) -> Self {
        Self { sdk }
    }

    /// The login path the next acquisition will take.
    pub fn login_path(&self) -> KakaoLoginPath {
        if self.sdk.is_talk_login_available() {
            KakaoLoginPath::Talk
        } else {
            KakaoLoginPath::Account
        }
    }
}

fn finish(path: KakaoLoginPath, completion: CredentialCompletion) -> KakaoLoginCallback {
    Box::new(move |result| match result {
        Ok(token) => match token.access_token.filter(|t| !t.is_empty()) {
            Some(access_token) => {
                info!(path = ?path, token_len = access_token.len(), "kakao login succeeded");
                completion.succeed(ProviderCredential::Kakao { access_token });
            }
            None => {
                warn!(path = ?path, "kakao login returned no access token");
                completion.fail(AuthError::sdk(Provider::Kakao, SdkFailure::FailedToGetToken));
            }
        },
        Err(sdk_error) => {
            warn!(path = ?path, code = %sdk_error.code, "kakao login failed");
            completion.fail(sdk_error.into_auth_error(Provider::Kakao));
        }
    })
}

impl CredentialAcquirer for KakaoAcquirer {
    fn provider(&self) -> Provider {
        Provider::Kakao
    }

    fn acquire(&self, _context: &PresentationContext, completion: CredentialCompletion) {
        let path = self.login_path();
        debug!(path = ?path, "starting kakao login");

        match path {
            KakaoLoginPath::Talk => self.sdk.login_with_talk(finish(path, completion)),
            KakaoLoginPath::Account => self.sdk.login_with_account(finish(path, completion)),
        }
    }
}
