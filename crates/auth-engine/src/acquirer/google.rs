use super::{CredentialAcquirer, CredentialCompletion, SdkError};
use crate::credential::ProviderCredential;
use crate::error::AuthError;
use crate::provider::{PresentationContext, Provider};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Signed-in Google user as returned by the native SDK.
#[derive(Clone, Default)]
pub struct GoogleUser {
    pub id_token: Option<String>,
    pub access_token: Option<String>,
}

impl fmt::Debug for GoogleUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleUser")
            .field("has_id_token", &self.id_token.is_some())
            .field("has_access_token", &self.access_token.is_some())
            .finish()
    }
}

pub type GoogleSignInCallback = Box<dyn FnOnce(Result<GoogleUser, SdkError>) + Send + 'static>;

/// Native Google Sign-In. Presents its own UI modally over `context`.
pub trait GoogleSignInSdk: Send + Sync {
    fn sign_in(&self, context: &PresentationContext, callback: GoogleSignInCallback);
}

pub struct GoogleAcquirer {
    sdk: Arc<dyn GoogleSignInSdk>,
}

impl GoogleAcquirer {
    pub fn new(sdk: Arc<dyn GoogleSignInSdk>) -> Self {
        Self { sdk }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl CredentialAcquirer for GoogleAcquirer {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    fn acquire(&self, context: &PresentationContext, completion: CredentialCompletion) {
        if !context.is_displayable() {
            completion.fail(AuthError::InvalidCredential(
                "google sign-in needs a displayable surface".into(),
            ));
            return;
        }

        debug!(window = %context.window_id(), "starting google sign-in");

        self.sdk.sign_in(
            context,
            Box::new(move |result| match result {
                Ok(user) => {
                    match (non_empty(user.id_token), non_empty(user.access_token)) {
                        (Some(id_token), Some(access_token)) => {
                            completion.succeed(ProviderCredential::Google {
                                id_token,
                                access_token,
                            })
                        }
                        (id_token, access_token) => {
                            warn!(
                                has_id_token = id_token.is_some(),
                                has_access_token = access_token.is_some(),
                                "google sign-in returned an incomplete credential"
                            );
                            completion.fail(AuthError::InvalidCredential(
                                "google sign-in returned no id token or access token".into(),
                            ));
                        }
                    }
                }
                Err(sdk_error) => {
                    warn!(code = %sdk_error.code, "google sign-in failed");
                    completion.fail(sdk_error.into_auth_error(Provider::Google));
                }
            }),
        );
    }
}
