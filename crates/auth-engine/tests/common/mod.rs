#![allow(dead_code)]

use async_trait::async_trait;
use auth_engine::acquirer::{
    AppleAcquirer, AppleAuthorizationCallback, AppleAuthorizationSdk, AppleIdCredential,
    AppleIdRequest, GoogleAcquirer, GoogleSignInCallback, GoogleSignInSdk, GoogleUser,
    KakaoAcquirer, KakaoLoginCallback, KakaoLoginPath, KakaoOAuthToken, KakaoSdk, NaverAcquirer,
    NaverLoginBehavior, NaverLoginCallback, NaverSdk,
};
use auth_engine::backend::{AuthBackend, BackendSession, ListenerHandle, SessionListener, SessionState};
use auth_engine::{
    sha256_hex, AuthError, AuthOrchestrator, AuthResult, BackendSessionToken, ExchangeRequest,
    MainThread, NativeAssertion, NaverLoginResult, PresentationContext, Provider,
    SessionAuthenticator, TokenExchange, UserId,
};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use url::Url;

/// Build an unsigned JWT-shaped token carrying `claims`.
pub fn fake_jwt(claims: Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.sig", header, payload)
}

pub fn window() -> PresentationContext {
    PresentationContext::surface("window-1", "surface-1")
}

fn session_for(user_id: &str, provider_id: &str) -> BackendSession {
    BackendSession {
        user_id: user_id.to_string(),
        id_token: format!("id-{}", user_id),
        refresh_token: format!("refresh-{}", user_id),
        expires_at: Utc::now() + ChronoDuration::hours(1),
        provider_id: Some(provider_id.to_string()),
    }
}

// ============================================================================
// Backend
// ============================================================================

/// In-memory backend that records every call that would reach the network.
#[derive(Default)]
pub struct FakeBackend {
    pub state: SessionState,
    pub custom_tokens: Mutex<Vec<String>>,
    pub assertions: Mutex<Vec<Provider>>,
    pub deletes: AtomicUsize,
    pub sign_outs: AtomicUsize,
    pub sign_in_error: Mutex<Option<AuthError>>,
    pub sign_out_error: Mutex<Option<AuthError>>,
    pub sign_in_delay: Mutex<Option<Duration>>,
    /// Runs once, right after the next `current_user` read.
    pub after_current_user: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    issued: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Calls that would have hit the backend REST API.
    pub fn network_calls(&self) -> usize {
        self.custom_tokens.lock().len()
            + self.assertions.lock().len()
            + self.deletes.load(Ordering::SeqCst)
    }

    pub fn seed_user(&self, user_id: &str) {
        self.state.set_session(session_for(user_id, "custom"));
    }

    async fn pause(&self) {
        let delay = *self.sign_in_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn fail_sign_in(&self) -> AuthResult<()> {
        match self.sign_in_error.lock().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl AuthBackend for FakeBackend {
    async fn sign_in_with_custom_token(&self, token: &BackendSessionToken) -> AuthResult<UserId> {
        self.custom_tokens.lock().push(token.as_str().to_string());
        self.pause().await;
        self.fail_sign_in()?;
        let user_id = format!("user-{}", token.as_str());
        self.state.set_session(session_for(&user_id, "custom"));
        Ok(user_id)
    }

    async fn sign_in_with_assertion(&self, assertion: &NativeAssertion) -> AuthResult<UserId> {
        let provider = assertion.provider();
        self.assertions.lock().push(provider);
        self.pause().await;
        self.fail_sign_in()?;
        let n = self.issued.fetch_add(1, Ordering::SeqCst);
        let user_id = format!("{}-user-{}", provider, n);
        let provider_id = match provider {
            Provider::Apple => "apple.com",
            _ => "google.com",
        };
        self.state.set_session(session_for(&user_id, provider_id));
        Ok(user_id)
    }

    fn sign_out(&self) -> AuthResult<()> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.sign_out_error.lock().clone() {
            return Err(error);
        }
        self.state.clear();
        Ok(())
    }

    async fn delete_current_user(&self) -> AuthResult<()> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.state.current_user().is_none() {
            return Err(AuthError::UserNotFound);
        }
        self.state.clear();
        Ok(())
    }

    fn add_session_change_listener(&self, listener: SessionListener) -> ListenerHandle {
        self.state.add_listener(listener)
    }

    fn remove_session_change_listener(&self, handle: ListenerHandle) -> bool {
        self.state.remove_listener(handle)
    }

    fn current_user(&self) -> Option<UserId> {
        let user = self.state.current_user();
        let hook = self.after_current_user.lock().take();
        if let Some(hook) = hook {
            hook();
        }
        user
    }
}

// ============================================================================
// Token exchange
// ============================================================================

pub struct CountingExchange {
    pub requests: Mutex<Vec<ExchangeRequest>>,
    result: Mutex<AuthResult<String>>,
}

impl CountingExchange {
    pub fn returning(token: &str) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            result: Mutex::new(Ok(token.to_string())),
        })
    }

    pub fn failing(error: AuthError) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            result: Mutex::new(Err(error)),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl TokenExchange for CountingExchange {
    async fn exchange(&self, request: ExchangeRequest) -> AuthResult<BackendSessionToken> {
        self.requests.lock().push(request);
        let result = self.result.lock().clone();
        result.and_then(|token| BackendSessionToken::new(token).ok_or(AuthError::MissingToken))
    }
}

// ============================================================================
// Provider SDKs
// ============================================================================

/// Answers every request with a token whose nonce claim echoes the request,
/// unless `nonce_claim` overrides it.
#[derive(Default)]
pub struct ScriptedApple {
    pub requests: Mutex<Vec<AppleIdRequest>>,
    pub nonce_claim: Mutex<Option<String>>,
}

impl AppleAuthorizationSdk for ScriptedApple {
    fn perform_request(
        &self,
        request: AppleIdRequest,
        _context: &PresentationContext,
        callback: AppleAuthorizationCallback,
    ) {
        let nonce = self
            .nonce_claim
            .lock()
            .clone()
            .unwrap_or_else(|| request.nonce_sha256.clone());
        self.requests.lock().push(request);
        let token = fake_jwt(json!({ "sub": "apple-sub", "nonce": nonce }));
        callback(Ok(AppleIdCredential {
            identity_token: Some(token.into_bytes()),
            full_name: None,
        }));
    }
}

#[derive(Default)]
pub struct ScriptedGoogle {
    pub calls: AtomicUsize,
}

impl GoogleSignInSdk for ScriptedGoogle {
    fn sign_in(&self, _context: &PresentationContext, callback: GoogleSignInCallback) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        callback(Ok(GoogleUser {
            id_token: Some(fake_jwt(json!({ "sub": "google-sub" }))),
            access_token: Some("google-access".into()),
        }));
    }
}

pub struct ScriptedKakao {
    pub talk_available: bool,
    pub token: Option<String>,
    /// Swallow the callback without answering.
    pub drop_callback: bool,
    pub paths: Mutex<Vec<KakaoLoginPath>>,
}

impl ScriptedKakao {
    pub fn web_login(token: &str) -> Self {
        Self {
            talk_available: false,
            token: Some(token.to_string()),
            drop_callback: false,
            paths: Mutex::new(Vec::new()),
        }
    }

    fn respond(&self, path: KakaoLoginPath, callback: KakaoLoginCallback) {
        self.paths.lock().push(path);
        if self.drop_callback {
            return;
        }
        callback(Ok(KakaoOAuthToken {
            access_token: self.token.clone(),
            refresh_token: None,
        }));
    }
}

impl KakaoSdk for ScriptedKakao {
    fn is_talk_login_available(&self) -> bool {
        self.talk_available
    }

    fn login_with_talk(&self, callback: KakaoLoginCallback) {
        self.respond(KakaoLoginPath::Talk, callback);
    }

    fn login_with_account(&self, callback: KakaoLoginCallback) {
        self.respond(KakaoLoginPath::Account, callback);
    }

    fn handle_open_url(&self, _url: &Url) -> bool {
        false
    }
}

pub struct ScriptedNaver {
    pub token: String,
    pub behaviors: Mutex<Vec<NaverLoginBehavior>>,
}

impl ScriptedNaver {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            behaviors: Mutex::new(Vec::new()),
        }
    }
}

impl NaverSdk for ScriptedNaver {
    fn set_login_behavior(&self, behavior: NaverLoginBehavior) {
        self.behaviors.lock().push(behavior);
    }

    fn request_login(&self, callback: NaverLoginCallback) {
        callback(Ok(NaverLoginResult {
            access_token: self.token.clone(),
            refresh_token: Some("naver-refresh".into()),
            expires_at: None,
        }));
    }

    fn handle_url(&self, _url: &Url) -> bool {
        false
    }
}

// ============================================================================
// Harness
// ============================================================================

/// A fully wired orchestrator over fakes. Must be built inside a tokio runtime.
pub struct Harness {
    pub backend: Arc<FakeBackend>,
    pub exchange: Arc<CountingExchange>,
    pub apple: Arc<ScriptedApple>,
    pub google: Arc<ScriptedGoogle>,
    pub kakao: Arc<ScriptedKakao>,
    pub naver: Arc<ScriptedNaver>,
    /// Fixed raw nonce for Apple; random when `None`.
    pub apple_nonce: Option<String>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            backend: FakeBackend::new(),
            exchange: CountingExchange::returning("ctk_123"),
            apple: Arc::new(ScriptedApple::default()),
            google: Arc::new(ScriptedGoogle::default()),
            kakao: Arc::new(ScriptedKakao::web_login("tok_abc")),
            naver: Arc::new(ScriptedNaver::new("nav_tok")),
            apple_nonce: None,
        }
    }

    pub fn orchestrator(&self, main: Arc<dyn MainThread>) -> AuthOrchestrator {
        let mut apple = AppleAcquirer::new(self.apple.clone());
        if let Some(nonce) = self.apple_nonce.clone() {
            apple = apple.with_nonce_source(move || nonce.clone());
        }

        AuthOrchestrator::new(
            SessionAuthenticator::new(self.backend.clone()),
            self.exchange.clone(),
            main,
            Handle::current(),
        )
        .with_acquirer(Arc::new(apple))
        .with_acquirer(Arc::new(GoogleAcquirer::new(self.google.clone())))
        .with_acquirer(Arc::new(KakaoAcquirer::new(self.kakao.clone())))
        .with_acquirer(Arc::new(NaverAcquirer::new(self.naver.clone())))
    }

    /// Hash the Apple SDK would see for the fixed nonce.
    pub fn expected_apple_hash(&self) -> Option<String> {
        self.apple_nonce.as_deref().map(sha256_hex)
    }
}
