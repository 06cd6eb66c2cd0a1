//! Deep-link callback routing.
//!
//! The host forwards every activation URL here. Handlers are asked in
//! priority order; the first one that claims the URL wins. The engine never
//! fetches these URLs.

use crate::acquirer::{KakaoSdk, NaverSdk};
use client_config_and_utils::{KakaoConfig, NaverConfig};
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// A provider's login-return URL recognizer.
pub trait UrlHandler: Send + Sync {
    fn name(&self) -> &'static str;

    /// Claim and consume `url`. Returns `false` to pass it on.
    fn handle(&self, url: &Url) -> bool;
}

/// Result of routing one URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlRouting {
    Handled(&'static str),
    Unhandled,
}

impl UrlRouting {
    pub fn is_handled(&self) -> bool {
        matches!(self, UrlRouting::Handled(_))
    }
}

/// KakaoTalk login return: `kakao{native_app_key}://oauth?...`.
pub struct KakaoUrlHandler {
    scheme: String,
    sdk: Arc<dyn KakaoSdk>,
}

impl KakaoUrlHandler {
    pub fn new(config: &KakaoConfig, sdk: Arc<dyn KakaoSdk>) -> Self {
        Self {
            scheme: config.url_scheme().to_ascii_lowercase(),
            sdk,
        }
    }

    pub fn is_talk_login_url(&self, url: &Url) -> bool {
        url.scheme() == self.scheme && url.host_str() == Some("oauth")
    }
}

impl UrlHandler for KakaoUrlHandler {
    fn name(&self) -> &'static str {
        "kakao"
    }

    fn handle(&self, url: &Url) -> bool {
        if !self.is_talk_login_url(url) {
            return false;
        }
        // A KakaoTalk login URL is Kakao's even if the SDK reports nothing to do.
        let consumed = self.sdk.handle_open_url(url);
        debug!(consumed, "kakao talk login url");
        true
    }
}

/// Naver login return on the configured URL scheme.
pub struct NaverUrlHandler {
    scheme: String,
    sdk: Arc<dyn NaverSdk>,
}

impl NaverUrlHandler {
    pub fn new(config: &NaverConfig, sdk: Arc<dyn NaverSdk>) -> Self {
        Self {
            scheme: config.url_scheme.to_ascii_lowercase(),
            sdk,
        }
    }
}

impl UrlHandler for NaverUrlHandler {
    fn name(&self) -> &'static str {
        "naver"
    }

    fn handle(&self, url: &Url) -> bool {
        url.scheme() == self.scheme && self.sdk.handle_url(url)
    }
}

/// Ordered list of URL handlers.
#[derive(Default)]
pub struct UrlCallbackRouter {
    handlers: Vec<Box<dyn UrlHandler>>,
}

impl UrlCallbackRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kakao first, then Naver.
    pub fn standard(kakao: KakaoUrlHandler, naver: NaverUrlHandler) -> Self {
        Self::new().with_handler(kakao).with_handler(naver)
    }

    /// Append a handler at the lowest priority.
    pub fn with_handler(mut self, handler: impl UrlHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }

    pub fn route(&self, url: &Url) -> UrlRouting {
        for handler in &self.handlers {
            if handler.handle(url) {
                info!(handler = handler.name(), scheme = url.scheme(), "activation url handled");
                return UrlRouting::Handled(handler.name());
            }
        }
        warn!(scheme = url.scheme(), host = ?url.host_str(), "unknown activation url");
        UrlRouting::Unhandled
    }

    /// Parse and route. Unparseable input is unhandled.
    pub fn route_str(&self, raw: &str) -> UrlRouting {
        match Url::parse(raw) {
            Ok(url) => self.route(&url),
            Err(e) => {
                warn!(error = %e, "activation url does not parse");
                UrlRouting::Unhandled
            }
        }
    }
}

impl std::fmt::Debug for UrlCallbackRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlCallbackRouter")
            .field("handlers", &self.handler_names())
            .finish()
    }
}
