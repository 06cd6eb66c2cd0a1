//! Configuration management for the client.
//!
//! Provider app identifiers, client secrets, URL schemes, and backend
//! coordinates are all required. [`Config::load`] reads them once, applies
//! environment overrides, and validates every value before anything else runs.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Region the `socialLogin` callable is deployed to. A mismatch with the
/// server deployment shows up as an opaque transport failure.
pub const DEFAULT_FUNCTIONS_REGION: &str = "asia-northeast3";

/// Identity toolkit REST base URL.
pub const DEFAULT_AUTH_BASE_URL: &str = "https://identitytoolkit.googleapis.com";

/// Secure token REST base URL (session refresh).
pub const DEFAULT_TOKEN_BASE_URL: &str = "https://securetoken.googleapis.com";

/// Prefix of an Info.plist-style build variable that was never substituted.
const PLACEHOLDER_PREFIX: &str = "$(";

/// Main client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Backend project coordinates.
    #[serde(default)]
    pub backend: BackendConfig,
    /// Kakao SDK settings.
    #[serde(default)]
    pub kakao: KakaoConfig,
    /// Naver SDK settings.
    #[serde(default)]
    pub naver: NaverConfig,
}

/// Backend project coordinates for the token exchange and auth REST calls.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Backend project identifier.
    #[serde(default)]
    pub project_id: String,
    /// Public web API key for auth REST calls.
    #[serde(default)]
    pub api_key: String,
    /// Region hosting the callable functions.
    #[serde(default = "default_functions_region")]
    pub functions_region: String,
    /// Explicit callable base URL (emulator or tests). Overrides region/project.
    #[serde(default)]
    pub functions_base_url: Option<String>,
    /// Identity toolkit base URL.
    #[serde(default = "default_auth_base_url")]
    pub auth_base_url: String,
    /// Secure token base URL.
    #[serde(default = "default_token_base_url")]
    pub token_base_url: String,
}

/// Kakao SDK settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KakaoConfig {
    /// Kakao native app key.
    #[serde(default)]
    pub native_app_key: String,
}

/// Naver login SDK settings.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct NaverConfig {
    /// Display name registered with Naver.
    #[serde(default)]
    pub app_name: String,
    /// OAuth client id.
    #[serde(default)]
    pub client_id: String,
    /// OAuth client secret.
    #[serde(default)]
    pub client_secret: String,
    /// URL scheme Naver redirects back to.
    #[serde(default)]
    pub url_scheme: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_functions_region() -> String {
    DEFAULT_FUNCTIONS_REGION.to_string()
}

fn default_auth_base_url() -> String {
    DEFAULT_AUTH_BASE_URL.to_string()
}

fn default_token_base_url() -> String {
    DEFAULT_TOKEN_BASE_URL.to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            api_key: String::new(),
            functions_region: default_functions_region(),
            functions_base_url: None,
            auth_base_url: default_auth_base_url(),
            token_base_url: default_token_base_url(),
        }
    }
}

impl BackendConfig {
    /// Base URL of the callable functions endpoint.
    ///
    /// `https://{region}-{project_id}.cloudfunctions.net` unless an explicit
    /// base is configured.
    pub fn functions_url(&self) -> String {
        match &self.functions_base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!(
                "https://{}-{}.cloudfunctions.net",
                self.functions_region, self.project_id
            ),
        }
    }

    fn validate(&self) -> CoreResult<()> {
        require("backend.project_id", &self.project_id)?;
        require("backend.api_key", &self.api_key)?;
        require("backend.functions_region", &self.functions_region)?;
        Url::parse(&self.functions_url())?;
        Url::parse(&self.auth_base_url)?;
        Url::parse(&self.token_base_url)?;
        Ok(())
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("project_id", &self.project_id)
            .field("api_key", &redact(&self.api_key))
            .field("functions_region", &self.functions_region)
            .field("functions_base_url", &self.functions_base_url)
            .field("auth_base_url", &self.auth_base_url)
            .field("token_base_url", &self.token_base_url)
            .finish()
    }
}

impl KakaoConfig {
    /// Custom URL scheme the Kakao SDK registers: `kakao{native_app_key}`.
    pub fn url_scheme(&self) -> String {
        format!("kakao{}", self.native_app_key)
    }

    fn validate(&self) -> CoreResult<()> {
        require("kakao.native_app_key", &self.native_app_key)
    }
}

impl NaverConfig {
    fn validate(&self) -> CoreResult<()> {
        require("naver.app_name", &self.app_name)?;
        require("naver.client_id", &self.client_id)?;
        require("naver.client_secret", &self.client_secret)?;
        require("naver.url_scheme", &self.url_scheme)?;
        Ok(())
    }
}

impl fmt::Debug for NaverConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NaverConfig")
            .field("app_name", &self.app_name)
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("url_scheme", &self.url_scheme)
            .finish()
    }
}

impl Config {
    /// Load configuration from `~/.pulseboard/config.json`, apply environment
    /// overrides, and validate.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        if !config_path.exists() {
            return Err(CoreError::Config(format!(
                "config file not found: {}",
                config_path.display()
            )));
        }

        let mut config = Self::load_from_file(&config_path)?;
        config.load_from_env();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file without validating it.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Check every required value is present and resolved.
    pub fn validate(&self) -> CoreResult<()> {
        self.backend.validate()?;
        self.kakao.validate()?;
        self.naver.validate()?;
        Ok(())
    }

    /// Override configuration from environment variables.
    fn load_from_env(&mut self) {
        if let Some(level) = env_value("PULSEBOARD_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Some(api_key) = env_value("PULSEBOARD_BACKEND_API_KEY") {
            self.backend.api_key = api_key;
        }
        if let Some(secret) = env_value("PULSEBOARD_NAVER_CLIENT_SECRET") {
            self.naver.client_secret = secret;
        }
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn require(key: &str, value: &str) -> CoreResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::MissingValue {
            key: key.to_string(),
        });
    }
    if trimmed.starts_with(PLACEHOLDER_PREFIX) {
        return Err(CoreError::UnresolvedPlaceholder {
            key: key.to_string(),
        });
    }
    Ok(())
}

fn redact(value: &str) -> String {
    if value.is_empty() {
        String::new()
    } else {
        format!("<redacted len={}>", value.len())
    }
}
