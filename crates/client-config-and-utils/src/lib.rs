//! Startup configuration, file system paths, and logging for the PulseBoard client.
//!
//! Configuration is loaded and validated once at process start. A missing or
//! unresolved provider/backend value is a [`CoreError`] returned from
//! [`Config::load`], never a panic deep in an auth flow.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    BackendConfig, Config, KakaoConfig, NaverConfig, DEFAULT_AUTH_BASE_URL,
    DEFAULT_FUNCTIONS_REGION, DEFAULT_LOG_LEVEL, DEFAULT_TOKEN_BASE_URL,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level, LogConfig};
pub use paths::Paths;
