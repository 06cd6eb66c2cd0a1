//! CLI command implementations.

mod auth;
mod config;
mod exchange;

pub use auth::{delete_account, logout, status};
pub use config::config_check;
pub use exchange::{exchange, redeem};

use anyhow::{Context, Result};
use auth_engine::backend::{FileStorage, IdentityToolkitBackend, SessionVault};
use auth_engine::{
    AuthOrchestrator, AuthService, CallableClient, InlineDispatcher, MainThread,
    SessionAuthenticator, SessionPublisher, TokenExchangeClient, UrlCallbackRouter,
};
use client_config_and_utils::{Config, Paths};
use std::sync::Arc;
use tokio::runtime::Handle;

/// Loaded configuration plus a backend over the on-disk session.
pub struct Client {
    pub config: Config,
    pub backend: Arc<IdentityToolkitBackend>,
}

impl Client {
    /// Load and validate configuration, then restore any stored session.
    pub fn load() -> Result<Self> {
        let paths = Paths::new()?;
        let config = Config::load(&paths)
            .with_context(|| format!("loading {}", paths.config_file().display()))?;

        let vault = SessionVault::new(Arc::new(FileStorage::new(paths.session_file())));
        let backend = Arc::new(IdentityToolkitBackend::new(&config.backend, vault));
        backend.restore_session()?;

        Ok(Self { config, backend })
    }

    pub fn token_exchange(&self) -> TokenExchangeClient {
        TokenExchangeClient::new(CallableClient::from_config(&self.config.backend))
    }

    /// Service without provider acquirers; native SDKs only exist on device.
    pub fn service(&self) -> AuthService {
        let main: Arc<dyn MainThread> = Arc::new(InlineDispatcher);
        let orchestrator = AuthOrchestrator::new(
            SessionAuthenticator::new(self.backend.clone()),
            Arc::new(self.token_exchange()),
            main.clone(),
            Handle::current(),
        );
        AuthService::new(
            orchestrator,
            SessionPublisher::new(self.backend.clone(), main),
            self.backend.clone(),
            UrlCallbackRouter::new(),
        )
    }
}
