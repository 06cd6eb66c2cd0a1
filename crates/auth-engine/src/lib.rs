//! Social identity to backend session exchange for the PulseBoard client.
//!
//! This crate provides:
//! - Credential acquirers for Apple, Google, Kakao and Naver over host-provided SDKs
//! - The `socialLogin` token exchange client
//! - An Identity Toolkit REST backend connector with persisted sessions
//! - The auth orchestrator with an explicit FSM per attempt
//! - Session state publishing and deep-link callback routing

pub mod acquirer;
mod attempt_fsm;
mod authenticator;
pub mod backend;
mod callable;
mod claims;
mod credential;
pub mod dispatch;
mod error;
mod http;
mod nonce;
mod orchestrator;
mod provider;
mod publisher;
mod service;
mod token_exchange;
mod url_router;

pub use attempt_fsm::attempt_machine;
pub use attempt_fsm::{AttemptMachine, AttemptMachineInput, AttemptMachineState, AttemptPhase};
pub use authenticator::SessionAuthenticator;
pub use callable::CallableClient;
pub use credential::{
    BackendSessionToken, CredentialRoute, ExchangeRequest, NativeAssertion, NaverLoginResult,
    PersonName, ProviderCredential, UserId,
};
pub use dispatch::{InlineDispatcher, MainQueue, MainTask, MainThread};
pub use error::{AuthError, AuthErrorKind, AuthOutcome, AuthResult, SdkFailure};
pub use nonce::{random_nonce, sha256_hex, NONCE_LENGTH};
pub use orchestrator::{AttemptId, AuthOrchestrator, OutcomeCallback, PhaseObserver};
pub use provider::{PresentationContext, Provider, ProviderPath};
pub use publisher::{SessionHandler, SessionPublisher};
pub use service::AuthService;
pub use token_exchange::{
    exchange_providers, failure_stage, TokenExchange, TokenExchangeClient, SOCIAL_LOGIN_FUNCTION,
};
pub use url_router::{KakaoUrlHandler, NaverUrlHandler, UrlCallbackRouter, UrlHandler, UrlRouting};
