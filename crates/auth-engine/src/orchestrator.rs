//! Auth orchestrator.
//!
//! Sequences acquisition, exchange and sign-in for one provider into a single
//! [`AuthOutcome`]:
//!
//! - Apple, Google: acquire → sign in with the native assertion
//! - Kakao, Naver: acquire → exchange → sign in with the backend token
//!
//! Acquisition runs on the UI thread. Exchange and sign-in run on the tokio
//! runtime. The outcome is marshaled back through the [`MainThread`] exactly
//! once. A failing step short-circuits and its error is forwarded unchanged.
//!
//! The orchestrator never writes session state. The backend's change
//! notification is the only signal that a user is signed in.
//!
//! Concurrent `authenticate` calls are independent attempts with their own
//! state machine and nonce; nothing serializes them.

use crate::acquirer::{CredentialAcquirer, CredentialCompletion};
use crate::attempt_fsm::{AttemptMachine, AttemptMachineInput, AttemptPhase};
use crate::authenticator::SessionAuthenticator;
use crate::credential::{CredentialRoute, ProviderCredential};
use crate::dispatch::{run_on_main, MainThread};
use crate::error::{AuthError, AuthOutcome, AuthResult};
use crate::provider::{PresentationContext, Provider};
use crate::token_exchange::TokenExchange;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Receives the outcome of one attempt, on the UI thread.
pub type OutcomeCallback = Box<dyn FnOnce(AuthOutcome) + Send + 'static>;

/// Observes phase transitions of every attempt.
pub type PhaseObserver = Arc<dyn Fn(AttemptId, Provider, AttemptPhase) + Send + Sync>;

/// Identifier of one authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttemptId(Uuid);

impl AttemptId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delivers the outcome of an attempt exactly once.
///
/// Dropping an undelivered sink (a network task torn down with its runtime,
/// for example) still resolves the attempt, as `Network`.
struct OutcomeSink {
    attempt_id: AttemptId,
    callback: Option<OutcomeCallback>,
    main: Arc<dyn MainThread>,
    in_flight: Arc<AtomicUsize>,
}

impl OutcomeSink {
    fn deliver(mut self, outcome: AuthOutcome) {
        self.send(outcome);
    }

    fn send(&mut self, outcome: AuthOutcome) {
        if let Some(callback) = self.callback.take() {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.main.dispatch(Box::new(move || callback(outcome)));
        }
    }
}

impl Drop for OutcomeSink {
    fn drop(&mut self) {
        if self.callback.is_some() {
            warn!(attempt_id = %self.attempt_id, "attempt dropped before completing");
            self.send(AuthOutcome::Failure(AuthError::Network(
                "attempt aborted before completion".into(),
            )));
        }
    }
}

/// One attempt's state machine.
struct Attempt {
    id: AttemptId,
    provider: Provider,
    machine: Mutex<AttemptMachine>,
    observer: Option<PhaseObserver>,
}

impl Attempt {
    fn advance(&self, input: AttemptMachineInput) {
        let phase = {
            let mut machine = self.machine.lock();
            if machine.consume(&input).is_err() {
                error!(
                    attempt_id = %self.id,
                    state = ?machine.state(),
                    input = ?input,
                    "invalid attempt transition"
                );
                return;
            }
            AttemptPhase::from(machine.state())
        };

        debug!(attempt_id = %self.id, provider = %self.provider, phase = ?phase, "attempt phase");
        if let Some(observer) = &self.observer {
            observer(self.id, self.provider, phase);
        }
    }

    fn phase(&self) -> AttemptPhase {
        AttemptPhase::from(self.machine.lock().state())
    }

    fn finish(&self, sink: OutcomeSink, result: AuthResult<()>) {
        match &result {
            Ok(()) => {
                self.advance(AttemptMachineInput::SignedIn);
                info!(attempt_id = %self.id, provider = %self.provider, "authentication succeeded");
            }
            Err(e) => {
                self.advance(AttemptMachineInput::Fail);
                warn!(
                    attempt_id = %self.id,
                    provider = %self.provider,
                    kind = ?e.kind(),
                    error = %e,
                    "authentication failed"
                );
            }
        }
        sink.deliver(result.into());
    }
}

/// Everything the network half of an attempt needs.
#[derive(Clone)]
struct Pipeline {
    exchange: Arc<dyn TokenExchange>,
    authenticator: SessionAuthenticator,
}

impl Pipeline {
    async fn run(&self, attempt: &Attempt, credential: ProviderCredential) -> AuthResult<()> {
        match credential.into_route() {
            CredentialRoute::Direct(assertion) => {
                attempt.advance(AttemptMachineInput::CredentialDirect);
                self.authenticator.sign_in_with_assertion(&assertion).await?;
            }
            CredentialRoute::Indirect(request) => {
                attempt.advance(AttemptMachineInput::CredentialIndirect);
                let token = self.exchange.exchange(request).await?;
                attempt.advance(AttemptMachineInput::TokenIssued);
                self.authenticator.sign_in(&token).await?;
            }
        }
        Ok(())
    }
}

pub struct AuthOrchestrator {
    acquirers: HashMap<Provider, Arc<dyn CredentialAcquirer>>,
    pipeline: Pipeline,
    main: Arc<dyn MainThread>,
    runtime: Handle,
    observer: Option<PhaseObserver>,
    in_flight: Arc<AtomicUsize>,
}

impl AuthOrchestrator {
    /// `runtime` runs the exchange and sign-in steps.
    pub fn new(
        authenticator: SessionAuthenticator,
        exchange: Arc<dyn TokenExchange>,
        main: Arc<dyn MainThread>,
        runtime: Handle,
    ) -> Self {
        Self {
            acquirers: HashMap::new(),
            pipeline: Pipeline {
                exchange,
                authenticator,
            },
            main,
            runtime,
            observer: None,
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wire an acquirer. Replaces any acquirer already wired for its provider.
    pub fn with_acquirer(mut self, acquirer: Arc<dyn CredentialAcquirer>) -> Self {
        self.acquirers.insert(acquirer.provider(), acquirer);
        self
    }

    pub fn with_phase_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(AttemptId, Provider, AttemptPhase) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn supports(&self, provider: Provider) -> bool {
        self.acquirers.contains_key(&provider)
    }

    /// Attempts started and not yet resolved.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Start an attempt. `on_outcome` runs exactly once, on the UI thread.
    pub fn authenticate(
        &self,
        provider: Provider,
        context: PresentationContext,
        on_outcome: OutcomeCallback,
    ) -> AttemptId {
        let attempt = Arc::new(Attempt {
            id: AttemptId::new(),
            provider,
            machine: Mutex::new(AttemptMachine::new()),
            observer: self.observer.clone(),
        });
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let sink = OutcomeSink {
            attempt_id: attempt.id,
            callback: Some(on_outcome),
            main: self.main.clone(),
            in_flight: self.in_flight.clone(),
        };

        info!(attempt_id = %attempt.id, provider = %provider, "authentication started");
        attempt.advance(AttemptMachineInput::Begin);

        if provider == Provider::Google && !context.is_displayable() {
            attempt.finish(
                sink,
                Err(AuthError::InvalidCredential(
                    "google sign-in needs a displayable surface".into(),
                )),
            );
            return attempt.id;
        }

        let acquirer = match self.acquirers.get(&provider) {
            Some(acquirer) => acquirer.clone(),
            None => {
                attempt.finish(sink, Err(AuthError::UnsupportedProvider(provider)));
                return attempt.id;
            }
        };

        let id = attempt.id;
        let pipeline = self.pipeline.clone();
        let runtime = self.runtime.clone();
        let completion = CredentialCompletion::new(
            provider,
            Box::new(move |result| {
                let credential = match result {
                    Ok(credential) if credential.provider() == provider => credential,
                    Ok(credential) => {
                        let error = AuthError::InvalidCredential(format!(
                            "{} acquirer returned a {} credential",
                            provider,
                            credential.provider()
                        ));
                        attempt.finish(sink, Err(error));
                        return;
                    }
                    Err(e) => {
                        attempt.finish(sink, Err(e));
                        return;
                    }
                };

                debug!(attempt_id = %attempt.id, phase = ?attempt.phase(), "credential acquired");
                runtime.spawn(async move {
                    let result = pipeline.run(&attempt, credential).await;
                    attempt.finish(sink, result);
                });
            }),
        );

        run_on_main(
            &self.main,
            Box::new(move || acquirer.acquire(&context, completion)),
        );
        id
    }

    /// [`authenticate`](Self::authenticate) as a future.
    ///
    /// The outcome still travels through the UI dispatcher, so with a
    /// [`MainQueue`](crate::dispatch::MainQueue) someone has to drain it.
    pub async fn authenticate_async(
        &self,
        provider: Provider,
        context: PresentationContext,
    ) -> AuthOutcome {
        let (tx, rx) = oneshot::channel();
        self.authenticate(
            provider,
            context,
            Box::new(move |outcome| {
                let _ = tx.send(outcome);
            }),
        );
        rx.await.unwrap_or_else(|_| {
            AuthOutcome::Failure(AuthError::Network(
                "attempt outcome was never delivered".into(),
            ))
        })
    }
}

impl fmt::Debug for AuthOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut providers: Vec<&str> = self.acquirers.keys().map(Provider::as_str).collect();
        providers.sort_unstable();
        f.debug_struct("AuthOrchestrator")
            .field("providers", &providers)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}
