mod common;

use auth_engine::{
    AttemptPhase, AuthError, AuthErrorKind, AuthOrchestrator, AuthOutcome, ExchangeRequest,
    InlineDispatcher, MainQueue, MainThread, PresentationContext, Provider, SdkFailure,
    SessionAuthenticator, SessionPublisher,
};
use common::{window, CountingExchange, Harness, ScriptedKakao};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

fn inline() -> Arc<dyn MainThread> {
    Arc::new(InlineDispatcher)
}

#[tokio::test]
async fn test_every_provider_resolves_exactly_once() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator(inline());
    let (tx, mut rx) = mpsc::unbounded_channel();

    for provider in Provider::ALL {
        let tx = tx.clone();
        orchestrator.authenticate(
            provider,
            window(),
            Box::new(move |outcome| {
                let _ = tx.send((provider, outcome));
            }),
        );
    }

    let mut seen = Vec::new();
    for _ in 0..Provider::ALL.len() {
        let (provider, outcome) = rx.recv().await.expect("outcome");
        assert!(outcome.is_success(), "{} failed: {:?}", provider, outcome);
        seen.push(provider);
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err(), "an attempt resolved twice");
    seen.sort_by_key(|p| p.as_str());
    seen.dedup();
    assert_eq!(seen.len(), Provider::ALL.len());
    assert_eq!(orchestrator.in_flight(), 0);
}

#[tokio::test]
async fn test_failures_also_resolve_exactly_once() {
    let mut harness = Harness::new();
    harness.exchange = CountingExchange::failing(AuthError::MissingToken);
    *harness.backend.sign_in_error.lock() = Some(AuthError::AuthFailed("rejected".into()));
    let orchestrator = harness.orchestrator(inline());
    let (tx, mut rx) = mpsc::unbounded_channel();

    for provider in Provider::ALL {
        let tx = tx.clone();
        orchestrator.authenticate(
            provider,
            window(),
            Box::new(move |outcome| {
                let _ = tx.send((provider, outcome));
            }),
        );
    }

    for _ in 0..Provider::ALL.len() {
        let (provider, outcome) = rx.recv().await.expect("outcome");
        let expected = match provider.path() {
            auth_engine::ProviderPath::Direct => AuthErrorKind::AuthFailed,
            auth_engine::ProviderPath::Indirect => AuthErrorKind::MissingToken,
        };
        assert_eq!(outcome.error_kind(), Some(expected), "{}", provider);
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_direct_providers_never_call_the_exchange() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator(inline());

    for provider in [Provider::Apple, Provider::Google] {
        let outcome = orchestrator.authenticate_async(provider, window()).await;
        assert_eq!(outcome, AuthOutcome::Success);
    }

    assert_eq!(harness.exchange.calls(), 0);
    assert_eq!(
        *harness.backend.assertions.lock(),
        vec![Provider::Apple, Provider::Google]
    );
    assert!(harness.backend.custom_tokens.lock().is_empty());
}

#[tokio::test]
async fn test_indirect_providers_exchange_exactly_once() {
    for provider in [Provider::Kakao, Provider::Naver] {
        let harness = Harness::new();
        let orchestrator = harness.orchestrator(inline());

        let outcome = orchestrator.authenticate_async(provider, window()).await;
        assert!(outcome.is_success());

        let requests = harness.exchange.requests.lock();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].provider, provider);
        assert!(harness.backend.assertions.lock().is_empty());
        assert_eq!(*harness.backend.custom_tokens.lock(), vec!["ctk_123".to_string()]);
    }
}

#[tokio::test]
async fn test_kakao_web_login_end_to_end() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator(inline());
    let publisher = SessionPublisher::new(harness.backend.clone(), inline());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    publisher.observe(move |user| sink.lock().push(user));
    publisher.start();

    let outcome = orchestrator
        .authenticate_async(Provider::Kakao, window())
        .await;

    assert_eq!(outcome, AuthOutcome::Success);
    assert_eq!(
        *harness.kakao.paths.lock(),
        vec![auth_engine::acquirer::KakaoLoginPath::Account]
    );
    assert_eq!(
        *harness.exchange.requests.lock(),
        vec![ExchangeRequest::new("tok_abc", Provider::Kakao)]
    );
    assert_eq!(*harness.backend.custom_tokens.lock(), vec!["ctk_123".to_string()]);

    let user = harness.backend.state.current_user();
    assert_eq!(user.as_deref(), Some("user-ctk_123"));
    assert_eq!(*seen.lock(), vec![None, user]);
}

#[tokio::test]
async fn test_naver_uses_app_with_browser_fallback() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator(inline());

    let outcome = orchestrator.authenticate_async(Provider::Naver, window()).await;

    assert!(outcome.is_success());
    assert_eq!(
        *harness.naver.behaviors.lock(),
        vec![auth_engine::acquirer::NaverLoginBehavior::AppPreferredWithInAppBrowserFallback]
    );
    assert_eq!(harness.exchange.requests.lock()[0].access_token, "nav_tok");
}

#[tokio::test]
async fn test_apple_nonce_mismatch_makes_no_network_call() {
    let mut harness = Harness::new();
    harness.apple_nonce = Some("fixed-nonce".into());
    *harness.apple.nonce_claim.lock() = Some(auth_engine::sha256_hex("someone-elses-nonce"));
    let orchestrator = harness.orchestrator(inline());

    let outcome = orchestrator.authenticate_async(Provider::Apple, window()).await;

    assert_eq!(outcome.error_kind(), Some(AuthErrorKind::InvalidCredential));
    assert_eq!(harness.backend.network_calls(), 0);
    assert_eq!(harness.exchange.calls(), 0);
    assert_eq!(
        harness.apple.requests.lock()[0].nonce_sha256,
        harness.expected_apple_hash().expect("fixed nonce")
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_apple_attempts_both_succeed() {
    let harness = Harness::new();
    *harness.backend.sign_in_delay.lock() = Some(Duration::from_millis(20));
    let orchestrator = harness.orchestrator(inline());
    let publisher = SessionPublisher::new(harness.backend.clone(), inline());
    let last = Arc::new(Mutex::new(None));
    let sink = last.clone();
    publisher.observe(move |user| *sink.lock() = Some(user));
    publisher.start();

    let (a, b) = tokio::join!(
        orchestrator.authenticate_async(Provider::Apple, window()),
        orchestrator.authenticate_async(Provider::Apple, window()),
    );

    assert!(a.is_success());
    assert!(b.is_success());
    assert_eq!(harness.backend.assertions.lock().len(), 2);

    // Two distinct nonces were requested.
    let requests = harness.apple.requests.lock();
    assert_ne!(requests[0].nonce_sha256, requests[1].nonce_sha256);

    let published = last.lock().clone().expect("published");
    assert_eq!(published, harness.backend.state.current_user());
    assert!(published.is_some());
}

#[tokio::test]
async fn test_google_needs_a_displayable_surface() {
    let harness = Harness::new();
    let orchestrator = harness.orchestrator(inline());

    let outcome = orchestrator
        .authenticate_async(Provider::Google, PresentationContext::anchor("window-1"))
        .await;

    assert_eq!(outcome.error_kind(), Some(AuthErrorKind::InvalidCredential));
    assert_eq!(
        harness.google.calls.load(std::sync::atomic::Ordering::SeqCst),
        0
    );
}

#[tokio::test]
async fn test_unwired_provider_is_unsupported() {
    let harness = Harness::new();
    let orchestrator = AuthOrchestrator::new(
        SessionAuthenticator::new(harness.backend.clone()),
        harness.exchange.clone(),
        inline(),
        Handle::current(),
    );
    assert!(!orchestrator.supports(Provider::Naver));

    let outcome = orchestrator.authenticate_async(Provider::Naver, window()).await;

    assert_eq!(
        outcome,
        AuthOutcome::Failure(AuthError::UnsupportedProvider(Provider::Naver))
    );
    assert_eq!(orchestrator.in_flight(), 0);
}

#[tokio::test]
async fn test_sdk_that_never_answers_still_resolves() {
    let mut harness = Harness::new();
    harness.kakao = Arc::new(ScriptedKakao {
        drop_callback: true,
        ..ScriptedKakao::web_login("unused")
    });
    let orchestrator = harness.orchestrator(inline());

    let outcome = orchestrator.authenticate_async(Provider::Kakao, window()).await;

    assert_eq!(
        outcome,
        AuthOutcome::Failure(AuthError::sdk(Provider::Kakao, SdkFailure::CallbackDropped))
    );
    assert_eq!(harness.exchange.calls(), 0);
}

#[tokio::test]
async fn test_kakao_without_token_fails_to_get_token() {
    let mut harness = Harness::new();
    harness.kakao = Arc::new(ScriptedKakao {
        token: None,
        ..ScriptedKakao::web_login("unused")
    });
    let orchestrator = harness.orchestrator(inline());

    let outcome = orchestrator.authenticate_async(Provider::Kakao, window()).await;

    assert_eq!(
        outcome,
        AuthOutcome::Failure(AuthError::sdk(Provider::Kakao, SdkFailure::FailedToGetToken))
    );
}

#[tokio::test]
async fn test_phase_observer_sees_indirect_sequence() {
    let harness = Harness::new();
    let phases = Arc::new(Mutex::new(Vec::new()));
    let sink = phases.clone();
    let orchestrator = harness
        .orchestrator(inline())
        .with_phase_observer(move |_, provider, phase| sink.lock().push((provider, phase)));

    orchestrator.authenticate_async(Provider::Kakao, window()).await;

    let phases: Vec<AttemptPhase> = phases.lock().iter().map(|(_, p)| *p).collect();
    assert_eq!(
        phases,
        vec![
            AttemptPhase::Acquiring,
            AttemptPhase::Exchanging,
            AttemptPhase::SigningIn,
            AttemptPhase::Succeeded,
        ]
    );
}

#[tokio::test]
async fn test_phase_observer_sees_direct_failure() {
    let harness = Harness::new();
    *harness.backend.sign_in_error.lock() = Some(AuthError::AuthFailed("nope".into()));
    let phases = Arc::new(Mutex::new(Vec::new()));
    let sink = phases.clone();
    let orchestrator = harness
        .orchestrator(inline())
        .with_phase_observer(move |_, _, phase| sink.lock().push(phase));

    orchestrator.authenticate_async(Provider::Google, window()).await;

    assert_eq!(
        *phases.lock(),
        vec![
            AttemptPhase::Acquiring,
            AttemptPhase::SigningIn,
            AttemptPhase::Failed,
        ]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_outcome_is_delivered_on_the_main_queue_thread() {
    let harness = Harness::new();
    let queue = MainQueue::new();
    let orchestrator = harness.orchestrator(queue.clone());
    let delivered_on = Arc::new(Mutex::new(None));
    let sink = delivered_on.clone();

    orchestrator.authenticate(
        Provider::Kakao,
        window(),
        Box::new(move |outcome| {
            assert!(outcome.is_success());
            *sink.lock() = Some(thread::current().id());
        }),
    );

    assert!(queue.run_next().await);
    assert_eq!(*delivered_on.lock(), Some(queue.owner()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_acquisition_from_another_thread_hops_to_main() {
    let harness = Harness::new();
    let queue = MainQueue::new();
    let orchestrator = Arc::new(harness.orchestrator(queue.clone()));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let worker = orchestrator.clone();
    tokio::task::spawn_blocking(move || {
        worker.authenticate(
            Provider::Naver,
            window(),
            Box::new(move |outcome| {
                let _ = tx.send(outcome);
            }),
        );
    })
    .await
    .expect("spawn_blocking");

    // Acquisition was queued, not run on the worker thread.
    assert_eq!(harness.exchange.calls(), 0);
    assert!(queue.run_next().await);
    assert!(queue.run_next().await);

    let outcome = rx.recv().await.expect("outcome");
    assert!(outcome.is_success());
    assert_eq!(queue.drained(), 2);
}
