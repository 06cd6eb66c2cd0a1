use auth_engine::{
    failure_stage, AuthError, AuthErrorKind, CallableClient, ExchangeRequest, Provider,
    TokenExchange, TokenExchangeClient,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> TokenExchangeClient {
    TokenExchangeClient::new(CallableClient::new(server.uri()))
}

#[tokio::test]
async fn test_exchange_posts_callable_envelope_and_returns_custom_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/socialLogin"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "data": { "accessToken": "tok_abc", "provider": "kakao" }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": { "customToken": "ctk_123" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let token = client_for(&server)
        .exchange(ExchangeRequest::new("tok_abc", Provider::Kakao))
        .await
        .expect("exchange");

    assert_eq!(token.as_str(), "ctk_123");
}

#[tokio::test]
async fn test_naver_provider_is_echoed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/socialLogin"))
        .and(body_json(json!({
            "data": { "accessToken": "nav_tok", "provider": "naver" }
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": { "customToken": "ctk_n" } })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let token = client_for(&server)
        .exchange(ExchangeRequest::new("nav_tok", Provider::Naver))
        .await
        .expect("exchange");

    assert_eq!(token.as_str(), "ctk_n");
}

#[tokio::test]
async fn test_missing_custom_token_is_missing_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/socialLogin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": {} })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .exchange(ExchangeRequest::new("tok_abc", Provider::Kakao))
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::MissingToken);
    assert_eq!(failure_stage(&err), "token-extraction");
}

#[tokio::test]
async fn test_empty_or_null_custom_token_is_missing_token() {
    for result in [json!({ "customToken": "" }), json!({ "customToken": null })] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": result })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .exchange(ExchangeRequest::new("tok_abc", Provider::Naver))
            .await
            .unwrap_err();

        assert_eq!(err, AuthError::MissingToken);
    }
}

#[tokio::test]
async fn test_server_error_is_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/socialLogin"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "status": "INTERNAL", "message": "boom" }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .exchange(ExchangeRequest::new("tok_abc", Provider::Kakao))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), AuthErrorKind::Network);
    assert!(err.to_string().contains("boom"), "{}", err);
    assert_eq!(failure_stage(&err), "transport");
}

#[tokio::test]
async fn test_connection_failure_is_network() {
    let client = TokenExchangeClient::new(CallableClient::new("http://127.0.0.1:1"));

    let err = client
        .exchange(ExchangeRequest::new("tok_abc", Provider::Kakao))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), AuthErrorKind::Network);
}

#[tokio::test]
async fn test_non_json_reply_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .exchange(ExchangeRequest::new("tok_abc", Provider::Kakao))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), AuthErrorKind::InvalidResponse);
    assert_eq!(failure_stage(&err), "parse");
}

#[tokio::test]
async fn test_reply_without_result_object_is_invalid_response() {
    for body in [json!({ "data": {} }), json!({ "result": "ctk_123" }), json!([1, 2])] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .exchange(ExchangeRequest::new("tok_abc", Provider::Kakao))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), AuthErrorKind::InvalidResponse);
    }
}

#[tokio::test]
async fn test_direct_provider_is_rejected_without_a_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .exchange(ExchangeRequest::new("apple-token", Provider::Apple))
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::UnsupportedProvider(Provider::Apple));
}
