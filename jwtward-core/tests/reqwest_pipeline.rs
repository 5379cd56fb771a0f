//! Integration tests for the reqwest pipeline.
//!
//! These tests verify that JwtClient correctly:
//! - Sends the bearer header to allowed hosts
//! - Leaves requests to other hosts and disallowed routes untouched
//! - Refuses to send when a token is required but missing

#![cfg(feature = "reqwest")]

use jwtward_core::{
    ClientError, InterceptError, InterceptorConfig, JwtClient, JwtInterceptor, RouteRule,
    token::{TokenFetch, from_fn},
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

/// Host (with port) of the mock server, as the allow-list must spell it.
fn mock_host(server: &MockServer) -> String {
    server
        .uri()
        .trim_start_matches("http://")
        .trim_end_matches('/')
        .to_string()
}

fn client_for(allowed: RouteRule, token: &'static str) -> JwtClient {
    let config = InterceptorConfig::builder(from_fn(move |_| TokenFetch::ready(token)))
        .allowed_domain(allowed)
        .disallowed_route(RouteRule::pattern(r"/public/").unwrap())
        .build();
    JwtClient::new(JwtInterceptor::new(config))
}

#[tokio::test]
async fn test_allowed_host_receives_bearer_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/items"))
        .and(header("authorization", "Bearer T"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"items": []})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(RouteRule::exact(mock_host(&mock_server)), "T");
    let response = client
        .get(format!("{}/api/items", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_post_body_survives_interception() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/items"))
        .and(header("authorization", "Bearer T"))
        .and(wiremock::matchers::body_string(r#"{"name":"widget"}"#))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(RouteRule::exact(mock_host(&mock_server)), "T");
    let response = client
        .post(format!("{}/api/items", mock_server.uri()), r#"{"name":"widget"}"#)
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn test_other_host_gets_no_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/items"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = client_for(RouteRule::exact("allowed.com"), "T");
    let response = client
        .get(format!("{}/api/items", mock_server.uri()))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_disallowed_route_gets_no_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/public/feed"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let client = client_for(RouteRule::pattern(r"^127\.0\.0\.1:\d+$").unwrap(), "T");
    client
        .get(format!("{}/public/feed", mock_server.uri()))
        .await
        .unwrap();

    let received = mock_server.received_requests().await.unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_missing_token_is_not_sent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = InterceptorConfig::builder(from_fn(|_| TokenFetch::none()))
        .allowed_domain(mock_host(&mock_server))
        .throw_no_token_error(true)
        .build();
    let client = JwtClient::new(JwtInterceptor::new(config));

    let err = client
        .get(format!("{}/api/items", mock_server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Intercept(InterceptError::NoToken)));
}
