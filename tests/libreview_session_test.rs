// ABOUTME: Integration tests for the LibreLinkUp session client against a mock server
// ABOUTME: Login, patient resolution, the single re-login on token expiry and failure states
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use common::{connections_body, init_test_logging, login_body};
use follower_providers::{
    Credentials, FollowProvider, LibreViewProvider, ProviderError, SessionClient, SessionPhase,
    SessionState,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn credentials() -> Credentials {
    Credentials::new("follower@example.com", "correct horse")
}

fn provider() -> Arc<dyn FollowProvider> {
    Arc::new(LibreViewProvider::new())
}

async fn mount_login(server: &MockServer, token: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/llu/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body(token)))
        .expect(times)
        .mount(server)
        .await;
}

async fn mount_connections(server: &MockServer, token: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/llu/connections"))
        .and(header("authorization", format!("Bearer {token}").as_str()))
        .respond_with(response)
        .mount(server)
        .await;
}

fn expired() -> ResponseTemplate {
    ResponseTemplate::new(401).set_body_json(json!({"message": "invalid or expired jwt"}))
}

#[tokio::test]
async fn test_login_sends_client_headers_and_credentials() -> Result<()> {
    init_test_logging();
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/llu/auth/login"))
        .and(header("product", "llu.ios"))
        .and(header("version", "4.7.0"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "email": "follower@example.com",
            "password": "correct horse"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body("token-1")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut session = SessionClient::new(provider());
    let token = session.login(&credentials(), &mock_server.uri()).await?;

    assert_eq!(token, "token-1");
    assert_eq!(session.phase().name(), "authenticated");
    assert_eq!(session.state().auth_token.as_deref(), Some("token-1"));
    assert!(session.state().patient_id.is_none());
    Ok(())
}

#[tokio::test]
async fn test_rejected_credentials_leave_session_logged_out() {
    init_test_logging();
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/llu/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": 2, "error": {"message": "bad credentials"}})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut session = SessionClient::new(provider());
    let err = session
        .ensure_session(&credentials(), &mock_server.uri())
        .await
        .unwrap_err();

    assert!(err.is_authentication_failure());
    assert_eq!(err.reason(), "bad credentials");
    assert_eq!(session.phase(), &SessionPhase::LoggedOut);
    assert_eq!(session.state(), SessionState::logged_out());
}

#[tokio::test]
async fn test_login_without_token_is_missing_field() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/llu/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 0, "data": {}})))
        .mount(&mock_server)
        .await;

    let mut session = SessionClient::new(provider());
    let err = session
        .login(&credentials(), &mock_server.uri())
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::MissingField { .. }));
    assert_eq!(session.phase().name(), "logged_out");
}

#[tokio::test]
async fn test_fresh_session_logs_in_then_resolves_patient() -> Result<()> {
    init_test_logging();
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, "token-1", 1).await;
    mount_connections(
        &mock_server,
        "token-1",
        ResponseTemplate::new(200).set_body_json(connections_body("patient-1")),
    )
    .await;

    let mut session = SessionClient::new(provider());
    let ready = session
        .ensure_session(&credentials(), &mock_server.uri())
        .await?;

    assert_eq!(ready.token, "token-1");
    assert_eq!(ready.patient_id, "patient-1");
    assert_eq!(session.phase().name(), "ready");
    assert_eq!(session.ready(), Some(ready));
    Ok(())
}

#[tokio::test]
async fn test_ready_session_makes_no_calls() -> Result<()> {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, "unused", 0).await;

    let state = SessionState {
        auth_token: Some("token-1".to_owned()),
        patient_id: Some("patient-1".to_owned()),
    };
    let mut session = SessionClient::from_state(provider(), &state);
    let ready = session
        .ensure_session(&credentials(), &mock_server.uri())
        .await?;

    assert_eq!(ready.patient_id, "patient-1");
    assert!(mock_server.received_requests().await.unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_expired_token_triggers_one_relogin() -> Result<()> {
    init_test_logging();
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, "fresh-token", 1).await;
    mount_connections(&mock_server, "stale-token", expired()).await;
    mount_connections(
        &mock_server,
        "fresh-token",
        ResponseTemplate::new(200).set_body_json(connections_body("patient-7")),
    )
    .await;

    let state = SessionState {
        auth_token: Some("stale-token".to_owned()),
        patient_id: None,
    };
    let mut session = SessionClient::from_state(provider(), &state);
    let ready = session
        .ensure_session(&credentials(), &mock_server.uri())
        .await?;

    assert_eq!(ready.token, "fresh-token");
    assert_eq!(ready.patient_id, "patient-7");
    Ok(())
}

#[tokio::test]
async fn test_second_expiry_is_reported() {
    init_test_logging();
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, "fresh-token", 1).await;
    mount_connections(&mock_server, "stale-token", expired()).await;
    mount_connections(&mock_server, "fresh-token", expired()).await;

    let state = SessionState {
        auth_token: Some("stale-token".to_owned()),
        patient_id: None,
    };
    let mut session = SessionClient::from_state(provider(), &state);
    let err = session
        .ensure_session(&credentials(), &mock_server.uri())
        .await
        .unwrap_err();

    assert!(err.is_session_expired());
    assert_eq!(session.phase(), &SessionPhase::LoggedOut);
}

#[tokio::test]
async fn test_expiry_right_after_login_still_gets_one_retry() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, "token-1", 2).await;
    mount_connections(&mock_server, "token-1", expired()).await;

    let mut session = SessionClient::new(provider());
    let err = session
        .ensure_session(&credentials(), &mock_server.uri())
        .await
        .unwrap_err();

    assert!(err.is_session_expired());
}

#[tokio::test]
async fn test_other_resolution_failures_keep_token() {
    let mock_server = MockServer::start().await;
    mount_login(&mock_server, "token-1", 1).await;
    mount_connections(
        &mock_server,
        "token-1",
        ResponseTemplate::new(200).set_body_json(json!({"status": 0, "data": []})),
    )
    .await;

    let mut session = SessionClient::new(provider());
    let err = session
        .ensure_session(&credentials(), &mock_server.uri())
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::NoPatientConnection { .. }));
    assert_eq!(session.state().auth_token.as_deref(), Some("token-1"));
    assert_eq!(session.phase().name(), "authenticated");
}

#[tokio::test]
async fn test_server_error_on_connections_is_retryable_api_error() {
    let mock_server = MockServer::start().await;
    mount_connections(
        &mock_server,
        "token-1",
        ResponseTemplate::new(503).set_body_string("<html>maintenance</html>"),
    )
    .await;

    let state = SessionState {
        auth_token: Some("token-1".to_owned()),
        patient_id: None,
    };
    let mut session = SessionClient::from_state(provider(), &state);
    let err = session
        .ensure_session(&credentials(), &mock_server.uri())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ProviderError::ApiError {
            status_code: 503,
            ..
        }
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    // Nothing listens on the discard port
    let mut session = SessionClient::new(provider());
    let err = session
        .login(&credentials(), "http://127.0.0.1:9")
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Network { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_invalidate_returns_to_logged_out() {
    let state = SessionState {
        auth_token: Some("token-1".to_owned()),
        patient_id: Some("patient-1".to_owned()),
    };
    let mut session = SessionClient::from_state(provider(), &state);
    assert!(session.ready().is_some());

    session.invalidate();

    assert!(session.ready().is_none());
    assert_eq!(session.state(), SessionState::logged_out());
}
