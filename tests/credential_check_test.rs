// ABOUTME: Integration tests for verifying stored LibreView credentials
// ABOUTME: Message titles and bodies, token storage on success and session clearing on failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use common::{init_test_logging, login_body, store_with_account};
use follower_providers::{FollowProvider, LibreViewProvider};
use glucose_follower::consumer::{DedicatedThreadContext, ExecutionContext, InlineContext};
use glucose_follower::credential_check::{
    check_credentials, MessageHandler, FAILURE_TITLE, SUCCESS_MESSAGE, SUCCESS_TITLE,
};
use glucose_follower::settings::{load_session, InMemorySettingsStore, SettingKey, SettingsStore};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::thread;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Handler recording each message and the thread it arrived on
#[derive(Default)]
struct RecordingHandler {
    messages: Mutex<Vec<(String, String, Option<String>)>>,
    context: Option<Arc<DedicatedThreadContext>>,
}

impl RecordingHandler {
    fn messages(&self) -> Vec<(String, String, Option<String>)> {
        self.messages.lock().unwrap().clone()
    }
}

impl MessageHandler for RecordingHandler {
    fn show_message(&self, title: &str, message: &str) {
        self.messages.lock().unwrap().push((
            title.to_owned(),
            message.to_owned(),
            thread::current().name().map(str::to_owned),
        ));
    }

    fn execution_context(&self) -> Arc<dyn ExecutionContext> {
        match &self.context {
            Some(context) => Arc::clone(context) as Arc<dyn ExecutionContext>,
            None => Arc::new(InlineContext),
        }
    }
}

fn provider() -> Arc<dyn FollowProvider> {
    Arc::new(LibreViewProvider::new())
}

#[tokio::test]
async fn test_successful_check_stores_token() -> Result<()> {
    init_test_logging();
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/llu/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body("token-1")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = store_with_account(&mock_server.uri());
    store
        .set(SettingKey::AccountPatientId, json!("old-patient"))
        .await?;
    let handler = Arc::new(RecordingHandler::default());

    let outcome = check_credentials(
        provider(),
        store.as_ref(),
        Arc::clone(&handler) as Arc<dyn MessageHandler>,
    )
    .await?;

    assert!(outcome.success);
    assert_eq!(outcome.title, SUCCESS_TITLE);
    assert_eq!(outcome.message, SUCCESS_MESSAGE);

    let messages = handler.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, "Verification Successful");

    let session = load_session(store.as_ref()).await?;
    assert_eq!(session.auth_token.as_deref(), Some("token-1"));
    assert!(session.patient_id.is_none());
    Ok(())
}

#[tokio::test]
async fn test_rejected_check_reports_server_message_and_clears_session() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/llu/auth/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"status": 2, "error": {"message": "bad credentials"}})),
        )
        .mount(&mock_server)
        .await;

    let store = store_with_account(&mock_server.uri());
    store.set(SettingKey::AuthToken, json!("token-0")).await?;
    let handler = Arc::new(RecordingHandler::default());

    let outcome = check_credentials(
        provider(),
        store.as_ref(),
        Arc::clone(&handler) as Arc<dyn MessageHandler>,
    )
    .await?;

    assert!(!outcome.success);
    assert_eq!(outcome.title, FAILURE_TITLE);
    assert_eq!(
        outcome.message,
        "LibreView credentials check failed. Error = bad credentials"
    );
    assert_eq!(handler.messages()[0].1, outcome.message);
    assert!(load_session(store.as_ref()).await?.auth_token.is_none());
    Ok(())
}

#[tokio::test]
async fn test_missing_credentials_fail_without_network() -> Result<()> {
    let mock_server = MockServer::start().await;
    let store = InMemorySettingsStore::with_values([
        (SettingKey::BaseUrl, json!(mock_server.uri())),
        (SettingKey::Username, json!("follower@example.com")),
        (SettingKey::AuthToken, json!("token-0")),
    ]);
    let handler = Arc::new(RecordingHandler::default());

    let outcome = check_credentials(
        provider(),
        &store,
        Arc::clone(&handler) as Arc<dyn MessageHandler>,
    )
    .await?;

    assert!(!outcome.success);
    assert_eq!(outcome.title, FAILURE_TITLE);
    assert!(outcome.message.starts_with("LibreView credentials check failed."));
    assert!(load_session(&store).await?.auth_token.is_none());
    assert!(mock_server.received_requests().await.unwrap().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_message_is_shown_on_handler_thread() -> Result<()> {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/llu/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(login_body("token-1")))
        .mount(&mock_server)
        .await;

    let context = Arc::new(DedicatedThreadContext::spawn("settings-screen")?);
    let handler = Arc::new(RecordingHandler {
        messages: Mutex::default(),
        context: Some(Arc::clone(&context)),
    });
    let store = store_with_account(&mock_server.uri());

    check_credentials(
        provider(),
        store.as_ref(),
        Arc::clone(&handler) as Arc<dyn MessageHandler>,
    )
    .await?;
    context.shutdown();

    let messages = handler.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].2.as_deref(), Some("settings-screen"));
    Ok(())
}
