// ABOUTME: Integration tests for follower settings persistence
// ABOUTME: JSON file store, credential updates that clear the session, history and session round trips
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use anyhow::Result;
use common::at;
use follower_core::constants::libreview::DEFAULT_BASE_URL;
use follower_core::errors::ErrorCode;
use follower_intelligence::RollingHistory;
use follower_providers::SessionState;
use glucose_follower::settings::{
    get_bool, get_string, load_history, load_session, save_history, save_session,
    update_base_url, update_password, update_username, FollowerSettings, InMemorySettingsStore,
    JsonFileSettingsStore, SettingKey, SettingsStore,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::fs;

fn signed_in() -> InMemorySettingsStore {
    InMemorySettingsStore::with_values([
        (SettingKey::BaseUrl, json!("https://api-eu.libreview.io")),
        (SettingKey::Username, json!("follower@example.com")),
        (SettingKey::Password, json!("correct horse")),
        (SettingKey::AuthToken, json!("token-1")),
        (SettingKey::AccountPatientId, json!("patient-1")),
    ])
}

#[tokio::test]
async fn test_file_store_survives_reopen() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("nested").join("settings.json");

    let store = JsonFileSettingsStore::open(&path).await?;
    store.set(SettingKey::Username, json!("follower@example.com")).await?;
    store.set(SettingKey::SmoothingEnabled, json!(true)).await?;
    drop(store);

    let reopened = JsonFileSettingsStore::open(&path).await?;
    assert_eq!(reopened.path(), path.as_path());
    assert_eq!(
        get_string(&reopened, SettingKey::Username).await?.as_deref(),
        Some("follower@example.com")
    );
    assert!(get_bool(&reopened, SettingKey::SmoothingEnabled, false).await?);

    let raw: Value = serde_json::from_str(&fs::read_to_string(&path).await?)?;
    assert_eq!(raw["username"], json!("follower@example.com"));
    assert_eq!(raw["smoothingEnabled"], json!(true));
    assert!(!path.with_extension("json.tmp").exists());
    Ok(())
}

#[tokio::test]
async fn test_missing_file_is_empty_store() -> Result<()> {
    let dir = TempDir::new()?;
    let store = JsonFileSettingsStore::open(dir.path().join("absent.json")).await?;

    let settings = FollowerSettings::load(&store).await?;
    assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    assert!(settings.credentials().is_none());
    assert!(settings.follower_enabled);
    assert!(!settings.smoothing_enabled);
    Ok(())
}

#[tokio::test]
async fn test_unknown_keys_are_ignored() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("settings.json");
    fs::write(
        &path,
        r#"{"username": "a@example.com", "legacyTheme": "dark", "password": "pw"}"#,
    )
    .await?;

    let store = JsonFileSettingsStore::open(&path).await?;
    let settings = FollowerSettings::load(&store).await?;
    let credentials = settings.credentials().unwrap();
    assert_eq!(credentials.username, "a@example.com");
    assert_eq!(credentials.password, "pw");
    Ok(())
}

#[tokio::test]
async fn test_file_that_is_not_an_object_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("settings.json");
    fs::write(&path, "[1, 2, 3]").await?;

    let err = JsonFileSettingsStore::open(&path).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::StorageError);
    Ok(())
}

#[cfg(unix)]
#[tokio::test]
async fn test_settings_file_is_private() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new()?;
    let path = dir.path().join("settings.json");
    let store = JsonFileSettingsStore::open(&path).await?;
    store.set(SettingKey::Password, json!("secret")).await?;

    let mode = fs::metadata(&path).await?.permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
    Ok(())
}

#[tokio::test]
async fn test_changing_username_clears_session() -> Result<()> {
    let store = signed_in();

    assert!(update_username(&store, Some("other@example.com")).await?);

    let session = load_session(&store).await?;
    assert_eq!(session, SessionState::logged_out());
    assert_eq!(
        get_string(&store, SettingKey::Username).await?.as_deref(),
        Some("other@example.com")
    );
    Ok(())
}

#[tokio::test]
async fn test_unchanged_password_keeps_session() -> Result<()> {
    let store = signed_in();

    assert!(!update_password(&store, Some("correct horse")).await?);

    let session = load_session(&store).await?;
    assert_eq!(session.auth_token.as_deref(), Some("token-1"));
    Ok(())
}

#[tokio::test]
async fn test_clearing_password_clears_session() -> Result<()> {
    let store = signed_in();

    assert!(update_password(&store, Some("")).await?);

    let settings = FollowerSettings::load(&store).await?;
    assert!(settings.password.is_none());
    assert!(settings.credentials().is_none());
    assert!(settings.session.auth_token.is_none());
    Ok(())
}

#[tokio::test]
async fn test_base_url_is_normalized_before_storing() -> Result<()> {
    let store = signed_in();

    let stored = update_base_url(&store, "api-us.libreview.io/some/path").await?;
    assert_eq!(stored, "https://api-us.libreview.io");
    assert!(load_session(&store).await?.auth_token.is_none());

    // Same address in another spelling changes nothing
    store.set(SettingKey::AuthToken, json!("token-2")).await?;
    update_base_url(&store, "https://api-us.libreview.io/").await?;
    assert_eq!(
        load_session(&store).await?.auth_token.as_deref(),
        Some("token-2")
    );
    Ok(())
}

#[tokio::test]
async fn test_unusable_base_url_is_rejected() {
    let store = signed_in();

    let err = update_base_url(&store, "   ").await.unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidInput);
    assert_eq!(
        get_string(&store, SettingKey::BaseUrl).await.unwrap().as_deref(),
        Some("https://api-eu.libreview.io")
    );
}

#[tokio::test]
async fn test_credentials_fingerprint_tracks_account() -> Result<()> {
    let store = signed_in();
    let before = FollowerSettings::load(&store).await?.credentials_fingerprint();

    store.set(SettingKey::SmoothingEnabled, json!(true)).await?;
    assert_eq!(
        FollowerSettings::load(&store).await?.credentials_fingerprint(),
        before
    );

    store.set(SettingKey::Password, json!("new")).await?;
    assert_ne!(
        FollowerSettings::load(&store).await?.credentials_fingerprint(),
        before
    );
    Ok(())
}

#[tokio::test]
async fn test_session_round_trip_removes_absent_values() -> Result<()> {
    let store = signed_in();

    save_session(
        &store,
        &SessionState {
            auth_token: Some("token-9".to_owned()),
            patient_id: None,
        },
    )
    .await?;

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.get(&SettingKey::AuthToken), Some(&json!("token-9")));
    assert!(!snapshot.contains_key(&SettingKey::AccountPatientId));
    Ok(())
}

#[tokio::test]
async fn test_history_round_trip() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("settings.json");
    let history = RollingHistory::from_parts(vec![120, 0, 118], Some(at(10, 5)), 72);

    let store = JsonFileSettingsStore::open(&path).await?;
    save_history(&store, &history).await?;
    drop(store);

    let reopened = JsonFileSettingsStore::open(&path).await?;
    let restored = load_history(&reopened, 72).await?;
    assert_eq!(restored.anchor(), Some(at(10, 5)));
    assert_eq!(restored.values(), vec![120, 0, 118]);

    let shorter = load_history(&reopened, 2).await?;
    assert_eq!(shorter.values(), vec![120, 0]);
    Ok(())
}

#[tokio::test]
async fn test_unreadable_history_starts_empty() -> Result<()> {
    let store = InMemorySettingsStore::with_values([
        (SettingKey::RollingHistoryValues, json!("not a list")),
        (SettingKey::RollingHistoryAnchorTimestamp, json!("yesterday")),
    ]);

    let history = load_history(&store, 72).await?;
    assert!(history.is_empty());
    assert!(history.anchor().is_none());
    Ok(())
}

#[tokio::test]
async fn test_wrongly_typed_values_fall_back_to_defaults() -> Result<()> {
    let store = InMemorySettingsStore::with_values([
        (SettingKey::FollowerEnabled, json!("no")),
        (SettingKey::BaseUrl, json!(42)),
    ]);

    let settings = FollowerSettings::load(&store).await?;
    assert!(settings.follower_enabled);
    assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    Ok(())
}
