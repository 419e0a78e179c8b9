// ABOUTME: Persisted follower settings: keys, the async store trait and typed accessors
// ABOUTME: Session, rolling history and credentials with token invalidation on change
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Follower Settings
//!
//! Account data shared between the CLI, the orchestrator and an embedding
//! application lives in a key-value [`SettingsStore`]. Values are JSON so that
//! any backend can hold them; the functions in this module give them types.
//!
//! Changing the server, user name or password through
//! [`update_base_url`], [`update_username`] or [`update_password`] clears the
//! stored token and patient so the next cycle authenticates again.

mod file;
mod memory;

pub use file::JsonFileSettingsStore;
pub use memory::InMemorySettingsStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use follower_core::constants::libreview::DEFAULT_BASE_URL;
use follower_core::errors::{AppError, AppResult};
use follower_intelligence::RollingHistory;
use follower_providers::{normalize_base_url, Credentials, SessionState};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::{debug, info, warn};

/// Keys of the persisted follower settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SettingKey {
    /// Bearer token of the current session
    AuthToken,
    /// Followed patient of the current session
    AccountPatientId,
    /// Normalized server address
    BaseUrl,
    /// Account user name (e-mail)
    Username,
    /// Account password
    Password,
    /// Whether readings are smoothed before delivery
    SmoothingEnabled,
    /// Rolling history slots, newest first
    RollingHistoryValues,
    /// Timestamp of rolling history slot 0
    RollingHistoryAnchorTimestamp,
    /// Whether poll cycles run at all
    FollowerEnabled,
}

impl SettingKey {
    /// Every key, in display order
    pub const ALL: [Self; 9] = [
        Self::BaseUrl,
        Self::Username,
        Self::Password,
        Self::AuthToken,
        Self::AccountPatientId,
        Self::FollowerEnabled,
        Self::SmoothingEnabled,
        Self::RollingHistoryValues,
        Self::RollingHistoryAnchorTimestamp,
    ];

    /// Name used in storage
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AuthToken => "authToken",
            Self::AccountPatientId => "accountPatientId",
            Self::BaseUrl => "baseUrl",
            Self::Username => "username",
            Self::Password => "password",
            Self::SmoothingEnabled => "smoothingEnabled",
            Self::RollingHistoryValues => "rollingHistoryValues",
            Self::RollingHistoryAnchorTimestamp => "rollingHistoryAnchorTimestamp",
            Self::FollowerEnabled => "followerEnabled",
        }
    }

    /// Whether values under this key must be obscured for display
    #[must_use]
    pub const fn is_secret(self) -> bool {
        matches!(self, Self::AuthToken | Self::Password)
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key-value storage of follower settings, owned by the embedding application
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Value stored under `key`
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend cannot be read
    async fn get(&self, key: SettingKey) -> AppResult<Option<Value>>;

    /// Apply several writes together; `None` removes the key
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend cannot be written
    async fn set_many(&self, entries: Vec<(SettingKey, Option<Value>)>) -> AppResult<()>;

    /// Store `value` under `key`
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend cannot be written
    async fn set(&self, key: SettingKey, value: Value) -> AppResult<()> {
        self.set_many(vec![(key, Some(value))]).await
    }

    /// Remove `key`
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend cannot be written
    async fn remove(&self, key: SettingKey) -> AppResult<()> {
        self.set_many(vec![(key, None)]).await
    }
}

/// String stored under `key`; other JSON types read as absent
///
/// # Errors
///
/// Returns a storage error if the backend cannot be read
pub async fn get_string(store: &dyn SettingsStore, key: SettingKey) -> AppResult<Option<String>> {
    Ok(match store.get(key).await? {
        Some(Value::String(value)) => Some(value),
        Some(Value::Null) | None => None,
        Some(other) => {
            warn!(key = %key, kind = json_kind(&other), "Ignoring non-string setting");
            None
        }
    })
}

/// Boolean stored under `key`, or `default`
///
/// # Errors
///
/// Returns a storage error if the backend cannot be read
pub async fn get_bool(store: &dyn SettingsStore, key: SettingKey, default: bool) -> AppResult<bool> {
    Ok(match store.get(key).await? {
        Some(Value::Bool(value)) => value,
        Some(Value::Null) | None => default,
        Some(other) => {
            warn!(key = %key, kind = json_kind(&other), "Ignoring non-boolean setting");
            default
        }
    })
}

/// Persisted session token and patient
///
/// # Errors
///
/// Returns a storage error if the backend cannot be read
pub async fn load_session(store: &dyn SettingsStore) -> AppResult<SessionState> {
    Ok(SessionState {
        auth_token: get_string(store, SettingKey::AuthToken).await?,
        patient_id: get_string(store, SettingKey::AccountPatientId).await?,
    })
}

/// Persist session token and patient; absent values are removed
///
/// # Errors
///
/// Returns a storage error if the backend cannot be written
pub async fn save_session(store: &dyn SettingsStore, session: &SessionState) -> AppResult<()> {
    store
        .set_many(vec![
            (SettingKey::AuthToken, session.auth_token.clone().map(Value::String)),
            (
                SettingKey::AccountPatientId,
                session.patient_id.clone().map(Value::String),
            ),
        ])
        .await
}

/// Persisted rolling history, truncated to `capacity`.
///
/// Unreadable values start an empty history rather than failing the cycle.
///
/// # Errors
///
/// Returns a storage error if the backend cannot be read
pub async fn load_history(store: &dyn SettingsStore, capacity: usize) -> AppResult<RollingHistory> {
    let values = match store.get(SettingKey::RollingHistoryValues).await? {
        Some(raw) => serde_json::from_value::<Vec<i32>>(raw).unwrap_or_else(|e| {
            warn!(error = %e, "Discarding unreadable rolling history");
            Vec::new()
        }),
        None => Vec::new(),
    };

    let anchor = get_string(store, SettingKey::RollingHistoryAnchorTimestamp)
        .await?
        .and_then(|raw| match DateTime::parse_from_rfc3339(&raw) {
            Ok(anchor) => Some(anchor.with_timezone(&Utc)),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable rolling history anchor");
                None
            }
        });

    Ok(RollingHistory::from_parts(values, anchor, capacity))
}

/// Persist the rolling history and its anchor
///
/// # Errors
///
/// Returns a storage error if the backend cannot be written
pub async fn save_history(store: &dyn SettingsStore, history: &RollingHistory) -> AppResult<()> {
    store
        .set_many(vec![
            (
                SettingKey::RollingHistoryValues,
                Some(Value::from(history.values())),
            ),
            (
                SettingKey::RollingHistoryAnchorTimestamp,
                history.anchor().map(|anchor| Value::String(anchor.to_rfc3339())),
            ),
        ])
        .await
}

/// Snapshot of the settings one poll cycle needs
#[derive(Clone, PartialEq, Eq)]
pub struct FollowerSettings {
    /// Server address, the default region when unset
    pub base_url: String,
    /// Account user name
    pub username: Option<String>,
    /// Account password
    pub password: Option<String>,
    /// Persisted session
    pub session: SessionState,
    /// Whether readings are smoothed
    pub smoothing_enabled: bool,
    /// Whether cycles run; unset means enabled
    pub follower_enabled: bool,
}

impl fmt::Debug for FollowerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FollowerSettings")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("has_token", &self.session.auth_token.is_some())
            .field("patient_id", &self.session.patient_id)
            .field("smoothing_enabled", &self.smoothing_enabled)
            .field("follower_enabled", &self.follower_enabled)
            .finish()
    }
}

impl FollowerSettings {
    /// Read a snapshot from `store`
    ///
    /// # Errors
    ///
    /// Returns a storage error if the backend cannot be read
    pub async fn load(store: &dyn SettingsStore) -> AppResult<Self> {
        Ok(Self {
            base_url: get_string(store, SettingKey::BaseUrl)
                .await?
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            username: non_empty(get_string(store, SettingKey::Username).await?),
            password: non_empty(get_string(store, SettingKey::Password).await?),
            session: load_session(store).await?,
            smoothing_enabled: get_bool(store, SettingKey::SmoothingEnabled, false).await?,
            follower_enabled: get_bool(store, SettingKey::FollowerEnabled, true).await?,
        })
    }

    /// Credentials, when both user name and password are set
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Credentials::new(username, password)),
            _ => None,
        }
    }

    /// Digest of server, user name and password, compared between cycles
    #[must_use]
    pub fn credentials_fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.base_url.hash(&mut hasher);
        self.username.hash(&mut hasher);
        self.password.hash(&mut hasher);
        hasher.finish()
    }
}

/// Store a new server address and return its normalized form.
///
/// The token and patient are cleared when the address changes.
///
/// # Errors
///
/// Returns an invalid-input error when the address cannot be normalized, or a
/// storage error
pub async fn update_base_url(store: &dyn SettingsStore, raw: &str) -> AppResult<String> {
    let normalized = normalize_base_url(raw)
        .ok_or_else(|| AppError::invalid_input(format!("Invalid server address: '{raw}'")))?;
    let value = Value::String(normalized.clone());
    update_credential(store, SettingKey::BaseUrl, Some(value)).await?;
    Ok(normalized)
}

/// Store a new user name (`None` or blank clears it); clears the session on change
///
/// # Errors
///
/// Returns a storage error if the backend cannot be written
pub async fn update_username(store: &dyn SettingsStore, username: Option<&str>) -> AppResult<bool> {
    let value = username
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| Value::String(name.to_owned()));
    update_credential(store, SettingKey::Username, value).await
}

/// Store a new password (`None` or empty clears it); clears the session on change
///
/// # Errors
///
/// Returns a storage error if the backend cannot be written
pub async fn update_password(store: &dyn SettingsStore, password: Option<&str>) -> AppResult<bool> {
    let value = password
        .filter(|secret| !secret.is_empty())
        .map(|secret| Value::String(secret.to_owned()));
    update_credential(store, SettingKey::Password, value).await
}

async fn update_credential(
    store: &dyn SettingsStore,
    key: SettingKey,
    value: Option<Value>,
) -> AppResult<bool> {
    let current = store.get(key).await?;
    if current == value {
        debug!(key = %key, "Credential unchanged");
        return Ok(false);
    }

    info!(key = %key, "Credential changed, session cleared");
    store
        .set_many(vec![
            (key, value),
            (SettingKey::AuthToken, None),
            (SettingKey::AccountPatientId, None),
        ])
        .await?;
    Ok(true)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
