// ABOUTME: JSON file settings store used by the command-line follower
// ABOUTME: Whole-file rewrite through a temporary file and rename on every change
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{SettingKey, SettingsStore};
use async_trait::async_trait;
use follower_core::errors::{AppError, AppResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Settings persisted as one JSON object in a file
#[derive(Debug)]
pub struct JsonFileSettingsStore {
    path: PathBuf,
    values: Mutex<BTreeMap<SettingKey, Value>>,
}

impl JsonFileSettingsStore {
    /// Open the store at `path`; a missing file is an empty store.
    ///
    /// Unknown keys in the file are ignored.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the file exists but cannot be read or is not a JSON object
    pub async fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let values = match fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => parse_settings(&path, &contents)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "Settings file not found, starting empty");
                BTreeMap::new()
            }
            Err(e) => {
                return Err(AppError::storage(format!(
                    "Failed to read settings file {}",
                    path.display()
                ))
                .with_source(e))
            }
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Location of the settings file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, values: &BTreeMap<SettingKey, Value>) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| storage_error("create settings directory", parent, e))?;
        }

        let object: Map<String, Value> = values
            .iter()
            .map(|(key, value)| (key.as_str().to_owned(), value.clone()))
            .collect();
        let contents = serde_json::to_string_pretty(&Value::Object(object))?;

        let temporary = self.path.with_extension("json.tmp");
        fs::write(&temporary, contents)
            .await
            .map_err(|e| storage_error("write settings file", &temporary, e))?;
        restrict_permissions(&temporary).await?;
        fs::rename(&temporary, &self.path)
            .await
            .map_err(|e| storage_error("replace settings file", &self.path, e))?;

        debug!(path = %self.path.display(), keys = values.len(), "Settings saved");
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for JsonFileSettingsStore {
    async fn get(&self, key: SettingKey) -> AppResult<Option<Value>> {
        Ok(self.values.lock().await.get(&key).cloned())
    }

    async fn set_many(&self, entries: Vec<(SettingKey, Option<Value>)>) -> AppResult<()> {
        let mut values = self.values.lock().await;
        let mut updated = values.clone();
        for (key, value) in entries {
            match value {
                Some(value) => {
                    updated.insert(key, value);
                }
                None => {
                    updated.remove(&key);
                }
            }
        }

        if updated == *values {
            return Ok(());
        }

        self.persist(&updated).await?;
        *values = updated;
        Ok(())
    }
}

fn parse_settings(path: &Path, contents: &str) -> AppResult<BTreeMap<SettingKey, Value>> {
    let Value::Object(object) = serde_json::from_str::<Value>(contents)? else {
        return Err(AppError::storage(format!(
            "Settings file {} is not a JSON object",
            path.display()
        )));
    };

    Ok(object
        .into_iter()
        .filter_map(|(name, value)| {
            let key = SettingKey::ALL.into_iter().find(|key| key.as_str() == name);
            if key.is_none() {
                warn!(key = %name, "Ignoring unknown setting");
            }
            key.map(|key| (key, value))
        })
        .collect())
}

fn storage_error(action: &str, path: &Path, error: io::Error) -> AppError {
    AppError::storage(format!("Failed to {action} {}", path.display())).with_source(error)
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> AppResult<()> {
    use std::fs::Permissions;
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, Permissions::from_mode(0o600))
        .await
        .map_err(|e| storage_error("restrict permissions of", path, e))
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> AppResult<()> {
    Ok(())
}
