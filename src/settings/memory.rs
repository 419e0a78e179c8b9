// ABOUTME: In-memory settings store for tests and embedding applications
// ABOUTME: Values live in a lock-protected map for the lifetime of the process
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::{SettingKey, SettingsStore};
use async_trait::async_trait;
use follower_core::errors::AppResult;
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Settings held in memory only
#[derive(Debug, Default)]
pub struct InMemorySettingsStore {
    values: RwLock<BTreeMap<SettingKey, Value>>,
}

impl InMemorySettingsStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with `entries`
    #[must_use]
    pub fn with_values(entries: impl IntoIterator<Item = (SettingKey, Value)>) -> Self {
        Self {
            values: RwLock::new(entries.into_iter().collect()),
        }
    }

    /// Copy of every stored value
    pub async fn snapshot(&self) -> BTreeMap<SettingKey, Value> {
        self.values.read().await.clone()
    }
}

#[async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn get(&self, key: SettingKey) -> AppResult<Option<Value>> {
        Ok(self.values.read().await.get(&key).cloned())
    }

    async fn set_many(&self, entries: Vec<(SettingKey, Option<Value>)>) -> AppResult<()> {
        let mut values = self.values.write().await;
        for (key, value) in entries {
            match value {
                Some(value) => {
                    values.insert(key, value);
                }
                None => {
                    values.remove(&key);
                }
            }
        }
        Ok(())
    }
}
