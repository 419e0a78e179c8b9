// ABOUTME: Settings commands for glucose-follower
// ABOUTME: Writes server, account and switches; shows the stored values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use glucose_follower::errors::AppResult;
use glucose_follower::settings::{
    load_history, update_base_url, update_password, update_username, FollowerSettings, SettingKey,
    SettingsStore,
};
use serde_json::Value;
use tracing::info;

use crate::helpers::display::display_settings;

type Result<T> = AppResult<T>;

/// Values passed to `configure`; `None` leaves a setting as it is
pub struct ConfigureArgs {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub smoothing: Option<bool>,
    pub follower: Option<bool>,
}

/// Apply the given settings
pub async fn configure(store: &dyn SettingsStore, args: ConfigureArgs) -> Result<()> {
    if let Some(url) = args.url {
        let normalized = update_base_url(store, &url).await?;
        println!("Server set to {normalized}");
    }

    if let Some(username) = args.username {
        if update_username(store, Some(&username)).await? {
            println!("Username updated, session cleared");
        }
    }

    if let Some(password) = args.password {
        if update_password(store, Some(&password)).await? {
            println!("Password updated, session cleared");
        }
    }

    if let Some(smoothing) = args.smoothing {
        store
            .set(SettingKey::SmoothingEnabled, Value::Bool(smoothing))
            .await?;
        println!("Smoothing {}", if smoothing { "enabled" } else { "disabled" });
    }

    if let Some(follower) = args.follower {
        store
            .set(SettingKey::FollowerEnabled, Value::Bool(follower))
            .await?;
        println!("Follower {}", if follower { "enabled" } else { "disabled" });
    }

    info!("Settings updated");
    Ok(())
}

/// Print the stored settings
pub async fn show(store: &dyn SettingsStore, retention_depth: usize) -> Result<()> {
    let settings = FollowerSettings::load(store).await?;
    let history = load_history(store, retention_depth).await?;
    display_settings(&settings, history.len());
    Ok(())
}
