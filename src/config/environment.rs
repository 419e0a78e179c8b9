// ABOUTME: Environment configuration for the follower process
// ABOUTME: Parses FOLLOWER_* variables with logged fallbacks to defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration

use chrono::TimeDelta;
use follower_core::constants::{gap_fill, http, polling, service_names, smoothing};
use follower_core::errors::{AppError, AppResult};
use follower_intelligence::{GapFillConfig, SmoothingConfig};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Settings file location
pub const ENV_SETTINGS_PATH: &str = "FOLLOWER_SETTINGS_PATH";
/// Seconds between poll cycles
pub const ENV_POLL_INTERVAL_SECS: &str = "FOLLOWER_POLL_INTERVAL_SECS";
/// Request timeout
pub const ENV_HTTP_TIMEOUT_SECS: &str = "FOLLOWER_HTTP_TIMEOUT_SECS";
/// Connection timeout
pub const ENV_HTTP_CONNECT_TIMEOUT_SECS: &str = "FOLLOWER_HTTP_CONNECT_TIMEOUT_SECS";
/// Rolling history depth in minutes
pub const ENV_RETENTION_DEPTH: &str = "FOLLOWER_RETENTION_DEPTH";
/// Widest interpolated gap in minutes
pub const ENV_MAX_INTERPOLATION_GAP_MINUTES: &str = "FOLLOWER_MAX_INTERPOLATION_GAP_MINUTES";
/// Per-minute regression half-width
pub const ENV_SMOOTHING_WIDTH_PER_MINUTE: &str = "FOLLOWER_SMOOTHING_WIDTH_PER_MINUTE";
/// Per-minute regression passes
pub const ENV_SMOOTHING_REPEAT_PER_MINUTE: &str = "FOLLOWER_SMOOTHING_REPEAT_PER_MINUTE";
/// 5-minute regression half-width
pub const ENV_SMOOTHING_WIDTH_PER_5_MINUTE: &str = "FOLLOWER_SMOOTHING_WIDTH_PER_5_MINUTE";
/// 5-minute regression passes
pub const ENV_SMOOTHING_REPEAT_PER_5_MINUTE: &str = "FOLLOWER_SMOOTHING_REPEAT_PER_5_MINUTE";

/// Settings file name inside the per-user configuration directory
const SETTINGS_FILE_NAME: &str = "settings.json";

/// Timeouts for the shared HTTP client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
    /// Connection establishment timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: http::DEFAULT_TIMEOUT_SECS,
            connect_timeout_secs: http::DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

/// Process configuration of the follower
#[derive(Debug, Clone, PartialEq)]
pub struct FollowerConfig {
    /// JSON settings file used by the CLI
    pub settings_path: PathBuf,
    /// Time between poll cycles
    pub poll_interval: Duration,
    /// Shared HTTP client timeouts
    pub http: HttpClientConfig,
    /// Gap filling parameters
    pub gap_fill: GapFillConfig,
    /// Smoothing parameters; `enabled` is overridden per cycle by the stored setting
    pub smoothing: SmoothingConfig,
}

impl Default for FollowerConfig {
    fn default() -> Self {
        Self {
            settings_path: default_settings_path(),
            poll_interval: Duration::from_secs(polling::DEFAULT_POLL_INTERVAL_SECS),
            http: HttpClientConfig::default(),
            gap_fill: GapFillConfig::default(),
            smoothing: SmoothingConfig::default(),
        }
    }
}

impl FollowerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the result fails [`validate`](Self::validate).
    pub fn from_env() -> AppResult<Self> {
        info!("Loading configuration from environment variables");

        let settings_path = env::var(ENV_SETTINGS_PATH)
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map_or_else(default_settings_path, PathBuf::from);

        let config = Self {
            settings_path,
            poll_interval: Duration::from_secs(env_parse_or(
                ENV_POLL_INTERVAL_SECS,
                polling::DEFAULT_POLL_INTERVAL_SECS,
            )),
            http: HttpClientConfig {
                timeout_secs: env_parse_or(ENV_HTTP_TIMEOUT_SECS, http::DEFAULT_TIMEOUT_SECS),
                connect_timeout_secs: env_parse_or(
                    ENV_HTTP_CONNECT_TIMEOUT_SECS,
                    http::DEFAULT_CONNECT_TIMEOUT_SECS,
                ),
            },
            gap_fill: GapFillConfig {
                retention_depth: env_parse_or(
                    ENV_RETENTION_DEPTH,
                    gap_fill::DEFAULT_RETENTION_DEPTH,
                ),
                max_interpolation_gap: max_interpolation_gap(env_parse_or(
                    ENV_MAX_INTERPOLATION_GAP_MINUTES,
                    gap_fill::DEFAULT_MAX_INTERPOLATION_GAP_MINUTES,
                )),
            },
            smoothing: SmoothingConfig {
                enabled: false,
                width_per_minute: env_parse_or(
                    ENV_SMOOTHING_WIDTH_PER_MINUTE,
                    smoothing::DEFAULT_WIDTH_PER_MINUTE,
                ),
                repeat_per_minute: env_parse_or(
                    ENV_SMOOTHING_REPEAT_PER_MINUTE,
                    smoothing::DEFAULT_REPEAT_PER_MINUTE,
                ),
                width_per_5_minute: env_parse_or(
                    ENV_SMOOTHING_WIDTH_PER_5_MINUTE,
                    smoothing::DEFAULT_WIDTH_PER_5_MINUTE,
                ),
                repeat_per_5_minute: env_parse_or(
                    ENV_SMOOTHING_REPEAT_PER_5_MINUTE,
                    smoothing::DEFAULT_REPEAT_PER_5_MINUTE,
                ),
            },
        };

        config.validate()?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Rejects a zero retention depth, a zero poll interval and a negative
    /// interpolation gap.
    pub fn validate(&self) -> AppResult<()> {
        if self.gap_fill.retention_depth == 0 {
            return Err(AppError::config(format!(
                "{ENV_RETENTION_DEPTH} must be at least 1"
            )));
        }

        if self.poll_interval.is_zero() {
            return Err(AppError::config(format!(
                "{ENV_POLL_INTERVAL_SECS} must be at least 1"
            )));
        }

        if self.gap_fill.max_interpolation_gap < TimeDelta::zero() {
            return Err(AppError::config(format!(
                "{ENV_MAX_INTERPOLATION_GAP_MINUTES} must not be negative"
            )));
        }

        Ok(())
    }

    /// Get a summary of the configuration for logging (without secrets)
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} configuration: settings={}, poll={}s, http_timeout={}s, connect_timeout={}s, \
             retention_depth={}, max_gap={}min, smoothing(per_minute={}x{}, per_5_minute={}x{})",
            service_names::GLUCOSE_FOLLOWER,
            self.settings_path.display(),
            self.poll_interval.as_secs(),
            self.http.timeout_secs,
            self.http.connect_timeout_secs,
            self.gap_fill.retention_depth,
            self.gap_fill.max_interpolation_gap.num_minutes(),
            self.smoothing.width_per_minute,
            self.smoothing.repeat_per_minute,
            self.smoothing.width_per_5_minute,
            self.smoothing.repeat_per_5_minute,
        )
    }
}

/// `<config dir>/glucose-follower/settings.json`, or the working directory when there is none
#[must_use]
pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(service_names::GLUCOSE_FOLLOWER)
        .join(SETTINGS_FILE_NAME)
}

fn max_interpolation_gap(minutes: i64) -> TimeDelta {
    TimeDelta::try_minutes(minutes).unwrap_or_else(|| {
        warn!(minutes, "Interpolation gap out of range, using default");
        TimeDelta::minutes(gap_fill::DEFAULT_MAX_INTERPOLATION_GAP_MINUTES)
    })
}

/// Parse an environment variable, falling back to `default` when unset or invalid
fn env_parse_or<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!(key, value = %raw, error = %e, fallback = %default, "Invalid environment value, using default");
            default
        }),
        Err(_) => default,
    }
}
