// ABOUTME: Logging configuration and structured logging setup for the follower
// ABOUTME: Configures log level, output format and noise filters for the tracing subscriber
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Structured logging configuration

use follower_core::constants::service_names;
use follower_core::errors::{AppError, AppResult};
use std::env;
use std::io;
use tracing::info;
use tracing_subscriber::{
    filter::Directive, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Include thread names and ids
    pub include_thread: bool,
    /// Service name for structured logging
    pub service_name: String,
    /// Service version
    pub service_version: String,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` lines for log collectors
    Json,
    /// Multi-field human-readable output
    Pretty,
    /// Single-line output
    Compact,
}

impl LogFormat {
    /// Parse a `LOG_FORMAT` value, defaulting to [`LogFormat::Pretty`]
    #[must_use]
    pub fn from_str_or_default(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            include_location: false,
            include_thread: false,
            service_name: service_names::GLUCOSE_FOLLOWER.into(),
            service_version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            level: env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
            format: env::var("LOG_FORMAT")
                .map(|value| LogFormat::from_str_or_default(&value))
                .unwrap_or(LogFormat::Pretty),
            include_location: env_flag("LOG_INCLUDE_LOCATION"),
            include_thread: env_flag("LOG_INCLUDE_THREAD"),
            ..Self::default()
        }
    }

    /// Same configuration with a different level
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Build the filter: the configured level plus fixed noise reduction for HTTP internals
    #[must_use]
    pub fn env_filter(&self) -> EnvFilter {
        ["hyper=warn", "hyper_util=warn", "reqwest=warn", "rustls=warn"]
            .iter()
            .filter_map(|directive| directive.parse::<Directive>().ok())
            .fold(EnvFilter::new(&self.level), EnvFilter::add_directive)
    }

    /// Initialize the global tracing subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> AppResult<()> {
        let registry = tracing_subscriber::registry().with(self.env_filter());

        let result = match self.format {
            LogFormat::Json => registry
                .with(
                    fmt::layer()
                        .json()
                        .with_file(self.include_location)
                        .with_line_number(self.include_location)
                        .with_thread_names(self.include_thread)
                        .with_thread_ids(self.include_thread)
                        .with_writer(io::stderr),
                )
                .try_init(),
            LogFormat::Pretty => registry
                .with(
                    fmt::layer()
                        .with_file(self.include_location)
                        .with_line_number(self.include_location)
                        .with_thread_names(self.include_thread)
                        .with_thread_ids(self.include_thread)
                        .with_writer(io::stderr),
                )
                .try_init(),
            LogFormat::Compact => registry
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(false)
                        .with_thread_names(self.include_thread)
                        .with_writer(io::stderr),
                )
                .try_init(),
        };

        result.map_err(|e| AppError::internal(format!("Failed to initialize logging: {e}")))?;

        info!(
            service.name = %self.service_name,
            service.version = %self.service_version,
            log.level = %self.level,
            log.format = ?self.format,
            "Glucose follower starting up"
        );
        Ok(())
    }
}

/// Initialize logging from environment
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_from_env() -> AppResult<()> {
    LoggingConfig::from_env().init()
}

/// Whether a flag variable is set to something other than `0`/`false`
fn env_flag(key: &str) -> bool {
    env::var(key).is_ok_and(|value| !matches!(value.trim(), "0" | "false" | ""))
}
