// ABOUTME: Main library entry point for the glucose follower
// ABOUTME: Settings, configuration, logging, orchestration and consumer delivery
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Glucose Follower
//!
//! Follows a remote LibreView (LibreLinkUp) account: it logs in, resolves the
//! followed patient, pulls the recent glucose history, turns it into a
//! gap-free per-minute series and hands that series to a registered consumer.
//!
//! ## Architecture
//!
//! - **`follower-core`**: readings, the ordered sequence, errors and constants
//! - **`follower-providers`**: the `LibreLinkUp` session and readings retrieval
//! - **`follower-intelligence`**: gap filling against a rolling history, smoothing
//! - **this crate**: persisted settings, environment configuration, logging,
//!   the poll cycle and the CLI
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use glucose_follower::config::FollowerConfig;
//! use glucose_follower::errors::AppResult;
//! use glucose_follower::orchestrator::FollowOrchestrator;
//! use glucose_follower::settings::JsonFileSettingsStore;
//! use glucose_follower::consumer::FollowerConsumer;
//! use glucose_follower::models::ChronoSequence;
//! use follower_providers::LibreViewProvider;
//!
//! struct Printer;
//!
//! impl FollowerConsumer for Printer {
//!     fn on_follower_info_received(
//!         &self,
//!         readings: ChronoSequence,
//!         _serial_number: Option<String>,
//!         _sensor_start: Option<chrono::DateTime<chrono::Utc>>,
//!     ) {
//!         println!("{} readings", readings.len());
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = FollowerConfig::from_env()?;
//!     let store = JsonFileSettingsStore::open(config.settings_path.clone()).await?;
//!     let orchestrator = FollowOrchestrator::new(
//!         Arc::new(LibreViewProvider::new()),
//!         Arc::new(store),
//!         Arc::new(Printer),
//!     )
//!     .with_gap_fill(config.gap_fill)
//!     .with_smoothing(config.smoothing);
//!
//!     let outcome = orchestrator.poll_cycle().await?;
//!     println!("{outcome:?}");
//!     Ok(())
//! }
//! ```

/// Environment configuration
pub mod config;

/// Consumer contract and execution contexts
pub mod consumer;

/// Stored credential verification
pub mod credential_check;

/// Structured logging setup
pub mod logging;

/// Poll cycle orchestration
pub mod orchestrator;

/// Persisted follower settings
pub mod settings;

/// Secret redaction helpers
pub mod utils;

pub use follower_core::{constants, errors, models};
