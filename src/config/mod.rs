// ABOUTME: Configuration management module for process-level follower settings
// ABOUTME: Environment-only configuration of polling, HTTP timeouts and the numerical pipeline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module for the glucose follower
//!
//! Process configuration comes from environment variables only. Account data
//! (server, credentials, session, history) lives in the
//! [`SettingsStore`](crate::settings::SettingsStore) instead.

/// Environment configuration
pub mod environment;

pub use environment::{FollowerConfig, HttpClientConfig};
