// ABOUTME: Remote glucose follower service integrations
// ABOUTME: Provider trait, shared HTTP client and the LibreLinkUp session and readings client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! Follower provider implementations and core abstractions.
//!
//! This crate owns everything that talks to a remote follower service: the
//! [`FollowProvider`] seam, the process-wide HTTP client and the LibreLinkUp
//! implementation with its session state machine.

/// Core provider trait and credential types
pub mod core;
/// Shared HTTP client for follower API calls
pub mod http_client;
/// LibreLinkUp (LibreView follower) implementation
pub mod libreview;

pub use core::{Credentials, FollowProvider};
pub use follower_core::errors::provider::{ProviderError, ProviderResult};
pub use http_client::{initialize_shared_client, shared_client};
pub use libreview::{
    normalize_base_url, LibreViewProvider, ReadingsFetcher, ReadySession, SessionClient,
    SessionPhase, SessionState,
};
