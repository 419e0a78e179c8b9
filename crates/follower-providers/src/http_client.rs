// ABOUTME: Shared HTTP client with connection pooling for follower service calls
// ABOUTME: Singleton pattern with timeouts configured once at process startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use follower_core::constants::http::{DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS};
use reqwest::{Client, ClientBuilder};
use std::sync::OnceLock;
use std::time::Duration;

/// Configured timeout values for the shared client
static CLIENT_TIMEOUTS: OnceLock<(u64, u64)> = OnceLock::new();

/// Global shared HTTP client with configured timeouts
static SHARED_CLIENT: OnceLock<Client> = OnceLock::new();

/// Set the timeouts used when the shared client is first built.
///
/// Only the first call has an effect, and only if it happens before the first
/// [`shared_client`] call. Returns whether the values were accepted.
pub fn initialize_shared_client(timeout_secs: u64, connect_timeout_secs: u64) -> bool {
    CLIENT_TIMEOUTS
        .set((timeout_secs, connect_timeout_secs))
        .is_ok()
}

/// Shared HTTP client for all follower requests
pub fn shared_client() -> &'static Client {
    SHARED_CLIENT.get_or_init(|| {
        let (timeout, connect_timeout) = CLIENT_TIMEOUTS
            .get()
            .copied()
            .unwrap_or((DEFAULT_TIMEOUT_SECS, DEFAULT_CONNECT_TIMEOUT_SECS));

        ClientBuilder::new()
            .timeout(Duration::from_secs(timeout))
            .connect_timeout(Duration::from_secs(connect_timeout))
            .build()
            .unwrap_or_else(|_| Client::new())
    })
}
