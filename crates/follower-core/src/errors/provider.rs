// ABOUTME: Structured error types for remote glucose provider operations
// ABOUTME: Distinguishes transport, authentication, session-expiry and payload failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Provider error taxonomy.
//!
//! The variants map one-to-one onto how a poll cycle reacts: transport failures
//! abort without touching state, authentication failures clear the token,
//! session expiry triggers the single re-login, and payload failures are reported
//! with the JSON path that was missing.

use thiserror::Error;

/// Errors raised while talking to a remote follower service
#[non_exhaustive]
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Request never produced a usable response (no network, timeout, TLS)
    #[error("{provider} network error: {message}")]
    Network {
        /// Provider name
        provider: String,
        /// Transport error description
        message: String,
    },

    /// Credentials were rejected
    #[error("{provider} authentication failed: {reason}")]
    AuthenticationFailed {
        /// Provider name
        provider: String,
        /// Server supplied message, or the generic failure marker
        reason: String,
    },

    /// The bearer token is no longer accepted
    #[error("{provider} session expired: {reason}")]
    SessionExpired {
        /// Provider name
        provider: String,
        /// Server supplied message
        reason: String,
    },

    /// Non-success response that is not an authentication problem
    #[error("{provider} API error ({status_code}): {message}")]
    ApiError {
        /// Provider name
        provider: String,
        /// HTTP status code
        status_code: u16,
        /// Server supplied message, or "unknown error"
        message: String,
        /// Whether a later attempt may succeed
        retryable: bool,
    },

    /// A mandatory field was absent from the payload
    #[error("{provider} response is missing '{field}'")]
    MissingField {
        /// Provider name
        provider: String,
        /// Dotted JSON path of the missing field
        field: &'static str,
    },

    /// The payload could not be decoded at all
    #[error("{provider} returned an unreadable response: {reason}")]
    InvalidResponse {
        /// Provider name
        provider: String,
        /// Decoder error description
        reason: String,
    },

    /// The account follows nobody
    #[error("{provider} account has no patient connection")]
    NoPatientConnection {
        /// Provider name
        provider: String,
    },

    /// A setting required to reach the provider is absent
    #[error("{provider} is missing configuration: {key}")]
    ConfigMissing {
        /// Provider name
        provider: String,
        /// Setting key
        key: &'static str,
    },
}

impl ProviderError {
    /// Provider that raised the error
    #[must_use]
    pub fn provider(&self) -> &str {
        match self {
            Self::Network { provider, .. }
            | Self::AuthenticationFailed { provider, .. }
            | Self::SessionExpired { provider, .. }
            | Self::ApiError { provider, .. }
            | Self::MissingField { provider, .. }
            | Self::InvalidResponse { provider, .. }
            | Self::NoPatientConnection { provider }
            | Self::ConfigMissing { provider, .. } => provider,
        }
    }

    /// Human-readable failure detail suitable for a settings screen
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::Network { message, .. } | Self::ApiError { message, .. } => message.clone(),
            Self::AuthenticationFailed { reason, .. }
            | Self::SessionExpired { reason, .. }
            | Self::InvalidResponse { reason, .. } => reason.clone(),
            Self::MissingField { field, .. } => format!("missing {field}"),
            Self::NoPatientConnection { .. } => "no patient connection".to_owned(),
            Self::ConfigMissing { key, .. } => format!("{key} not set"),
        }
    }

    /// Whether the remote service reported the session token as expired
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired { .. })
    }

    /// Whether the failure is a rejection of credentials
    #[must_use]
    pub const fn is_authentication_failure(&self) -> bool {
        matches!(self, Self::AuthenticationFailed { .. })
    }

    /// Whether the next scheduled cycle might succeed without user action
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } | Self::SessionExpired { .. } => true,
            Self::ApiError { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;
