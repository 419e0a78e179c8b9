// ABOUTME: Unified error handling for the follower pipeline with standard error codes
// ABOUTME: Defines ErrorCode, AppError and the AppResult alias used across crates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! Every layer above the HTTP client reports failures as [`AppError`]. Provider
//! failures keep their structured [`ProviderError`] as the error source so callers
//! can still distinguish an expired session from a transport failure.

/// Structured errors for remote provider operations
pub mod provider;

pub use provider::{ProviderError, ProviderResult};

use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Authentication (1000-1999)
    /// No credentials configured
    #[serde(rename = "AUTH_REQUIRED")]
    AuthRequired = 1000,
    /// Credentials rejected by the remote service
    #[serde(rename = "AUTH_INVALID")]
    AuthInvalid = 1001,
    /// Session token expired
    #[serde(rename = "AUTH_EXPIRED")]
    AuthExpired = 1002,

    // Validation (3000-3999)
    /// Input rejected by validation
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,
    /// Data in an unexpected format
    #[serde(rename = "INVALID_FORMAT")]
    InvalidFormat = 3002,

    // External Services (5000-5999)
    /// Remote service returned an error
    #[serde(rename = "EXTERNAL_SERVICE_ERROR")]
    ExternalServiceError = 5000,
    /// Remote service unreachable
    #[serde(rename = "EXTERNAL_SERVICE_UNAVAILABLE")]
    ExternalServiceUnavailable = 5001,
    /// Remote service rejected authentication
    #[serde(rename = "EXTERNAL_AUTH_FAILED")]
    ExternalAuthFailed = 5002,

    // Configuration (6000-6999)
    /// Required configuration is missing
    #[serde(rename = "CONFIG_MISSING")]
    ConfigMissing = 6001,
    /// Configuration is invalid
    #[serde(rename = "CONFIG_INVALID")]
    ConfigInvalid = 6002,

    // Internal Errors (9000-9999)
    /// Unexpected internal failure
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    /// Settings storage failure
    #[serde(rename = "STORAGE_ERROR")]
    StorageError = 9002,
    /// Serialization or deserialization failure
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9003,
}

impl ErrorCode {
    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthRequired => "Credentials are required to follow a remote account",
            Self::AuthInvalid => "The provided credentials are invalid",
            Self::AuthExpired => "The remote session has expired",
            Self::InvalidInput => "The provided input is invalid",
            Self::InvalidFormat => "The data format is invalid",
            Self::ExternalServiceError => "An external service encountered an error",
            Self::ExternalServiceUnavailable => "An external service is currently unavailable",
            Self::ExternalAuthFailed => "Authentication with external service failed",
            Self::ConfigMissing => "Required configuration is missing",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::InternalError => "An internal error occurred",
            Self::StorageError => "Settings storage operation failed",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }

    /// Whether the failure stems from credentials or session state
    #[must_use]
    pub const fn is_auth_related(self) -> bool {
        matches!(
            self,
            Self::AuthRequired | Self::AuthInvalid | Self::AuthExpired | Self::ExternalAuthFailed
        )
    }
}

/// Unified error type for the application
#[derive(Debug, Error)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Source error for error chaining
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error for error chaining
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Downcast the source to a provider error, if that is what caused this error
    #[must_use]
    pub fn provider_error(&self) -> Option<&ProviderError> {
        self.source
            .as_deref()
            .and_then(|source| source.downcast_ref::<ProviderError>())
    }

    /// No credentials configured
    #[must_use]
    pub fn auth_required() -> Self {
        Self::new(ErrorCode::AuthRequired, "Username and password are required")
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigInvalid, message)
    }

    /// Missing configuration value
    pub fn config_missing(key: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ConfigMissing,
            format!("Missing configuration: {}", key.into()),
        )
    }

    /// Settings storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    /// Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }

    /// External service error
    pub fn external_service(service: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ExternalServiceError,
            format!("{}: {}", service.into(), message.into()),
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl From<ProviderError> for AppError {
    fn from(error: ProviderError) -> Self {
        let code = match &error {
            ProviderError::Network { .. } => ErrorCode::ExternalServiceUnavailable,
            ProviderError::AuthenticationFailed { .. } => ErrorCode::ExternalAuthFailed,
            ProviderError::SessionExpired { .. } => ErrorCode::AuthExpired,
            ProviderError::MissingField { .. } | ProviderError::InvalidResponse { .. } => {
                ErrorCode::InvalidFormat
            }
            ProviderError::ConfigMissing { .. } => ErrorCode::ConfigMissing,
            ProviderError::ApiError { .. } | ProviderError::NoPatientConnection { .. } => {
                ErrorCode::ExternalServiceError
            }
        };
        Self::new(code, error.to_string()).with_source(error)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::serialization(error.to_string()).with_source(error)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_keeps_source() {
        let error: AppError = ProviderError::AuthenticationFailed {
            provider: "libreview".to_owned(),
            reason: "bad credentials".to_owned(),
        }
        .into();

        assert_eq!(error.code, ErrorCode::ExternalAuthFailed);
        assert!(error.code.is_auth_related());
        assert!(matches!(
            error.provider_error(),
            Some(ProviderError::AuthenticationFailed { reason, .. }) if reason == "bad credentials"
        ));
    }

    #[test]
    fn test_display_includes_description() {
        let error = AppError::config_missing("baseUrl");
        assert_eq!(
            error.to_string(),
            "Required configuration is missing: Missing configuration: baseUrl"
        );
    }
}
