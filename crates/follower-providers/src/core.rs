// ABOUTME: Core follower provider trait and credential types
// ABOUTME: The async seam between session handling and a concrete remote service
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Follower Provider Contract
//!
//! A follower service is reached through three calls, always in this order on
//! a fresh session: [`FollowProvider::login`] exchanges credentials for a bearer
//! token, [`FollowProvider::resolve_patient_id`] finds the monitored account, and
//! [`FollowProvider::fetch_readings`] retrieves the current series. Session
//! bookkeeping (which step is needed, when to re-login) lives in
//! [`SessionClient`](crate::libreview::SessionClient), not in providers.

use async_trait::async_trait;
use follower_core::errors::provider::ProviderResult;
use follower_core::models::FetchedReadings;
use std::fmt;

/// Account credentials for a follower service
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account e-mail or user name
    pub username: String,
    /// Account password
    pub password: String,
}

impl Credentials {
    /// Build credentials from borrowed strings
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Remote follower service
#[async_trait]
pub trait FollowProvider: Send + Sync {
    /// Provider identifier used in logs and errors
    fn name(&self) -> &'static str;

    /// Exchange credentials for a bearer token
    ///
    /// # Errors
    ///
    /// `AuthenticationFailed` with the server's message when the credentials are
    /// rejected, `MissingField` when the token is absent from a success payload,
    /// `Network` on transport failure.
    async fn login(&self, credentials: &Credentials, base_url: &str) -> ProviderResult<String>;

    /// Resolve the identifier of the first followed patient
    ///
    /// # Errors
    ///
    /// `SessionExpired` when the token is no longer accepted,
    /// `NoPatientConnection` when the account follows nobody, `ApiError` for
    /// other rejections, `Network` on transport failure.
    async fn resolve_patient_id(&self, token: &str, base_url: &str) -> ProviderResult<String>;

    /// Retrieve the patient's readings, newest first, with sensor metadata.
    ///
    /// An empty result is "no data this cycle", not a failure.
    ///
    /// # Errors
    ///
    /// `SessionExpired` when the token is no longer accepted, `ApiError` for
    /// other rejections, `Network` on transport failure.
    async fn fetch_readings(
        &self,
        token: &str,
        patient_id: &str,
        base_url: &str,
    ) -> ProviderResult<FetchedReadings>;
}
