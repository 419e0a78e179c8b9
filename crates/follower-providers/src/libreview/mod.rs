// ABOUTME: LibreLinkUp follower provider over the shared reqwest client
// ABOUTME: Login, patient resolution and graph retrieval with lenient payload decoding
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # LibreLinkUp
//!
//! [`LibreViewProvider`] speaks the HTTP protocol. [`SessionClient`] decides when
//! to log in and resolve the patient, and [`ReadingsFetcher`] retrieves readings
//! for a ready session.

mod base_url;
mod dto;
mod fetcher;
mod session;

pub use base_url::normalize_base_url;
pub use fetcher::{parse_factory_timestamp, readings_from_payload, ReadingsFetcher};
pub use session::{ReadySession, SessionClient, SessionPhase, SessionState};

use crate::core::{Credentials, FollowProvider};
use crate::http_client::shared_client;
use async_trait::async_trait;
use dto::{Envelope, LoginRequest};
use follower_core::constants::libreview::{
    CONNECTIONS_PATH, EXPIRED_TOKEN_MARKER, GRAPH_SUFFIX, LOGIN_PATH, PRODUCT_HEADER,
    PRODUCT_HEADER_VALUE, PROVIDER_NAME, UNKNOWN_ERROR, VERSION_HEADER, VERSION_HEADER_VALUE,
};
use follower_core::errors::provider::{ProviderError, ProviderResult};
use follower_core::models::FetchedReadings;
use reqwest::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, instrument, warn};

/// LibreLinkUp follower API client
#[derive(Debug, Clone)]
pub struct LibreViewProvider {
    client: Client,
}

impl Default for LibreViewProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LibreViewProvider {
    /// Provider backed by the process-wide shared HTTP client
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: shared_client().clone(),
        }
    }

    /// Provider backed by a specific client
    #[must_use]
    pub const fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Set the headers every LibreLinkUp request carries, send, and decode the envelope.
    ///
    /// A non-JSON body on a success status is an `InvalidResponse`; on a failure
    /// status it becomes an `ApiError` with the generic detail.
    async fn send(&self, request: RequestBuilder) -> ProviderResult<(StatusCode, Envelope)> {
        let mut request = request.build().map_err(|e| network_error(&e))?;
        let headers = request.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(PRODUCT_HEADER, HeaderValue::from_static(PRODUCT_HEADER_VALUE));
        headers.insert(VERSION_HEADER, HeaderValue::from_static(VERSION_HEADER_VALUE));

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| network_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| network_error(&e))?;
        debug!(status = status.as_u16(), body_length = body.len(), "LibreLinkUp response");

        if body.trim().is_empty() {
            return Ok((status, Envelope::default()));
        }

        match serde_json::from_str::<Envelope>(&body) {
            Ok(envelope) => Ok((status, envelope)),
            Err(e) if status.is_success() => Err(ProviderError::InvalidResponse {
                provider: PROVIDER_NAME.to_owned(),
                reason: e.to_string(),
            }),
            Err(_) => Err(api_error(status, UNKNOWN_ERROR)),
        }
    }
}

#[async_trait]
impl FollowProvider for LibreViewProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    #[instrument(skip(self, credentials), fields(provider = PROVIDER_NAME, api_call = "login"))]
    async fn login(&self, credentials: &Credentials, base_url: &str) -> ProviderResult<String> {
        let url = endpoint(base_url, LOGIN_PATH);
        let request = self.client.post(url).json(&LoginRequest {
            email: &credentials.username,
            password: &credentials.password,
        });

        let (status, envelope) = self.send(request).await?;
        session::token_from_login(status, envelope)
    }

    #[instrument(skip(self, token), fields(provider = PROVIDER_NAME, api_call = "connections"))]
    async fn resolve_patient_id(&self, token: &str, base_url: &str) -> ProviderResult<String> {
        let request = with_bearer(self.client.get(endpoint(base_url, CONNECTIONS_PATH)), token);
        let (status, envelope) = self.send(request).await?;
        session::patient_from_connections(status, envelope)
    }

    #[instrument(skip(self, token), fields(provider = PROVIDER_NAME, api_call = "graph"))]
    async fn fetch_readings(
        &self,
        token: &str,
        patient_id: &str,
        base_url: &str,
    ) -> ProviderResult<FetchedReadings> {
        let path = format!("{CONNECTIONS_PATH}/{patient_id}{GRAPH_SUFFIX}");
        let request = with_bearer(self.client.get(endpoint(base_url, &path)), token);
        let (status, envelope) = self.send(request).await?;

        if let Some(failure) = rejection(status, &envelope) {
            return Err(failure);
        }

        let Some(data) = envelope.data else {
            // Absent data is "nothing this cycle", reported only as a diagnostic.
            warn!(
                message = envelope.server_message().unwrap_or(UNKNOWN_ERROR),
                "Graph response carried no data"
            );
            return Ok(FetchedReadings::empty());
        };

        let fetched = readings_from_payload(&data);
        debug!(
            readings = fetched.readings.len(),
            has_serial = fetched.serial_number.is_some(),
            "Parsed graph response"
        );
        Ok(fetched)
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

fn with_bearer(request: RequestBuilder, token: &str) -> RequestBuilder {
    request.header(AUTHORIZATION, format!("Bearer {token}"))
}

fn network_error(error: &reqwest::Error) -> ProviderError {
    ProviderError::Network {
        provider: PROVIDER_NAME.to_owned(),
        message: error.to_string(),
    }
}

fn api_error(status: StatusCode, message: &str) -> ProviderError {
    let status_code = status.as_u16();
    ProviderError::ApiError {
        provider: PROVIDER_NAME.to_owned(),
        status_code,
        message: message.to_owned(),
        retryable: status_code == 429 || status_code >= 500,
    }
}

/// Whether a server message reports an expired bearer token
pub(crate) fn is_expired_token_message(message: &str) -> bool {
    message.to_lowercase().contains(EXPIRED_TOKEN_MARKER)
}

/// Failure carried by an authenticated response, if any.
///
/// An "expired jwt" message means `SessionExpired` whatever the status; other
/// non-success statuses become `ApiError`.
pub(crate) fn rejection(status: StatusCode, envelope: &Envelope) -> Option<ProviderError> {
    let message = envelope.server_message();
    if let Some(message) = message.filter(|m| is_expired_token_message(m)) {
        return Some(ProviderError::SessionExpired {
            provider: PROVIDER_NAME.to_owned(),
            reason: message.to_owned(),
        });
    }

    if status.is_success() {
        None
    } else {
        Some(api_error(status, message.unwrap_or(UNKNOWN_ERROR)))
    }
}
