// ABOUTME: LibreLinkUp session state machine: login, patient resolution, expiry re-login
// ABOUTME: Decodes login and connection payloads into tokens and patient identifiers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::dto::{ConnectionEntry, Envelope, LoginData};
use super::rejection;
use crate::core::{Credentials, FollowProvider};
use follower_core::constants::libreview::{GENERIC_LOGIN_FAILURE, PROVIDER_NAME, UNKNOWN_ERROR};
use follower_core::errors::provider::{ProviderError, ProviderResult};
use reqwest::StatusCode;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Persisted session values: the bearer token and the followed patient
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Bearer token; `None` means a login is needed
    pub auth_token: Option<String>,
    /// Followed patient; `None` means it must be resolved
    pub patient_id: Option<String>,
}

impl SessionState {
    /// Session with nothing known
    #[must_use]
    pub const fn logged_out() -> Self {
        Self {
            auth_token: None,
            patient_id: None,
        }
    }
}

/// Where a session stands between two remote calls
#[derive(Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// No token
    LoggedOut,
    /// Login request in flight
    Authenticating,
    /// Token held, patient unknown
    Authenticated {
        /// Bearer token
        token: String,
    },
    /// Connection listing in flight
    ResolvingPatient {
        /// Bearer token
        token: String,
    },
    /// Token and patient known; readings can be fetched
    Ready {
        /// Bearer token
        token: String,
        /// Followed patient
        patient_id: String,
    },
}

impl SessionPhase {
    /// Phase implied by persisted session values
    #[must_use]
    pub fn from_state(state: &SessionState) -> Self {
        match (&state.auth_token, &state.patient_id) {
            (Some(token), Some(patient_id)) => Self::Ready {
                token: token.clone(),
                patient_id: patient_id.clone(),
            },
            (Some(token), None) => Self::Authenticated {
                token: token.clone(),
            },
            (None, _) => Self::LoggedOut,
        }
    }

    /// Short name for logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LoggedOut => "logged_out",
            Self::Authenticating => "authenticating",
            Self::Authenticated { .. } => "authenticated",
            Self::ResolvingPatient { .. } => "resolving_patient",
            Self::Ready { .. } => "ready",
        }
    }
}

impl fmt::Debug for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Token and patient of a session that can fetch readings
#[derive(Clone, PartialEq, Eq)]
pub struct ReadySession {
    /// Bearer token
    pub token: String,
    /// Followed patient
    pub patient_id: String,
}

impl fmt::Debug for ReadySession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadySession")
            .field("token", &"[REDACTED]")
            .field("patient_id", &self.patient_id)
            .finish()
    }
}

/// Drives a provider session from any phase to [`SessionPhase::Ready`]
pub struct SessionClient {
    provider: Arc<dyn FollowProvider>,
    phase: SessionPhase,
}

impl fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionClient")
            .field("provider", &self.provider.name())
            .field("phase", &self.phase)
            .finish()
    }
}

impl SessionClient {
    /// Logged-out session over `provider`
    #[must_use]
    pub fn new(provider: Arc<dyn FollowProvider>) -> Self {
        Self {
            provider,
            phase: SessionPhase::LoggedOut,
        }
    }

    /// Session resuming from persisted values
    #[must_use]
    pub fn from_state(provider: Arc<dyn FollowProvider>, state: &SessionState) -> Self {
        Self {
            provider,
            phase: SessionPhase::from_state(state),
        }
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    /// Values to persist for the current phase
    #[must_use]
    pub fn state(&self) -> SessionState {
        match &self.phase {
            SessionPhase::LoggedOut | SessionPhase::Authenticating => SessionState::logged_out(),
            SessionPhase::Authenticated { token } | SessionPhase::ResolvingPatient { token } => {
                SessionState {
                    auth_token: Some(token.clone()),
                    patient_id: None,
                }
            }
            SessionPhase::Ready { token, patient_id } => SessionState {
                auth_token: Some(token.clone()),
                patient_id: Some(patient_id.clone()),
            },
        }
    }

    /// Token and patient if the session is ready
    #[must_use]
    pub fn ready(&self) -> Option<ReadySession> {
        match &self.phase {
            SessionPhase::Ready { token, patient_id } => Some(ReadySession {
                token: token.clone(),
                patient_id: patient_id.clone(),
            }),
            _ => None,
        }
    }

    /// Drop the token and patient, e.g. after the credentials changed
    pub fn invalidate(&mut self) {
        debug!(from = self.phase.name(), "Session invalidated");
        self.phase = SessionPhase::LoggedOut;
    }

    /// Log in with `credentials`, replacing any previous token.
    ///
    /// # Errors
    ///
    /// Returns the provider's login failure; the session is then logged out.
    pub async fn login(&mut self, credentials: &Credentials, base_url: &str) -> ProviderResult<String> {
        self.phase = SessionPhase::Authenticating;
        match self.provider.login(credentials, base_url).await {
            Ok(token) => {
                info!(provider = self.provider.name(), "Logged in");
                self.phase = SessionPhase::Authenticated {
                    token: token.clone(),
                };
                Ok(token)
            }
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "Login failed");
                self.phase = SessionPhase::LoggedOut;
                Err(e)
            }
        }
    }

    /// Bring the session to [`SessionPhase::Ready`], logging in and resolving the patient as needed.
    ///
    /// A patient resolution rejected as "expired jwt" discards the token and logs
    /// in again, once. Other resolution failures keep the token.
    ///
    /// # Errors
    ///
    /// Returns the first login failure, a second expiry, or any other resolution failure.
    pub async fn ensure_session(
        &mut self,
        credentials: &Credentials,
        base_url: &str,
    ) -> ProviderResult<ReadySession> {
        let mut relogged = false;

        loop {
            let token = match &self.phase {
                SessionPhase::Ready { token, patient_id } => {
                    return Ok(ReadySession {
                        token: token.clone(),
                        patient_id: patient_id.clone(),
                    });
                }
                SessionPhase::Authenticated { token } | SessionPhase::ResolvingPatient { token } => {
                    Some(token.clone())
                }
                SessionPhase::LoggedOut | SessionPhase::Authenticating => None,
            };
            let Some(token) = token else {
                self.login(credentials, base_url).await?;
                continue;
            };

            match self.resolve_patient(token, base_url).await {
                Ok(()) => {}
                Err(e) if e.is_session_expired() && !relogged => {
                    info!(provider = self.provider.name(), "Session expired, logging in again");
                    relogged = true;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn resolve_patient(&mut self, token: String, base_url: &str) -> ProviderResult<()> {
        self.phase = SessionPhase::ResolvingPatient {
            token: token.clone(),
        };

        match self.provider.resolve_patient_id(&token, base_url).await {
            Ok(patient_id) => {
                debug!(provider = self.provider.name(), "Patient resolved");
                self.phase = SessionPhase::Ready { token, patient_id };
                Ok(())
            }
            Err(e) if e.is_session_expired() => {
                self.phase = SessionPhase::LoggedOut;
                Err(e)
            }
            Err(e) => {
                self.phase = SessionPhase::Authenticated { token };
                Err(e)
            }
        }
    }
}

/// Token from a login response.
///
/// `error.message` wins over everything; a body without `data` is a login
/// failure with the generic detail; `data` without the token is a missing field.
pub(crate) fn token_from_login(status: StatusCode, envelope: Envelope) -> ProviderResult<String> {
    if let Some(message) = envelope.error.as_ref().and_then(|e| e.message.as_deref()) {
        return Err(ProviderError::AuthenticationFailed {
            provider: PROVIDER_NAME.to_owned(),
            reason: message.to_owned(),
        });
    }

    let Some(data) = envelope.data else {
        if status.is_server_error() {
            return Err(ProviderError::ApiError {
                provider: PROVIDER_NAME.to_owned(),
                status_code: status.as_u16(),
                message: envelope.message.unwrap_or_else(|| UNKNOWN_ERROR.to_owned()),
                retryable: true,
            });
        }
        return Err(ProviderError::AuthenticationFailed {
            provider: PROVIDER_NAME.to_owned(),
            reason: envelope
                .message
                .unwrap_or_else(|| GENERIC_LOGIN_FAILURE.to_owned()),
        });
    };

    serde_json::from_value::<LoginData>(data)
        .ok()
        .and_then(|login| login.auth_ticket)
        .and_then(|ticket| ticket.token)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ProviderError::MissingField {
            provider: PROVIDER_NAME.to_owned(),
            field: "data.authTicket.token",
        })
}

/// First `patientId` of a connections response
pub(crate) fn patient_from_connections(
    status: StatusCode,
    envelope: Envelope,
) -> ProviderResult<String> {
    if let Some(failure) = rejection(status, &envelope) {
        return Err(failure);
    }

    let Some(data) = envelope.data else {
        return Err(ProviderError::ApiError {
            provider: PROVIDER_NAME.to_owned(),
            status_code: status.as_u16(),
            message: envelope
                .message
                .unwrap_or_else(|| UNKNOWN_ERROR.to_owned()),
            retryable: false,
        });
    };

    let Value::Array(entries) = data else {
        return Err(ProviderError::InvalidResponse {
            provider: PROVIDER_NAME.to_owned(),
            reason: "connections data is not a list".to_owned(),
        });
    };

    entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<ConnectionEntry>(entry).ok())
        .find_map(|entry| entry.patient_id.filter(|id| !id.is_empty()))
        .ok_or_else(|| ProviderError::NoPatientConnection {
            provider: PROVIDER_NAME.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(body: &Value) -> Envelope {
        serde_json::from_value(body.clone()).unwrap()
    }

    #[test]
    fn test_login_reads_nested_token() {
        let body = json!({"status": 0, "data": {"authTicket": {"token": "abc", "expires": 1}}});
        assert_eq!(token_from_login(StatusCode::OK, envelope(&body)).unwrap(), "abc");
    }

    #[test]
    fn test_login_reports_missing_ticket_as_field() {
        let body = json!({"data": {"user": {}}});
        let err = token_from_login(StatusCode::OK, envelope(&body)).unwrap_err();
        assert!(matches!(
            err,
            ProviderError::MissingField {
                field: "data.authTicket.token",
                ..
            }
        ));
    }

    #[test]
    fn test_login_without_data_or_message_uses_generic_marker() {
        let err = token_from_login(StatusCode::UNAUTHORIZED, Envelope::default()).unwrap_err();
        assert_eq!(err.reason(), GENERIC_LOGIN_FAILURE);
    }

    #[test]
    fn test_connections_skip_entries_without_patient() {
        let body = json!({"data": [{"firstName": "A"}, {"patientId": "p-2"}]});
        assert_eq!(
            patient_from_connections(StatusCode::OK, envelope(&body)).unwrap(),
            "p-2"
        );
    }

    #[test]
    fn test_connections_empty_list() {
        let body = json!({"data": []});
        let err = patient_from_connections(StatusCode::OK, envelope(&body)).unwrap_err();
        assert!(matches!(err, ProviderError::NoPatientConnection { .. }));
    }

    #[test]
    fn test_connections_missing_data_surfaces_message() {
        let body = json!({"message": "MissingCachedUser"});
        let err = patient_from_connections(StatusCode::OK, envelope(&body)).unwrap_err();
        assert_eq!(err.reason(), "MissingCachedUser");

        let err = patient_from_connections(StatusCode::OK, Envelope::default()).unwrap_err();
        assert_eq!(err.reason(), UNKNOWN_ERROR);
    }

    #[test]
    fn test_connections_expired_jwt_is_case_insensitive() {
        let body = json!({"message": "Invalid or Expired JWT"});
        let err = patient_from_connections(StatusCode::UNAUTHORIZED, envelope(&body)).unwrap_err();
        assert!(err.is_session_expired());
    }

    #[test]
    fn test_phase_from_persisted_state() {
        let state = SessionState {
            auth_token: Some("t".to_owned()),
            patient_id: None,
        };
        assert_eq!(SessionPhase::from_state(&state).name(), "authenticated");
        assert_eq!(
            SessionPhase::from_state(&SessionState {
                auth_token: None,
                patient_id: Some("p".to_owned()),
            }),
            SessionPhase::LoggedOut
        );
    }
}
