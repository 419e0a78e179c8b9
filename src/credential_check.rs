// ABOUTME: Verifies stored LibreView credentials with a login and reports the result
// ABOUTME: Title and message pair delivered to a message handler on its execution context
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::consumer::{ExecutionContext, InlineContext};
use crate::settings::{save_session, FollowerSettings, SettingsStore};
use follower_core::errors::AppResult;
use follower_providers::{FollowProvider, SessionClient, SessionState};
use std::sync::Arc;
use tracing::{info, warn};

/// Title shown after a successful check
pub const SUCCESS_TITLE: &str = "Verification Successful";
/// Title shown after a failed check
pub const FAILURE_TITLE: &str = "Verification Error";
/// Message shown after a successful check
pub const SUCCESS_MESSAGE: &str = "LibreView credentials were verified successfully.";

/// Receives user-facing messages
pub trait MessageHandler: Send + Sync + 'static {
    /// Show `message` under `title`
    fn show_message(&self, title: &str, message: &str);

    /// Context the handler must be called on
    fn execution_context(&self) -> Arc<dyn ExecutionContext> {
        Arc::new(InlineContext)
    }
}

/// Result of a credential check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialCheckOutcome {
    /// Whether the login succeeded
    pub success: bool,
    /// Message title
    pub title: String,
    /// Message body
    pub message: String,
}

impl CredentialCheckOutcome {
    fn succeeded() -> Self {
        Self {
            success: true,
            title: SUCCESS_TITLE.to_owned(),
            message: SUCCESS_MESSAGE.to_owned(),
        }
    }

    fn failed(detail: &str) -> Self {
        Self {
            success: false,
            title: FAILURE_TITLE.to_owned(),
            message: format!("LibreView credentials check failed. Error = {detail}"),
        }
    }
}

/// Log in with the stored credentials and tell `handler` how it went.
///
/// A successful login stores the new token and clears the patient so the next
/// cycle resolves it again; a failed one clears the session. Missing credentials
/// are reported as a failed check.
///
/// # Errors
///
/// Returns a storage error if the settings cannot be read or written, or an
/// internal error if the handler's context rejects the message.
pub async fn check_credentials(
    provider: Arc<dyn FollowProvider>,
    store: &dyn SettingsStore,
    handler: Arc<dyn MessageHandler>,
) -> AppResult<CredentialCheckOutcome> {
    let settings = FollowerSettings::load(store).await?;

    let outcome = match settings.credentials() {
        None => {
            warn!("Credential check without user name or password");
            save_session(store, &SessionState::logged_out()).await?;
            CredentialCheckOutcome::failed("missing user name or password")
        }
        Some(credentials) => {
            let mut session = SessionClient::new(provider);
            match session.login(&credentials, &settings.base_url).await {
                Ok(token) => {
                    info!("Credential check succeeded");
                    save_session(
                        store,
                        &SessionState {
                            auth_token: Some(token),
                            patient_id: None,
                        },
                    )
                    .await?;
                    CredentialCheckOutcome::succeeded()
                }
                Err(e) => {
                    warn!(error = %e, "Credential check failed");
                    save_session(store, &SessionState::logged_out()).await?;
                    CredentialCheckOutcome::failed(&e.reason())
                }
            }
        }
    };

    let context = handler.execution_context();
    let (title, message) = (outcome.title.clone(), outcome.message.clone());
    context.dispatch(Box::new(move || handler.show_message(&title, &message)))?;

    Ok(outcome)
}
