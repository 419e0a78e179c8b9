// ABOUTME: Follower commands for glucose-follower
// ABOUTME: Credential check and polling with readings printed on a delivery thread
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use follower_providers::LibreViewProvider;
use glucose_follower::config::FollowerConfig;
use glucose_follower::consumer::{DedicatedThreadContext, ExecutionContext, FollowerConsumer};
use glucose_follower::credential_check::{check_credentials, MessageHandler};
use glucose_follower::errors::{AppError, AppResult, ErrorCode};
use glucose_follower::models::ChronoSequence;
use glucose_follower::orchestrator::{FollowOrchestrator, Poller};
use glucose_follower::settings::JsonFileSettingsStore;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::helpers::display::{display_message, display_readings};

type Result<T> = AppResult<T>;

/// Name of the thread readings are printed on
const DELIVERY_THREAD: &str = "follower-delivery";

struct TerminalMessages;

impl MessageHandler for TerminalMessages {
    fn show_message(&self, title: &str, message: &str) {
        display_message(title, message);
    }
}

struct ReadingsPrinter {
    context: Arc<DedicatedThreadContext>,
}

impl FollowerConsumer for ReadingsPrinter {
    fn on_follower_info_received(
        &self,
        readings: ChronoSequence,
        serial_number: Option<String>,
        sensor_start: Option<DateTime<Utc>>,
    ) {
        display_readings(&readings, serial_number.as_deref(), sensor_start);
    }

    fn execution_context(&self) -> Arc<dyn ExecutionContext> {
        Arc::clone(&self.context) as Arc<dyn ExecutionContext>
    }
}

/// Verify the stored credentials
pub async fn check(store: &JsonFileSettingsStore) -> Result<()> {
    let outcome = check_credentials(
        Arc::new(LibreViewProvider::new()),
        store,
        Arc::new(TerminalMessages),
    )
    .await?;

    if outcome.success {
        Ok(())
    } else {
        Err(AppError::new(ErrorCode::AuthInvalid, outcome.message))
    }
}

/// Run one cycle, or poll until Ctrl-C
pub async fn poll(config: &FollowerConfig, store: JsonFileSettingsStore, once: bool) -> Result<()> {
    let context = Arc::new(DedicatedThreadContext::spawn(DELIVERY_THREAD)?);
    let orchestrator = Arc::new(
        FollowOrchestrator::new(
            Arc::new(LibreViewProvider::new()),
            Arc::new(store),
            Arc::new(ReadingsPrinter {
                context: Arc::clone(&context),
            }),
        )
        .with_gap_fill(config.gap_fill)
        .with_smoothing(config.smoothing),
    );

    let result = if once {
        orchestrator.poll_cycle().await.map(|outcome| {
            info!(?outcome, "Poll cycle finished");
        })
    } else {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            if let Err(e) = signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                return;
            }
            let _ = shutdown_tx.send(true);
        });

        Poller::new(Arc::clone(&orchestrator), config.poll_interval)
            .run(shutdown_rx)
            .await;
        Ok(())
    };

    // Flush pending output before exiting
    context.shutdown();
    result
}
