// ABOUTME: Poll cycle driver: session, fetch, gap fill, smoothing and consumer delivery
// ABOUTME: Cycle ids discard late completions; shared settings mutate under one lock
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Follow Orchestrator
//!
//! One [`FollowOrchestrator::poll_cycle`] call runs the whole pipeline:
//!
//! 1. re-read the settings and clear the session if the credentials changed
//! 2. bring the session to ready (with at most one re-login on expiry)
//! 3. fetch the readings
//! 4. normalize gaps against the persisted rolling history
//! 5. smooth, when enabled
//! 6. hand the result to the consumer on its execution context
//!
//! Every cycle takes a new id. Writes to the shared settings happen under a
//! single lock and only while the writing cycle is still the newest one, so a
//! cycle overtaken by a later one never touches the rolling history.

use crate::consumer::FollowerConsumer;
use crate::settings::{load_history, save_history, save_session, FollowerSettings, SettingsStore};
use chrono::{DateTime, Utc};
use follower_core::errors::{AppError, AppResult};
use follower_core::models::{ChronoSequence, FetchedReadings};
use follower_intelligence::{GapFillConfig, GapFiller, SmoothingConfig, SmoothingFilter};
use follower_providers::{FollowProvider, ProviderError, ReadingsFetcher, SessionClient, SessionState};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::time::{self, MissedTickBehavior};
use tracing::field::Empty;
use tracing::{debug, info, instrument, warn, Span};

/// How a poll cycle ended without an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Readings were handed to the consumer
    Delivered {
        /// Number of delivered readings, placeholders included
        readings: usize,
    },
    /// Follower mode is switched off
    Skipped,
    /// The service returned no readings
    NoData,
    /// A newer cycle started before this one could commit
    Superseded,
}

/// Sequences one follower poll cycle end to end
pub struct FollowOrchestrator {
    provider: Arc<dyn FollowProvider>,
    store: Arc<dyn SettingsStore>,
    consumer: Arc<dyn FollowerConsumer>,
    gap_filler: GapFiller,
    smoothing: SmoothingConfig,
    current_cycle: AtomicU64,
    /// Guards shared-settings writes; holds the credentials fingerprint of the last cycle
    last_fingerprint: Mutex<Option<u64>>,
}

impl FollowOrchestrator {
    /// Orchestrator with default gap filling and smoothing parameters
    #[must_use]
    pub fn new(
        provider: Arc<dyn FollowProvider>,
        store: Arc<dyn SettingsStore>,
        consumer: Arc<dyn FollowerConsumer>,
    ) -> Self {
        Self {
            provider,
            store,
            consumer,
            gap_filler: GapFiller::default(),
            smoothing: SmoothingConfig::default(),
            current_cycle: AtomicU64::new(0),
            last_fingerprint: Mutex::new(None),
        }
    }

    /// Use `config` for gap filling
    #[must_use]
    pub fn with_gap_fill(mut self, config: GapFillConfig) -> Self {
        self.gap_filler = GapFiller::new(config);
        self
    }

    /// Use `config` for smoothing widths and repeats; the on/off switch comes from the settings
    #[must_use]
    pub const fn with_smoothing(mut self, config: SmoothingConfig) -> Self {
        self.smoothing = config;
        self
    }

    /// Id of the newest cycle started so far
    #[must_use]
    pub fn current_cycle(&self) -> u64 {
        self.current_cycle.load(Ordering::SeqCst)
    }

    fn is_current(&self, cycle_id: u64) -> bool {
        self.current_cycle() == cycle_id
    }

    /// Run one poll cycle.
    ///
    /// # Errors
    ///
    /// Returns an auth error when no credentials are configured, the provider
    /// failure when the session or fetch fails, or a storage error. No readings
    /// are delivered and the rolling history is untouched in all these cases.
    #[instrument(skip(self), fields(cycle_id = Empty))]
    pub async fn poll_cycle(&self) -> AppResult<CycleOutcome> {
        let cycle_id = self.current_cycle.fetch_add(1, Ordering::SeqCst) + 1;
        Span::current().record("cycle_id", cycle_id);

        let settings = FollowerSettings::load(self.store.as_ref()).await?;
        if !settings.follower_enabled {
            debug!("Follower mode disabled, cycle skipped");
            return Ok(CycleOutcome::Skipped);
        }

        let Some(persisted) = self.reconcile_credentials(cycle_id, &settings).await? else {
            return Ok(CycleOutcome::Superseded);
        };
        let credentials = settings.credentials().ok_or_else(AppError::auth_required)?;

        let mut session = SessionClient::from_state(Arc::clone(&self.provider), &persisted);
        if let Err(e) = session.ensure_session(&credentials, &settings.base_url).await {
            return Err(self.abort(cycle_id, &persisted, &session, e).await);
        }

        let fetcher = ReadingsFetcher::new(Arc::clone(&self.provider));
        let fetched = match fetcher.fetch(&mut session, &settings.base_url).await {
            Ok(fetched) => fetched,
            Err(e) => return Err(self.abort(cycle_id, &persisted, &session, e).await),
        };

        if fetched.is_empty() {
            info!("No readings returned");
            let committed = self.commit_session(cycle_id, &persisted, &session.state()).await?;
            return Ok(if committed {
                CycleOutcome::NoData
            } else {
                CycleOutcome::Superseded
            });
        }

        let FetchedReadings {
            readings,
            serial_number,
            sensor_start,
        } = fetched;

        let Some(mut readings) = self
            .normalize_and_commit(cycle_id, readings, &persisted, &session.state())
            .await?
        else {
            return Ok(CycleOutcome::Superseded);
        };

        let smoothed = SmoothingFilter::new(self.smoothing.with_enabled(settings.smoothing_enabled))
            .smooth(&mut readings);
        debug!(smoothed, "Smoothing applied");

        if !self.is_current(cycle_id) {
            info!("Cycle superseded before delivery");
            return Ok(CycleOutcome::Superseded);
        }

        let count = readings.len();
        self.deliver(readings, serial_number, sensor_start)?;
        info!(readings = count, "Readings delivered");
        Ok(CycleOutcome::Delivered { readings: count })
    }

    /// Compare the credentials with the previous cycle's; returns the session to start from
    async fn reconcile_credentials(
        &self,
        cycle_id: u64,
        settings: &FollowerSettings,
    ) -> AppResult<Option<SessionState>> {
        let fingerprint = settings.credentials_fingerprint();
        let mut last_fingerprint = self.last_fingerprint.lock().await;
        if !self.is_current(cycle_id) {
            return Ok(None);
        }

        match last_fingerprint.replace(fingerprint) {
            Some(previous) if previous != fingerprint => {
                info!("Credentials changed since the last cycle, session cleared");
                let cleared = SessionState::logged_out();
                save_session(self.store.as_ref(), &cleared).await?;
                Ok(Some(cleared))
            }
            _ => Ok(Some(settings.session.clone())),
        }
    }

    /// Run the gap filler and persist history and session, unless the cycle was overtaken
    async fn normalize_and_commit(
        &self,
        cycle_id: u64,
        readings: ChronoSequence,
        persisted: &SessionState,
        session: &SessionState,
    ) -> AppResult<Option<ChronoSequence>> {
        let _guard = self.last_fingerprint.lock().await;
        if !self.is_current(cycle_id) {
            info!("Cycle superseded before gap filling");
            return Ok(None);
        }

        let store = self.store.as_ref();
        let mut history = load_history(store, self.gap_filler.config().retention_depth).await?;
        let normalized = self.gap_filler.normalize(readings, &mut history);
        save_history(store, &history).await?;
        if persisted != session {
            save_session(store, session).await?;
        }
        Ok(Some(normalized))
    }

    /// Persist a changed session if the cycle is still current; `false` when it was not
    async fn commit_session(
        &self,
        cycle_id: u64,
        persisted: &SessionState,
        session: &SessionState,
    ) -> AppResult<bool> {
        if persisted == session {
            return Ok(self.is_current(cycle_id));
        }

        let _guard = self.last_fingerprint.lock().await;
        if !self.is_current(cycle_id) {
            info!("Discarding session update of a superseded cycle");
            return Ok(false);
        }
        save_session(self.store.as_ref(), session).await?;
        Ok(true)
    }

    /// End a failed cycle. Transport failures leave the persisted session alone;
    /// other failures persist what the session client ended with.
    async fn abort(
        &self,
        cycle_id: u64,
        persisted: &SessionState,
        session: &SessionClient,
        error: ProviderError,
    ) -> AppError {
        warn!(phase = session.phase().name(), error = %error, "Poll cycle failed");

        if !matches!(error, ProviderError::Network { .. }) {
            if let Err(store_error) = self.commit_session(cycle_id, persisted, &session.state()).await {
                warn!(error = %store_error, "Failed to persist session after a failed cycle");
            }
        }
        error.into()
    }

    fn deliver(
        &self,
        readings: ChronoSequence,
        serial_number: Option<String>,
        sensor_start: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        let consumer = Arc::clone(&self.consumer);
        let context = consumer.execution_context();
        debug!(context = context.name(), "Dispatching readings to consumer");
        context.dispatch(Box::new(move || {
            consumer.on_follower_info_received(readings, serial_number, sensor_start);
        }))
    }
}

/// Runs poll cycles on a fixed interval until shut down
pub struct Poller {
    orchestrator: Arc<FollowOrchestrator>,
    interval: Duration,
}

impl Poller {
    /// Poller running `orchestrator` every `interval`
    #[must_use]
    pub const fn new(orchestrator: Arc<FollowOrchestrator>, interval: Duration) -> Self {
        Self {
            orchestrator,
            interval,
        }
    }

    /// Poll until `shutdown` turns true or its sender is dropped.
    ///
    /// The first cycle starts immediately. Ticks missed while a cycle runs are skipped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(interval_secs = self.interval.as_secs(), "Poller started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Poller received shutdown signal");
                        break;
                    }
                }
            }
        }
    }

    async fn tick(&self) {
        match self.orchestrator.poll_cycle().await {
            Ok(outcome) => debug!(?outcome, "Poll cycle finished"),
            Err(e) if e.code.is_auth_related() => {
                warn!(error = %e, "Poll cycle failed, credentials need attention");
            }
            Err(e) => warn!(error = %e, "Poll cycle failed"),
        }
    }
}
