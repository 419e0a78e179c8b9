// ABOUTME: LibreLinkUp graph retrieval and parsing into a newest-first reading sequence
// ABOUTME: Latest measurement, graph history and first active sensor, each section optional
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::dto::{ActiveSensor, Measurement};
use super::session::SessionClient;
use crate::core::FollowProvider;
use chrono::{DateTime, NaiveDateTime, Utc};
use follower_core::constants::libreview::FACTORY_TIMESTAMP_FORMAT;
use follower_core::errors::provider::{ProviderError, ProviderResult};
use follower_core::models::{ChronoSequence, FetchedReadings, GlucoseReading};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Fetches readings for a ready session
pub struct ReadingsFetcher {
    provider: Arc<dyn FollowProvider>,
}

impl ReadingsFetcher {
    /// Fetcher over `provider`
    #[must_use]
    pub fn new(provider: Arc<dyn FollowProvider>) -> Self {
        Self { provider }
    }

    /// Retrieve the current readings of the session's patient.
    ///
    /// A rejection as "expired jwt" logs the session out so the next cycle
    /// authenticates again; there is no retry here.
    ///
    /// # Errors
    ///
    /// `SessionExpired` when the session is not ready or the token was rejected,
    /// otherwise whatever the provider reports.
    pub async fn fetch(
        &self,
        session: &mut SessionClient,
        base_url: &str,
    ) -> ProviderResult<FetchedReadings> {
        let Some(ready) = session.ready() else {
            return Err(ProviderError::SessionExpired {
                provider: self.provider.name().to_owned(),
                reason: "no active session".to_owned(),
            });
        };

        let result = self
            .provider
            .fetch_readings(&ready.token, &ready.patient_id, base_url)
            .await;

        if let Err(e) = &result {
            if e.is_session_expired() {
                info!(provider = self.provider.name(), "Token rejected while fetching, session cleared");
                session.invalidate();
            }
        }
        result
    }
}

/// Parse the `data` object of a graph response.
///
/// Entries missing a value or a readable timestamp are skipped, as is a graph
/// point sharing its timestamp with the latest measurement. Sensor metadata
/// comes from the first `activeSensors` element only.
#[must_use]
pub fn readings_from_payload(data: &Value) -> FetchedReadings {
    let mut readings = ChronoSequence::new();
    let mut skipped = 0_usize;

    let latest = data.pointer("/connection/glucoseMeasurement");
    let history = data
        .get("graphData")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let latest = latest.and_then(|entry| {
        let reading = reading_from_measurement(entry);
        if reading.is_none() {
            skipped += 1;
        }
        reading
    });
    let latest_timestamp = latest.as_ref().map(|reading| reading.timestamp);
    let mut superseded = 0_usize;

    for entry in history {
        match reading_from_measurement(entry) {
            // The latest measurement replaces a graph point at the same instant
            Some(reading) if Some(reading.timestamp) == latest_timestamp => superseded += 1,
            Some(reading) => {
                readings.insert(reading);
            }
            None => skipped += 1,
        }
    }
    if let Some(reading) = latest {
        readings.insert(reading);
    }

    if skipped > 0 || superseded > 0 {
        debug!(skipped, superseded, "Dropped measurements from graph payload");
    }

    let sensor = data
        .get("activeSensors")
        .and_then(Value::as_array)
        .and_then(|sensors| sensors.first())
        .and_then(|entry| ActiveSensor::deserialize(entry).ok())
        .and_then(|active| active.sensor);

    let (serial_number, sensor_start) = sensor.map_or((None, None), |sensor| {
        (
            sensor.sn,
            sensor.a.and_then(|secs| DateTime::from_timestamp(secs, 0)),
        )
    });

    FetchedReadings {
        readings,
        serial_number,
        sensor_start,
    }
}

fn reading_from_measurement(entry: &Value) -> Option<GlucoseReading> {
    let measurement = Measurement::deserialize(entry).ok()?;
    let value = measurement.value_mg_per_dl.filter(|v| *v > 0.0)?;
    let timestamp = parse_factory_timestamp(measurement.factory_timestamp.as_deref()?)?;
    Some(GlucoseReading::new(timestamp, value))
}

/// Parse a `FactoryTimestamp` such as `1/1/2024 10:00:00 AM`, expressed in GMT
#[must_use]
pub fn parse_factory_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw.trim(), FACTORY_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
