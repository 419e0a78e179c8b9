// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides logging setup, reading builders, LibreLinkUp payloads and a recording consumer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::absolute_paths
)]
//! Shared test utilities for `glucose_follower`

use chrono::{DateTime, Duration, TimeZone, Utc};
use follower_core::constants::libreview::FACTORY_TIMESTAMP_FORMAT;
use glucose_follower::consumer::{ExecutionContext, FollowerConsumer, InlineContext};
use glucose_follower::models::{ChronoSequence, GlucoseReading};
use glucose_follower::settings::{InMemorySettingsStore, SettingKey};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex, Once};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// 1 January 2024 at `hour:minute` UTC
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
}

/// Reading at 10:`minute`
pub fn reading(minute: u32, value: f64) -> GlucoseReading {
    GlucoseReading::new(at(10, minute), value)
}

/// Newest-first sequence from `(minute, value)` pairs in any order
pub fn sequence(points: &[(u32, f64)]) -> ChronoSequence {
    points
        .iter()
        .map(|&(minute, value)| reading(minute, value))
        .collect()
}

/// Contiguous per-minute sequence ending at `newest`, values from `value_at(minutes_ago)`
pub fn per_minute(newest: DateTime<Utc>, count: i64, value_at: impl Fn(i64) -> f64) -> ChronoSequence {
    (0..count)
        .map(|ago| GlucoseReading::new(newest - Duration::minutes(ago), value_at(ago)))
        .collect()
}

/// `FactoryTimestamp` text for `timestamp`
pub fn factory_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(FACTORY_TIMESTAMP_FORMAT).to_string()
}

/// One LibreLinkUp measurement object
pub fn measurement(timestamp: DateTime<Utc>, value: i64) -> Value {
    json!({
        "FactoryTimestamp": factory_timestamp(timestamp),
        "Timestamp": factory_timestamp(timestamp),
        "ValueInMgPerDl": value,
        "Value": value,
        "type": 0
    })
}

/// Graph response body with a latest measurement, history and one active sensor
pub fn graph_body(latest: Option<(DateTime<Utc>, i64)>, history: &[(DateTime<Utc>, i64)]) -> Value {
    let mut connection = json!({"patientId": "patient-1"});
    if let Some((timestamp, value)) = latest {
        connection["glucoseMeasurement"] = measurement(timestamp, value);
    }

    json!({
        "status": 0,
        "data": {
            "connection": connection,
            "graphData": history
                .iter()
                .map(|&(timestamp, value)| measurement(timestamp, value))
                .collect::<Vec<_>>(),
            "activeSensors": [
                {"sensor": {"sn": "0M0001ABCD", "a": 1_704_067_200_i64}},
                {"sensor": {"sn": "OLDER", "a": 1_703_000_000_i64}}
            ]
        }
    })
}

/// Successful login body carrying `token`
pub fn login_body(token: &str) -> Value {
    json!({"status": 0, "data": {"authTicket": {"token": token, "expires": 1_900_000_000_i64, "duration": 15_552_000_000_i64}}})
}

/// Connections body listing `patient_id`
pub fn connections_body(patient_id: &str) -> Value {
    json!({"status": 0, "data": [{"id": "c-1", "patientId": patient_id, "firstName": "Test"}]})
}

/// Store holding a server address and an account
pub fn store_with_account(base_url: &str) -> Arc<InMemorySettingsStore> {
    Arc::new(InMemorySettingsStore::with_values([
        (SettingKey::BaseUrl, json!(base_url)),
        (SettingKey::Username, json!("follower@example.com")),
        (SettingKey::Password, json!("correct horse")),
    ]))
}

/// One consumer callback as observed by [`RecordingConsumer`]
#[derive(Debug, Clone)]
pub struct Delivery {
    pub readings: ChronoSequence,
    pub serial_number: Option<String>,
    pub sensor_start: Option<DateTime<Utc>>,
    pub thread_name: Option<String>,
}

/// Consumer that records every delivery and the thread it ran on
pub struct RecordingConsumer {
    deliveries: Mutex<Vec<Delivery>>,
    context: Option<Arc<dyn ExecutionContext>>,
}

impl RecordingConsumer {
    pub fn inline() -> Arc<Self> {
        Arc::new(Self {
            deliveries: Mutex::new(Vec::new()),
            context: None,
        })
    }

    pub fn on(context: Arc<dyn ExecutionContext>) -> Arc<Self> {
        Arc::new(Self {
            deliveries: Mutex::new(Vec::new()),
            context: Some(context),
        })
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().unwrap().clone()
    }
}

impl FollowerConsumer for RecordingConsumer {
    fn on_follower_info_received(
        &self,
        readings: ChronoSequence,
        serial_number: Option<String>,
        sensor_start: Option<DateTime<Utc>>,
    ) {
        self.deliveries.lock().unwrap().push(Delivery {
            readings,
            serial_number,
            sensor_start,
            thread_name: std::thread::current().name().map(str::to_owned),
        });
    }

    fn execution_context(&self) -> Arc<dyn ExecutionContext> {
        self.context
            .clone()
            .unwrap_or_else(|| Arc::new(InlineContext))
    }
}
