// ABOUTME: Result of one follower data retrieval: readings plus sensor metadata
// ABOUTME: Serial number and start time come from the first active sensor only
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::ChronoSequence;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Readings and sensor metadata retrieved in one poll
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchedReadings {
    /// Readings, newest first
    pub readings: ChronoSequence,
    /// Serial number of the active sensor
    pub serial_number: Option<String>,
    /// When the active sensor was started
    pub sensor_start: Option<DateTime<Utc>>,
}

impl FetchedReadings {
    /// Empty result, meaning "no data this cycle"
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            readings: ChronoSequence::new(),
            serial_number: None,
            sensor_start: None,
        }
    }

    /// Whether no readings were retrieved
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }
}
