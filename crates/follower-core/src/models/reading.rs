// ABOUTME: Glucose reading entity with optional trend metadata
// ABOUTME: Reserves 0.0 as the placeholder value for minutes without a known reading
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw value marking a slot whose reading is not known (never a physiological value)
pub const PLACEHOLDER_VALUE: f64 = 0.0;

/// A timestamped glucose concentration in device units (mg/dL)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlucoseReading {
    /// Moment the value was measured
    pub timestamp: DateTime<Utc>,
    /// Concentration, or [`PLACEHOLDER_VALUE`]
    pub raw_value: f64,
    /// Trend ordinal, only set by transmitter protocols that supply one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_ordinal: Option<i32>,
    /// Trend label matching `trend_ordinal`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_label: Option<String>,
}

impl GlucoseReading {
    /// Create a reading without trend metadata
    #[must_use]
    pub const fn new(timestamp: DateTime<Utc>, raw_value: f64) -> Self {
        Self {
            timestamp,
            raw_value,
            trend_ordinal: None,
            trend_label: None,
        }
    }

    /// Create a placeholder for a minute whose value is not known yet
    #[must_use]
    pub const fn placeholder(timestamp: DateTime<Utc>) -> Self {
        Self::new(timestamp, PLACEHOLDER_VALUE)
    }

    /// Attach trend metadata
    #[must_use]
    pub fn with_trend(mut self, ordinal: i32, label: impl Into<String>) -> Self {
        self.trend_ordinal = Some(ordinal);
        self.trend_label = Some(label.into());
        self
    }

    /// Whether this reading only holds the placeholder value
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.raw_value.abs() < f64::EPSILON
    }
}

impl fmt::Display for GlucoseReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_placeholder() {
            write!(f, "{} placeholder", self.timestamp.to_rfc3339())
        } else {
            write!(f, "{} {:.1}", self.timestamp.to_rfc3339(), self.raw_value)
        }
    }
}
