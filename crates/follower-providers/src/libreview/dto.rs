// ABOUTME: LibreLinkUp wire payloads, decoded leniently section by section
// ABOUTME: Every nested field is optional so partial bodies never abort decoding
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outer body shared by every LibreLinkUp response
#[derive(Debug, Default, Deserialize)]
pub(crate) struct Envelope {
    /// Payload; kept untyped so each section can fail on its own
    pub data: Option<Value>,
    /// Diagnostic sent instead of `data` (e.g. "invalid or expired jwt")
    pub message: Option<String>,
    /// Error object sent by the login endpoint
    pub error: Option<ErrorBody>,
}

impl Envelope {
    /// Server supplied message from either `error.message` or `message`
    pub fn server_message(&self) -> Option<&str> {
        self.error
            .as_ref()
            .and_then(|error| error.message.as_deref())
            .or(self.message.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}

/// Login request body
#[derive(Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginData {
    #[serde(rename = "authTicket")]
    pub auth_ticket: Option<AuthTicket>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthTicket {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConnectionEntry {
    #[serde(rename = "patientId")]
    pub patient_id: Option<String>,
}

/// One glucose measurement as it appears in `glucoseMeasurement` and `graphData`
#[derive(Debug, Deserialize)]
pub(crate) struct Measurement {
    #[serde(rename = "ValueInMgPerDl")]
    pub value_mg_per_dl: Option<f64>,
    #[serde(rename = "FactoryTimestamp")]
    pub factory_timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActiveSensor {
    pub sensor: Option<SensorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SensorBody {
    /// Serial number
    pub sn: Option<String>,
    /// Activation time, Unix epoch seconds
    pub a: Option<i64>,
}
