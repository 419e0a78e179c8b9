// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Remote API paths, gap-fill geometry, smoothing defaults and service names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single large file.

/// LibreLinkUp (LibreView follower) API constants
pub mod libreview;

/// Service identification
pub mod service_names {
    /// Name used in structured logs and the CLI
    pub const GLUCOSE_FOLLOWER: &str = "glucose-follower";
}

/// Per-minute series geometry used by gap filling
pub mod gap_fill {
    /// Expected spacing between consecutive readings
    pub const SLOT_SECONDS: i64 = 60;
    /// Allowed deviation from the expected spacing before a slot counts as missing
    pub const SLOT_TOLERANCE_SECONDS: i64 = 30;
    /// Default number of per-minute slots kept in the rolling history buffer
    pub const DEFAULT_RETENTION_DEPTH: usize = 72;
    /// Default widest gap (in minutes) bridged by linear interpolation
    pub const DEFAULT_MAX_INTERPOLATION_GAP_MINUTES: i64 = 30;
}

/// Local regression smoothing defaults
pub mod smoothing {
    /// Neighbours on each side used for per-minute regression
    pub const DEFAULT_WIDTH_PER_MINUTE: usize = 5;
    /// Passes over the per-minute series
    pub const DEFAULT_REPEAT_PER_MINUTE: usize = 2;
    /// Neighbours on each side used for 5-minute regression
    pub const DEFAULT_WIDTH_PER_5_MINUTE: usize = 3;
    /// Passes over the 5-minute series
    pub const DEFAULT_REPEAT_PER_5_MINUTE: usize = 1;
    /// Stride between anchors of the 5-minute series
    pub const FIVE_MINUTE_STRIDE: usize = 5;
}

/// Polling cadence
pub mod polling {
    /// Default interval between follower cycles
    pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
}

/// HTTP client timeouts
pub mod http {
    /// Default request timeout in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    /// Default connection timeout in seconds
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
}
