// ABOUTME: Configuration for gap filling and smoothing passes
// ABOUTME: Defaults mirror the constants in follower-core
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Duration;
use follower_core::constants::{gap_fill, smoothing};

/// Gap filling parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GapFillConfig {
    /// Number of per-minute slots examined and kept in the rolling history
    pub retention_depth: usize,
    /// Widest distance between two real readings that interpolation may bridge
    pub max_interpolation_gap: Duration,
}

impl Default for GapFillConfig {
    fn default() -> Self {
        Self {
            retention_depth: gap_fill::DEFAULT_RETENTION_DEPTH,
            max_interpolation_gap: Duration::minutes(
                gap_fill::DEFAULT_MAX_INTERPOLATION_GAP_MINUTES,
            ),
        }
    }
}

/// Smoothing parameters, one width/repeat pair per granularity.
///
/// Widths count neighbours on each side of the smoothed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmoothingConfig {
    /// Whether smoothing runs at all
    pub enabled: bool,
    /// Regression half-width over per-minute values
    pub width_per_minute: usize,
    /// Passes over per-minute values
    pub repeat_per_minute: usize,
    /// Regression half-width over 5-minute values
    pub width_per_5_minute: usize,
    /// Passes over 5-minute values
    pub repeat_per_5_minute: usize,
}

impl SmoothingConfig {
    /// Same parameters with smoothing switched on or off
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            width_per_minute: smoothing::DEFAULT_WIDTH_PER_MINUTE,
            repeat_per_minute: smoothing::DEFAULT_REPEAT_PER_MINUTE,
            width_per_5_minute: smoothing::DEFAULT_WIDTH_PER_5_MINUTE,
            repeat_per_5_minute: smoothing::DEFAULT_REPEAT_PER_5_MINUTE,
        }
    }
}
