// ABOUTME: Savitzky-Golay style smoothing of per-minute and 5-minute glucose series
// ABOUTME: Repeated local quadratic regression that skips placeholder slots
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Local regression smoothing.
//!
//! Each pass replaces every real value by the value at that point of a quadratic
//! least-squares fit over its neighbours (`width` on each side, fewer at the edges).
//! Positions are actual minutes, so the fit stays correct on a slightly irregular
//! grid. Placeholders are neither used as fit inputs nor modified.
//!
//! Smoothing only covers the leading region where consecutive readings are one
//! minute apart (within tolerance) or share a minute; older sparse history is left
//! as delivered.

use crate::config::SmoothingConfig;
use follower_core::constants::gap_fill::{SLOT_SECONDS, SLOT_TOLERANCE_SECONDS};
use follower_core::constants::smoothing::FIVE_MINUTE_STRIDE;
use follower_core::models::ChronoSequence;
use tracing::debug;

/// Repeated local polynomial regression over a newest-first sequence
#[derive(Debug, Clone, Copy, Default)]
pub struct SmoothingFilter {
    config: SmoothingConfig,
}

impl SmoothingFilter {
    /// Create a filter with the given configuration
    #[must_use]
    pub const fn new(config: SmoothingConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &SmoothingConfig {
        &self.config
    }

    /// Smooth `readings` in place and return how many values were rewritten.
    ///
    /// Does nothing when smoothing is disabled. Timestamps are never changed.
    pub fn smooth(&self, readings: &mut ChronoSequence) -> usize {
        if !self.config.enabled {
            return 0;
        }

        let region = per_minute_region_len(readings);
        if region < 3 {
            return 0;
        }

        let slice = &readings.as_slice()[..region];
        let newest = slice[0].timestamp;
        let positions: Vec<f64> = slice
            .iter()
            .map(|reading| (newest - reading.timestamp).num_seconds() as f64 / SLOT_SECONDS as f64)
            .collect();
        let original: Vec<Option<f64>> = slice
            .iter()
            .map(|reading| (!reading.is_placeholder()).then_some(reading.raw_value))
            .collect();

        let mut values = original.clone();
        for _ in 0..self.config.repeat_per_minute {
            values = regression_pass(&positions, &values, self.config.width_per_minute);
        }
        values = self.five_minute_pass(&positions, values);

        let mut rewritten = 0;
        for (index, (smoothed, before)) in values.iter().zip(&original).enumerate() {
            // A non-positive result would read as a placeholder downstream.
            if let (Some(smoothed), Some(_)) = (smoothed, before) {
                if *smoothed > 0.0 && readings.set_raw_value(index, *smoothed) {
                    rewritten += 1;
                }
            }
        }

        debug!(region, rewritten, "Smoothing complete");
        rewritten
    }

    /// Smooth every fifth value and spread the corrections over the minutes between
    fn five_minute_pass(&self, positions: &[f64], values: Vec<Option<f64>>) -> Vec<Option<f64>> {
        if self.config.repeat_per_5_minute == 0 || self.config.width_per_5_minute == 0 {
            return values;
        }

        let anchors: Vec<usize> = (0..values.len()).step_by(FIVE_MINUTE_STRIDE).collect();
        if anchors.len() < 3 {
            return values;
        }

        let anchor_positions: Vec<f64> = anchors.iter().map(|&i| positions[i]).collect();
        let anchor_values: Vec<Option<f64>> = anchors.iter().map(|&i| values[i]).collect();
        let mut smoothed = anchor_values.clone();
        for _ in 0..self.config.repeat_per_5_minute {
            smoothed = regression_pass(&anchor_positions, &smoothed, self.config.width_per_5_minute);
        }

        let deltas: Vec<Option<f64>> = smoothed
            .iter()
            .zip(&anchor_values)
            .map(|(after, before)| after.zip(*before).map(|(after, before)| after - before))
            .collect();

        values
            .iter()
            .enumerate()
            .map(|(index, value)| {
                let value = (*value)?;
                let lower = index / FIVE_MINUTE_STRIDE;
                let bounds = (
                    deltas.get(lower).copied().flatten(),
                    deltas.get(lower + 1).copied().flatten(),
                );
                let delta = match bounds {
                    (on_anchor, _) if index % FIVE_MINUTE_STRIDE == 0 => on_anchor.unwrap_or(0.0),
                    (Some(low), Some(high)) => {
                        let from = positions[anchors[lower]];
                        let to = positions[anchors[lower + 1]];
                        let fraction = if to > from {
                            (positions[index] - from) / (to - from)
                        } else {
                            0.0
                        };
                        (high - low).mul_add(fraction, low)
                    }
                    (Some(only), None) | (None, Some(only)) => only,
                    (None, None) => 0.0,
                };
                Some(value + delta)
            })
            .collect()
    }
}

/// Length of the leading region whose readings are one minute apart.
///
/// Readings closer together than the slot tolerance share a minute and do not
/// end the region; their actual positions still feed the regression.
fn per_minute_region_len(readings: &ChronoSequence) -> usize {
    let slice = readings.as_slice();
    if slice.is_empty() {
        return 0;
    }

    let high = SLOT_SECONDS + SLOT_TOLERANCE_SECONDS;
    1 + slice
        .windows(2)
        .take_while(|pair| (pair[0].timestamp - pair[1].timestamp).num_seconds() <= high)
        .count()
}

/// One regression pass; `None` entries are skipped as inputs and kept as `None`
fn regression_pass(positions: &[f64], values: &[Option<f64>], width: usize) -> Vec<Option<f64>> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let value = (*value)?;
            let start = index.saturating_sub(width);
            let end = (index + width + 1).min(values.len());
            let window: Vec<(f64, f64)> = (start..end)
                .filter_map(|j| values[j].map(|y| (positions[j] - positions[index], y)))
                .collect();
            Some(fit_at_origin(&window).unwrap_or(value))
        })
        .collect()
}

/// Value at `x = 0` of the least-squares quadratic through `points`.
///
/// Falls back to a straight line, then to the mean, when the points cannot
/// determine a higher order fit.
fn fit_at_origin(points: &[(f64, f64)]) -> Option<f64> {
    if points.is_empty() {
        return None;
    }

    let n = points.len() as f64;
    let (mut s1, mut s2, mut s3, mut s4) = (0.0, 0.0, 0.0, 0.0);
    let (mut t0, mut t1, mut t2) = (0.0, 0.0, 0.0);
    for &(x, y) in points {
        let x2 = x * x;
        s1 += x;
        s2 += x2;
        s3 += x2 * x;
        s4 += x2 * x2;
        t0 += y;
        t1 += x * y;
        t2 += x2 * y;
    }

    if points.len() >= 3 {
        let det = determinant3([[n, s1, s2], [s1, s2, s3], [s2, s3, s4]]);
        if det.abs() > f64::EPSILON {
            let det_a = determinant3([[t0, s1, s2], [t1, s2, s3], [t2, s3, s4]]);
            return Some(det_a / det);
        }
    }

    let denominator = n.mul_add(s2, -(s1 * s1));
    if points.len() >= 2 && denominator.abs() > f64::EPSILON {
        return Some(s2.mul_add(t0, -(s1 * t1)) / denominator);
    }

    Some(t0 / n)
}

fn determinant3(m: [[f64; 3]; 3]) -> f64 {
    m[0][0].mul_add(
        m[1][1].mul_add(m[2][2], -(m[1][2] * m[2][1])),
        (-m[0][1]).mul_add(
            m[1][0].mul_add(m[2][2], -(m[1][2] * m[2][0])),
            m[0][2] * m[1][0].mul_add(m[2][1], -(m[1][1] * m[2][0])),
        ),
    )
}
