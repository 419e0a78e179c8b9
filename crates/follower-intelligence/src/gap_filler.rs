// ABOUTME: Normalizes follower readings into a per-minute newest-first series
// ABOUTME: Placeholder insertion, rolling history merge, backfill and bounded interpolation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Gap filling.
//!
//! Normalization runs four steps over a newest-first sequence:
//!
//! - **A** walks the first `retention_depth` slots and inserts a placeholder one
//!   minute before the younger neighbour whenever two readings are further apart
//!   than a minute plus tolerance.
//! - **B** advances the [`RollingHistory`] to the newest reading and stores every
//!   real value in its slot, without overwriting values the history already knew.
//! - **C** copies known history values into placeholders addressed by the same slot.
//! - **D** linearly interpolates remaining placeholders that sit between two real
//!   readings no further apart than `max_interpolation_gap`. Anything else stays a
//!   placeholder.

use crate::config::GapFillConfig;
use crate::rolling_history::RollingHistory;
use chrono::Duration;
use follower_core::constants::gap_fill::{SLOT_SECONDS, SLOT_TOLERANCE_SECONDS};
use follower_core::models::{ChronoSequence, GlucoseReading};
use tracing::debug;

/// Counters describing what one normalization pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GapFillReport {
    /// Placeholders inserted for missing minutes
    pub placeholders_inserted: usize,
    /// Minutes between the previous and the new history anchor
    pub index_difference: i64,
    /// Placeholders resolved from the rolling history
    pub backfilled: usize,
    /// Placeholders resolved by interpolation
    pub interpolated: usize,
    /// Placeholders left in place
    pub unresolved: usize,
}

/// Per-minute gap filler backed by a rolling history
#[derive(Debug, Clone, Copy, Default)]
pub struct GapFiller {
    config: GapFillConfig,
}

impl GapFiller {
    /// Create a gap filler with the given configuration
    #[must_use]
    pub const fn new(config: GapFillConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &GapFillConfig {
        &self.config
    }

    /// Normalize `readings`, updating `history` in place
    #[must_use]
    pub fn normalize(
        &self,
        readings: ChronoSequence,
        history: &mut RollingHistory,
    ) -> ChronoSequence {
        self.normalize_with_report(readings, history).0
    }

    /// Normalize `readings` and report what was filled.
    ///
    /// An empty sequence is returned untouched and leaves `history` unchanged.
    pub fn normalize_with_report(
        &self,
        readings: ChronoSequence,
        history: &mut RollingHistory,
    ) -> (ChronoSequence, GapFillReport) {
        let mut report = GapFillReport::default();
        if readings.is_empty() {
            return (readings, report);
        }

        let mut sequence = readings;
        report.placeholders_inserted = self.insert_placeholders(&mut sequence);
        report.index_difference = Self::merge_into_history(&sequence, history);
        report.backfilled = Self::backfill_from_history(&mut sequence, history);
        let (interpolated, unresolved) = self.interpolate_residual(&mut sequence);
        report.interpolated = interpolated;
        report.unresolved = unresolved;

        debug!(
            inserted = report.placeholders_inserted,
            index_difference = report.index_difference,
            backfilled = report.backfilled,
            interpolated = report.interpolated,
            unresolved = report.unresolved,
            readings = sequence.len(),
            "Gap fill complete"
        );

        (sequence, report)
    }

    /// Step A: insert a placeholder wherever a minute is missing
    fn insert_placeholders(&self, sequence: &mut ChronoSequence) -> usize {
        let max_spacing = Duration::seconds(SLOT_SECONDS + SLOT_TOLERANCE_SECONDS);
        let mut inserted = 0;
        let mut index = 1;

        while index < sequence.len() && index < self.config.retention_depth {
            let (Some(younger), Some(older)) = (sequence.get(index - 1), sequence.get(index))
            else {
                break;
            };

            if younger.timestamp - older.timestamp > max_spacing {
                let timestamp = younger.timestamp - Duration::seconds(SLOT_SECONDS);
                let position = sequence.insert(GlucoseReading::placeholder(timestamp));
                debug_assert_eq!(position, index);
                inserted += 1;
            }
            index += 1;
        }

        inserted
    }

    /// Step B: advance the history to the newest reading and fill its empty slots
    fn merge_into_history(sequence: &ChronoSequence, history: &mut RollingHistory) -> i64 {
        let Some(newest) = sequence.newest() else {
            return 0;
        };

        let index_difference = history.advance_to(newest.timestamp);
        if index_difference >= i64::try_from(history.capacity()).unwrap_or(i64::MAX) {
            debug!(
                index_difference,
                capacity = history.capacity(),
                "Rolling history older than its depth, rebuilt from fresh readings"
            );
        }

        for reading in sequence.iter().filter(|reading| !reading.is_placeholder()) {
            if let Some(slot) = history.slot_of(reading.timestamp) {
                history.fill_if_empty(slot, reading.raw_value.round() as i32);
            }
        }

        index_difference
    }

    /// Step C: copy known history values into placeholders
    fn backfill_from_history(sequence: &mut ChronoSequence, history: &RollingHistory) -> usize {
        let fills: Vec<(usize, i32)> = sequence
            .iter()
            .enumerate()
            .filter(|(_, reading)| reading.is_placeholder())
            .filter_map(|(index, reading)| {
                history
                    .slot_of(reading.timestamp)
                    .and_then(|slot| history.known_value(slot))
                    .map(|value| (index, value))
            })
            .collect();

        for (index, value) in &fills {
            sequence.set_raw_value(*index, f64::from(*value));
        }
        fills.len()
    }

    /// Step D: interpolate placeholders between close enough real readings
    fn interpolate_residual(&self, sequence: &mut ChronoSequence) -> (usize, usize) {
        let readings = sequence.as_slice();
        let mut fills = Vec::new();
        let mut unresolved = 0;
        let mut index = 0;

        while index < readings.len() {
            if !readings[index].is_placeholder() {
                index += 1;
                continue;
            }

            let start = index;
            while index < readings.len() && readings[index].is_placeholder() {
                index += 1;
            }
            let end = index;

            let younger = start.checked_sub(1).and_then(|i| readings.get(i));
            let older = readings.get(end);
            let (Some(younger), Some(older)) = (younger, older) else {
                unresolved += end - start;
                continue;
            };

            let span = younger.timestamp - older.timestamp;
            if span > self.config.max_interpolation_gap || span.num_seconds() <= 0 {
                unresolved += end - start;
                continue;
            }

            let span_seconds = span.num_seconds() as f64;
            let rise = younger.raw_value - older.raw_value;
            for (slot, reading) in readings.iter().enumerate().take(end).skip(start) {
                let elapsed = (reading.timestamp - older.timestamp).num_seconds() as f64;
                fills.push((slot, rise.mul_add(elapsed / span_seconds, older.raw_value)));
            }
        }

        let interpolated = fills.len();
        for (slot, value) in fills {
            sequence.set_raw_value(slot, value);
        }
        (interpolated, unresolved)
    }
}
