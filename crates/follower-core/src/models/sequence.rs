// ABOUTME: Newest-first ordered container of glucose readings
// ABOUTME: Chronological insertion optimized for near-sorted API pages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use super::GlucoseReading;
use serde::{Deserialize, Serialize};
use std::{slice, vec};

/// Readings ordered by timestamp, newest first.
///
/// The ordering is the only invariant: the sequence is not assumed to be contiguous
/// at per-minute granularity until it has been through gap filling. Timestamps are
/// never exposed mutably; only raw values can be rewritten in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<GlucoseReading>", into = "Vec<GlucoseReading>")]
pub struct ChronoSequence {
    readings: Vec<GlucoseReading>,
}

impl ChronoSequence {
    /// Create an empty sequence
    #[must_use]
    pub const fn new() -> Self {
        Self {
            readings: Vec::new(),
        }
    }

    /// Create an empty sequence with room for `capacity` readings
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            readings: Vec::with_capacity(capacity),
        }
    }

    /// Insert a reading at its chronological position and return that position.
    ///
    /// The oldest entry is checked first: a strictly older reading is appended.
    /// Otherwise the reading goes in front of the first entry that is not newer
    /// than it, so an equal timestamp lands before the existing duplicates.
    pub fn insert(&mut self, reading: GlucoseReading) -> usize {
        if self
            .readings
            .last()
            .is_none_or(|oldest| reading.timestamp < oldest.timestamp)
        {
            self.readings.push(reading);
            return self.readings.len() - 1;
        }

        let index = self
            .readings
            .iter()
            .position(|existing| existing.timestamp <= reading.timestamp)
            .unwrap_or(self.readings.len());
        self.readings.insert(index, reading);
        index
    }

    /// Number of readings
    #[must_use]
    pub fn len(&self) -> usize {
        self.readings.len()
    }

    /// Whether the sequence holds no readings
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Reading at `index` (0 is the newest)
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&GlucoseReading> {
        self.readings.get(index)
    }

    /// Newest reading
    #[must_use]
    pub fn newest(&self) -> Option<&GlucoseReading> {
        self.readings.first()
    }

    /// Oldest reading
    #[must_use]
    pub fn oldest(&self) -> Option<&GlucoseReading> {
        self.readings.last()
    }

    /// Iterate newest to oldest
    pub fn iter(&self) -> slice::Iter<'_, GlucoseReading> {
        self.readings.iter()
    }

    /// Borrow the readings as a slice
    #[must_use]
    pub fn as_slice(&self) -> &[GlucoseReading] {
        &self.readings
    }

    /// Overwrite the raw value at `index`, returning false when out of range
    pub fn set_raw_value(&mut self, index: usize, raw_value: f64) -> bool {
        self.readings.get_mut(index).is_some_and(|reading| {
            reading.raw_value = raw_value;
            true
        })
    }

    /// Count of readings holding the placeholder value
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.readings.iter().filter(|r| r.is_placeholder()).count()
    }

    /// Consume the sequence, returning the readings newest first
    #[must_use]
    pub fn into_vec(self) -> Vec<GlucoseReading> {
        self.readings
    }
}

impl From<Vec<GlucoseReading>> for ChronoSequence {
    fn from(readings: Vec<GlucoseReading>) -> Self {
        readings.into_iter().collect()
    }
}

impl From<ChronoSequence> for Vec<GlucoseReading> {
    fn from(sequence: ChronoSequence) -> Self {
        sequence.readings
    }
}

impl FromIterator<GlucoseReading> for ChronoSequence {
    fn from_iter<I: IntoIterator<Item = GlucoseReading>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut sequence = Self::with_capacity(iter.size_hint().0);
        for reading in iter {
            sequence.insert(reading);
        }
        sequence
    }
}

impl Extend<GlucoseReading> for ChronoSequence {
    fn extend<I: IntoIterator<Item = GlucoseReading>>(&mut self, iter: I) {
        for reading in iter {
            self.insert(reading);
        }
    }
}

impl IntoIterator for ChronoSequence {
    type Item = GlucoseReading;
    type IntoIter = vec::IntoIter<GlucoseReading>;

    fn into_iter(self) -> Self::IntoIter {
        self.readings.into_iter()
    }
}

impl<'a> IntoIterator for &'a ChronoSequence {
    type Item = &'a GlucoseReading;
    type IntoIter = slice::Iter<'a, GlucoseReading>;

    fn into_iter(self) -> Self::IntoIter {
        self.readings.iter()
    }
}
