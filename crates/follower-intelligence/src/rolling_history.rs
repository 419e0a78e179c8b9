// ABOUTME: Fixed-capacity per-minute history of recent glucose values, newest first
// ABOUTME: Shift-and-fill operations used to backfill gaps across poll cycles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::{DateTime, Utc};
use follower_core::constants::gap_fill::SLOT_SECONDS;
use std::collections::VecDeque;

/// Per-minute history of integer values anchored at the newest slot.
///
/// Slot `n` holds the value measured `n` minutes before [`anchor`](Self::anchor);
/// `0` marks a slot without a known value. The buffer never grows beyond its
/// capacity and is empty whenever it has no anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollingHistory {
    values: VecDeque<i32>,
    anchor: Option<DateTime<Utc>>,
    capacity: usize,
}

impl RollingHistory {
    /// Value stored in a slot without a known reading
    pub const EMPTY_SLOT: i32 = 0;

    /// Create an empty history holding at most `capacity` slots
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            anchor: None,
            capacity,
        }
    }

    /// Rebuild a history from persisted values, truncated to `capacity`
    #[must_use]
    pub fn from_parts(values: Vec<i32>, anchor: Option<DateTime<Utc>>, capacity: usize) -> Self {
        let mut history = Self::new(capacity);
        if anchor.is_some() {
            history.values.extend(values.into_iter().take(capacity));
            history.anchor = anchor;
        }
        history
    }

    /// Timestamp of slot 0
    #[must_use]
    pub const fn anchor(&self) -> Option<DateTime<Utc>> {
        self.anchor
    }

    /// Maximum number of slots
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots currently held
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no slots are held
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values newest first, for persistence
    #[must_use]
    pub fn values(&self) -> Vec<i32> {
        self.values.iter().copied().collect()
    }

    /// Rounded number of minutes between the anchor and `timestamp` (positive when older)
    #[must_use]
    pub fn minutes_before_anchor(&self, timestamp: DateTime<Utc>) -> Option<i64> {
        self.anchor
            .map(|anchor| minutes_between(timestamp, anchor))
    }

    /// Slot addressed by `timestamp`, if it falls inside the buffer's capacity
    #[must_use]
    pub fn slot_of(&self, timestamp: DateTime<Utc>) -> Option<usize> {
        self.minutes_before_anchor(timestamp)
            .and_then(|offset| usize::try_from(offset).ok())
            .filter(|slot| *slot < self.capacity)
    }

    /// Known (non-empty) value held in `slot`
    #[must_use]
    pub fn known_value(&self, slot: usize) -> Option<i32> {
        self.values
            .get(slot)
            .copied()
            .filter(|value| *value != Self::EMPTY_SLOT)
    }

    /// Move the anchor forward to `newest` and return the index difference.
    ///
    /// A positive difference prepends that many empty slots (clamped to the capacity,
    /// so a history stale by more than its depth is fully replaced) and drops slots
    /// that fall off the end. A zero difference only re-anchors to the exact
    /// timestamp. A negative difference means `newest` is older than the anchor:
    /// the history is left as it is.
    pub fn advance_to(&mut self, newest: DateTime<Utc>) -> i64 {
        let Some(anchor) = self.anchor else {
            self.values.clear();
            self.anchor = Some(newest);
            return 0;
        };

        let difference = minutes_between(anchor, newest);
        if difference < 0 {
            return difference;
        }

        let shift = usize::try_from(difference)
            .unwrap_or(usize::MAX)
            .min(self.capacity);
        for _ in 0..shift {
            self.values.push_front(Self::EMPTY_SLOT);
        }
        self.values.truncate(self.capacity);
        self.anchor = Some(newest);
        difference
    }

    /// Store `value` in `slot` unless the slot already holds a known value.
    ///
    /// Slots past the current end are created (empty) up to `slot`, as long as the
    /// capacity allows. Returns whether the value was written.
    pub fn fill_if_empty(&mut self, slot: usize, value: i32) -> bool {
        if slot >= self.capacity || value == Self::EMPTY_SLOT {
            return false;
        }
        if slot >= self.values.len() {
            self.values.resize(slot + 1, Self::EMPTY_SLOT);
        }
        match self.values.get_mut(slot) {
            Some(existing) if *existing == Self::EMPTY_SLOT => {
                *existing = value;
                true
            }
            _ => false,
        }
    }

    /// Forget every slot and the anchor
    pub fn clear(&mut self) {
        self.values.clear();
        self.anchor = None;
    }
}

/// Whole minutes from `older` to `newer`, rounded to the nearest slot
fn minutes_between(older: DateTime<Utc>, newer: DateTime<Utc>) -> i64 {
    let seconds = (newer - older).num_seconds();
    (seconds as f64 / SLOT_SECONDS as f64).round() as i64
}
