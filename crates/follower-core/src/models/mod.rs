// ABOUTME: Core data models for the glucose follower pipeline
// ABOUTME: Re-exports GlucoseReading, ChronoSequence and fetched sensor metadata
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! - `GlucoseReading`: a timestamped concentration value, `0.0` reserved as the placeholder
//! - `ChronoSequence`: newest-first container with tail-first chronological insertion
//! - `FetchedReadings`: one poll's readings plus the active sensor's metadata

mod reading;
mod sensor;
mod sequence;

pub use reading::{GlucoseReading, PLACEHOLDER_VALUE};
pub use sensor::FetchedReadings;
pub use sequence::ChronoSequence;
