// ABOUTME: Numerical normalization pipeline for follower glucose series
// ABOUTME: Rolling history backfill, gap interpolation and local regression smoothing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Follower Intelligence
//!
//! Turns the irregular series returned by a follower service into a per-minute,
//! newest-first sequence:
//!
//! 1. [`GapFiller`] marks missing minutes with placeholders, merges the fresh values
//!    into the persisted [`RollingHistory`], backfills from it and interpolates
//!    whatever is still missing across narrow gaps.
//! 2. [`SmoothingFilter`] denoises the per-minute region with repeated local
//!    quadratic regression, then again on the 5-minute series.

/// Filter configuration types
pub mod config;
/// Placeholder insertion, history merge, backfill and interpolation
pub mod gap_filler;
/// Fixed-capacity per-minute history persisted across poll cycles
pub mod rolling_history;
/// Savitzky-Golay style local regression smoothing
pub mod smoothing;

pub use config::{GapFillConfig, SmoothingConfig};
pub use gap_filler::{GapFillReport, GapFiller};
pub use rolling_history::RollingHistory;
pub use smoothing::SmoothingFilter;
