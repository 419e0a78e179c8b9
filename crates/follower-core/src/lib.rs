// ABOUTME: Core types and constants for the glucose follower ingestion pipeline
// ABOUTME: Foundation crate with error handling, reading models, and protocol constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Follower Core
//!
//! Foundation crate providing shared types and constants for the glucose follower
//! pipeline. This crate is designed to change infrequently, enabling incremental
//! compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and `ProviderError`
//! - **constants**: Remote API paths, gap-fill and smoothing defaults
//! - **models**: `GlucoseReading`, the newest-first `ChronoSequence`, sensor metadata

/// Unified error handling system with standard error codes
pub mod errors;

/// Application constants organized by domain
pub mod constants;

/// Glucose reading models and the chronological sequence container
pub mod models;
