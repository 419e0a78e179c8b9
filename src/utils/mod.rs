// ABOUTME: Utility modules for common functionality across the follower
// ABOUTME: Contains secret redaction helpers for display and logs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Partial masking of passwords and tokens
pub mod redaction;

pub use redaction::obscure_secret;
