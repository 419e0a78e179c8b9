// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
// ABOUTME: Re-exports helper modules for glucose-follower
// ABOUTME: Provides display formatting for settings and readings

pub mod display;
