// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
// ABOUTME: Re-exports command modules for glucose-follower
// ABOUTME: Settings editing and the follower commands that talk to LibreView

pub mod follow;
pub mod settings;
