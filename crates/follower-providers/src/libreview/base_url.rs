// ABOUTME: Normalization of user-entered LibreLinkUp server addresses
// ABOUTME: Reduces any accepted input to https://<host> with an optional port
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use url::Url;

/// Normalize a user-entered server address to `https://<lowercased host>[:port]`.
///
/// Leading/trailing whitespace, a trailing `/` and any path (such as the login
/// path pasted along with the host) are dropped; a missing scheme is taken as
/// `https`. Returns `None` for empty input, for the doubled-scheme typo
/// `https://http...`, and for anything without a host.
#[must_use]
pub fn normalize_base_url(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let lowered = trimmed.to_ascii_lowercase();
    if lowered.starts_with("https://http") {
        return None;
    }

    let with_scheme = if lowered.starts_with("https://") || lowered.starts_with("http://") {
        trimmed.to_owned()
    } else {
        format!("https://{trimmed}")
    };

    let parsed = Url::parse(&with_scheme).ok()?;
    let host = parsed.host_str().filter(|host| !host.is_empty())?;
    let host = host.to_ascii_lowercase();

    Some(parsed.port().map_or_else(
        || format!("https://{host}"),
        |port| format!("https://{host}:{port}"),
    ))
}
