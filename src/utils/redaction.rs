// ABOUTME: Masks secrets for display, revealing a few leading characters for context
// ABOUTME: Longer secrets reveal more, and the masked form never exceeds twelve characters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::iter;

/// Longest masked string produced
const MAX_DISPLAY_CHARS: usize = 12;

/// Mask character
const MASK: char = '*';

/// Mask `secret`, keeping a few leading characters.
///
/// Lengths 0-3 reveal nothing, 4-5 one character, 6-7 two, 8-10 three and
/// 11-50 four; anything longer reveals nothing. The result is as long as the
/// secret, capped at twelve characters.
#[must_use]
pub fn obscure_secret(secret: &str) -> String {
    let length = secret.chars().count();
    let revealed = match length {
        4..=5 => 1,
        6..=7 => 2,
        8..=10 => 3,
        11..=50 => 4,
        _ => 0,
    };

    let shown = length.min(MAX_DISPLAY_CHARS);
    let mut obscured: String = secret.chars().take(revealed).collect();
    obscured.extend(iter::repeat_n(MASK, shown - revealed));
    obscured
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_secrets_fully_masked() {
        assert_eq!(obscure_secret(""), "");
        assert_eq!(obscure_secret("abc"), "***");
    }

    #[test]
    fn test_reveal_grows_with_length() {
        assert_eq!(obscure_secret("abcd"), "a***");
        assert_eq!(obscure_secret("abcdef"), "ab****");
        assert_eq!(obscure_secret("abcdefgh"), "abc*****");
        assert_eq!(obscure_secret("abcdefghijk"), "abcd*******");
    }

    #[test]
    fn test_display_capped_at_twelve() {
        assert_eq!(obscure_secret(&"x".repeat(40)), "xxxx********");
        assert_eq!(obscure_secret(&"y".repeat(51)), "************");
    }
}
