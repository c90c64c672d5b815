//! Demo keypad bindings.
//!
//! Bench terminals without a reader attached are driven from a keyboard:
//! `0` approves, `1` declines, `t` taps a test card and Escape resets.

use super::RESET_TOKEN;

/// Card frame produced by the `t` key.
pub const TEST_CARD_TOKEN: &str = "PAN:7123456;EXP:2405";

/// Translate a key name into a command token. Unbound keys yield `None`.
pub fn key_to_token(key: &str) -> Option<&'static str> {
    match key.trim_matches(|c: char| c == '\r' || c == '\n') {
        "0" => Some("0"),
        "1" => Some("1"),
        "t" | "T" => Some(TEST_CARD_TOKEN),
        "Escape" | "esc" | "\u{1b}" => Some(RESET_TOKEN),
        _ => None,
    }
}
