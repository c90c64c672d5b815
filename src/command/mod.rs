//! Command token parsing.
//!
//! A reader or controller sends one token per instruction. Parsing is a pure,
//! total function: every string maps to exactly one [`ParsedCommand`], and
//! anything the grammar does not recognise becomes
//! [`ParsedCommand::Unrecognized`] instead of an error.
//!
//! # Grammar
//!
//! - `PAN:<digits>;EXP:<4 digits>` presents a card
//! - `0` approves, `1` declines
//! - `RESET` (or a bare ESC character) resets the terminal
//!
//! Card frames are parsed permissively: a missing or malformed sub-field
//! becomes an empty string rather than rejecting the whole frame.
//!
//! # Example
//!
//! ```rust
//! use farebox::command::{parse, ParsedCommand};
//!
//! assert_eq!(
//!     parse("PAN:7123456;EXP:2405"),
//!     ParsedCommand::PresentCard {
//!         pan: "7123456".to_string(),
//!         expiry: "2405".to_string(),
//!     }
//! );
//! assert_eq!(parse("0"), ParsedCommand::Approve);
//! assert_eq!(parse("hello"), ParsedCommand::Unrecognized);
//! ```

pub mod keymap;

use serde::Serialize;

pub use keymap::{key_to_token, TEST_CARD_TOKEN};

/// Token that returns the terminal to idle.
pub const RESET_TOKEN: &str = "RESET";

/// ESC, sent by keypads with a dedicated cancel key.
pub const CANCEL_CHAR: &str = "\u{1b}";

const PAN_PREFIX: &str = "PAN:";
const EXPIRY_FIELD: &str = "EXP";
const EXPIRY_LEN: usize = 4;

/// A single decoded instruction from the command source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ParsedCommand {
    /// A card was read. Either field may be empty if the frame was damaged.
    PresentCard { pan: String, expiry: String },

    /// The controller accepted the payment.
    Approve,

    /// The controller rejected the payment.
    Decline,

    /// Return to idle, discarding any card on display.
    Reset,

    /// Anything else. Ignored by the state machine.
    Unrecognized,
}

impl ParsedCommand {
    /// Stable label for logs and transition history.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PresentCard { .. } => "PresentCard",
            Self::Approve => "Approve",
            Self::Decline => "Decline",
            Self::Reset => "Reset",
            Self::Unrecognized => "Unrecognized",
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized)
    }
}

/// Parse a raw command token. Never fails.
///
/// Matching is exact. Line framing belongs to the command source, so a token
/// that still carries whitespace is unrecognized.
pub fn parse(token: &str) -> ParsedCommand {
    if let Some(rest) = token.strip_prefix(PAN_PREFIX) {
        return parse_card(rest);
    }

    match token {
        "0" => ParsedCommand::Approve,
        "1" => ParsedCommand::Decline,
        RESET_TOKEN | CANCEL_CHAR => ParsedCommand::Reset,
        _ => ParsedCommand::Unrecognized,
    }
}

/// `rest` is everything after the `PAN:` prefix.
fn parse_card(rest: &str) -> ParsedCommand {
    let mut fields = rest.split(';');

    let pan = fields
        .next()
        .filter(|value| is_digits(value))
        .unwrap_or_default()
        .to_string();

    let expiry = fields
        .filter_map(|field| field.split_once(':'))
        .find(|(name, _)| *name == EXPIRY_FIELD)
        .map(|(_, value)| value)
        .filter(|value| value.len() == EXPIRY_LEN && is_digits(value))
        .unwrap_or_default()
        .to_string();

    ParsedCommand::PresentCard { pan, expiry }
}

fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}
