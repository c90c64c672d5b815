//! Text projection of the validator state.
//!
//! The display observes state and never feeds anything back into the state
//! machine. Everything here is a pure function of [`ValidatorState`] and the
//! terminal configuration.

use crate::config::TerminalConfig;
use crate::core::{ValidatorState, ValidatorStatus};
use serde::Serialize;

const IDLE_PROMPT: &str = "Present your card";
const PROCESSING_MESSAGE: &str = "Processing";
const APPROVED_MESSAGE: &str = "Payment successful";
const DECLINED_MESSAGE: &str = "Payment rejected";
const VISIBLE_PAN_DIGITS: usize = 4;

/// Verdict marker shown next to the status message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Success,
    Failure,
}

impl Indicator {
    /// `None` unless `status` is a verdict.
    pub fn for_status(status: ValidatorStatus) -> Option<Self> {
        if !status.is_verdict() {
            None
        } else if status.is_error() {
            Some(Self::Failure)
        } else {
            Some(Self::Success)
        }
    }

    fn marker(&self) -> &'static str {
        match self {
            Self::Success => "[OK]",
            Self::Failure => "[X]",
        }
    }
}

/// Reorder a `YYMM` expiry into `MM/YY`. Anything that is not exactly four
/// characters is returned unchanged.
///
/// ```rust
/// use farebox::display::format_expiry;
///
/// assert_eq!(format_expiry("2405"), "05/24");
/// assert_eq!(format_expiry(""), "");
/// ```
pub fn format_expiry(expiry: &str) -> String {
    let chars: Vec<char> = expiry.chars().collect();
    if chars.len() != 4 {
        return expiry.to_string();
    }
    let (year, month) = chars.split_at(2);
    format!(
        "{}/{}",
        month.iter().collect::<String>(),
        year.iter().collect::<String>()
    )
}

/// Hide all but the last four PAN characters.
pub fn mask_pan(pan: &str) -> String {
    let len = pan.chars().count();
    if len <= VISIBLE_PAN_DIGITS {
        return pan.to_string();
    }
    pan.chars()
        .enumerate()
        .map(|(i, c)| if i < len - VISIBLE_PAN_DIGITS { '*' } else { c })
        .collect()
}

/// What the screen shows for one state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DisplayFrame {
    pub status: ValidatorStatus,
    /// Fare amount, or the card number while a card is on screen
    pub headline: String,
    pub detail: String,
    /// Empty while idle
    pub status_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indicator: Option<Indicator>,
}

impl DisplayFrame {
    pub fn from_state(state: &ValidatorState, config: &TerminalConfig) -> Self {
        let status = state.status();

        let (headline, detail) = match state.card() {
            Some(card) => {
                let pan = if config.mask_pan {
                    mask_pan(&card.pan)
                } else {
                    card.pan.clone()
                };
                (pan, format!("Expiry: {}", format_expiry(&card.expiry)))
            }
            None => (config.fare_amount.clone(), IDLE_PROMPT.to_string()),
        };

        let status_message = match status {
            ValidatorStatus::Idle => "",
            ValidatorStatus::AwaitingCard => PROCESSING_MESSAGE,
            ValidatorStatus::Approved => APPROVED_MESSAGE,
            ValidatorStatus::Declined => DECLINED_MESSAGE,
        }
        .to_string();

        Self {
            status,
            headline,
            detail,
            status_message,
            indicator: Indicator::for_status(status),
        }
    }

    /// Render as text lines for a character display.
    pub fn render_text(&self) -> String {
        let mut out = format!("{}\n{}", self.headline, self.detail);
        if !self.status_message.is_empty() {
            out.push('\n');
            if let Some(indicator) = self.indicator {
                out.push_str(indicator.marker());
                out.push(' ');
            }
            out.push_str(&self.status_message);
        }
        out
    }
}

/// How the CLI prints frames: text blocks separated by a blank line, or one
/// JSON object per line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn render(&self, frame: &DisplayFrame) -> Result<String, serde_json::Error> {
        match self {
            Self::Text => Ok(format!("{}\n", frame.render_text())),
            Self::Json => serde_json::to_string(frame),
        }
    }
}
