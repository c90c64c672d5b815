//! Validator status and the state snapshot exposed to observers.
//!
//! All methods here are pure. The only writer of [`ValidatorState`] is
//! [`Validator`](super::Validator); everyone else receives a shared borrow.

use super::timer::TimerHandle;
use serde::Serialize;
use std::fmt;

/// Card details captured from a `PresentCard` command.
///
/// `expiry` is kept exactly as received (`YYMM`), or empty if the reader
/// frame was damaged. Reordering for display happens in the display layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CardSnapshot {
    pub pan: String,
    pub expiry: String,
}

/// The terminal's payment status. Exactly one is active at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ValidatorStatus {
    /// Showing the fare, waiting for a rider.
    #[default]
    Idle,
    /// A card was read and the terminal waits for the controller's verdict.
    AwaitingCard,
    Approved,
    Declined,
}

impl ValidatorStatus {
    /// Name for display and logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::AwaitingCard => "AwaitingCard",
            Self::Approved => "Approved",
            Self::Declined => "Declined",
        }
    }

    /// Declined is the only status shown as a failure to the rider.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Declined)
    }

    /// Approved and Declined stay on screen until the next command.
    pub fn is_verdict(&self) -> bool {
        matches!(self, Self::Approved | Self::Declined)
    }
}

impl fmt::Display for ValidatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything the display needs to know.
///
/// `card` and `pending_expiry` are present exactly when `status` is
/// [`ValidatorStatus::AwaitingCard`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidatorState {
    pub(crate) status: ValidatorStatus,
    pub(crate) card: Option<CardSnapshot>,
    pub(crate) pending_expiry: Option<TimerHandle>,
}

impl ValidatorState {
    pub fn status(&self) -> ValidatorStatus {
        self.status
    }

    pub fn card(&self) -> Option<&CardSnapshot> {
        self.card.as_ref()
    }

    pub fn pending_expiry(&self) -> Option<&TimerHandle> {
        self.pending_expiry.as_ref()
    }

    /// Check the card/timer/status invariant.
    pub fn is_consistent(&self) -> bool {
        let awaiting = self.status == ValidatorStatus::AwaitingCard;
        self.card.is_some() == awaiting && self.pending_expiry.is_some() == awaiting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_idle_and_empty() {
        let state = ValidatorState::default();
        assert_eq!(state.status(), ValidatorStatus::Idle);
        assert!(state.card().is_none());
        assert!(state.pending_expiry().is_none());
        assert!(state.is_consistent());
    }

    #[test]
    fn status_names_are_stable() {
        assert_eq!(ValidatorStatus::Idle.name(), "Idle");
        assert_eq!(ValidatorStatus::AwaitingCard.name(), "AwaitingCard");
        assert_eq!(ValidatorStatus::Approved.to_string(), "Approved");
        assert_eq!(ValidatorStatus::Declined.to_string(), "Declined");
    }

    #[test]
    fn only_declined_is_error() {
        assert!(!ValidatorStatus::Idle.is_error());
        assert!(!ValidatorStatus::AwaitingCard.is_error());
        assert!(!ValidatorStatus::Approved.is_error());
        assert!(ValidatorStatus::Declined.is_error());
    }

    #[test]
    fn verdicts() {
        assert!(ValidatorStatus::Approved.is_verdict());
        assert!(ValidatorStatus::Declined.is_verdict());
        assert!(!ValidatorStatus::Idle.is_verdict());
    }

    #[test]
    fn awaiting_without_card_is_inconsistent() {
        let state = ValidatorState {
            status: ValidatorStatus::AwaitingCard,
            card: None,
            pending_expiry: None,
        };
        assert!(!state.is_consistent());
    }

    #[test]
    fn idle_with_card_is_inconsistent() {
        let state = ValidatorState {
            status: ValidatorStatus::Idle,
            card: Some(CardSnapshot {
                pan: "1".to_string(),
                expiry: String::new(),
            }),
            pending_expiry: None,
        };
        assert!(!state.is_consistent());
    }

    #[test]
    fn status_serializes_correctly() {
        let json = serde_json::to_string(&ValidatorStatus::AwaitingCard).unwrap();
        assert_eq!(json, r#""AwaitingCard""#);
    }
}
