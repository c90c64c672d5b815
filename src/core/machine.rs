//! The validator state machine.

use super::history::{StatusHistory, StatusTransition, DEFAULT_HISTORY_CAPACITY};
use super::state::{CardSnapshot, ValidatorState, ValidatorStatus};
use super::timer::{TimerHandle, TimerId};
use crate::command::ParsedCommand;
use crate::config::TerminalConfig;
use chrono::Utc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

/// Trigger name recorded when the expiry timer fires.
pub const EXPIRE_TRIGGER: &str = "Expire";

/// Outcome of [`Validator::apply`].
///
/// When `changed` is set, any previously armed timer has been cancelled and
/// `armed` is the only live one. Drivers schedule their sleep from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Applied {
    /// Whether the observable state differs from before the command
    pub changed: bool,
    /// The timer armed by this command, if any
    pub armed: Option<TimerHandle>,
}

impl Applied {
    pub fn unchanged() -> Self {
        Self {
            changed: false,
            armed: None,
        }
    }
}

/// Owns the terminal's [`ValidatorState`] and is its only writer.
///
/// Commands go through [`apply`](Self::apply); timer fires go through
/// [`expire`](Self::expire) or [`poll_expiry`](Self::poll_expiry). Callers
/// must serialize these calls.
///
/// # Example
///
/// ```rust
/// use farebox::command::parse;
/// use farebox::core::{Validator, ValidatorStatus};
/// use std::time::{Duration, Instant};
///
/// let mut validator = Validator::new(Duration::from_secs(5));
/// let start = Instant::now();
///
/// validator.apply(parse("PAN:7123456;EXP:2405"), start);
/// assert_eq!(validator.status(), ValidatorStatus::AwaitingCard);
///
/// assert!(validator.poll_expiry(start + Duration::from_secs(5)));
/// assert_eq!(validator.status(), ValidatorStatus::Idle);
/// ```
#[derive(Debug)]
pub struct Validator {
    state: ValidatorState,
    expiry_duration: Duration,
    next_timer: TimerId,
    history: StatusHistory,
}

impl Validator {
    /// Create an idle validator whose card display lasts `expiry_duration`.
    pub fn new(expiry_duration: Duration) -> Self {
        Self {
            state: ValidatorState::default(),
            expiry_duration,
            next_timer: TimerId::first(),
            history: StatusHistory::with_capacity(DEFAULT_HISTORY_CAPACITY),
        }
    }

    pub fn from_config(config: &TerminalConfig) -> Self {
        Self::new(config.expiry_duration()).with_history_capacity(config.history_capacity)
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history = StatusHistory::with_capacity(capacity);
        self
    }

    pub fn state(&self) -> &ValidatorState {
        &self.state
    }

    pub fn status(&self) -> ValidatorStatus {
        self.state.status
    }

    pub fn history(&self) -> &StatusHistory {
        &self.history
    }

    pub fn expiry_duration(&self) -> Duration {
        self.expiry_duration
    }

    /// Deadline of the live timer, if one is armed.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.state.pending_expiry.map(|handle| handle.deadline())
    }

    /// Apply one parsed command at time `now`.
    ///
    /// Unrecognized commands leave the state untouched. Every other command
    /// first cancels the pending timer and clears the card, then applies its
    /// own effect, which for `PresentCard` arms a fresh timer. Logging an
    /// unrecognized token is left to the caller, which still has the raw text.
    pub fn apply(&mut self, command: ParsedCommand, now: Instant) -> Applied {
        let trigger = command.name();

        let next_status = match &command {
            ParsedCommand::Unrecognized => return Applied::unchanged(),
            ParsedCommand::PresentCard { .. } => ValidatorStatus::AwaitingCard,
            ParsedCommand::Approve => ValidatorStatus::Approved,
            ParsedCommand::Decline => ValidatorStatus::Declined,
            ParsedCommand::Reset => ValidatorStatus::Idle,
        };

        let previous = self.state.clone();
        self.clear_pending();
        self.state.status = next_status;

        let mut armed = None;
        if let ParsedCommand::PresentCard { pan, expiry } = command {
            let handle = self.arm(now);
            debug!(
                "Armed {} for {:?} (card expiry field {:?})",
                handle.id(),
                self.expiry_duration,
                expiry
            );
            self.state.card = Some(CardSnapshot { pan, expiry });
            self.state.pending_expiry = Some(handle);
            armed = Some(handle);
        }

        let changed = self.state != previous;
        if changed {
            self.record(previous.status, trigger);
        } else {
            debug!("{} left state unchanged ({})", trigger, self.state.status);
        }

        Applied { changed, armed }
    }

    /// Fire the timer identified by `id`.
    ///
    /// Returns `false` without touching the state when `id` is not the live
    /// timer: it was cancelled, superseded, or has already fired.
    pub fn expire(&mut self, id: TimerId) -> bool {
        match self.state.pending_expiry {
            Some(handle) if handle.id() == id => {
                let from = self.state.status;
                self.clear_pending();
                self.state.status = ValidatorStatus::Idle;
                self.record(from, EXPIRE_TRIGGER);
                true
            }
            _ => {
                trace!("Discarding stale {}", id);
                false
            }
        }
    }

    /// Fire the live timer if its deadline has passed at `now`.
    pub fn poll_expiry(&mut self, now: Instant) -> bool {
        match self.state.pending_expiry {
            Some(handle) if handle.is_due(now) => self.expire(handle.id()),
            _ => false,
        }
    }

    /// Restore the no-card, no-timer baseline. Safe to call repeatedly.
    fn clear_pending(&mut self) {
        if let Some(handle) = self.state.pending_expiry.take() {
            trace!("Cancelled {}", handle.id());
        }
        self.state.card = None;
    }

    fn arm(&mut self, now: Instant) -> TimerHandle {
        let id = self.next_timer;
        self.next_timer = id.next();
        TimerHandle::new(id, now + self.expiry_duration)
    }

    fn record(&mut self, from: ValidatorStatus, trigger: &'static str) {
        let to = self.state.status;
        info!("{} -> {} ({})", from, to, trigger);
        self.history.record(StatusTransition {
            from,
            to,
            trigger,
            timestamp: Utc::now(),
        });
    }
}
