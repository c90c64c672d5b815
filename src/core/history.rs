//! Status transition history.
//!
//! Keeps the most recent transitions in memory for diagnostics. The log is
//! bounded and is never written anywhere; once capacity is reached the
//! oldest entry is evicted.

use super::state::ValidatorStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;

/// Default number of transitions retained.
pub const DEFAULT_HISTORY_CAPACITY: usize = 32;

/// Record of a single state change.
///
/// # Example
///
/// ```rust
/// use farebox::core::{StatusTransition, ValidatorStatus};
/// use chrono::Utc;
///
/// let transition = StatusTransition {
///     from: ValidatorStatus::Idle,
///     to: ValidatorStatus::AwaitingCard,
///     trigger: "PresentCard",
///     timestamp: Utc::now(),
/// };
/// assert_eq!(transition.trigger, "PresentCard");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusTransition {
    /// Status before the change
    pub from: ValidatorStatus,
    /// Status after the change
    pub to: ValidatorStatus,
    /// Command name, or `"Expire"` for a timer fire
    pub trigger: &'static str,
    /// When the change was applied
    pub timestamp: DateTime<Utc>,
}

/// Bounded, ordered log of state changes.
///
/// # Example
///
/// ```rust
/// use farebox::core::{StatusHistory, StatusTransition, ValidatorStatus};
/// use chrono::Utc;
///
/// let mut history = StatusHistory::with_capacity(2);
/// for to in [
///     ValidatorStatus::AwaitingCard,
///     ValidatorStatus::Approved,
///     ValidatorStatus::Idle,
/// ] {
///     history.record(StatusTransition {
///         from: ValidatorStatus::Idle,
///         to,
///         trigger: "test",
///         timestamp: Utc::now(),
///     });
/// }
///
/// assert_eq!(history.len(), 2);
/// assert_eq!(history.transitions().next().unwrap().to, ValidatorStatus::Approved);
/// ```
#[derive(Clone, Debug, Serialize)]
pub struct StatusHistory {
    capacity: usize,
    transitions: VecDeque<StatusTransition>,
}

impl Default for StatusHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl StatusHistory {
    /// Create an empty history retaining at most `capacity` entries.
    /// A capacity of zero disables recording.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            transitions: VecDeque::with_capacity(capacity),
        }
    }

    /// Append a transition, evicting the oldest when full.
    pub fn record(&mut self, transition: StatusTransition) {
        if self.capacity == 0 {
            return;
        }
        while self.transitions.len() >= self.capacity {
            self.transitions.pop_front();
        }
        self.transitions.push_back(transition);
    }

    /// Transitions oldest first.
    pub fn transitions(&self) -> impl Iterator<Item = &StatusTransition> {
        self.transitions.iter()
    }

    pub fn last(&self) -> Option<&StatusTransition> {
        self.transitions.back()
    }

    /// Statuses visited: the first retained `from`, then each `to`.
    pub fn path(&self) -> Vec<ValidatorStatus> {
        let mut path = Vec::with_capacity(self.transitions.len() + 1);
        if let Some(first) = self.transitions.front() {
            path.push(first.from);
        }
        path.extend(self.transitions.iter().map(|t| t.to));
        path
    }

    /// Time between the oldest and newest retained transition.
    pub fn span(&self) -> Option<Duration> {
        let (first, last) = (self.transitions.front()?, self.transitions.back()?);
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
