//! Expiry timer handles.
//!
//! A handle is a plain value naming one armed expiry. Cancelling means
//! dropping the handle from the state; a fire for an id that is no longer
//! held is stale and gets discarded, so cancellation is idempotent and a
//! late fire can never overwrite a newer state.

use std::fmt;
use std::time::Instant;

/// Identifier of one armed expiry. Ids increase monotonically per machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    pub(crate) fn first() -> Self {
        TimerId(1)
    }

    pub(crate) fn next(self) -> Self {
        TimerId(self.0.wrapping_add(1))
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// A pending expiry owned by the validator state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerHandle {
    id: TimerId,
    deadline: Instant,
}

impl TimerHandle {
    pub(crate) fn new(id: TimerId, deadline: Instant) -> Self {
        Self { id, deadline }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Whether the deadline has been reached at `now`.
    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}
