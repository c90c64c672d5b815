//! Validator state machine.
//!
//! This module contains the pure core of the terminal:
//! - Status and card snapshot types
//! - Cancellable expiry timer handles
//! - The [`Validator`] that applies parsed commands
//! - A bounded in-memory transition history
//!
//! Nothing here performs I/O or reads the clock. Time is passed in by the
//! caller, which keeps every transition deterministic under test.

mod history;
mod machine;
mod state;
mod timer;

pub use history::{StatusHistory, StatusTransition, DEFAULT_HISTORY_CAPACITY};
pub use machine::{Applied, Validator, EXPIRE_TRIGGER};
pub use state::{CardSnapshot, ValidatorState, ValidatorStatus};
pub use timer::{TimerHandle, TimerId};
