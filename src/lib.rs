//! Farebox: command interpreter for transit fare validator terminals
//!
//! A card reader or controller sends short command tokens. Farebox parses
//! them, drives a small status state machine, and expires a presented card
//! automatically when no verdict arrives in time. Rendering is left to the
//! caller, which observes the exposed state.
//!
//! # Core Concepts
//!
//! - **Commands**: `parse` turns any string into a [`ParsedCommand`], never failing
//! - **Validator**: the single owner and writer of [`ValidatorState`]
//! - **Expiry**: a cancellable timer handle stored in the state itself
//! - **Runtime**: a tokio loop serializing commands and timer fires
//!
//! # Example
//!
//! ```rust
//! use farebox::{parse, Validator, ValidatorStatus};
//! use farebox::display::format_expiry;
//! use std::time::{Duration, Instant};
//!
//! let mut validator = Validator::new(Duration::from_secs(5));
//! let now = Instant::now();
//!
//! validator.apply(parse("PAN:7123456;EXP:2405"), now);
//! let card = validator.state().card().unwrap();
//! assert_eq!(card.pan, "7123456");
//! assert_eq!(format_expiry(&card.expiry), "05/24");
//!
//! validator.apply(parse("0"), now);
//! assert_eq!(validator.status(), ValidatorStatus::Approved);
//! assert!(validator.state().card().is_none());
//! ```

pub mod clock;
pub mod command;
pub mod config;
pub mod core;
pub mod display;
pub mod runtime;

// Re-export commonly used types
pub use command::{parse, ParsedCommand};
pub use config::TerminalConfig;
pub use core::{CardSnapshot, Validator, ValidatorState, ValidatorStatus};
pub use runtime::{InputMode, Terminal};
