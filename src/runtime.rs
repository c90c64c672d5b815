//! Event loop driving a [`Validator`] from a command source.
//!
//! One task owns the validator. It waits on whichever comes first, the next
//! command token or the live expiry deadline, so command application and
//! timer fires are serialized through a single writer. Each armed sleep
//! carries the id of the timer it was armed for; a sleep that outlives its
//! timer is discarded by [`Validator::expire`].

use crate::clock::{Clock, TokioClock};
use crate::command::{key_to_token, parse};
use crate::core::{Applied, TimerHandle, TimerId, Validator, ValidatorState};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Errors that stop the event loop
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Failed to read command source: {0}")]
    Source(#[from] io::Error),
}

/// An ordered source of raw command tokens. `Ok(None)` means end of input.
#[allow(async_fn_in_trait)]
pub trait CommandSource {
    async fn next_token(&mut self) -> io::Result<Option<String>>;
}

/// One token per line, from a byte stream such as a serial port or stdin.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected, so a
/// garbled frame reaches the parser as an unrecognized token instead of
/// ending the session. A trailing `\n` or `\r\n` is stripped.
pub struct LineSource<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::new(),
        }
    }
}

impl<R: AsyncBufRead + Unpin> CommandSource for LineSource<R> {
    async fn next_token(&mut self) -> io::Result<Option<String>> {
        // Partial reads stay in `buf` if this future is dropped mid-line.
        let read = self.reader.read_until(b'\n', &mut self.buf).await?;
        if read == 0 && self.buf.is_empty() {
            return Ok(None);
        }

        let mut line = self.buf.as_slice();
        if let Some(rest) = line.strip_suffix(b"\n") {
            line = rest.strip_suffix(b"\r").unwrap_or(rest);
        }
        let token = String::from_utf8_lossy(line).into_owned();
        self.buf.clear();
        Ok(Some(token))
    }
}

impl CommandSource for mpsc::Receiver<String> {
    async fn next_token(&mut self) -> io::Result<Option<String>> {
        Ok(self.recv().await)
    }
}

/// How raw input is interpreted before parsing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputMode {
    /// Input is already in the command grammar.
    #[default]
    Tokens,
    /// Input is demo key names, translated through the keypad bindings.
    Keys,
}

pub struct Terminal<C: Clock = TokioClock> {
    validator: Validator,
    clock: C,
    mode: InputMode,
}

impl Terminal<TokioClock> {
    pub fn new(validator: Validator) -> Self {
        Self::with_clock(validator, TokioClock)
    }
}

impl<C: Clock> Terminal<C> {
    pub fn with_clock(validator: Validator, clock: C) -> Self {
        Self {
            validator,
            clock,
            mode: InputMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: InputMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn into_validator(self) -> Validator {
        self.validator
    }

    /// Parse and apply one raw input.
    pub fn dispatch(&mut self, raw: &str) -> Applied {
        let token = match self.mode {
            InputMode::Tokens => raw,
            InputMode::Keys => match key_to_token(raw) {
                Some(token) => token,
                None => {
                    debug!("Unbound key {:?}", raw);
                    return Applied::unchanged();
                }
            },
        };

        let command = parse(token);
        if command.is_recognized() {
            debug!("Received {:?} -> {}", token, command.name());
        } else {
            warn!("Ignoring unrecognized token {:?}", token);
        }
        self.validator.apply(command, self.clock.now())
    }

    /// Fire the timer `id` if it is still live. Returns whether it fired.
    pub fn fire(&mut self, id: TimerId) -> bool {
        self.validator.expire(id)
    }

    /// Run until the source ends, calling `observer` after every state change.
    pub async fn run<S, F>(&mut self, mut source: S, mut observer: F) -> Result<(), RuntimeError>
    where
        S: CommandSource,
        F: FnMut(&ValidatorState),
    {
        info!(
            "Terminal ready (expiry {:?}, mode {:?})",
            self.validator.expiry_duration(),
            self.mode
        );
        observer(self.validator.state());

        let mut scheduled = self.validator.state().pending_expiry().copied();

        loop {
            tokio::select! {
                biased;

                Some(id) = wait_for(scheduled) => {
                    scheduled = None;
                    if self.fire(id) {
                        observer(self.validator.state());
                    }
                }
                token = source.next_token() => match token? {
                    Some(raw) => {
                        if raw.trim().is_empty() {
                            continue;
                        }
                        let applied = self.dispatch(&raw);
                        if applied.changed {
                            // Any recognised change cancels the old timer;
                            // only a new card arms another.
                            scheduled = applied.armed;
                            observer(self.validator.state());
                        }
                    }
                    None => {
                        info!("Command source closed");
                        return Ok(());
                    }
                },
            }
        }
    }
}

/// Resolve with the timer's id once its deadline passes. Never resolves
/// when nothing is armed.
async fn wait_for(pending: Option<TimerHandle>) -> Option<TimerId> {
    match pending {
        Some(handle) => {
            tokio::time::sleep_until(tokio::time::Instant::from_std(handle.deadline())).await;
            Some(handle.id())
        }
        None => std::future::pending().await,
    }
}
