//! End-to-end terminal scenarios.
//!
//! Synchronous flows drive the validator directly with explicit instants.
//! Runtime flows feed a [`Terminal`] through an in-memory pipe under paused
//! tokio time, so timer behaviour is deterministic and instantaneous.

use farebox::clock::{Clock, TokioClock};
use farebox::core::{Validator, ValidatorStatus, EXPIRE_TRIGGER};
use farebox::display::{format_expiry, DisplayFrame};
use farebox::runtime::LineSource;
use farebox::{parse, CardSnapshot, InputMode, ParsedCommand, Terminal, TerminalConfig};
use std::time::{Duration, Instant};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::time::sleep;

const EXPIRY: Duration = Duration::from_secs(5);

/// Tokio's timer wheel works in whole milliseconds.
fn assert_near(actual: Duration, expected: Duration) {
    let diff = if actual > expected {
        actual - expected
    } else {
        expected - actual
    };
    assert!(
        diff <= Duration::from_millis(1),
        "expected ~{expected:?}, got {actual:?}"
    );
}

#[test]
fn approval_flow() {
    let mut validator = Validator::new(EXPIRY);
    let now = Instant::now();

    validator.apply(parse("PAN:7123456;EXP:2405"), now);

    assert_eq!(validator.status(), ValidatorStatus::AwaitingCard);
    let card = validator.state().card().unwrap();
    assert_eq!(
        card,
        &CardSnapshot {
            pan: "7123456".to_string(),
            expiry: "2405".to_string(),
        }
    );
    assert_eq!(format_expiry(&card.expiry), "05/24");

    validator.apply(parse("0"), now);

    assert_eq!(validator.status(), ValidatorStatus::Approved);
    assert!(validator.state().card().is_none());
    assert!(validator.state().pending_expiry().is_none());
}

#[test]
fn expiry_auto_reset() {
    let mut validator = Validator::new(EXPIRY);
    let start = Instant::now();

    validator.apply(parse("PAN:55;EXP:2612"), start);
    assert!(validator.poll_expiry(start + EXPIRY));

    assert_eq!(validator.status(), ValidatorStatus::Idle);
    assert!(validator.state().card().is_none());
    assert_eq!(validator.history().last().unwrap().trigger, EXPIRE_TRIGGER);
}

#[test]
fn malformed_pan_is_tolerated() {
    let command = parse("PAN:123");
    assert_eq!(
        command,
        ParsedCommand::PresentCard {
            pan: "123".to_string(),
            expiry: String::new(),
        }
    );

    let mut validator = Validator::new(EXPIRY);
    validator.apply(command, Instant::now());

    assert_eq!(validator.status(), ValidatorStatus::AwaitingCard);
    assert_eq!(validator.state().card().unwrap().expiry, "");

    let frame = DisplayFrame::from_state(validator.state(), &TerminalConfig::default());
    assert_eq!(frame.detail, "Expiry: ");
}

/// Observed (status, pan, elapsed since start) after each state change.
type Observation = (ValidatorStatus, Option<String>, Duration);

async fn run_script(
    mode: InputMode,
    script: Vec<(Duration, &'static str)>,
    tail: Duration,
) -> (Vec<Observation>, Validator) {
    let chunks = script
        .into_iter()
        .map(|(delay, line)| (delay, format!("{line}\n").into_bytes()))
        .collect();
    run_bytes(mode, chunks, tail).await
}

/// Feed raw byte chunks, each after its delay, then keep the pipe open for `tail`.
async fn run_bytes(
    mode: InputMode,
    chunks: Vec<(Duration, Vec<u8>)>,
    tail: Duration,
) -> (Vec<Observation>, Validator) {
    let (reader, mut writer) = tokio::io::duplex(256);

    let feeder = tokio::spawn(async move {
        for (delay, bytes) in chunks {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            writer.write_all(&bytes).await.unwrap();
        }
        if !tail.is_zero() {
            sleep(tail).await;
        }
    });

    let start = TokioClock.now();
    let mut terminal = Terminal::new(Validator::new(EXPIRY)).with_mode(mode);
    let mut seen = Vec::new();
    terminal
        .run(LineSource::new(BufReader::new(reader)), |state| {
            seen.push((
                state.status(),
                state.card().map(|c| c.pan.clone()),
                TokioClock.now() - start,
            ));
        })
        .await
        .unwrap();
    feeder.await.unwrap();

    (seen, terminal.into_validator())
}

#[tokio::test(start_paused = true)]
async fn runtime_expires_card_at_deadline() {
    let (seen, validator) = run_script(
        InputMode::Tokens,
        vec![(Duration::ZERO, "PAN:7123456;EXP:2405")],
        Duration::from_secs(20),
    )
    .await;

    let changes: Vec<_> = seen
        .iter()
        .map(|(status, pan, _)| (*status, pan.clone()))
        .collect();
    assert_eq!(
        changes,
        vec![
            (ValidatorStatus::Idle, None),
            (ValidatorStatus::AwaitingCard, Some("7123456".to_string())),
            (ValidatorStatus::Idle, None),
        ]
    );
    assert_near(seen[1].2, Duration::ZERO);
    assert_near(seen[2].2, EXPIRY);
    assert_eq!(validator.status(), ValidatorStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn runtime_second_card_postpones_expiry() {
    let (seen, _) = run_script(
        InputMode::Tokens,
        vec![
            (Duration::ZERO, "PAN:111;EXP:2401"),
            (Duration::from_secs(3), "PAN:222;EXP:2502"),
        ],
        Duration::from_secs(20),
    )
    .await;

    let expiries: Vec<_> = seen
        .iter()
        .skip(1)
        .filter(|(status, _, _)| *status == ValidatorStatus::Idle)
        .collect();
    assert_eq!(expiries.len(), 1);
    assert_near(expiries[0].2, Duration::from_secs(3) + EXPIRY);

    let cards: Vec<_> = seen.iter().filter_map(|(_, pan, _)| pan.clone()).collect();
    assert_eq!(cards, vec!["111".to_string(), "222".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn runtime_verdict_cancels_pending_expiry() {
    let (seen, validator) = run_script(
        InputMode::Tokens,
        vec![
            (Duration::ZERO, "PAN:42;EXP:2405"),
            (Duration::from_secs(2), "1"),
            (Duration::from_millis(100), "???"),
        ],
        Duration::from_secs(20),
    )
    .await;

    let statuses: Vec<_> = seen.iter().map(|(status, _, _)| *status).collect();
    assert_eq!(
        statuses,
        vec![
            ValidatorStatus::Idle,
            ValidatorStatus::AwaitingCard,
            ValidatorStatus::Declined,
        ]
    );
    assert_eq!(validator.status(), ValidatorStatus::Declined);
}

#[tokio::test(start_paused = true)]
async fn runtime_key_bindings() {
    let (seen, validator) = run_script(
        InputMode::Keys,
        vec![
            (Duration::ZERO, "t"),
            (Duration::from_secs(1), "0"),
            (Duration::from_secs(1), "q"),
            (Duration::from_secs(1), "Escape"),
        ],
        Duration::ZERO,
    )
    .await;

    let statuses: Vec<_> = seen.iter().map(|(status, _, _)| *status).collect();
    assert_eq!(
        statuses,
        vec![
            ValidatorStatus::Idle,
            ValidatorStatus::AwaitingCard,
            ValidatorStatus::Approved,
            ValidatorStatus::Idle,
        ]
    );
    assert_eq!(validator.history().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn runtime_survives_invalid_utf8_line() {
    let (seen, validator) = run_bytes(
        InputMode::Tokens,
        vec![
            (Duration::ZERO, b"PAN:1;EXP:2405\n".to_vec()),
            (Duration::from_millis(100), b"\xff\xfe\n".to_vec()),
            (Duration::from_millis(100), b"0\r\n".to_vec()),
        ],
        Duration::ZERO,
    )
    .await;

    let statuses: Vec<_> = seen.iter().map(|(status, _, _)| *status).collect();
    assert_eq!(
        statuses,
        vec![
            ValidatorStatus::Idle,
            ValidatorStatus::AwaitingCard,
            ValidatorStatus::Approved,
        ]
    );
    assert_eq!(validator.status(), ValidatorStatus::Approved);
}

#[tokio::test(start_paused = true)]
async fn runtime_ignores_padded_tokens() {
    let (seen, validator) = run_script(
        InputMode::Tokens,
        vec![
            (Duration::ZERO, "PAN:9;EXP:2405"),
            (Duration::from_millis(100), " 0"),
            (Duration::from_millis(100), "1\t"),
        ],
        Duration::from_secs(20),
    )
    .await;

    let statuses: Vec<_> = seen.iter().map(|(status, _, _)| *status).collect();
    assert_eq!(
        statuses,
        vec![
            ValidatorStatus::Idle,
            ValidatorStatus::AwaitingCard,
            ValidatorStatus::Idle,
        ]
    );
    assert_eq!(validator.history().last().unwrap().trigger, EXPIRE_TRIGGER);
}
