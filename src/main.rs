use anyhow::Result;
use clap::{Parser, Subcommand};
use farebox::config::Overrides;
use farebox::display::{DisplayFrame, OutputFormat};
use farebox::runtime::LineSource;
use farebox::{parse, InputMode, Terminal, TerminalConfig, Validator};
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "farebox", version, about = "Transit fare validator terminal")]
struct Cli {
    #[arg(long, global = true, help = "Path to a JSON config file")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "How long a card stays on screen, in ms")]
    expiry_ms: Option<u64>,
    #[arg(long, global = true, help = "Show only the last four PAN digits")]
    mask_pan: bool,
    #[arg(long, global = true, help = "Output one JSON frame per state change")]
    json: bool,
    #[arg(short, long, global = true, help = "Enable debug logging")]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read command tokens from stdin, one per line
    Run,
    /// Read demo keys from stdin: 0 approve, 1 decline, t test card, esc reset
    Keys,
    /// Parse a single token and print the result
    Parse { token: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let overrides = Overrides {
        expiry_duration_ms: cli.expiry_ms,
        mask_pan: cli.mask_pan,
    };
    let config = TerminalConfig::load(cli.config.as_deref(), &overrides)?;

    let mode = match cli.command {
        Commands::Parse { token } => {
            println!("{}", serde_json::to_string(&parse(&token))?);
            return Ok(());
        }
        Commands::Run => InputMode::Tokens,
        Commands::Keys => InputMode::Keys,
    };

    let mut terminal = Terminal::new(Validator::from_config(&config)).with_mode(mode);
    let source = LineSource::new(BufReader::new(tokio::io::stdin()));
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    terminal
        .run(source, |state| {
            let frame = DisplayFrame::from_state(state, &config);
            match format.render(&frame) {
                Ok(out) => println!("{out}"),
                Err(e) => tracing::error!("Failed to encode frame: {}", e),
            }
        })
        .await?;

    let validator = terminal.into_validator();
    let history = validator.history();
    info!(
        "Stopped in {} after {} recorded transitions over {:?}",
        validator.status(),
        history.len(),
        history.span().unwrap_or_default()
    );
    Ok(())
}
