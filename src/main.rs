use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use snake_duel::game::DuelConfig;
use snake_duel::modes::{HeadlessMode, SpectateMode};

#[derive(Parser)]
#[command(name = "snake_duel")]
#[command(version, about = "Two autonomous snakes duel on a wrapping grid")]
struct Cli {
    /// Run mode
    #[arg(long, default_value = "spectate")]
    mode: Mode,

    /// JSON file with a duel configuration; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Grid width
    #[arg(long)]
    cols: Option<usize>,

    /// Grid height
    #[arg(long)]
    rows: Option<usize>,

    /// Milliseconds between simulation ticks
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Milliseconds between a round ending and the next one starting
    #[arg(long)]
    restart_delay_ms: Option<u64>,

    /// Seed for reproducible duels
    #[arg(long)]
    seed: Option<u64>,

    /// Rounds to play in headless mode
    #[arg(long, default_value = "10")]
    rounds: u32,
}

#[derive(Clone, ValueEnum)]
enum Mode {
    /// Watch the duel in the terminal and bet on rounds
    Spectate,
    /// Play rounds on a simulated clock and print results as JSON lines
    Headless,
}

fn init_tracing() {
    // Stdout carries headless results
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: &Path) -> Result<DuelConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse config {}", path.display()))
}

fn build_config(cli: &Cli) -> Result<DuelConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DuelConfig::default(),
    };

    if let Some(cols) = cli.cols {
        config.cols = cols;
    }
    if let Some(rows) = cli.rows {
        config.rows = rows;
    }
    if let Some(tick_ms) = cli.tick_ms {
        config.tick_ms = tick_ms;
    }
    if let Some(restart_delay_ms) = cli.restart_delay_ms {
        config.restart_delay_ms = restart_delay_ms;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }

    if let Err(reason) = config.validate() {
        bail!("Invalid configuration: {reason}");
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = build_config(&cli)?;

    // Dispatch to appropriate mode
    match cli.mode {
        Mode::Spectate => {
            let mut spectate_mode = SpectateMode::new(config)?;
            spectate_mode.run().await?;
        }
        Mode::Headless => {
            let mut headless_mode = HeadlessMode::new(config, cli.rounds)?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let metrics = headless_mode.run(&mut out)?;
            eprintln!("{}", metrics.format_summary());
        }
    }

    Ok(())
}
