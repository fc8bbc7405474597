// Entry point for the Minesweeper TUI application
// Parses flags, sets up optional file logging, loads the configuration and launches the UI

use clap::Parser;
use std::error::Error;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{Level, info};

use mspro::Difficulty;
use mspro::msp_config::load_or_create_config;
use mspro::msp_ui::run as run_ui;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Board preset to play (remembered for next time)
    #[arg(short, long, value_enum)]
    difficulty: Option<Difficulty>,

    /// Force a seed for mine placement instead of random
    #[arg(short, long)]
    seed: Option<u64>,

    /// Write a log to this file; the terminal itself is owned by the UI
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// More log detail (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(path: &Path, verbose: u8) -> Result<(), Box<dyn Error>> {
    let level = match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let file = File::create(path)?;
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path, args.verbose)?;
    }

    // Load or create user configuration (difficulty, preferences)
    let mut cfg = load_or_create_config();
    if let Some(difficulty) = args.difficulty {
        cfg.difficulty = difficulty;
    }
    info!(difficulty = cfg.difficulty.name(), seed = ?args.seed, "starting");

    // Launch the main UI loop
    run_ui(&mut cfg, args.seed)
}
