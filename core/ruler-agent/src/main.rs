//! ruler-agent: locks the desktop at a fixed minute on weekdays.
//!
//! ## Subcommands
//!
//! - `run` (default): start the agent; exits 1 if another agent holds the guard
//! - `status`: print the persisted state and exit
//!
//! ## Threads
//!
//! - main: the [`LockAgent`] actor, sole writer of the lock state
//! - `ruler-ticker`: sends a tick every poll interval
//! - `ruler-prompt` / `ruler-keep-on-top`: only while the prompt is up

mod prompt;

use clap::{Parser, Subcommand};
use ruler_core::agent::spawn_ticker;
use ruler_core::clock::{Clock, SystemClock};
use ruler_core::{InstanceGuard, LockAgent, RulerConfig, RulerError, StateStore};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;

use prompt::TerminalPrompt;

#[derive(Parser)]
#[command(name = "ruler-agent")]
#[command(about = "Locks the screen on weekday evenings")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $RULER_CONFIG, then the per-user config dir)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the lock agent
    Run,

    /// Print the persisted lock state
    Status,
}

fn main() -> ExitCode {
    let _logging_guard = ruler_core::logging::init("ruler-agent");
    let cli = Cli::parse();
    let config = load_config(cli.config);

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(config),
        Commands::Status => status(&config),
    }
}

fn load_config(explicit: Option<PathBuf>) -> RulerConfig {
    let path = match explicit {
        Some(path) => path,
        None => match ruler_core::paths::default_config_path() {
            Ok(path) => path,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to resolve config path; using defaults");
                return RulerConfig::default();
            }
        },
    };
    RulerConfig::load_or_default(&path)
}

fn run(config: RulerConfig) -> ExitCode {
    let _guard = match InstanceGuard::acquire_default() {
        Ok(guard) => guard,
        Err(RulerError::AlreadyRunning { holder }) => {
            tracing::error!(holder = ?holder, "Another instance is already running. Exiting.");
            println!("Another instance of the ruler agent is already running. Exiting.");
            return ExitCode::FAILURE;
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to acquire instance guard");
            println!("Error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let store = match StateStore::open_default() {
        Ok(store) => store,
        Err(err) => {
            tracing::error!(error = %err, "Failed to resolve state file path");
            println!("Error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(
        pid = std::process::id(),
        state_file = %store.path().display(),
        "Starting ruler agent"
    );

    let (events, receiver) = mpsc::channel();
    let prompt = TerminalPrompt::new(config.keep_on_top_interval());
    let poll_interval = config.poll_interval();
    let agent = LockAgent::new(config, store, SystemClock, prompt, events.clone());

    if let Err(err) = spawn_ticker(events, poll_interval) {
        tracing::error!(error = %err, "Failed to start ticker");
        println!("Error: {}", err);
        return ExitCode::FAILURE;
    }

    agent.run(receiver);
    ExitCode::SUCCESS
}

fn status(config: &RulerConfig) -> ExitCode {
    let store = match StateStore::open_default() {
        Ok(store) => store,
        Err(err) => {
            println!("Error: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let state = store.load();
    let phase = state.phase(SystemClock.now(), &config.schedule());
    println!("state file:     {}", store.path().display());
    println!("lock time:      {} (weekdays)", config.schedule());
    println!("is_locked:      {}", state.is_locked);
    println!("lock_triggered: {}", state.lock_triggered);
    println!("phase:          {}", phase);
    ExitCode::SUCCESS
}
