//! ruler-killer: stops the ruler agent and deletes its state file.
//!
//! ## Usage
//!
//! ```bash
//! ruler-killer <password>
//! ```
//!
//! The password is checked against the same config the agent reads.

use clap::Parser;
use ruler_core::process::SystemProcessTable;
use ruler_core::terminator::terminate_agents;
use ruler_core::{RulerConfig, RulerError, StateStore};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "ruler-killer")]
#[command(about = "Stop the ruler agent and clear its lock state")]
#[command(version)]
struct Cli {
    /// Unlock password
    #[arg(value_name = "PASSWORD")]
    password: String,

    /// Config file (defaults to $RULER_CONFIG, then the per-user config dir)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let _logging_guard = ruler_core::logging::init("ruler-killer");
    let cli = Cli::parse();

    match run(&cli) {
        Ok(killed) => {
            println!("Successfully killed {} TimeLock processes", killed);
            ExitCode::SUCCESS
        }
        Err(RulerError::IncorrectPassword) => {
            println!("Incorrect password!");
            ExitCode::FAILURE
        }
        Err(err) => {
            tracing::error!(error = %err, "Error killing processes");
            println!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<usize, RulerError> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => ruler_core::paths::default_config_path()?,
    };
    let config = RulerConfig::load_or_default(&config_path);
    let store = StateStore::open_default()?;

    let report = terminate_agents(&config.password, &cli.password, &SystemProcessTable, &store)?;
    Ok(report.killed)
}
