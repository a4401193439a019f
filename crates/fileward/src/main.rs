//! fileward command-line entry point
//!
//! One invocation performs one pass (or one half of a pass) and exits.
//! Scheduling is left to cron, systemd timers or similar.

use anyhow::Result;
use clap::{Parser, Subcommand};
use fileward::Steps;
use fileward_logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;

mod cli;

#[derive(Parser, Debug)]
#[command(
    name = "fileward",
    version,
    about = "Quarantine files unknown to an inventory and purge them after a retention window"
)]
struct Cli {
    /// Enable verbose logging (debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.fileward/config.toml)
    #[arg(long, global = true, env = "FILEWARD_CONFIG")]
    config: Option<PathBuf>,

    /// Defaults to `run`
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Reconcile the source folder, then purge expired quarantine
    Run(cli::run::PassArgs),

    /// Move unknown files into quarantine only
    Reconcile(cli::run::PassArgs),

    /// Purge expired quarantine only
    Sweep(cli::run::PassArgs),

    /// List quarantine records, their age and whether the file is present
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the resolved configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn command_wants_json(command: &Commands) -> bool {
    match command {
        Commands::Run(args) | Commands::Reconcile(args) | Commands::Sweep(args) => args.json,
        Commands::Status { json } => *json,
        Commands::Config { json } => *json,
    }
}

fn run_command(command: Commands, config: Option<PathBuf>) -> Result<()> {
    let config = config.as_deref();
    match command {
        Commands::Run(args) => cli::run::run(Steps::All, args, config),
        Commands::Reconcile(args) => cli::run::run(Steps::Reconcile, args, config),
        Commands::Sweep(args) => cli::run::run(Steps::Sweep, args, config),
        Commands::Status { json } => cli::status::run(cli::status::StatusArgs { json }, config),
        Commands::Config { json } => cli::config::run(cli::config::ConfigArgs { json }, config),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Commands::Run(cli::run::PassArgs::default()));
    let json_mode = command_wants_json(&command);

    if let Err(err) = init_logging(LogConfig {
        app_name: "fileward",
        verbose: cli.verbose,
        json_output: json_mode,
    }) {
        eprintln!("Warning: logging unavailable: {:#}", err);
    }

    match run_command(command, cli.config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else {
                eprint!("{}", cli::error::HelpfulError::from_anyhow(&err));
            }
            ExitCode::from(1)
        }
    }
}
