//! Portwright — git-backed port registry maintenance CLI.
//!
//! # Usage
//!
//! ```text
//! portwright create <port> --repo <owner/name> (--ref <sha> | --source-dir <path>) [--version <v>] [--semver]
//! portwright update <port> [--ref <sha> | --source-dir <path>] [--version <v>]
//! portwright list [--json]
//! ```
//!
//! Every command accepts `--registry <path>` (default: current directory).
//!
//! Exit status is 0 on success, 1 when the request fails validation, and 2
//! for any other error.

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use commands::{create::CreateArgs, list::ListArgs, update::UpdateArgs};
use portwright_sync::SyncError;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "portwright",
    version,
    about = "Create and update ports in a git-backed vcpkg registry",
    long_about = None,
)]
struct Cli {
    /// Registry working tree (holds `ports/` and `versions/`).
    #[arg(long, global = true, default_value = ".")]
    registry: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a new port to the registry.
    Create(CreateArgs),

    /// Point an existing port at a new upstream ref or version.
    Update(UpdateArgs),

    /// Show every port in the baseline.
    List(ListArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let result: Result<()> = match cli.command {
        Commands::Create(args) => args.run(&cli.registry),
        Commands::Update(args) => args.run(&cli.registry),
        Commands::List(args) => args.run(&cli.registry),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_error(&err),
    }
}

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn report_error(err: &anyhow::Error) -> ExitCode {
    if let Some(SyncError::Validation(issues)) = err.downcast_ref::<SyncError>() {
        eprintln!("{}", "The request cannot be applied:".red().bold());
        for issue in issues {
            eprintln!("  - {issue}");
        }
        eprintln!("Resolve these errors and retry.");
        return ExitCode::from(1);
    }
    eprintln!("{} {err:#}", "error:".red().bold());
    ExitCode::from(2)
}
