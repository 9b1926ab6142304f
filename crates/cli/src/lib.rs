pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "catalog",
    about = "Product catalog operator CLI",
    long_about = "Inspect catalog-server configuration and check runtime readiness.",
    after_help = "Examples:\n  catalog start\n  catalog config\n  catalog doctor --json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Run startup preflight checks and return structured status output")]
    Start,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config and object storage reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

/// Loads `.env` from the working directory (or a parent) without overriding
/// variables already set, so the CLI reads the same settings as the server.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

pub fn run() -> ExitCode {
    load_dotenv();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Start => commands::start::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
