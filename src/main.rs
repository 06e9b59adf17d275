//! # Brudi AST Gate
//!
//! Blocks a generated React + Tailwind project when any error-severity rule
//! fires. Structural, utility-class, token, semantic and import-graph
//! analyzers run over one parse of the project.

use clap::Parser;
use commands::{Cli, Commands, OutputFormat};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod files;
mod rules;

fn init_logging(verbose: bool) {
    let default = if verbose { "brudi_gate=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("BRUDI_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match cli.command {
        Commands::Run { project_dir, json, format, severity } => {
            let format = if json { OutputFormat::Json } else { format };
            commands::run::handle_run(&project_dir, format, severity)
        }
        Commands::Rules { project_dir } => commands::rules::handle_rules_command(&project_dir),
    };
    std::process::exit(code);
}
