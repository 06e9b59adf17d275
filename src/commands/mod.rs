pub mod render;
pub mod rules;
pub mod run;

use crate::rules::SeverityFilter;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "brudi-gate")]
#[command(about = "AST rule gate for React + Tailwind projects", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Debug logging on stderr (BRUDI_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a project and exit 1 when any error-severity rule fires
    Run {
        /// Project root to analyze
        project_dir: PathBuf,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
        /// Output format (overridden by --json)
        #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
        format: OutputFormat,
        /// Which severities the human output lists
        #[arg(long, value_enum, default_value_t = SeverityFilter::All)]
        severity: SeverityFilter,
    },
    /// List every rule with its severity, plus the active thresholds
    Rules {
        /// Project whose .brudirc.toml supplies the thresholds
        #[arg(default_value = ".")]
        project_dir: PathBuf,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Sarif,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from(["brudi-gate", "run", "site", "--json", "--severity=error"]).unwrap();
        match cli.command {
            Commands::Run { project_dir, json, format, severity } => {
                assert_eq!(project_dir, PathBuf::from("site"));
                assert!(json);
                assert_eq!(format, OutputFormat::Human);
                assert_eq!(severity, SeverityFilter::Error);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_severity_defaults_to_all() {
        let cli = Cli::try_parse_from(["brudi-gate", "run", "."]).unwrap();
        let Commands::Run { severity, .. } = cli.command else {
            panic!("expected run");
        };
        assert_eq!(severity, SeverityFilter::All);
    }

    #[test]
    fn test_rejects_unknown_severity() {
        assert!(Cli::try_parse_from(["brudi-gate", "run", ".", "--severity=info"]).is_err());
    }
}
