//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Read configuration from this file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// maintainerd - CNCF maintainer registry and FOSSA onboarding
#[derive(Parser, Debug)]
#[command(name = "maintainerd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (overrides $MAINTAINERD_CONFIG and default locations)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the registry and load it from the maintainer worksheet
    #[command(
        long_about = "Create the registry and load it from the maintainer worksheet.\n\n\
            The schema is always created. Unless --no-seed is given, the known services \
            are registered, every worksheet row is loaded (rows that fail are skipped and \
            reported) and FOSSA teams are linked to the projects they are named after.",
        after_help = "\
EXAMPLES:
    # Load from a CSV export
    maintainerd bootstrap --csv maintainers.csv

    # Load from the live worksheet ($MD_WORKSHEET and $GOOGLE_API_KEY set)
    maintainerd bootstrap

    # Schema only
    maintainerd bootstrap --no-seed"
    )]
    Bootstrap {
        /// Registry database file
        #[arg(long, value_name = "PATH")]
        db: Option<PathBuf>,

        /// Read the worksheet from a CSV export
        #[arg(long, value_name = "FILE", conflicts_with_all = ["sheet_id", "range"])]
        csv: Option<PathBuf>,

        /// Google spreadsheet id (overrides $MD_WORKSHEET)
        #[arg(long, value_name = "ID")]
        sheet_id: Option<String>,

        /// Worksheet range, header row included
        #[arg(long, value_name = "RANGE")]
        range: Option<String>,

        /// Only create the schema
        #[arg(long)]
        no_seed: bool,

        /// Do not link FOSSA teams
        #[arg(long)]
        skip_fossa: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare registered maintainers with their FOSSA teams
    #[command(
        long_about = "Compare registered maintainers with their FOSSA teams.\n\n\
            Every project with a team on the service is reconciled. Maintainers missing \
            from their team are reported and, with --invite, invited to the organization. \
            Teams whose members cannot be fetched are reported and skipped.",
        after_help = "\
EXAMPLES:
    # Report only
    maintainerd reconcile

    # Invite missing maintainers and print a JSON report
    maintainerd reconcile --invite --json"
    )]
    Reconcile {
        /// Registry database file
        #[arg(long, value_name = "PATH")]
        db: Option<PathBuf>,

        /// Service whose teams are reconciled
        #[arg(long, value_name = "NAME")]
        service: Option<String>,

        /// Invite maintainers missing from their team
        #[arg(long)]
        invite: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve the GitHub onboarding webhook
    Serve {
        /// Registry database file
        #[arg(long, value_name = "PATH")]
        db: Option<PathBuf>,

        /// Listen address
        #[arg(long, value_name = "ADDR")]
        addr: Option<String>,

        /// Webhook secret (overrides $GITHUB_WEBHOOK_SECRET)
        #[arg(long, value_name = "SECRET")]
        webhook_secret: Option<String>,
    },

    /// Show the effective configuration
    Config {
        /// Print as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["maintainerd", "reconcile", "--debug", "-q"]).unwrap();
        assert!(cli.debug);
        assert!(cli.quiet);
        assert!(matches!(cli.command, Command::Reconcile { invite: false, .. }));
    }

    #[test]
    fn csv_conflicts_with_sheet() {
        let result = Cli::try_parse_from([
            "maintainerd",
            "bootstrap",
            "--csv",
            "a.csv",
            "--sheet-id",
            "x",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_bootstrap_flags() {
        let cli = Cli::try_parse_from([
            "maintainerd",
            "--config",
            "/tmp/c.toml",
            "bootstrap",
            "--db",
            "/tmp/x.db",
            "--no-seed",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.toml")));
        match cli.command {
            Command::Bootstrap { db, no_seed, .. } => {
                assert_eq!(db, Some(PathBuf::from("/tmp/x.db")));
                assert!(no_seed);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
