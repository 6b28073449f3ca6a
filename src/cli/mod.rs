//! cli
//!
//! Command-line interface layer for maintainerd.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and resolve secrets
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It turns flags and configuration into calls on
//! [`crate::bootstrap`], [`crate::engine`] and [`crate::onboarding`], and
//! formats what they return.

pub mod args;
pub mod commands;

pub use args::{Cli, Command, Shell};

use anyhow::{Context as _, Result};

use crate::core::config::Config;
use crate::ui::output::{self, Verbosity};

/// State shared by every command handler.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub verbosity: Verbosity,
}

/// Run a parsed command line.
///
/// This is the main entry point called from `main.rs`.
pub fn run(cli: Cli) -> Result<()> {
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);

    // Completion needs no configuration.
    if let Command::Completion { shell } = cli.command {
        return commands::completion(shell);
    }

    let loaded = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    for warning in &loaded.warnings {
        output::warn(
            format!("{} ({})", warning.message, warning.path.display()),
            verbosity,
        );
    }

    let ctx = Context {
        config: loaded.config,
        verbosity,
    };
    commands::dispatch(cli.command, &ctx)
}
