//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves flags against the configuration
//! 2. Calls into the library
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! Commands that talk to FOSSA, Google Sheets or serve HTTP are async
//! underneath. Handlers stay synchronous and build a tokio runtime to
//! `block_on` the work.

mod bootstrap;
mod completion;
mod config_cmd;
mod reconcile;
mod serve;

pub use bootstrap::{bootstrap, BootstrapArgs};
pub use completion::completion;
pub use config_cmd::config;
pub use reconcile::reconcile;
pub use serve::serve;

use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};

use super::args::Command;
use super::Context;
use crate::fossa::FossaClient;
use crate::store::Store;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Bootstrap {
            db,
            csv,
            sheet_id,
            range,
            no_seed,
            skip_fossa,
            json,
        } => bootstrap(
            ctx,
            BootstrapArgs {
                db,
                csv,
                sheet_id,
                range,
                seed: !no_seed,
                link_fossa: !skip_fossa,
                json,
            },
        ),
        Command::Reconcile {
            db,
            service,
            invite,
            json,
        } => reconcile(ctx, db, service, invite, json),
        Command::Serve {
            db,
            addr,
            webhook_secret,
        } => serve(ctx, db, addr, webhook_secret),
        Command::Config { json } => config(ctx, json),
        Command::Completion { shell } => completion(shell),
    }
}

/// Open the registry at `--db`, or the configured path.
///
/// The parent directory is created if needed.
pub(crate) fn open_store(ctx: &Context, db: Option<PathBuf>) -> Result<Store> {
    let path = db.unwrap_or_else(|| ctx.config.database_path());
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Store::open(&path).with_context(|| format!("failed to open registry at {}", path.display()))
}

/// A FOSSA client from the configured token and endpoint.
pub(crate) fn fossa_client(ctx: &Context) -> Result<FossaClient> {
    let Some(token) = ctx.config.fossa_token() else {
        bail!(
            "FOSSA API token not set: export ${}",
            ctx.config.fossa_token_env()
        );
    };
    Ok(FossaClient::with_api_base(
        token,
        ctx.config.fossa_api_base(),
        ctx.config.fossa_organization_id(),
    ))
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to start async runtime")
}
