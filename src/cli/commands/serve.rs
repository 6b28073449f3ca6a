//! serve command - Serve the GitHub onboarding webhook

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use tracing::info;

use super::{fossa_client, open_store, runtime};
use crate::cli::Context;
use crate::onboarding::{build_router, AppState};

/// Listen for webhook deliveries until the process is stopped.
pub fn serve(
    ctx: &Context,
    db: Option<PathBuf>,
    addr: Option<String>,
    webhook_secret: Option<String>,
) -> Result<()> {
    let secret = webhook_secret
        .filter(|s| !s.is_empty())
        .or_else(|| ctx.config.webhook_secret().map(str::to_string));
    let Some(secret) = secret else {
        bail!(
            "webhook secret not set: pass --webhook-secret or export ${}",
            ctx.config.webhook_secret_env()
        );
    };
    let addr = addr.unwrap_or_else(|| ctx.config.server_addr().to_string());
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("invalid listen address {:?}", addr))?;

    let state = Arc::new(AppState {
        store: Arc::new(open_store(ctx, db)?),
        provider: Arc::new(fossa_client(ctx)?),
        secret,
        service: ctx.config.fossa_service().to_string(),
    });

    runtime()?.block_on(listen(addr, state))
}

async fn listen(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "listening for webhook deliveries on /webhook");
    axum::serve(listener, build_router(state))
        .await
        .context("webhook server stopped")
}
