//! config command - Show the effective configuration

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::ui::output;

/// Print the effective configuration with secrets redacted.
pub fn config(ctx: &Context, json: bool) -> Result<()> {
    let effective = ctx.config.redacted();
    if json {
        output::json(&effective)?;
    } else {
        let text = toml::to_string_pretty(&effective).context("failed to render configuration")?;
        print!("{}", text);
    }
    Ok(())
}
