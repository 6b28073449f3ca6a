//! bootstrap command - Create and load the registry

use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};

use super::{fossa_client, open_store, runtime};
use crate::bootstrap::sheet::rows_from_values;
use crate::bootstrap::{
    self, BootstrapReport, CsvSheet, GoogleSheet, SheetAuth, SheetRow, SheetSource,
};
use crate::cli::Context;
use crate::fossa::MembershipProvider;
use crate::ui::output;

/// Resolved `bootstrap` flags.
#[derive(Debug, Clone, Default)]
pub struct BootstrapArgs {
    pub db: Option<PathBuf>,
    pub csv: Option<PathBuf>,
    pub sheet_id: Option<String>,
    pub range: Option<String>,
    pub seed: bool,
    pub link_fossa: bool,
    pub json: bool,
}

/// Create the registry and, when seeding, load it.
pub fn bootstrap(ctx: &Context, args: BootstrapArgs) -> Result<()> {
    let store = open_store(ctx, args.db.clone())?;
    let rt = runtime()?;

    let rows = if args.seed {
        read_rows(ctx, &args, &rt)?
    } else {
        Vec::new()
    };

    let client = if args.seed && args.link_fossa {
        Some(fossa_client(ctx).context("pass --skip-fossa to load without linking teams")?)
    } else {
        None
    };
    let provider = client.as_ref().map(|c| c as &dyn MembershipProvider);

    let report = rt
        .block_on(bootstrap::bootstrap(&store, &rows, provider, args.seed))
        .context("bootstrap failed")?;

    if args.json {
        output::json(&report)?;
    } else {
        print_report(&report, ctx);
    }
    Ok(())
}

fn read_rows(
    ctx: &Context,
    args: &BootstrapArgs,
    rt: &tokio::runtime::Runtime,
) -> Result<Vec<SheetRow>> {
    let values = match &args.csv {
        Some(path) => CsvSheet::new(path).values()?,
        None => {
            let Some(sheet_id) = args.sheet_id.as_deref().or(ctx.config.spreadsheet_id()) else {
                bail!("no worksheet: pass --csv FILE or --sheet-id ID, or set $MD_WORKSHEET");
            };
            let range = args.range.as_deref().unwrap_or(ctx.config.sheet_range());
            let auth = SheetAuth::from_parts(ctx.config.sheet_api_key(), ctx.config.sheet_token())
                .with_context(|| {
                    format!(
                        "export ${} or ${}",
                        ctx.config.sheet_api_key_env(),
                        ctx.config.sheet_token_env()
                    )
                })?;
            rt.block_on(GoogleSheet::new(sheet_id, range, auth).fetch_values())
                .context("failed to read worksheet")?
        }
    };
    Ok(rows_from_values(values)?)
}

fn print_report(report: &BootstrapReport, ctx: &Context) {
    let v = ctx.verbosity;
    if !report.seeded {
        output::print("Registry schema ready (seeding skipped)", v);
        return;
    }

    output::print(
        format!("Registered {}", output::plural(report.services, "service")),
        v,
    );
    if let Some(load) = &report.load {
        output::print(
            format!(
                "Loaded {} of {}",
                load.loaded,
                output::plural(load.rows, "row")
            ),
            v,
        );
        if load.skipped > 0 {
            output::warn(
                format!("{} skipped, see log for details", output::plural(load.skipped, "row")),
                v,
            );
        }
        if load.with_warnings > 0 {
            output::warn(
                format!(
                    "{} with blank fields",
                    output::plural(load.with_warnings, "maintainer")
                ),
                v,
            );
        }
    }
    if let Some(linked) = report.teams_linked {
        output::print(
            format!("Linked {}", output::plural(linked, "FOSSA team")),
            v,
        );
    }
}
