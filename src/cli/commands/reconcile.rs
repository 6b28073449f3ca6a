//! reconcile command - Compare registered maintainers with FOSSA teams

use std::path::PathBuf;

use anyhow::{Context as _, Result};

use super::{fossa_client, open_store, runtime};
use crate::cli::Context;
use crate::engine::{self, InvitationStatus, RunOptions, RunReport};
use crate::ui::output::{self, Verbosity};

/// Run one reconciliation pass and report it.
pub fn reconcile(
    ctx: &Context,
    db: Option<PathBuf>,
    service: Option<String>,
    invite: bool,
    json: bool,
) -> Result<()> {
    let store = open_store(ctx, db)?;
    let client = fossa_client(ctx)?;
    let options = RunOptions {
        service: service.unwrap_or_else(|| ctx.config.fossa_service().to_string()),
        invite,
    };

    let report = runtime()?
        .block_on(engine::run(&store, &client, &options))
        .with_context(|| format!("reconciliation against {} failed", options.service))?;

    if json {
        output::json(&report)?;
    } else {
        print_report(&report, ctx.verbosity);
    }
    Ok(())
}

fn print_report(report: &RunReport, v: Verbosity) {
    for project in &report.projects {
        let outcome = &project.outcome;
        if outcome.fully_covered {
            output::print(format!("{}: all maintainers on the team", project.project), v);
        } else {
            output::print(
                format!(
                    "{}: {} missing\n{}",
                    project.project,
                    outcome.missing_externally.len(),
                    output::format_list(&outcome.missing_externally, "  - ")
                ),
                v,
            );
        }
        if !outcome.unregistered_external.is_empty() {
            output::print(
                format!(
                    "  {} not in the registry",
                    output::plural(outcome.unregistered_external.len(), "team member")
                ),
                v,
            );
        }
    }

    for skipped in &report.skipped {
        output::warn(
            format!(
                "{}: skipped ({}), see {}",
                skipped.project, skipped.reason, skipped.settings_url
            ),
            v,
        );
    }

    for invitation in &report.invitations {
        let line = match &invitation.status {
            InvitationStatus::Sent => format!("invited {}", invitation.email),
            InvitationStatus::AlreadyInvited => format!("{} already invited", invitation.email),
            InvitationStatus::AlreadyMember => format!("{} already a member", invitation.email),
            InvitationStatus::Failed(err) => {
                output::warn(format!("inviting {} failed: {}", invitation.email, err), v);
                continue;
            }
        };
        output::print(format!("{}: {}", invitation.project, line), v);
    }

    output::print(
        format!(
            "{} of {} fully covered, {} missing",
            report.covered(),
            output::plural(report.projects.len(), "project"),
            output::plural(report.missing(), "maintainer")
        ),
        v,
    );
}
