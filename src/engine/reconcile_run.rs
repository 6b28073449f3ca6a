//! engine::reconcile_run
//!
//! One reconciliation pass over every project with a team on a service.
//!
//! # Lifecycle
//!
//! ```text
//! collect_snapshots -> reconcile_all -> consumers (log, invite)
//! ```
//!
//! Fetching is the only step that talks to the provider before the
//! consumers run. A team whose members cannot be fetched is reported in
//! `skipped` and the pass carries on with the remaining projects.
//!
//! # Example
//!
//! ```ignore
//! use maintainerd::engine::{run, RunOptions};
//!
//! let report = run(&store, &client, &RunOptions { invite: true, ..Default::default() }).await?;
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::invite::{invite_missing, Invitation};
use crate::core::config::DEFAULT_FOSSA_SERVICE;
use crate::core::types::{Project, ProjectId};
use crate::fossa::{team_settings_url, MembershipProvider};
use crate::reconcile::{reconcile_all, ProjectMembershipSnapshot, ReconciliationOutcome};
use crate::store::{Store, StoreError};

/// What a pass does besides reconciling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Service whose teams are reconciled.
    pub service: String,
    /// Invite registered maintainers missing from their team.
    pub invite: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            service: DEFAULT_FOSSA_SERVICE.to_string(),
            invite: false,
        }
    }
}

/// A team left out of the pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedTeam {
    pub project: String,
    pub team_id: i64,
    pub reason: String,
    pub settings_url: String,
}

/// Snapshots ready for reconciliation, plus what could not be fetched.
#[derive(Debug, Clone, Default)]
pub struct CollectedSnapshots {
    pub snapshots: Vec<ProjectMembershipSnapshot>,
    pub projects: BTreeMap<ProjectId, Project>,
    pub skipped: Vec<SkippedTeam>,
}

/// Reconciliation result for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectReport {
    pub project_id: ProjectId,
    pub project: String,
    #[serde(flatten)]
    pub outcome: ReconciliationOutcome,
}

/// Everything a pass found and did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub service: String,
    pub projects: Vec<ProjectReport>,
    pub invitations: Vec<Invitation>,
    pub skipped: Vec<SkippedTeam>,
}

impl RunReport {
    /// Projects whose registered maintainers are all on the team.
    pub fn covered(&self) -> usize {
        self.projects.iter().filter(|p| p.outcome.fully_covered).count()
    }

    /// Registered identities missing externally, across all projects.
    pub fn missing(&self) -> usize {
        self.projects
            .iter()
            .map(|p| p.outcome.missing_externally.len())
            .sum()
    }
}

/// E-mails of a project's registered maintainers, placeholders excluded.
pub fn registered_emails(store: &Store, project_id: ProjectId) -> Result<Vec<String>, StoreError> {
    Ok(store
        .maintainers_by_project(project_id)?
        .into_iter()
        .filter(|m| m.has_email())
        .map(|m| m.email)
        .collect())
}

/// Capture registered and external membership for every team of a service.
///
/// Teams are visited in project id order.
///
/// # Errors
///
/// Registry failures, including an unknown service. Provider failures are
/// reported as skipped teams instead.
pub async fn collect_snapshots(
    store: &Store,
    provider: &dyn MembershipProvider,
    service_name: &str,
) -> Result<CollectedSnapshots, StoreError> {
    let mut collected = CollectedSnapshots::default();

    for team in store.service_teams_for_service(service_name)? {
        let project = store.project_by_id(team.project_id)?;

        let external = match provider.fetch_team_member_emails(team.remote_id).await {
            Ok(emails) => emails,
            Err(err) => {
                let settings_url = team_settings_url(team.remote_id);
                warn!(
                    project = %project.name,
                    team_id = team.remote_id,
                    error = %err,
                    "could not fetch team members, check {}",
                    settings_url
                );
                collected.skipped.push(SkippedTeam {
                    project: project.name.clone(),
                    team_id: team.remote_id,
                    reason: err.to_string(),
                    settings_url,
                });
                continue;
            }
        };

        let registered = registered_emails(store, project.id)?;
        debug!(
            project = %project.name,
            registered = registered.len(),
            external = external.len(),
            "captured membership"
        );
        collected
            .snapshots
            .push(ProjectMembershipSnapshot::new(project.id, registered, external));
        collected.projects.insert(project.id, project);
    }

    Ok(collected)
}

/// Reconcile every team of `options.service` and run the consumers.
pub async fn run(
    store: &Store,
    provider: &dyn MembershipProvider,
    options: &RunOptions,
) -> Result<RunReport, StoreError> {
    let service = store.service_by_name(&options.service)?;
    let CollectedSnapshots {
        snapshots,
        projects,
        skipped,
    } = collect_snapshots(store, provider, &options.service).await?;

    let mut report = RunReport {
        service: service.name.clone(),
        skipped,
        ..Default::default()
    };

    for (project_id, outcome) in reconcile_all(&snapshots) {
        let Some(project) = projects.get(&project_id) else {
            continue;
        };
        log_outcome(project, &outcome);

        if options.invite && !outcome.missing_externally.is_empty() {
            let sent = invite_missing(
                store,
                provider,
                project,
                service.id,
                &outcome.missing_externally,
            )
            .await?;
            report.invitations.extend(sent);
        }

        report.projects.push(ProjectReport {
            project_id,
            project: project.name.clone(),
            outcome,
        });
    }

    info!(
        service = %report.service,
        projects = report.projects.len(),
        covered = report.covered(),
        missing = report.missing(),
        skipped = report.skipped.len(),
        invitations = report.invitations.len(),
        "reconciliation pass complete"
    );
    Ok(report)
}

fn log_outcome(project: &Project, outcome: &ReconciliationOutcome) {
    info!(
        project = %project.name,
        fully_covered = outcome.fully_covered,
        missing = outcome.missing_externally.len(),
        unregistered = outcome.unregistered_external.len(),
        "reconciled"
    );
    if outcome.discarded.total() > 0 {
        warn!(
            project = %project.name,
            registered = outcome.discarded.registered,
            external = outcome.discarded.external,
            "discarded invalid identities"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::EMAIL_MISSING;
    use crate::engine::invite::InvitationStatus;
    use crate::fossa::mock::{FailOn, MockProvider};
    use crate::fossa::FossaError;
    use crate::store::{NewMaintainer, NewProject};

    fn rt() -> tokio::runtime::Runtime {
        tokio::runtime::Runtime::new().unwrap()
    }

    /// Registry with one project per entry, linked to FOSSA team `id`.
    fn store_with(projects: &[(i64, &str, &[&str])]) -> Store {
        let store = Store::open_in_memory().unwrap();
        let service = store.upsert_service("FOSSA", "").unwrap();
        for (team_id, name, emails) in projects {
            let project = store
                .transaction(|tx| {
                    let project = tx.upsert_project(&NewProject::named(*name))?;
                    for email in *emails {
                        let m = tx.upsert_maintainer(&NewMaintainer {
                            name: email.to_string(),
                            email: email.to_string(),
                            ..Default::default()
                        })?;
                        tx.link_maintainer_project(m.id, project.id)?;
                    }
                    Ok(project)
                })
                .unwrap();
            store
                .upsert_service_team(project.id, service.id, *team_id, Some(*name))
                .unwrap();
        }
        store
    }

    #[test]
    fn collects_in_project_order_and_skips_failures() {
        let store = store_with(&[(1, "alpha", &["a@x.org"]), (2, "beta", &["b@x.org"])]);
        let provider = MockProvider::new()
            .with_team(1, "alpha", &["a@x.org"])
            .with_team(2, "beta", &[])
            .fail_on(FailOn::FetchTeamMembers(2, FossaError::RateLimited));

        let collected = rt()
            .block_on(collect_snapshots(&store, &provider, "FOSSA"))
            .unwrap();
        assert_eq!(collected.snapshots.len(), 1);
        assert_eq!(collected.snapshots[0].external, vec!["a@x.org"]);
        assert_eq!(collected.skipped.len(), 1);
        assert_eq!(collected.skipped[0].project, "beta");
        assert!(collected.skipped[0].settings_url.ends_with("/teams/2"));
    }

    #[test]
    fn placeholder_emails_are_not_registered() {
        let store = store_with(&[(1, "alpha", &[])]);
        let project = store.project_by_name("alpha").unwrap().unwrap();
        store
            .transaction(|tx| {
                let m = tx.upsert_maintainer(&NewMaintainer {
                    name: "No Mail".into(),
                    ..Default::default()
                })?;
                tx.link_maintainer_project(m.id, project.id)
            })
            .unwrap();

        let emails = registered_emails(&store, project.id).unwrap();
        assert!(emails.is_empty());
        assert_eq!(
            store.maintainers_by_project(project.id).unwrap()[0].email,
            EMAIL_MISSING
        );
    }

    #[test]
    fn run_reports_without_inviting() {
        let store = store_with(&[(1, "alpha", &["a@x.org", "b@x.org"])]);
        let provider = MockProvider::new().with_team(1, "alpha", &["A@X.org", "c@x.org"]);

        let report = rt()
            .block_on(run(&store, &provider, &RunOptions::default()))
            .unwrap();
        assert_eq!(report.projects.len(), 1);
        let outcome = &report.projects[0].outcome;
        assert!(!outcome.fully_covered);
        assert_eq!(outcome.missing_externally[0].as_str(), "b@x.org");
        assert_eq!(outcome.unregistered_external[0].as_str(), "c@x.org");
        assert!(report.invitations.is_empty());
        assert!(provider.invited_emails().is_empty());
    }

    #[test]
    fn run_invites_missing() {
        let store = store_with(&[
            (1, "alpha", &["a@x.org", "b@x.org"]),
            (2, "beta", &["c@x.org"]),
        ]);
        let provider = MockProvider::new()
            .with_team(1, "alpha", &["a@x.org"])
            .with_team(2, "beta", &["c@x.org"]);

        let options = RunOptions {
            invite: true,
            ..Default::default()
        };
        let report = rt().block_on(run(&store, &provider, &options)).unwrap();
        assert_eq!(report.covered(), 1);
        assert_eq!(report.missing(), 1);
        assert_eq!(provider.invited_emails(), vec!["b@x.org"]);
        assert_eq!(report.invitations[0].status, InvitationStatus::Sent);
        assert_eq!(report.invitations[0].project, "alpha");
    }

    #[test]
    fn unknown_service_is_error() {
        let store = store_with(&[]);
        let provider = MockProvider::new();
        let options = RunOptions {
            service: "Snyk".into(),
            ..Default::default()
        };
        let result = rt().block_on(run(&store, &provider, &options));
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }
}
