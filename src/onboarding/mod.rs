//! onboarding
//!
//! Signs projects up for FOSSA when their onboarding issue is labeled.
//!
//! # Flow
//!
//! ```text
//! POST /webhook -> verify signature -> issues/labeled "fossa"
//!   -> project name from title -> sign_project_up_for_fossa
//! ```
//!
//! Sign-up makes sure the project has a FOSSA team (creating one named after
//! the project, or reusing a team of that name), records it, reconciles the
//! project's maintainers against it and invites whoever is missing.
//!
//! # Modules
//!
//! - [`signature`] - `X-Hub-Signature-256` verification
//! - [`title`] - project names from issue titles
//! - [`server`] - the axum router

pub mod server;
pub mod signature;
pub mod title;

pub use server::{build_router, AppState};
pub use signature::verify_signature;
pub use title::project_name_from_title;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::core::types::{AuditEvent, Project};
use crate::engine::{invite_missing, registered_emails, Invitation};
use crate::fossa::{FossaError, MembershipProvider};
use crate::reconcile::{reconcile, ProjectMembershipSnapshot, ReconciliationOutcome};
use crate::store::{Store, StoreError};

/// Audit action for a team recorded against a project.
pub const ACTION_TEAM_LINKED: &str = "TEAM_LINKED";

/// Errors from webhook handling and sign-up.
#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error("invalid signature")]
    InvalidSignature,

    #[error("could not parse event: {0}")]
    Parse(String),

    #[error("no project name in issue title {0:?}")]
    InvalidTitle(String),

    #[error("unknown project: {0}")]
    UnknownProject(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("FOSSA: {0}")]
    Provider(#[from] FossaError),
}

/// Result of signing a project up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignUpOutcome {
    pub project: String,
    pub team_id: i64,
    /// The team was recorded against the project by this sign-up.
    pub team_linked: bool,
    pub outcome: ReconciliationOutcome,
    pub invitations: Vec<Invitation>,
}

/// Give `project` a team on the service and invite its maintainers.
///
/// Safe to repeat: an existing team is reused and invitees that are
/// already pending or members are classified rather than re-invited.
pub async fn sign_project_up_for_fossa(
    store: &Store,
    provider: &dyn MembershipProvider,
    project: &Project,
    service_name: &str,
) -> Result<SignUpOutcome, OnboardingError> {
    info!(project = %project.name, "signing project up for {}", service_name);
    let service = store.service_by_name(service_name)?;

    let (team_id, team_linked) = match store.service_team_by_project(project.id, service.id)? {
        Some(existing) => (existing.remote_id, false),
        None => {
            let team = provider.create_team(&project.name).await?;
            store.upsert_service_team(project.id, service.id, team.id, Some(&team.name))?;
            store.log_audit_event(
                &AuditEvent::new(ACTION_TEAM_LINKED)
                    .project(project.id)
                    .service(service.id)
                    .message(format!("linked {} team {} ({})", service.name, team.name, team.id)),
            )?;
            (team.id, true)
        }
    };

    let external = provider.fetch_team_member_emails(team_id).await?;
    let registered = registered_emails(store, project.id)?;
    let outcome = reconcile(&ProjectMembershipSnapshot::new(project.id, registered, external));

    let invitations = invite_missing(
        store,
        provider,
        project,
        service.id,
        &outcome.missing_externally,
    )
    .await?;

    Ok(SignUpOutcome {
        project: project.name.clone(),
        team_id,
        team_linked,
        outcome,
        invitations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::InvitationStatus;
    use crate::fossa::mock::{FailOn, MockOperation, MockProvider};
    use crate::store::{NewMaintainer, NewProject};

    fn rt() -> tokio::runtime::Runtime {
        tokio::runtime::Runtime::new().unwrap()
    }

    fn store_with_project(emails: &[&str]) -> (Store, Project) {
        let store = Store::open_in_memory().unwrap();
        store.upsert_service("FOSSA", "").unwrap();
        let project = store
            .transaction(|tx| {
                let project = tx.upsert_project(&NewProject::named("envoy"))?;
                for email in emails {
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
        (store, project)
    }

    #[test]
    fn creates_team_and_invites_everyone() {
        let (store, project) = store_with_project(&["a@x.org", "b@x.org"]);
        let provider = MockProvider::new();

        let signup = rt()
            .block_on(sign_project_up_for_fossa(&store, &provider, &project, "FOSSA"))
            .unwrap();
        assert!(signup.team_linked);
        assert_eq!(provider.team("envoy").map(|t| t.id), Some(signup.team_id));
        assert_eq!(provider.invited_emails(), vec!["a@x.org", "b@x.org"]);
        assert!(signup
            .invitations
            .iter()
            .all(|i| i.status == InvitationStatus::Sent));

        let service = store.service_by_name("FOSSA").unwrap();
        let team = store
            .service_team_by_project(project.id, service.id)
            .unwrap()
            .unwrap();
        assert_eq!(team.remote_id, signup.team_id);
    }

    #[test]
    fn reuses_recorded_team() {
        let (store, project) = store_with_project(&["a@x.org"]);
        let service = store.service_by_name("FOSSA").unwrap();
        store
            .upsert_service_team(project.id, service.id, 7, Some("envoy"))
            .unwrap();
        let provider = MockProvider::new().with_team(7, "envoy", &["a@x.org"]);

        let signup = rt()
            .block_on(sign_project_up_for_fossa(&store, &provider, &project, "FOSSA"))
            .unwrap();
        assert!(!signup.team_linked);
        assert!(signup.outcome.fully_covered);
        assert!(signup.invitations.is_empty());
        assert!(!provider
            .operations()
            .iter()
            .any(|op| matches!(op, MockOperation::CreateTeam { .. })));
    }

    #[test]
    fn repeated_signup_does_not_reinvite() {
        let (store, project) = store_with_project(&["a@x.org"]);
        let provider = MockProvider::new();
        let rt = rt();

        rt.block_on(sign_project_up_for_fossa(&store, &provider, &project, "FOSSA"))
            .unwrap();
        let again = rt
            .block_on(sign_project_up_for_fossa(&store, &provider, &project, "FOSSA"))
            .unwrap();
        assert_eq!(again.invitations[0].status, InvitationStatus::AlreadyInvited);
    }

    #[test]
    fn team_creation_failure_is_error() {
        let (store, project) = store_with_project(&["a@x.org"]);
        let provider = MockProvider::new().fail_on(FailOn::CreateTeam(FossaError::AuthFailed(
            "nope".into(),
        )));
        let result = rt().block_on(sign_project_up_for_fossa(&store, &provider, &project, "FOSSA"));
        assert!(matches!(
            result,
            Err(OnboardingError::Provider(FossaError::AuthFailed(_)))
        ));
    }
}
