//! engine::invite
//!
//! Invitation consumer: turns `missing_externally` identities into FOSSA
//! organization invitations and audit log entries.
//!
//! Provider responses are classified, never propagated. An address that is
//! already invited or already a member needs no action, and a failure for
//! one address does not stop the others.
//!
//! Organization users and pending invitations are listed once per batch so
//! known addresses are classified without sending anything. If a listing
//! fails, the invitation response is used instead.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::identity::{normalize, NormalizedIdentity};
use crate::core::types::{AuditEvent, Project, ServiceId};
use crate::fossa::{FossaError, MembershipProvider};
use crate::store::{Store, StoreError};

/// Audit action for a sent invitation.
pub const ACTION_INVITE_SENT: &str = "INVITE_SENT";
/// Audit action for an address with a pending invitation.
pub const ACTION_INVITE_PENDING: &str = "INVITE_PENDING";
/// Audit action for an address that already belongs to the organization.
pub const ACTION_ALREADY_MEMBER: &str = "ALREADY_MEMBER";
/// Audit action for a failed invitation.
pub const ACTION_INVITE_FAILED: &str = "INVITE_FAILED";

/// Result of one invitation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum InvitationStatus {
    Sent,
    AlreadyInvited,
    AlreadyMember,
    Failed(String),
}

impl InvitationStatus {
    fn from_result(result: Result<(), FossaError>) -> Self {
        match result {
            Ok(()) => InvitationStatus::Sent,
            Err(FossaError::InviteAlreadyExists(_)) => InvitationStatus::AlreadyInvited,
            Err(FossaError::UserAlreadyMember(_)) => InvitationStatus::AlreadyMember,
            Err(err) => InvitationStatus::Failed(err.to_string()),
        }
    }

    fn action(&self) -> &'static str {
        match self {
            InvitationStatus::Sent => ACTION_INVITE_SENT,
            InvitationStatus::AlreadyInvited => ACTION_INVITE_PENDING,
            InvitationStatus::AlreadyMember => ACTION_ALREADY_MEMBER,
            InvitationStatus::Failed(_) => ACTION_INVITE_FAILED,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, InvitationStatus::Failed(_))
    }
}

/// An invitation attempt for one address on behalf of one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invitation {
    pub project: String,
    pub email: String,
    #[serde(flatten)]
    pub status: InvitationStatus,
}

/// Addresses the organization already knows.
#[derive(Debug, Default)]
struct KnownAddresses {
    members: BTreeSet<NormalizedIdentity>,
    pending: BTreeSet<NormalizedIdentity>,
}

impl KnownAddresses {
    async fn fetch(provider: &dyn MembershipProvider) -> Self {
        let mut known = KnownAddresses::default();

        match provider.fetch_users().await {
            Ok(users) => {
                known.members = users.iter().filter_map(|u| normalize(&u.email).ok()).collect()
            }
            Err(err) => warn!(error = %err, "could not list organization users"),
        }
        match provider.fetch_user_invitations().await {
            Ok(invitations) => {
                known.pending = invitations
                    .iter()
                    .filter_map(|i| normalize(&i.email).ok())
                    .collect()
            }
            Err(err) => warn!(error = %err, "could not list pending invitations"),
        }

        debug!(
            members = known.members.len(),
            pending = known.pending.len(),
            "listed organization addresses"
        );
        known
    }

    fn status(&self, email: &NormalizedIdentity) -> Option<InvitationStatus> {
        if self.members.contains(email) {
            Some(InvitationStatus::AlreadyMember)
        } else if self.pending.contains(email) {
            Some(InvitationStatus::AlreadyInvited)
        } else {
            None
        }
    }
}

/// Invite every address in `missing` and record each attempt.
///
/// # Errors
///
/// Only audit log failures are returned.
pub async fn invite_missing(
    store: &Store,
    provider: &dyn MembershipProvider,
    project: &Project,
    service_id: ServiceId,
    missing: &[NormalizedIdentity],
) -> Result<Vec<Invitation>, StoreError> {
    let mut invitations = Vec::with_capacity(missing.len());
    if missing.is_empty() {
        return Ok(invitations);
    }
    let known = KnownAddresses::fetch(provider).await;

    for email in missing {
        let status = match known.status(email) {
            Some(status) => status,
            None => {
                InvitationStatus::from_result(provider.send_user_invitation(email.as_str()).await)
            }
        };
        match &status {
            InvitationStatus::Failed(err) => {
                warn!(project = %project.name, %email, error = %err, "invitation failed")
            }
            status => info!(project = %project.name, %email, ?status, "invitation"),
        }

        let mut event = AuditEvent::new(status.action())
            .project(project.id)
            .service(service_id)
            .message(audit_message(&status, email.as_str(), provider.name()));
        if let Some(maintainer) = store.maintainer_by_email(email.as_str())? {
            event = event.maintainer(maintainer.id);
        }
        store.log_audit_event(&event)?;

        invitations.push(Invitation {
            project: project.name.clone(),
            email: email.to_string(),
            status,
        });
    }

    Ok(invitations)
}

fn audit_message(status: &InvitationStatus, email: &str, provider: &str) -> String {
    match status {
        InvitationStatus::Sent => format!("invited {} to {}", email, provider),
        InvitationStatus::AlreadyInvited => {
            format!("{} already has a pending {} invitation", email, provider)
        }
        InvitationStatus::AlreadyMember => format!("{} is already a {} member", email, provider),
        InvitationStatus::Failed(err) => {
            format!("inviting {} to {} failed: {}", email, provider, err)
        }
    }
}
