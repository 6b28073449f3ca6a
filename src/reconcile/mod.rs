//! reconcile
//!
//! Membership reconciliation between the maintainer registry and an external
//! team-membership provider.
//!
//! # Architecture
//!
//! The reconciler is a pure function over data the caller has already
//! fetched:
//!
//! ```text
//! ProjectMembershipSnapshot -> build_sets -> diff -> ReconciliationOutcome
//! ```
//!
//! - [`sets`] normalizes and de-duplicates both identity lists
//! - [`diff`] computes the two directional differences in sorted order
//!
//! Nothing here performs I/O, blocks or retries. Deciding what to do with an
//! outcome (log it, send invitations) belongs to the caller; see
//! [`crate::engine::reconcile_run`].
//!
//! # Invariants
//!
//! - `fully_covered` is true iff `missing_externally` is empty
//! - Output lists are sorted ascending and contain no duplicates
//! - The same snapshot always yields the same outcome
//!
//! # Example
//!
//! ```
//! use maintainerd::core::types::ProjectId;
//! use maintainerd::reconcile::{reconcile, ProjectMembershipSnapshot};
//!
//! let snapshot = ProjectMembershipSnapshot::new(
//!     ProjectId(1),
//!     vec!["a@x.org".into(), "b@x.org".into()],
//!     vec!["A@x.org".into()],
//! );
//!
//! let outcome = reconcile(&snapshot);
//! assert!(!outcome.fully_covered);
//! assert_eq!(outcome.missing_externally[0].as_str(), "b@x.org");
//! ```

pub mod diff;
pub mod sets;

pub use diff::{diff, MembershipDiff};
pub use sets::{build_sets, DiscardCounts, MembershipSets};

use serde::{Deserialize, Serialize};

use crate::core::identity::NormalizedIdentity;
use crate::core::types::ProjectId;

/// Raw membership of one project, captured for a single reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMembershipSnapshot {
    pub project: ProjectId,
    /// Identities of registered maintainers, as stored.
    pub registered: Vec<String>,
    /// Identities returned by the membership provider, as received.
    pub external: Vec<String>,
}

impl ProjectMembershipSnapshot {
    pub fn new(project: ProjectId, registered: Vec<String>, external: Vec<String>) -> Self {
        Self {
            project,
            registered,
            external,
        }
    }
}

/// Classified result of reconciling one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationOutcome {
    /// Every registered identity is present externally.
    pub fully_covered: bool,
    /// Registered identities absent externally; candidates for invitation.
    pub missing_externally: Vec<NormalizedIdentity>,
    /// External identities that are not registered maintainers.
    pub unregistered_external: Vec<NormalizedIdentity>,
    /// Raw identities dropped as invalid.
    pub discarded: DiscardCounts,
}

/// Reconcile one project's membership.
pub fn reconcile(snapshot: &ProjectMembershipSnapshot) -> ReconciliationOutcome {
    let sets = build_sets(&snapshot.registered, &snapshot.external);
    let MembershipDiff {
        missing_externally,
        unregistered_external,
    } = diff(&sets.registered, &sets.external);

    ReconciliationOutcome {
        fully_covered: missing_externally.is_empty(),
        missing_externally,
        unregistered_external,
        discarded: sets.discarded,
    }
}

/// Reconcile many projects independently, preserving input order.
pub fn reconcile_all(
    snapshots: &[ProjectMembershipSnapshot],
) -> Vec<(ProjectId, ReconciliationOutcome)> {
    snapshots
        .iter()
        .map(|snapshot| (snapshot.project, reconcile(snapshot)))
        .collect()
}
