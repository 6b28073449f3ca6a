//! engine
//!
//! Drives reconciliation against live data and acts on the outcomes.
//!
//! # Architecture
//!
//! [`crate::reconcile`] is pure. The engine does the I/O around it:
//!
//! 1. **Collect**: read registered maintainers from the store and team
//!    members from the provider into snapshots
//! 2. **Reconcile**: classify each snapshot
//! 3. **Consume**: log every outcome and, when asked, invite the maintainers
//!    missing from their team
//!
//! # Invariants
//!
//! - One project's fetch failure never aborts the pass
//! - Every invitation attempt is written to the audit log
//! - Invitation responses meaning "nothing to do" are not failures

pub mod invite;
pub mod reconcile_run;

pub use invite::{invite_missing, Invitation, InvitationStatus};
pub use reconcile_run::{
    collect_snapshots, registered_emails, run, CollectedSnapshots, ProjectReport, RunOptions,
    RunReport, SkippedTeam,
};
