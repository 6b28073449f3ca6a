//! fossa
//!
//! Team-membership provider abstraction and the FOSSA implementation.
//!
//! # Modules
//!
//! - [`traits`] - `MembershipProvider` trait, FOSSA data model and errors
//! - [`client`] - REST client for the FOSSA API
//! - [`mock`] - In-memory provider for tests

pub mod client;
pub mod mock;
pub mod traits;

pub use client::FossaClient;
pub use traits::{FossaError, MembershipProvider, Team, TeamMember, User, UserInvitation};

/// Web UI location of team settings.
const TEAM_SETTINGS_BASE: &str = "https://app.fossa.com/account/settings/organization/teams";

/// Link to a team's settings page, for log lines aimed at operators.
pub fn team_settings_url(team_id: i64) -> String {
    format!("{}/{}", TEAM_SETTINGS_BASE, team_id)
}
