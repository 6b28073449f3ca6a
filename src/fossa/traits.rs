//! fossa::traits
//!
//! Membership provider trait and the FOSSA data model.
//!
//! # Design
//!
//! The `MembershipProvider` trait is async because every operation is a
//! network call. Reconciliation itself never talks to the provider: callers
//! fetch team membership first, then hand plain lists to
//! [`crate::reconcile`].
//!
//! Provider failures are returned, never swallowed. A failed fetch for one
//! team must not abort work on other teams; that policy lives in the caller
//! (see [`crate::engine::reconcile_run`]).
//!
//! # Example
//!
//! ```ignore
//! use maintainerd::fossa::{MembershipProvider, FossaError};
//!
//! async fn members(provider: &dyn MembershipProvider) -> Result<(), FossaError> {
//!     let team = provider.fetch_team("envoy").await?;
//!     let emails = provider.fetch_team_member_emails(team.id).await?;
//!     println!("{} has {} members", team.name, emails.len());
//!     Ok(())
//! }
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// FOSSA API error code: an invitation for this e-mail is already pending.
pub const ERR_CODE_INVITE_ALREADY_EXISTS: i64 = 2011;

/// FOSSA API error code: the user already belongs to the organization.
pub const ERR_CODE_USER_ALREADY_MEMBER: i64 = 2001;

/// FOSSA API error code: a team with this name already exists.
pub const ERR_CODE_TEAM_ALREADY_EXISTS: i64 = 2003;

/// Errors from membership provider operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FossaError {
    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// An invitation for the e-mail is already pending.
    #[error("invitation already exists: {0}")]
    InviteAlreadyExists(String),

    /// The user is already a member of the organization.
    #[error("user is already a member: {0}")]
    UserAlreadyMember(String),

    /// A team with the requested name already exists.
    #[error("team already exists: {0}")]
    TeamAlreadyExists(String),
}

/// A FOSSA team, as returned by `GET /teams`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub organization_id: Option<i64>,
    #[serde(default)]
    pub team_projects_count: Option<i64>,
}

/// A member entry from `GET /teams/{id}/members`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: String,
}

/// One page of team members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamMembersPage {
    pub results: Vec<TeamMember>,
    pub page_size: u64,
    pub page: u64,
    pub total_count: u64,
}

/// An organization user, as returned by `GET /users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub enabled: bool,
}

/// A pending invitation, as returned by `GET /user-invitations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInvitation {
    pub email: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub expires_at: Option<String>,
}

/// A service that groups project maintainers into teams.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow use across async tasks
/// and from the webhook server.
///
/// # Error Handling
///
/// - `AuthFailed`: the token is missing, invalid or lacks permissions
/// - `NotFound`: the team does not exist
/// - `RateLimited`: back off and retry
/// - `InviteAlreadyExists` / `UserAlreadyMember`: the invitee needs no action
#[async_trait]
pub trait MembershipProvider: Send + Sync {
    /// Provider name for logs (e.g., "fossa").
    fn name(&self) -> &'static str;

    /// List every team in the organization.
    async fn fetch_teams(&self) -> Result<Vec<Team>, FossaError>;

    /// Find a team by exact name.
    ///
    /// # Errors
    ///
    /// - `NotFound` if no team has that name
    async fn fetch_team(&self, name: &str) -> Result<Team, FossaError> {
        self.fetch_teams()
            .await?
            .into_iter()
            .find(|team| team.name == name)
            .ok_or_else(|| FossaError::NotFound(format!("team {:?}", name)))
    }

    /// E-mail addresses of every member of a team, across all pages.
    async fn fetch_team_member_emails(&self, team_id: i64) -> Result<Vec<String>, FossaError>;

    /// Every user in the organization, across all pages.
    async fn fetch_users(&self) -> Result<Vec<User>, FossaError>;

    /// Active (non-expired) invitations for the organization.
    async fn fetch_user_invitations(&self) -> Result<Vec<UserInvitation>, FossaError>;

    /// Invite an e-mail address to join the organization.
    ///
    /// # Errors
    ///
    /// - `InviteAlreadyExists` if an invitation is already pending
    /// - `UserAlreadyMember` if the address already belongs to a user
    async fn send_user_invitation(&self, email: &str) -> Result<(), FossaError>;

    /// Create a team, returning the existing one if the name is taken.
    async fn create_team(&self, name: &str) -> Result<Team, FossaError>;

    /// Teams keyed by name.
    async fn fetch_teams_map(&self) -> Result<BTreeMap<String, Team>, FossaError> {
        Ok(self
            .fetch_teams()
            .await?
            .into_iter()
            .map(|team| (team.name.clone(), team))
            .collect())
    }
}
