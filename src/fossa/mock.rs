//! fossa::mock
//!
//! In-memory membership provider for deterministic testing.
//!
//! # Design
//!
//! `MockProvider` keeps teams, members, organization users and pending
//! invitations in memory and follows the same rules as the FOSSA API:
//! inviting an existing user yields `UserAlreadyMember`, inviting twice
//! yields `InviteAlreadyExists`, and creating a team whose name is taken
//! returns the existing team. Failures can be injected per operation, and
//! every call is recorded.
//!
//! # Example
//!
//! ```
//! use maintainerd::fossa::mock::MockProvider;
//! use maintainerd::fossa::MembershipProvider;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let provider = MockProvider::new().with_team(7, "envoy", &["a@x.org"]);
//!
//! let team = provider.fetch_team("envoy").await.unwrap();
//! let emails = provider.fetch_team_member_emails(team.id).await.unwrap();
//! assert_eq!(emails, vec!["a@x.org".to_string()]);
//! # });
//! ```

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::traits::{FossaError, MembershipProvider, Team, User, UserInvitation};

/// Mock provider for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockProvider {
    inner: Arc<Mutex<MockProviderInner>>,
}

#[derive(Debug, Default)]
struct MockProviderInner {
    /// Teams by id.
    teams: BTreeMap<i64, Team>,
    /// Member e-mails by team id.
    members: BTreeMap<i64, Vec<String>>,
    /// Organization users.
    users: Vec<User>,
    /// Pending invitations.
    invitations: Vec<UserInvitation>,
    /// Injected failures.
    fail_on: Vec<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    FetchTeams(FossaError),
    /// Fail member fetches for one team.
    FetchTeamMembers(i64, FossaError),
    FetchUsers(FossaError),
    FetchUserInvitations(FossaError),
    /// Fail every invitation.
    SendUserInvitation(FossaError),
    /// Fail invitations to one address.
    SendUserInvitationTo(String, FossaError),
    CreateTeam(FossaError),
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    FetchTeams,
    FetchTeamMemberEmails { team_id: i64 },
    FetchUsers,
    FetchUserInvitations,
    SendUserInvitation { email: String },
    CreateTeam { name: String },
}

impl MockProvider {
    /// Create an empty mock provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a team with the given member e-mails.
    pub fn with_team(self, id: i64, name: &str, members: &[&str]) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.teams.insert(
                id,
                Team {
                    id,
                    name: name.to_string(),
                    organization_id: None,
                    team_projects_count: None,
                },
            );
            inner
                .members
                .insert(id, members.iter().map(|m| m.to_string()).collect());
        }
        self
    }

    /// Add an organization user.
    pub fn with_user(self, email: &str) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            let id = inner.users.len() as i64 + 1;
            inner.users.push(User {
                id,
                username: email.to_string(),
                email: email.to_string(),
                full_name: None,
                enabled: true,
            });
        }
        self
    }

    /// Add a pending invitation.
    pub fn with_invitation(self, email: &str) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.invitations.push(UserInvitation {
                email: email.to_string(),
                created_at: None,
                expires_at: None,
            });
        }
        self
    }

    /// Configure the mock to fail on an operation.
    ///
    /// # Example
    ///
    /// ```
    /// use maintainerd::fossa::mock::{FailOn, MockProvider};
    /// use maintainerd::fossa::FossaError;
    ///
    /// let provider = MockProvider::new().fail_on(FailOn::FetchTeams(FossaError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.fail_on.push(fail_on);
        }
        self
    }

    /// Clear all failure configuration.
    pub fn clear_fail_on(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_on.clear();
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        let inner = self.inner.lock().unwrap();
        inner.operations.clone()
    }

    /// E-mails that received an invitation through this mock, in order.
    pub fn invited_emails(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .operations
            .iter()
            .filter_map(|op| match op {
                MockOperation::SendUserInvitation { email } => Some(email.clone()),
                _ => None,
            })
            .collect()
    }

    /// Team by name, if present.
    pub fn team(&self, name: &str) -> Option<Team> {
        let inner = self.inner.lock().unwrap();
        inner.teams.values().find(|t| t.name == name).cloned()
    }

    fn record(&self, op: MockOperation) {
        let mut inner = self.inner.lock().unwrap();
        inner.operations.push(op);
    }

    fn check_fail<F>(&self, select: F) -> Result<(), FossaError>
    where
        F: Fn(&FailOn) -> Option<FossaError>,
    {
        let inner = self.inner.lock().unwrap();
        match inner.fail_on.iter().find_map(select) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MembershipProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn fetch_teams(&self) -> Result<Vec<Team>, FossaError> {
        self.record(MockOperation::FetchTeams);
        self.check_fail(|f| match f {
            FailOn::FetchTeams(e) => Some(e.clone()),
            _ => None,
        })?;
        let inner = self.inner.lock().unwrap();
        Ok(inner.teams.values().cloned().collect())
    }

    async fn fetch_team_member_emails(&self, team_id: i64) -> Result<Vec<String>, FossaError> {
        self.record(MockOperation::FetchTeamMemberEmails { team_id });
        self.check_fail(|f| match f {
            FailOn::FetchTeamMembers(id, e) if *id == team_id => Some(e.clone()),
            _ => None,
        })?;
        let inner = self.inner.lock().unwrap();
        inner
            .members
            .get(&team_id)
            .cloned()
            .ok_or_else(|| FossaError::NotFound(format!("team {}", team_id)))
    }

    async fn fetch_users(&self) -> Result<Vec<User>, FossaError> {
        self.record(MockOperation::FetchUsers);
        self.check_fail(|f| match f {
            FailOn::FetchUsers(e) => Some(e.clone()),
            _ => None,
        })?;
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.clone())
    }

    async fn fetch_user_invitations(&self) -> Result<Vec<UserInvitation>, FossaError> {
        self.record(MockOperation::FetchUserInvitations);
        self.check_fail(|f| match f {
            FailOn::FetchUserInvitations(e) => Some(e.clone()),
            _ => None,
        })?;
        let inner = self.inner.lock().unwrap();
        Ok(inner.invitations.clone())
    }

    async fn send_user_invitation(&self, email: &str) -> Result<(), FossaError> {
        self.record(MockOperation::SendUserInvitation {
            email: email.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::SendUserInvitation(e) => Some(e.clone()),
            FailOn::SendUserInvitationTo(to, e) if to.eq_ignore_ascii_case(email) => {
                Some(e.clone())
            }
            _ => None,
        })?;

        let mut inner = self.inner.lock().unwrap();
        if inner.users.iter().any(|u| u.email.eq_ignore_ascii_case(email)) {
            return Err(FossaError::UserAlreadyMember(email.to_string()));
        }
        if inner
            .invitations
            .iter()
            .any(|i| i.email.eq_ignore_ascii_case(email))
        {
            return Err(FossaError::InviteAlreadyExists(email.to_string()));
        }
        inner.invitations.push(UserInvitation {
            email: email.to_string(),
            created_at: None,
            expires_at: None,
        });
        Ok(())
    }

    async fn create_team(&self, name: &str) -> Result<Team, FossaError> {
        self.record(MockOperation::CreateTeam {
            name: name.to_string(),
        });
        self.check_fail(|f| match f {
            FailOn::CreateTeam(e) => Some(e.clone()),
            _ => None,
        })?;

        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner.teams.values().find(|t| t.name == name) {
            return Ok(existing.clone());
        }
        let id = inner.teams.keys().next_back().copied().unwrap_or(0) + 1;
        let team = Team {
            id,
            name: name.to_string(),
            organization_id: None,
            team_projects_count: None,
        };
        inner.teams.insert(id, team.clone());
        inner.members.insert(id, Vec::new());
        Ok(team)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_on<F: std::future::Future>(f: F) -> F::Output {
        tokio::runtime::Runtime::new().unwrap().block_on(f)
    }

    #[test]
    fn fetch_team_by_name() {
        block_on(async {
            let provider = MockProvider::new()
                .with_team(1, "envoy", &[])
                .with_team(2, "linkerd", &[]);
            assert_eq!(provider.fetch_team("linkerd").await.unwrap().id, 2);
            assert!(matches!(
                provider.fetch_team("nope").await,
                Err(FossaError::NotFound(_))
            ));
            let map = provider.fetch_teams_map().await.unwrap();
            assert_eq!(map.len(), 2);
            assert_eq!(map["envoy"].id, 1);
        });
    }

    #[test]
    fn invitation_rules() {
        block_on(async {
            let provider = MockProvider::new()
                .with_user("member@x.org")
                .with_invitation("pending@x.org");

            assert!(provider.send_user_invitation("new@x.org").await.is_ok());
            assert!(matches!(
                provider.send_user_invitation("new@x.org").await,
                Err(FossaError::InviteAlreadyExists(_))
            ));
            assert!(matches!(
                provider.send_user_invitation("MEMBER@x.org").await,
                Err(FossaError::UserAlreadyMember(_))
            ));
            assert!(matches!(
                provider.send_user_invitation("pending@x.org").await,
                Err(FossaError::InviteAlreadyExists(_))
            ));
            assert_eq!(provider.fetch_user_invitations().await.unwrap().len(), 2);
            assert_eq!(provider.invited_emails().len(), 4);
        });
    }

    #[test]
    fn create_team_reuses_existing() {
        block_on(async {
            let provider = MockProvider::new().with_team(5, "envoy", &["a@x.org"]);
            let existing = provider.create_team("envoy").await.unwrap();
            assert_eq!(existing.id, 5);

            let created = provider.create_team("linkerd").await.unwrap();
            assert_eq!(created.id, 6);
            assert!(provider
                .fetch_team_member_emails(created.id)
                .await
                .unwrap()
                .is_empty());
        });
    }

    #[test]
    fn targeted_failures() {
        block_on(async {
            let provider = MockProvider::new()
                .with_team(1, "a", &["x@x.org"])
                .with_team(2, "b", &["y@x.org"])
                .fail_on(FailOn::FetchTeamMembers(1, FossaError::RateLimited))
                .fail_on(FailOn::SendUserInvitationTo(
                    "bad@x.org".into(),
                    FossaError::NetworkError("reset".into()),
                ));

            assert_eq!(
                provider.fetch_team_member_emails(1).await,
                Err(FossaError::RateLimited)
            );
            assert!(provider.fetch_team_member_emails(2).await.is_ok());
            assert!(provider.send_user_invitation("bad@x.org").await.is_err());
            assert!(provider.send_user_invitation("good@x.org").await.is_ok());

            provider.clear_fail_on();
            assert!(provider.fetch_team_member_emails(1).await.is_ok());
        });
    }

    #[test]
    fn operations_recorded() {
        block_on(async {
            let provider = MockProvider::new();
            let _ = provider.fetch_teams().await;
            let _ = provider.create_team("x").await;
            assert_eq!(
                provider.operations(),
                vec![
                    MockOperation::FetchTeams,
                    MockOperation::CreateTeam { name: "x".into() }
                ]
            );
        });
    }
}
