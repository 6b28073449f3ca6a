//! fossa::client
//!
//! FOSSA REST API client.
//!
//! # Design
//!
//! This module implements [`MembershipProvider`] for FOSSA. Every request
//! carries the API token as a bearer token and asks for JSON.
//!
//! FOSSA reports some conditions as numeric error codes in the response
//! body rather than through the HTTP status. These are mapped first:
//!
//! | Code | Error |
//! |------|-------|
//! | 2011 | [`FossaError::InviteAlreadyExists`] |
//! | 2001 | [`FossaError::UserAlreadyMember`] |
//! | 2003 | [`FossaError::TeamAlreadyExists`] (absorbed by `create_team`) |
//!
//! Remaining failures map by status the same way for every endpoint:
//! 401/403 → `AuthFailed`, 404 → `NotFound`, 429 → `RateLimited`,
//! anything else → `ApiError`.
//!
//! # Rate Limiting
//!
//! Rate limits surface as `FossaError::RateLimited`. There is no automatic
//! retry; the next reconciliation pass picks up where this one failed.
//!
//! # Example
//!
//! ```ignore
//! use maintainerd::fossa::{FossaClient, MembershipProvider};
//!
//! let client = FossaClient::new(std::env::var("FOSSA_API_TOKEN")?);
//! let teams = client.fetch_teams_map().await?;
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::traits::{
    FossaError, MembershipProvider, Team, TeamMembersPage, User, UserInvitation,
    ERR_CODE_INVITE_ALREADY_EXISTS, ERR_CODE_TEAM_ALREADY_EXISTS, ERR_CODE_USER_ALREADY_MEMBER,
};
use crate::core::config::{DEFAULT_FOSSA_API_BASE, DEFAULT_FOSSA_ORG_ID};

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "maintainerd";

/// Page size for paginated endpoints.
pub const PAGE_SIZE: usize = 100;

/// FOSSA API client.
pub struct FossaClient {
    /// HTTP client for making requests
    client: Client,
    /// API token
    token: String,
    /// API base URL, without a trailing slash
    api_base: String,
    /// Organization that invitations are sent for
    organization_id: u64,
}

// Custom Debug to avoid exposing the token
impl std::fmt::Debug for FossaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FossaClient")
            .field("has_token", &!self.token.is_empty())
            .field("api_base", &self.api_base)
            .field("organization_id", &self.organization_id)
            .finish()
    }
}

impl FossaClient {
    /// Create a client for the public FOSSA API and the default organization.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_api_base(token, DEFAULT_FOSSA_API_BASE, DEFAULT_FOSSA_ORG_ID)
    }

    /// Create a client for a specific API base URL and organization.
    ///
    /// Used for self-hosted instances and for testing with a mock server.
    pub fn with_api_base(
        token: impl Into<String>,
        api_base: impl Into<String>,
        organization_id: u64,
    ) -> Self {
        let api_base: String = api_base.into();
        Self {
            client: Client::new(),
            token: token.into(),
            api_base: api_base.trim_end_matches('/').to_string(),
            organization_id,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    pub fn organization_id(&self) -> u64 {
        self.organization_id
    }

    /// Build common headers for API requests.
    fn headers(&self) -> Result<HeaderMap, FossaError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|_| FossaError::AuthFailed("token contains invalid characters".into()))?;
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        Ok(headers)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, FossaError> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self
            .client
            .get(&url)
            .headers(self.headers()?)
            .send()
            .await
            .map_err(|e| FossaError::NetworkError(e.to_string()))?;
        self.handle_response(response).await
    }

    async fn post(&self, path: &str, body: &impl Serialize) -> Result<Response, FossaError> {
        let url = self.url(path);
        debug!(%url, "POST");
        self.client
            .post(&url)
            .headers(self.headers()?)
            .json(body)
            .send()
            .await
            .map_err(|e| FossaError::NetworkError(e.to_string()))
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, FossaError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| FossaError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            self.handle_error_response(response, status).await
        }
    }

    /// Handle an error response from the API.
    async fn handle_error_response<T>(
        &self,
        response: Response,
        status: StatusCode,
    ) -> Result<T, FossaError> {
        let body = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<FossaErrorResponse>(&body).ok();

        let message = parsed
            .as_ref()
            .and_then(|e| e.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| {
                if body.is_empty() {
                    "Unknown error".to_string()
                } else {
                    body.clone()
                }
            });

        if let Some(code) = parsed.as_ref().and_then(|e| e.code) {
            match code {
                ERR_CODE_INVITE_ALREADY_EXISTS => {
                    return Err(FossaError::InviteAlreadyExists(message))
                }
                ERR_CODE_USER_ALREADY_MEMBER => return Err(FossaError::UserAlreadyMember(message)),
                ERR_CODE_TEAM_ALREADY_EXISTS => return Err(FossaError::TeamAlreadyExists(message)),
                _ => {}
            }
        }

        Err(match status {
            StatusCode::UNAUTHORIZED => FossaError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN => {
                FossaError::AuthFailed(format!("Permission denied: {}", message))
            }
            StatusCode::NOT_FOUND => FossaError::NotFound(message),
            StatusCode::TOO_MANY_REQUESTS => FossaError::RateLimited,
            _ if status.is_server_error() => FossaError::ApiError {
                status: status.as_u16(),
                message: format!("FOSSA server error: {}", message),
            },
            _ => FossaError::ApiError {
                status: status.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl MembershipProvider for FossaClient {
    fn name(&self) -> &'static str {
        "fossa"
    }

    async fn fetch_teams(&self) -> Result<Vec<Team>, FossaError> {
        self.get("teams").await
    }

    async fn fetch_team_member_emails(&self, team_id: i64) -> Result<Vec<String>, FossaError> {
        let mut emails = Vec::new();
        let mut page = 1;
        loop {
            let members: TeamMembersPage = self
                .get(&format!(
                    "teams/{}/members?count={}&page={}",
                    team_id, PAGE_SIZE, page
                ))
                .await?;
            let received = members.results.len();
            emails.extend(members.results.into_iter().map(|m| m.email));

            let total_reached =
                members.total_count > 0 && emails.len() as u64 >= members.total_count;
            if received < PAGE_SIZE || total_reached {
                break;
            }
            page += 1;
        }
        Ok(emails)
    }

    async fn fetch_users(&self) -> Result<Vec<User>, FossaError> {
        let mut users = Vec::new();
        let mut page = 1;
        loop {
            let batch: Vec<User> = self
                .get(&format!("users?count={}&page={}", PAGE_SIZE, page))
                .await?;
            let received = batch.len();
            users.extend(batch);
            if received < PAGE_SIZE {
                break;
            }
            page += 1;
        }
        Ok(users)
    }

    async fn fetch_user_invitations(&self) -> Result<Vec<UserInvitation>, FossaError> {
        let body: InvitationsResponse = self.get("user-invitations").await?;
        Ok(match body {
            InvitationsResponse::List(list) => list,
            InvitationsResponse::Paged { results } => results,
        })
    }

    async fn send_user_invitation(&self, email: &str) -> Result<(), FossaError> {
        let path = format!("organizations/{}/invite", self.organization_id);
        let response = self.post(&path, &InviteBody { email }).await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            self.handle_error_response(response, status).await
        }
    }

    async fn create_team(&self, name: &str) -> Result<Team, FossaError> {
        let response = self.post("teams", &CreateTeamBody { name }).await?;
        match self.handle_response(response).await {
            Err(FossaError::TeamAlreadyExists(_)) => {
                debug!(team = name, "team already exists, fetching it");
                self.fetch_team(name).await
            }
            other => other,
        }
    }
}

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct FossaErrorResponse {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InvitationsResponse {
    List(Vec<UserInvitation>),
    Paged { results: Vec<UserInvitation> },
}

#[derive(Debug, Serialize)]
struct InviteBody<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateTeamBody<'a> {
    name: &'a str,
}
