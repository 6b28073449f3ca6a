//! onboarding::server
//!
//! GitHub webhook endpoint.
//!
//! | Condition | Response |
//! |-----------|----------|
//! | missing or wrong signature | 401 `invalid signature` |
//! | no event header, or a body that does not parse as the event | 400 `could not parse event` |
//! | anything else | 200 |
//!
//! Deliveries may be `application/json` or `application/x-www-form-urlencoded`.
//! The signature always covers the raw body; form deliveries carry the event
//! JSON in the `payload` field.
//!
//! Sign-up failures are logged and still answered with 200 so GitHub does
//! not redeliver.

use std::borrow::Cow;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::signature::verify_signature;
use super::title::project_name_from_title;
use super::{sign_project_up_for_fossa, OnboardingError, SignUpOutcome};
use crate::fossa::MembershipProvider;
use crate::store::Store;

pub const EVENT_HEADER: &str = "x-github-event";
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Label that requests a FOSSA sign-up.
pub const FOSSA_LABEL: &str = "fossa";

/// Shared state for the webhook handler.
pub struct AppState {
    pub store: Arc<Store>,
    pub provider: Arc<dyn MembershipProvider>,
    pub secret: String,
    /// Service that sign-ups are recorded against.
    pub service: String,
}

// Custom Debug to avoid exposing the secret
impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("provider", &self.provider.name())
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

/// Build the webhook router with the given state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/webhook", post(handle_webhook))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct IssuesEvent {
    action: String,
    issue: Issue,
}

#[derive(Debug, Deserialize)]
struct Issue {
    #[serde(default)]
    number: u64,
    title: String,
    #[serde(default)]
    labels: Vec<Label>,
}

#[derive(Debug, Deserialize)]
struct Label {
    name: String,
}

enum WebhookEvent {
    Issues(IssuesEvent),
    Other(String),
}

#[derive(Debug, Deserialize)]
struct FormDelivery {
    payload: String,
}

/// The event JSON of a delivery, unwrapped from the form body if needed.
fn event_json<'a>(
    content_type: Option<&str>,
    body: &'a [u8],
) -> Result<Cow<'a, [u8]>, OnboardingError> {
    let is_form = content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|ct| ct.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE));
    if !is_form {
        return Ok(Cow::Borrowed(body));
    }
    let form: FormDelivery =
        serde_urlencoded::from_bytes(body).map_err(|e| OnboardingError::Parse(e.to_string()))?;
    Ok(Cow::Owned(form.payload.into_bytes()))
}

fn parse_event(
    kind: Option<&str>,
    content_type: Option<&str>,
    body: &[u8],
) -> Result<WebhookEvent, OnboardingError> {
    match kind {
        None | Some("") => Err(OnboardingError::Parse("missing event type".into())),
        Some("issues") => serde_json::from_slice(&event_json(content_type, body)?)
            .map(WebhookEvent::Issues)
            .map_err(|e| OnboardingError::Parse(e.to_string())),
        Some(other) => Ok(WebhookEvent::Other(other.to_string())),
    }
}

async fn handle_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

    if verify_signature(state.secret.as_bytes(), &body, header(SIGNATURE_HEADER)).is_err() {
        warn!("rejected webhook delivery with invalid signature");
        return (StatusCode::UNAUTHORIZED, "invalid signature");
    }

    match parse_event(header(EVENT_HEADER), header(CONTENT_TYPE.as_str()), &body) {
        Err(err) => {
            warn!(error = %err, "rejected webhook delivery");
            return (StatusCode::BAD_REQUEST, "could not parse event");
        }
        Ok(WebhookEvent::Issues(event)) => handle_issues(&state, event).await,
        Ok(WebhookEvent::Other(kind)) => debug!(event = %kind, "ignoring event"),
    }

    (StatusCode::OK, "")
}

async fn handle_issues(state: &AppState, event: IssuesEvent) {
    if event.action != "labeled" {
        return;
    }
    if !event.issue.labels.iter().any(|l| l.name == FOSSA_LABEL) {
        return;
    }

    let result = sign_up_from_issue(state, &event.issue).await;

    match result {
        Ok(signup) => info!(
            issue = event.issue.number,
            project = %signup.project,
            team_id = signup.team_id,
            invitations = signup.invitations.len(),
            "signed project up"
        ),
        Err(err) => warn!(issue = event.issue.number, error = %err, "sign-up failed"),
    }
}

async fn sign_up_from_issue(
    state: &AppState,
    issue: &Issue,
) -> Result<SignUpOutcome, OnboardingError> {
    let name = project_name_from_title(&issue.title)?;
    let project = state
        .store
        .project_by_name(&name)?
        .ok_or(OnboardingError::UnknownProject(name))?;
    sign_project_up_for_fossa(&state.store, state.provider.as_ref(), &project, &state.service).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_issue_events() {
        let body = br#"{"action":"labeled","issue":{"number":3,"title":"[PROJECT ONBOARDING] envoy","labels":[{"name":"fossa"}]}}"#;
        match parse_event(Some("issues"), Some("application/json"), body) {
            Ok(WebhookEvent::Issues(event)) => {
                assert_eq!(event.action, "labeled");
                assert_eq!(event.issue.labels[0].name, "fossa");
            }
            _ => panic!("expected issues event"),
        }
    }

    #[test]
    fn unwraps_form_payload() {
        let json = r#"{"action":"labeled","issue":{"title":"[PROJECT ONBOARDING] a b","labels":[]}}"#;
        let body = serde_urlencoded::to_string([("payload", json)]).unwrap();
        match parse_event(
            Some("issues"),
            Some("application/x-www-form-urlencoded; charset=utf-8"),
            body.as_bytes(),
        ) {
            Ok(WebhookEvent::Issues(event)) => {
                assert_eq!(event.issue.title, "[PROJECT ONBOARDING] a b");
            }
            _ => panic!("expected issues event"),
        }
    }

    #[test]
    fn form_without_payload_fails() {
        assert!(parse_event(Some("issues"), Some(FORM_CONTENT_TYPE), b"other=1").is_err());
    }

    #[test]
    fn other_events_are_not_parsed() {
        assert!(matches!(
            parse_event(Some("ping"), None, b"not json"),
            Ok(WebhookEvent::Other(kind)) if kind == "ping"
        ));
    }

    #[test]
    fn bad_issue_payload_and_missing_kind_fail() {
        assert!(parse_event(Some("issues"), None, b"{}").is_err());
        assert!(parse_event(None, None, b"{}").is_err());
    }
}
