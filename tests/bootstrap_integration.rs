//! Integration tests for bootstrapping a registry and reconciling it.
//!
//! Covers the full path: worksheet (CSV file or mocked Sheets API) into a
//! file-backed registry, team linking, then a reconciliation pass with
//! invitations.

use std::io::Write;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use maintainerd::bootstrap::sheet::rows_from_values;
use maintainerd::bootstrap::{
    bootstrap, CsvSheet, GoogleSheet, SheetAuth, SheetError, SheetRow, SheetSource,
};
use maintainerd::core::types::{Maturity, EMAIL_MISSING};
use maintainerd::engine::{self, InvitationStatus, RunOptions};
use maintainerd::fossa::mock::{FailOn, MockProvider};
use maintainerd::fossa::{FossaError, MembershipProvider};
use maintainerd::store::Store;

const WORKSHEET: &str = "\
Status,Project,Maintainer Name,Company,Emails,Github Name,Parent Project,OWNERS/MAINTAINERS,Mailing List Address
Graduated,envoy,Ada Lovelace,Lyft,ada@envoy.io,ada,,https://github.com/envoyproxy/envoy/blob/main/OWNERS.md,envoy-maintainers@googlegroups.com
,,Bo Tanaka,Lyft,Bo@Envoy.io,bo,,,
Incubating,linkerd,Cy Park,Buoyant,cy@linkerd.io,cypark,,,
,,Di Okafor,,,dio,,,
Sandbox,envoy-gateway,Ed Ruiz,Tetrate,ed@tetrate.io,edr,envoy,,
";

fn write_worksheet(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("worksheet.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(WORKSHEET.as_bytes()).unwrap();
    path
}

fn worksheet_rows(dir: &TempDir) -> Vec<SheetRow> {
    rows_from_values(CsvSheet::new(write_worksheet(dir)).values().unwrap()).unwrap()
}

fn provider() -> MockProvider {
    MockProvider::new()
        .with_team(11, "envoy", &["ada@envoy.io", "outsider@example.com"])
        .with_team(12, "linkerd", &["cy@linkerd.io"])
        .with_team(13, "unrelated", &[])
}

mod csv_bootstrap {
    use super::*;

    #[tokio::test]
    async fn loads_worksheet_into_file_registry() {
        let dir = TempDir::new().unwrap();
        let csv = write_worksheet(&dir);
        let rows = rows_from_values(CsvSheet::new(&csv).values().unwrap()).unwrap();
        let db = dir.path().join("onboarding.db");

        {
            let store = Store::open(&db).unwrap();
            let provider = provider();
            let report = bootstrap(&store, &rows, Some(&provider as &dyn MembershipProvider), true)
                .await
                .unwrap();

            assert!(report.seeded);
            assert_eq!(report.services, 4);
            let load = report.load.unwrap();
            assert_eq!(load.rows, 5);
            assert_eq!(load.loaded, 5);
            assert_eq!(load.skipped, 0);
            assert_eq!(load.with_warnings, 1);
            assert_eq!(report.teams_linked, Some(2));
        }

        // Everything survives reopening the file.
        let store = Store::open(&db).unwrap();
        let envoy = store.project_by_name("envoy").unwrap().unwrap();
        assert_eq!(envoy.maturity, Some(Maturity::Graduated));
        assert_eq!(store.maintainers_by_project(envoy.id).unwrap().len(), 2);

        let gateway = store.project_by_name("envoy-gateway").unwrap().unwrap();
        assert_eq!(gateway.parent_id, Some(envoy.id));
        assert_eq!(gateway.maturity, Some(Maturity::Graduated));

        let linkerd = store.project_by_name("linkerd").unwrap().unwrap();
        let di = store
            .maintainers_by_project(linkerd.id)
            .unwrap()
            .into_iter()
            .find(|m| m.name == "Di Okafor")
            .unwrap();
        assert_eq!(di.email, EMAIL_MISSING);
        assert_eq!(di.import_warnings, ":Company:Emails");
    }

    #[tokio::test]
    async fn bootstrap_twice_is_stable() {
        let dir = TempDir::new().unwrap();
        let rows = worksheet_rows(&dir);
        let store = Store::open(&dir.path().join("r.db")).unwrap();
        let provider = provider();

        let first = bootstrap(&store, &rows, Some(&provider as &dyn MembershipProvider), true)
            .await
            .unwrap();
        let second = bootstrap(&store, &rows, Some(&provider as &dyn MembershipProvider), true)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(store.projects_by_name().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn no_seed_leaves_registry_empty() {
        let store = Store::open_in_memory().unwrap();
        let report = bootstrap(&store, &[], None, false).await.unwrap();
        assert!(!report.seeded);
        assert!(store.projects_by_name().unwrap().is_empty());
        assert!(store.service_by_name("FOSSA").is_err());
    }

    #[tokio::test]
    async fn team_listing_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let rows = worksheet_rows(&dir);
        let store = Store::open_in_memory().unwrap();
        let provider = MockProvider::new().fail_on(FailOn::FetchTeams(FossaError::RateLimited));

        let provider = Some(&provider as &dyn MembershipProvider);
        let result = bootstrap(&store, &rows, provider, true).await;
        assert!(result.is_err());
        // Rows were committed before team linking failed.
        assert!(store.project_by_name("envoy").unwrap().is_some());
    }
}

mod reconcile_after_bootstrap {
    use super::*;

    async fn bootstrapped(provider: &MockProvider) -> Store {
        let dir = TempDir::new().unwrap();
        let rows = worksheet_rows(&dir);
        let store = Store::open_in_memory().unwrap();
        bootstrap(&store, &rows, Some(provider as &dyn MembershipProvider), true)
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn reports_missing_and_unregistered() {
        let provider = provider();
        let store = bootstrapped(&provider).await;

        let report = engine::run(&store, &provider, &RunOptions::default())
            .await
            .unwrap();
        assert_eq!(report.service, "FOSSA");
        assert_eq!(report.projects.len(), 2);
        assert!(report.invitations.is_empty());

        let envoy = report.projects.iter().find(|p| p.project == "envoy").unwrap();
        assert!(!envoy.outcome.fully_covered);
        assert_eq!(envoy.outcome.missing_externally[0].as_str(), "bo@envoy.io");
        assert_eq!(
            envoy.outcome.unregistered_external[0].as_str(),
            "outsider@example.com"
        );

        // Placeholder e-mails are not registered identities.
        let linkerd = report.projects.iter().find(|p| p.project == "linkerd").unwrap();
        assert!(linkerd.outcome.fully_covered);
        assert_eq!(report.covered(), 1);
        assert_eq!(report.missing(), 1);
    }

    #[tokio::test]
    async fn invites_missing_maintainers() {
        let provider = provider().with_invitation("someone-else@example.com");
        let store = bootstrapped(&provider).await;

        let options = RunOptions {
            invite: true,
            ..Default::default()
        };
        let report = engine::run(&store, &provider, &options).await.unwrap();

        assert_eq!(provider.invited_emails(), vec!["bo@envoy.io"]);
        assert_eq!(report.invitations.len(), 1);
        assert_eq!(report.invitations[0].status, InvitationStatus::Sent);

        let audit = store.recent_audit_events(1).unwrap();
        assert_eq!(audit[0].event.action, "INVITE_SENT");
        assert!(audit[0].event.maintainer_id.is_some());

        // A second pass finds the invitation pending.
        let report = engine::run(&store, &provider, &options).await.unwrap();
        assert_eq!(report.invitations[0].status, InvitationStatus::AlreadyInvited);
    }

    #[tokio::test]
    async fn unreachable_team_is_skipped() {
        let provider = provider();
        let store = bootstrapped(&provider).await;
        let provider = provider.fail_on(FailOn::FetchTeamMembers(12, FossaError::RateLimited));

        let report = engine::run(&store, &provider, &RunOptions::default())
            .await
            .unwrap();
        assert_eq!(report.projects.len(), 1);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].project, "linkerd");
        assert_eq!(report.skipped[0].team_id, 12);
    }
}

mod google_sheet {
    use super::*;

    #[tokio::test]
    async fn fetches_values_with_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/spreadsheets/sheet-1/values/Active!A1:J10"))
            .and(query_param("key", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "range": "Active!A1:J10",
                "majorDimension": "ROWS",
                "values": [
                    ["Status", "Project", "Maintainer Name", "Emails"],
                    ["Graduated", "envoy", "Ada", "ada@envoy.io"],
                    ["", "", "Bo", "bo@envoy.io"]
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sheet = GoogleSheet::with_api_base(
            server.uri(),
            "sheet-1",
            "Active!A1:J10",
            SheetAuth::ApiKey("k".into()),
        );
        let rows = rows_from_values(sheet.fetch_values().await.unwrap()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("Project"), "envoy");
        assert_eq!(rows[1].get("Status"), "Graduated");
    }

    #[tokio::test]
    async fn api_error_carries_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": { "code": 403, "message": "The caller does not have permission", "status": "PERMISSION_DENIED" }
            })))
            .mount(&server)
            .await;

        let sheet = GoogleSheet::with_api_base(
            server.uri(),
            "sheet-1",
            "A1:J10",
            SheetAuth::Bearer("t".into()),
        );
        match sheet.fetch_values().await {
            Err(SheetError::Api { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "The caller does not have permission");
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_range_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "range": "A1:J10" })))
            .mount(&server)
            .await;

        let auth = SheetAuth::ApiKey("k".into());
        let sheet = GoogleSheet::with_api_base(server.uri(), "s", "A1:J10", auth);
        assert!(matches!(sheet.fetch_values().await, Err(SheetError::Empty)));
    }
}
