//! bootstrap::sheet
//!
//! Maintainer spreadsheet rows.
//!
//! # Format
//!
//! The first row is the header. Every following row becomes a [`SheetRow`]
//! keyed by header name. Cells are trimmed and missing trailing cells read
//! as empty.
//!
//! Projects with several maintainers only name the project (and its status)
//! on the first of their rows, so the `Project` and `Status` columns carry
//! the last non-empty value forward when blank.
//!
//! # Sources
//!
//! - [`CsvSheet`] - a CSV export on disk
//! - [`GoogleSheet`] - the live worksheet, via the Sheets v4 values API
//! - `Vec<Vec<String>>` - values already in memory

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const STATUS_HDR: &str = "Status";
pub const PROJECT_HDR: &str = "Project";
pub const MAINTAINER_NAME_HDR: &str = "Maintainer Name";
pub const COMPANY_HDR: &str = "Company";
pub const EMAIL_HDR: &str = "Emails";
pub const GITHUB_HDR: &str = "Github Name";
pub const PARENT_PROJECT_HDR: &str = "Parent Project";
pub const MAINTAINER_FILE_REF_HDR: &str = "OWNERS/MAINTAINERS";
pub const MAILING_LIST_HDR: &str = "Mailing List Address";

/// Default Sheets API base URL.
pub const DEFAULT_SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

/// Errors from reading a sheet.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("worksheet is empty")]
    Empty,

    #[error("failed to read '{path}': {source}")]
    Csv { path: PathBuf, source: csv::Error },

    #[error("Sheets API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("no Sheets credentials: set an API key or bearer token")]
    MissingCredentials,
}

/// Anything that yields raw sheet cells, header row included.
pub trait SheetSource {
    fn values(&self) -> Result<Vec<Vec<String>>, SheetError>;
}

impl SheetSource for Vec<Vec<String>> {
    fn values(&self) -> Result<Vec<Vec<String>>, SheetError> {
        Ok(self.clone())
    }
}

/// One data row keyed by header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetRow(BTreeMap<String, String>);

impl SheetRow {
    /// Cell under `header`, or `""` when the column is absent.
    pub fn get(&self, header: &str) -> &str {
        self.0.get(header).map(String::as_str).unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for SheetRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        SheetRow(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Turn raw cells into rows keyed by the header row.
///
/// # Errors
///
/// `SheetError::Empty` when there is no header row.
///
/// # Example
///
/// ```
/// use maintainerd::bootstrap::sheet::rows_from_values;
///
/// let values = vec![
///     vec!["Project".to_string(), "Maintainer Name".to_string()],
///     vec!["envoy".to_string(), "Ada".to_string()],
///     vec!["".to_string(), "Bo".to_string()],
/// ];
/// let rows = rows_from_values(values).unwrap();
/// assert_eq!(rows[1].get("Project"), "envoy");
/// assert_eq!(rows[1].get("Maintainer Name"), "Bo");
/// ```
pub fn rows_from_values(values: Vec<Vec<String>>) -> Result<Vec<SheetRow>, SheetError> {
    let mut values = values.into_iter();
    let headers: Vec<String> = values
        .next()
        .ok_or(SheetError::Empty)?
        .into_iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut last_project = String::new();
    let mut last_status = String::new();
    let mut rows = Vec::new();

    for raw in values {
        let mut row = BTreeMap::new();
        for (i, header) in headers.iter().enumerate() {
            let cell = raw.get(i).map(|c| c.trim()).unwrap_or("");
            let value = match header.as_str() {
                PROJECT_HDR => carry_forward(&mut last_project, cell),
                STATUS_HDR => carry_forward(&mut last_status, cell),
                _ => cell.to_string(),
            };
            row.insert(header.clone(), value);
        }
        rows.push(SheetRow(row));
    }

    Ok(rows)
}

fn carry_forward(last: &mut String, cell: &str) -> String {
    if !cell.is_empty() {
        *last = cell.to_string();
    }
    last.clone()
}

/// A CSV export of the maintainer sheet.
#[derive(Debug, Clone)]
pub struct CsvSheet {
    path: PathBuf,
}

impl CsvSheet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SheetSource for CsvSheet {
    fn values(&self) -> Result<Vec<Vec<String>>, SheetError> {
        let csv_err = |source| SheetError::Csv {
            path: self.path.clone(),
            source,
        };
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)
            .map_err(csv_err)?;

        let mut values = Vec::new();
        for record in reader.records() {
            let record = record.map_err(csv_err)?;
            values.push(record.iter().map(str::to_string).collect());
        }
        if values.is_empty() {
            return Err(SheetError::Empty);
        }
        Ok(values)
    }
}

/// How to authenticate to the Sheets API.
#[derive(Clone)]
pub enum SheetAuth {
    /// `?key=` query parameter (public or link-shared sheets)
    ApiKey(String),
    /// `Authorization: Bearer` header (OAuth access token)
    Bearer(String),
}

impl std::fmt::Debug for SheetAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetAuth::ApiKey(_) => write!(f, "ApiKey([REDACTED])"),
            SheetAuth::Bearer(_) => write!(f, "Bearer([REDACTED])"),
        }
    }
}

impl SheetAuth {
    /// Pick credentials, preferring a bearer token over an API key.
    pub fn from_parts(api_key: Option<&str>, token: Option<&str>) -> Result<Self, SheetError> {
        match (token, api_key) {
            (Some(token), _) => Ok(SheetAuth::Bearer(token.to_string())),
            (None, Some(key)) => Ok(SheetAuth::ApiKey(key.to_string())),
            (None, None) => Err(SheetError::MissingCredentials),
        }
    }
}

/// The live Google worksheet.
#[derive(Debug, Clone)]
pub struct GoogleSheet {
    client: Client,
    api_base: String,
    spreadsheet_id: String,
    range: String,
    auth: SheetAuth,
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorResponse {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    #[serde(default)]
    message: String,
}

impl GoogleSheet {
    pub fn new(
        spreadsheet_id: impl Into<String>,
        range: impl Into<String>,
        auth: SheetAuth,
    ) -> Self {
        Self::with_api_base(DEFAULT_SHEETS_API_BASE, spreadsheet_id, range, auth)
    }

    /// Point at a different API host (used for testing with a mock server).
    pub fn with_api_base(
        api_base: impl Into<String>,
        spreadsheet_id: impl Into<String>,
        range: impl Into<String>,
        auth: SheetAuth,
    ) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into(),
            spreadsheet_id: spreadsheet_id.into(),
            range: range.into(),
            auth,
        }
    }

    fn values_url(&self) -> Result<Url, SheetError> {
        let mut url = Url::parse(&self.api_base)
            .map_err(|e| SheetError::Network(format!("invalid Sheets API base: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| SheetError::Network("Sheets API base cannot be a base URL".into()))?
            .pop_if_empty()
            .extend([
                "v4",
                "spreadsheets",
                self.spreadsheet_id.as_str(),
                "values",
                self.range.as_str(),
            ]);
        if let SheetAuth::ApiKey(key) = &self.auth {
            url.query_pairs_mut().append_pair("key", key);
        }
        Ok(url)
    }

    /// Fetch the raw cells of the configured range.
    pub async fn fetch_values(&self) -> Result<Vec<Vec<String>>, SheetError> {
        let url = self.values_url()?;
        debug!(spreadsheet = %self.spreadsheet_id, range = %self.range, "fetching worksheet");

        let mut request = self.client.get(url);
        if let SheetAuth::Bearer(token) = &self.auth {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| SheetError::Network(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = match response.json::<GoogleErrorResponse>().await {
                Ok(err) => err.error.message,
                Err(_) => "Unknown error".to_string(),
            };
            return Err(SheetError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let range: ValueRange = response.json().await.map_err(|e| SheetError::Api {
            status: status.as_u16(),
            message: format!("Failed to parse response: {}", e),
        })?;
        if range.values.is_empty() {
            return Err(SheetError::Empty);
        }

        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }
}

fn cell_to_string(cell: serde_json::Value) -> String {
    match cell {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    mod rows {
        use super::*;

        #[test]
        fn project_and_status_carry_forward() {
            let values = grid(&[
                &["Project", "Status", "Other"],
                &["P1", "S1", "X1"],
                &["", "S2", "X2"],
                &["", "", "X3"],
                &["P2", "", "X4"],
            ]);
            let rows = rows_from_values(values).unwrap();
            let flat: Vec<(&str, &str, &str)> = rows
                .iter()
                .map(|r| (r.get("Project"), r.get("Status"), r.get("Other")))
                .collect();
            assert_eq!(
                flat,
                vec![
                    ("P1", "S1", "X1"),
                    ("P1", "S2", "X2"),
                    ("P1", "S2", "X3"),
                    ("P2", "S2", "X4"),
                ]
            );
        }

        #[test]
        fn other_columns_do_not_carry_forward() {
            let values = grid(&[&["Project", "Company"], &["P1", "Acme"], &["", ""]]);
            let rows = rows_from_values(values).unwrap();
            assert_eq!(rows[1].get("Company"), "");
        }

        #[test]
        fn short_rows_and_whitespace() {
            let values = grid(&[&[" Project ", "Emails "], &["  P1  "]]);
            let rows = rows_from_values(values).unwrap();
            assert_eq!(rows[0].get("Project"), "P1");
            assert_eq!(rows[0].get("Emails"), "");
            assert_eq!(rows[0].get("Not A Column"), "");
        }

        #[test]
        fn empty_is_error() {
            assert!(matches!(rows_from_values(vec![]), Err(SheetError::Empty)));
        }

        #[test]
        fn header_only_has_no_rows() {
            let rows = rows_from_values(grid(&[&["Project"]])).unwrap();
            assert!(rows.is_empty());
        }
    }

    mod csv_source {
        use super::*;

        #[test]
        fn reads_ragged_rows() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "Project,Maintainer Name,Emails").unwrap();
            writeln!(file, "envoy,Ada,ada@x.org").unwrap();
            writeln!(file, ",Bo").unwrap();

            let values = CsvSheet::new(file.path()).values().unwrap();
            assert_eq!(values.len(), 3);
            assert_eq!(values[2], vec!["".to_string(), "Bo".to_string()]);

            let rows = rows_from_values(values).unwrap();
            assert_eq!(rows[1].get("Project"), "envoy");
        }

        #[test]
        fn missing_file_is_error() {
            let result = CsvSheet::new("/definitely/not/here.csv").values();
            assert!(matches!(result, Err(SheetError::Csv { .. })));
        }

        #[test]
        fn empty_file_is_empty() {
            let file = tempfile::NamedTempFile::new().unwrap();
            assert!(matches!(
                CsvSheet::new(file.path()).values(),
                Err(SheetError::Empty)
            ));
        }
    }

    mod google {
        use super::*;

        #[test]
        fn url_encodes_range_and_key() {
            let sheet = GoogleSheet::with_api_base(
                "http://localhost:9000",
                "sheet-id",
                "Active Maintainers!A1:J10",
                SheetAuth::ApiKey("k".into()),
            );
            let url = sheet.values_url().unwrap();
            assert_eq!(
                url.as_str(),
                "http://localhost:9000/v4/spreadsheets/sheet-id/values/Active%20Maintainers!A1:J10?key=k"
            );
        }

        #[test]
        fn bearer_has_no_query() {
            let sheet = GoogleSheet::new("id", "A1:B2", SheetAuth::Bearer("t".into()));
            let url = sheet.values_url().unwrap();
            assert!(url.query().is_none());
        }

        #[test]
        fn auth_prefers_token() {
            assert!(matches!(
                SheetAuth::from_parts(Some("key"), Some("tok")),
                Ok(SheetAuth::Bearer(_))
            ));
            assert!(matches!(
                SheetAuth::from_parts(Some("key"), None),
                Ok(SheetAuth::ApiKey(_))
            ));
            assert!(matches!(
                SheetAuth::from_parts(None, None),
                Err(SheetError::MissingCredentials)
            ));
            assert_eq!(format!("{:?}", SheetAuth::ApiKey("secret".into())), "ApiKey([REDACTED])");
        }

        #[test]
        fn cells_stringify() {
            assert_eq!(cell_to_string(serde_json::json!("a")), "a");
            assert_eq!(cell_to_string(serde_json::json!(3)), "3");
            assert_eq!(cell_to_string(serde_json::Value::Null), "");
        }
    }
}
