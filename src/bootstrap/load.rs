//! bootstrap::load
//!
//! Loads maintainer sheet rows into the registry.
//!
//! Each row is applied in its own transaction. A row that fails is rolled
//! back, logged and counted; the load carries on with the next row.
//!
//! Blank maintainer fields do not reject a row. The placeholder is stored
//! and the blank columns are listed in the maintainer's `import_warnings`
//! (`":Company:Emails"`, for example).

use serde::Serialize;
use tracing::{debug, warn};

use super::sheet::{
    SheetRow, COMPANY_HDR, EMAIL_HDR, GITHUB_HDR, MAILING_LIST_HDR, MAINTAINER_FILE_REF_HDR,
    MAINTAINER_NAME_HDR, PARENT_PROJECT_HDR, PROJECT_HDR, STATUS_HDR,
};
use crate::core::types::{MaintainerStatus, Maturity, Project};
use crate::store::{NewMaintainer, NewProject, Store, StoreError, StoreTx};

/// Counts from a load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// Data rows read from the sheet.
    pub rows: usize,
    /// Rows committed to the registry.
    pub loaded: usize,
    /// Rows rolled back.
    pub skipped: usize,
    /// Loaded maintainers with at least one blank field.
    pub with_warnings: usize,
}

/// Load projects, companies and maintainers from sheet rows.
///
/// # Errors
///
/// Only registry-level failures (a poisoned connection) abort the load.
/// Row-level failures are counted in `skipped`.
pub fn load_maintainers_and_projects(
    store: &Store,
    rows: &[SheetRow],
) -> Result<LoadSummary, StoreError> {
    let mut summary = LoadSummary {
        rows: rows.len(),
        ..Default::default()
    };

    for (index, row) in rows.iter().enumerate() {
        match store.transaction(|tx| load_row(tx, row)) {
            Ok(warned) => {
                summary.loaded += 1;
                if warned {
                    summary.with_warnings += 1;
                }
            }
            Err(StoreError::Poisoned) => return Err(StoreError::Poisoned),
            Err(err) => {
                // Sheet row numbers are 1-based and the header is row 1.
                warn!(row = index + 2, project = row.get(PROJECT_HDR), error = %err, "row skipped");
                summary.skipped += 1;
            }
        }
    }

    Ok(summary)
}

/// Apply one row. Returns whether the maintainer carries import warnings.
fn load_row(tx: &StoreTx<'_>, row: &SheetRow) -> Result<bool, StoreError> {
    let project_name = row.get(PROJECT_HDR);
    if project_name.is_empty() {
        return Err(StoreError::Invalid("row has no project".to_string()));
    }

    let parent = match row.get(PARENT_PROJECT_HDR) {
        "" => None,
        name => {
            let parent = tx.project_by_name(name)?;
            if parent.is_none() {
                debug!(project = project_name, parent = name, "parent project not loaded yet");
            }
            parent
        }
    };

    let project = tx.upsert_project(&NewProject {
        name: project_name.to_string(),
        parent_id: parent.as_ref().map(|p| p.id),
        maturity: maturity_for(row, parent.as_ref()),
        maintainer_ref: row.get(MAINTAINER_FILE_REF_HDR).to_string(),
        mailing_list: row.get(MAILING_LIST_HDR).to_string(),
    })?;

    let name = row.get(MAINTAINER_NAME_HDR);
    let company = row.get(COMPANY_HDR);
    let email = row.get(EMAIL_HDR);
    let github = row.get(GITHUB_HDR);

    // A row that only describes the project.
    if name.is_empty() && email.is_empty() && github.is_empty() {
        return Ok(false);
    }

    let warnings = import_warnings(row);
    let company_id = match company {
        "" => None,
        company => Some(tx.upsert_company(company)?.id),
    };

    let maintainer = tx.upsert_maintainer(&NewMaintainer {
        name: name.to_string(),
        email: email.to_string(),
        github_account: github.to_string(),
        status: MaintainerStatus::Active,
        company_id,
        import_warnings: warnings.clone(),
    })?;
    tx.link_maintainer_project(maintainer.id, project.id)?;

    Ok(!warnings.is_empty())
}

/// A child project inherits its parent's maturity; otherwise the `Status`
/// column is used when it names a known maturity.
fn maturity_for(row: &SheetRow, parent: Option<&Project>) -> Option<Maturity> {
    if let Some(parent) = parent {
        return parent.maturity;
    }
    match row.get(STATUS_HDR) {
        "" => None,
        status => match status.parse() {
            Ok(maturity) => Some(maturity),
            Err(err) => {
                debug!(project = row.get(PROJECT_HDR), error = %err, "ignoring status");
                None
            }
        },
    }
}

/// Blank maintainer columns, each prefixed with `:`.
pub fn import_warnings(row: &SheetRow) -> String {
    [MAINTAINER_NAME_HDR, COMPANY_HDR, EMAIL_HDR, GITHUB_HDR]
        .iter()
        .filter(|header| row.get(header).is_empty())
        .map(|header| format!(":{}", header))
        .collect()
}
