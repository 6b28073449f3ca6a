//! bootstrap
//!
//! First-run population of the registry.
//!
//! # Sequence
//!
//! 1. Schema (applied when the store is opened)
//! 2. Seed the known services
//! 3. Load projects and maintainers from the worksheet rows
//! 4. Link FOSSA teams to projects with the same name
//!
//! Steps 2-4 only run when seeding is requested. Step 4 is skipped when no
//! provider is given.
//!
//! # Modules
//!
//! - [`sheet`] - worksheet sources and header-keyed rows
//! - [`load`] - row-by-row loading into the registry

pub mod load;
pub mod sheet;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::config::DEFAULT_FOSSA_SERVICE;
use crate::fossa::{FossaError, MembershipProvider};
use crate::store::{Store, StoreError};

pub use load::{load_maintainers_and_projects, LoadSummary};
pub use sheet::{CsvSheet, GoogleSheet, SheetAuth, SheetError, SheetRow, SheetSource};

/// Services known to the registry, with their descriptions.
pub const SERVICES: &[(&str, &str)] = &[
    (
        "FOSSA",
        "Static code check we use to ensure 3rd Party License Policy",
    ),
    ("Service Desk", "Jira"),
    ("cncf.groups.io", "Mailing list channels"),
    (
        "Snyk",
        "Static code checker for 3rd Party License Policy monitoring and compliance",
    ),
];

/// Errors that abort a bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error("FOSSA: {0}")]
    Provider(#[from] FossaError),
}

/// What a bootstrap did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub seeded: bool,
    pub services: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<LoadSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teams_linked: Option<usize>,
}

/// Register the known services. Safe to run repeatedly.
pub fn seed_services(store: &Store) -> Result<usize, StoreError> {
    store.transaction(|tx| {
        for (name, description) in SERVICES {
            tx.upsert_service(name, description)?;
        }
        Ok(SERVICES.len())
    })
}

/// Link every FOSSA team whose name matches a project to that project.
///
/// Returns the number of projects linked. Teams without a matching project
/// are ignored.
pub async fn link_fossa_teams(
    store: &Store,
    provider: &dyn MembershipProvider,
) -> Result<usize, BootstrapError> {
    let service = store.service_by_name(DEFAULT_FOSSA_SERVICE)?;
    let teams = provider.fetch_teams_map().await?;
    let projects = store.projects_by_name()?;
    debug!(teams = teams.len(), projects = projects.len(), "matching teams to projects");

    let linked = store.transaction(|tx| {
        let mut linked = 0;
        for (name, team) in &teams {
            if let Some(project) = projects.get(name) {
                tx.upsert_service_team(project.id, service.id, team.id, Some(name.as_str()))?;
                linked += 1;
            }
        }
        Ok(linked)
    })?;

    info!(linked, unmatched = teams.len() - linked, "linked FOSSA teams");
    Ok(linked)
}

/// Populate a freshly opened registry.
///
/// With `seed` false nothing beyond the schema is written.
pub async fn bootstrap(
    store: &Store,
    rows: &[SheetRow],
    provider: Option<&dyn MembershipProvider>,
    seed: bool,
) -> Result<BootstrapReport, BootstrapError> {
    if !seed {
        info!("schema ready, seeding skipped");
        return Ok(BootstrapReport::default());
    }

    let services = seed_services(store)?;
    let load = load_maintainers_and_projects(store, rows)?;
    info!(
        rows = load.rows,
        loaded = load.loaded,
        skipped = load.skipped,
        "loaded worksheet"
    );

    let teams_linked = match provider {
        Some(provider) => Some(link_fossa_teams(store, provider).await?),
        None => None,
    };

    Ok(BootstrapReport {
        seeded: true,
        services,
        load: Some(load),
        teams_linked,
    })
}
