//! store
//!
//! The maintainer registry, backed by SQLite.
//!
//! # Overview
//!
//! [`Store`] owns a single connection behind a mutex. Reads go through
//! methods on `Store`; multi-step writes go through [`Store::transaction`],
//! which hands a [`StoreTx`] to a closure and commits only if the closure
//! succeeds.
//!
//! # Upserts
//!
//! All `upsert_*` operations are first-or-create: an existing row is
//! returned untouched, except for [`StoreTx::upsert_service_team`], which
//! points an existing `(project, service)` pair at the new remote team.
//!
//! # Example
//!
//! ```
//! use maintainerd::store::{NewProject, Store};
//!
//! let store = Store::open_in_memory().unwrap();
//! let project = store
//!     .transaction(|tx| tx.upsert_project(&NewProject::named("envoy")))
//!     .unwrap();
//!
//! assert_eq!(store.project_by_name("envoy").unwrap().unwrap().id, project.id);
//! ```

mod schema;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;
use tracing::info;

use crate::core::types::{
    AuditEvent, Company, CompanyId, Maintainer, MaintainerId, MaintainerStatus, Maturity,
    Project, ProjectId, Service, ServiceId, ServiceTeam, EMAIL_MISSING, GITHUB_MISSING,
    MAILING_LIST_MISSING,
};

/// Errors from registry operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("invalid record: {0}")]
    Invalid(String),

    #[error("registry connection lock poisoned")]
    Poisoned,
}

impl StoreError {
    fn not_found(kind: &'static str, key: impl std::fmt::Display) -> Self {
        StoreError::NotFound {
            kind,
            key: key.to_string(),
        }
    }
}

/// Fields for a project that may not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub parent_id: Option<ProjectId>,
    pub maturity: Option<Maturity>,
    pub maintainer_ref: String,
    pub mailing_list: String,
}

impl NewProject {
    /// A project with only a name; the mailing list is the placeholder.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mailing_list: MAILING_LIST_MISSING.to_string(),
            ..Default::default()
        }
    }
}

/// Fields for a maintainer that may not exist yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewMaintainer {
    pub name: String,
    /// Empty means "no e-mail"; the placeholder is stored instead.
    pub email: String,
    /// Empty means "no account"; the placeholder is stored instead.
    pub github_account: String,
    pub status: MaintainerStatus,
    pub company_id: Option<CompanyId>,
    pub import_warnings: String,
}

/// A row from the audit log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub id: i64,
    /// RFC 3339 timestamp
    pub created_at: String,
    pub event: AuditEvent,
}

/// The maintainer registry.
pub struct Store {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    /// Open (or create) a registry at `path` and apply the schema.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory registry.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        schema::apply(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Run `f` inside a transaction, committing when it returns `Ok`.
    ///
    /// Any error rolls the transaction back.
    pub fn transaction<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&StoreTx<'_>) -> Result<T, StoreError>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let out = f(&StoreTx { conn: &*tx })?;
        tx.commit()?;
        Ok(out)
    }

    // ── Single-statement writes ─────────────────────────────────────

    pub fn upsert_service(&self, name: &str, description: &str) -> Result<Service, StoreError> {
        self.transaction(|tx| tx.upsert_service(name, description))
    }

    pub fn upsert_service_team(
        &self,
        project_id: ProjectId,
        service_id: ServiceId,
        remote_id: i64,
        remote_name: Option<&str>,
    ) -> Result<ServiceTeam, StoreError> {
        self.transaction(|tx| {
            tx.upsert_service_team(project_id, service_id, remote_id, remote_name)
        })
    }

    /// Append an event to the audit log and emit it as a log line.
    pub fn log_audit_event(&self, event: &AuditEvent) -> Result<i64, StoreError> {
        let conn = self.lock()?;
        let created_at = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO audit_log (project_id, maintainer_id, service_id, action, message, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                event.project_id.map(|id| id.0),
                event.maintainer_id.map(|id| id.0),
                event.service_id.map(|id| id.0),
                event.action,
                event.effective_message(),
                created_at,
            ],
        )?;
        let id = conn.last_insert_rowid();
        info!(
            audit_id = id,
            action = %event.action,
            project_id = ?event.project_id.map(|p| p.0),
            maintainer_id = ?event.maintainer_id.map(|m| m.0),
            service_id = ?event.service_id.map(|s| s.0),
            "{}",
            event.effective_message()
        );
        Ok(id)
    }

    // ── Queries ─────────────────────────────────────────────────────

    /// Look up a service by exact name.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` if no such service is registered.
    pub fn service_by_name(&self, name: &str) -> Result<Service, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, name, description FROM services WHERE name = ?1",
            params![name],
            service_from_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("service", name))
    }

    pub fn project_by_name(&self, name: &str) -> Result<Option<Project>, StoreError> {
        let conn = self.lock()?;
        let tx = StoreTx { conn: &*conn };
        tx.project_by_name(name)
    }

    /// Look up a project by id.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` if the id is unknown.
    pub fn project_by_id(&self, id: ProjectId) -> Result<Project, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("{} WHERE id = ?1", PROJECT_SELECT),
            params![id.0],
            project_from_row,
        )
        .optional()?
        .ok_or_else(|| StoreError::not_found("project", id))
    }

    /// All projects keyed by name.
    pub fn projects_by_name(&self) -> Result<BTreeMap<String, Project>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(PROJECT_SELECT)?;
        let rows = stmt.query_map([], project_from_row)?;
        let mut out = BTreeMap::new();
        for project in rows {
            let project = project?;
            out.insert(project.name.clone(), project);
        }
        Ok(out)
    }

    /// Maintainers linked to a project, in registration order.
    pub fn maintainers_by_project(
        &self,
        project_id: ProjectId,
    ) -> Result<Vec<Maintainer>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT m.id, m.name, m.email, m.github_account, m.status, m.company_id,
                    m.import_warnings
             FROM maintainers m
             JOIN maintainer_projects mp ON mp.maintainer_id = m.id
             WHERE mp.project_id = ?1
             ORDER BY m.id",
        )?;
        let rows = stmt.query_map(params![project_id.0], maintainer_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Look up a maintainer by e-mail, ignoring case.
    pub fn maintainer_by_email(&self, email: &str) -> Result<Option<Maintainer>, StoreError> {
        let conn = self.lock()?;
        let tx = StoreTx { conn: &*conn };
        tx.maintainer_by_email(email)
    }

    pub fn service_team_by_project(
        &self,
        project_id: ProjectId,
        service_id: ServiceId,
    ) -> Result<Option<ServiceTeam>, StoreError> {
        let conn = self.lock()?;
        Ok(conn
            .query_row(
                &format!("{} WHERE project_id = ?1 AND service_id = ?2", SERVICE_TEAM_SELECT),
                params![project_id.0, service_id.0],
                service_team_from_row,
            )
            .optional()?)
    }

    /// Service teams of the named service, ordered by project id.
    ///
    /// # Errors
    ///
    /// `StoreError::NotFound` if the service is not registered.
    pub fn service_teams_for_service(
        &self,
        service_name: &str,
    ) -> Result<Vec<ServiceTeam>, StoreError> {
        let service = self.service_by_name(service_name)?;
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE service_id = ?1 ORDER BY project_id",
            SERVICE_TEAM_SELECT
        ))?;
        let rows = stmt.query_map(params![service.id.0], service_team_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Most recent audit records first.
    pub fn recent_audit_events(&self, limit: usize) -> Result<Vec<AuditRecord>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, project_id, maintainer_id, service_id, action, message, created_at
             FROM audit_log ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(AuditRecord {
                id: row.get(0)?,
                event: AuditEvent {
                    project_id: row.get::<_, Option<i64>>(1)?.map(ProjectId),
                    maintainer_id: row.get::<_, Option<i64>>(2)?.map(MaintainerId),
                    service_id: row.get::<_, Option<i64>>(3)?.map(ServiceId),
                    action: row.get(4)?,
                    message: row.get(5)?,
                },
                created_at: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

/// Write access to the registry inside a transaction.
pub struct StoreTx<'a> {
    conn: &'a Connection,
}

impl StoreTx<'_> {
    pub fn upsert_company(&self, name: &str) -> Result<Company, StoreError> {
        self.conn.execute(
            "INSERT INTO companies (name) VALUES (?1) ON CONFLICT(name) DO NOTHING",
            params![name],
        )?;
        Ok(self.conn.query_row(
            "SELECT id, name FROM companies WHERE name = ?1",
            params![name],
            |row| {
                Ok(Company {
                    id: CompanyId(row.get(0)?),
                    name: row.get(1)?,
                })
            },
        )?)
    }

    /// Create the project unless one with the same name exists.
    ///
    /// An existing project is returned unchanged.
    pub fn upsert_project(&self, project: &NewProject) -> Result<Project, StoreError> {
        if project.name.trim().is_empty() {
            return Err(StoreError::Invalid("project name cannot be empty".to_string()));
        }
        let mailing_list = if project.mailing_list.is_empty() {
            MAILING_LIST_MISSING
        } else {
            project.mailing_list.as_str()
        };
        self.conn.execute(
            "INSERT INTO projects (name, parent_id, maturity, maintainer_ref, mailing_list)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(name) DO NOTHING",
            params![
                project.name,
                project.parent_id.map(|id| id.0),
                project.maturity.map(|m| m.as_str()),
                project.maintainer_ref,
                mailing_list,
            ],
        )?;
        self.project_by_name(&project.name)?
            .ok_or_else(|| StoreError::not_found("project", &project.name))
    }

    /// Create the maintainer unless one with the same identity exists.
    ///
    /// Maintainers with an e-mail are keyed by it (case-insensitive). Without
    /// one they are keyed by name and GitHub account.
    pub fn upsert_maintainer(&self, maintainer: &NewMaintainer) -> Result<Maintainer, StoreError> {
        let email = or_placeholder(&maintainer.email, EMAIL_MISSING);
        let github = or_placeholder(&maintainer.github_account, GITHUB_MISSING);

        let existing = if email == EMAIL_MISSING {
            self.conn
                .query_row(
                    &format!(
                        "{} WHERE email = ?1 AND name = ?2 AND github_account = ?3",
                        MAINTAINER_SELECT
                    ),
                    params![EMAIL_MISSING, maintainer.name, github],
                    maintainer_from_row,
                )
                .optional()?
        } else {
            self.maintainer_by_email(email)?
        };
        if let Some(existing) = existing {
            return Ok(existing);
        }

        self.conn.execute(
            "INSERT INTO maintainers (name, email, github_account, status, company_id, import_warnings)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                maintainer.name,
                email,
                github,
                maintainer.status.as_str(),
                maintainer.company_id.map(|id| id.0),
                maintainer.import_warnings,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        Ok(self.conn.query_row(
            &format!("{} WHERE id = ?1", MAINTAINER_SELECT),
            params![id],
            maintainer_from_row,
        )?)
    }

    pub fn link_maintainer_project(
        &self,
        maintainer_id: MaintainerId,
        project_id: ProjectId,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO maintainer_projects (maintainer_id, project_id) VALUES (?1, ?2)",
            params![maintainer_id.0, project_id.0],
        )?;
        Ok(())
    }

    pub fn upsert_service(&self, name: &str, description: &str) -> Result<Service, StoreError> {
        self.conn.execute(
            "INSERT INTO services (name, description) VALUES (?1, ?2) ON CONFLICT(name) DO NOTHING",
            params![name, description],
        )?;
        Ok(self.conn.query_row(
            "SELECT id, name, description FROM services WHERE name = ?1",
            params![name],
            service_from_row,
        )?)
    }

    /// Record the remote team holding a project's maintainers on a service.
    pub fn upsert_service_team(
        &self,
        project_id: ProjectId,
        service_id: ServiceId,
        remote_id: i64,
        remote_name: Option<&str>,
    ) -> Result<ServiceTeam, StoreError> {
        self.conn.execute(
            "INSERT INTO service_teams (project_id, service_id, remote_id, remote_name)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(project_id, service_id)
             DO UPDATE SET remote_id = excluded.remote_id, remote_name = excluded.remote_name",
            params![project_id.0, service_id.0, remote_id, remote_name],
        )?;
        Ok(self.conn.query_row(
            &format!("{} WHERE project_id = ?1 AND service_id = ?2", SERVICE_TEAM_SELECT),
            params![project_id.0, service_id.0],
            service_team_from_row,
        )?)
    }

    pub fn project_by_name(&self, name: &str) -> Result<Option<Project>, StoreError> {
        Ok(self
            .conn
            .query_row(
                &format!("{} WHERE name = ?1", PROJECT_SELECT),
                params![name],
                project_from_row,
            )
            .optional()?)
    }

    pub fn maintainer_by_email(&self, email: &str) -> Result<Option<Maintainer>, StoreError> {
        Ok(self
            .conn
            .query_row(
                &format!("{} WHERE email = ?1 COLLATE NOCASE", MAINTAINER_SELECT),
                params![email.trim()],
                maintainer_from_row,
            )
            .optional()?)
    }
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        placeholder
    } else {
        trimmed
    }
}

const PROJECT_SELECT: &str =
    "SELECT id, name, parent_id, maturity, maintainer_ref, mailing_list FROM projects";

const MAINTAINER_SELECT: &str =
    "SELECT id, name, email, github_account, status, company_id, import_warnings FROM maintainers";

const SERVICE_TEAM_SELECT: &str =
    "SELECT id, project_id, service_id, remote_id, remote_name FROM service_teams";

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    let maturity = match row.get::<_, Option<String>>(3)? {
        Some(raw) if !raw.is_empty() => {
            Some(raw.parse::<Maturity>().map_err(|e| conversion_error(3, e))?)
        }
        _ => None,
    };
    Ok(Project {
        id: ProjectId(row.get(0)?),
        name: row.get(1)?,
        parent_id: row.get::<_, Option<i64>>(2)?.map(ProjectId),
        maturity,
        maintainer_ref: row.get(4)?,
        mailing_list: row.get(5)?,
    })
}

fn maintainer_from_row(row: &Row<'_>) -> rusqlite::Result<Maintainer> {
    let status: String = row.get(4)?;
    Ok(Maintainer {
        id: MaintainerId(row.get(0)?),
        name: row.get(1)?,
        email: row.get(2)?,
        github_account: row.get(3)?,
        status: status
            .parse::<MaintainerStatus>()
            .map_err(|e| conversion_error(4, e))?,
        company_id: row.get::<_, Option<i64>>(5)?.map(CompanyId),
        import_warnings: row.get(6)?,
    })
}

fn service_from_row(row: &Row<'_>) -> rusqlite::Result<Service> {
    Ok(Service {
        id: ServiceId(row.get(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
    })
}

fn service_team_from_row(row: &Row<'_>) -> rusqlite::Result<ServiceTeam> {
    Ok(ServiceTeam {
        id: row.get(0)?,
        project_id: ProjectId(row.get(1)?),
        service_id: ServiceId(row.get(2)?),
        remote_id: row.get(3)?,
        remote_name: row.get(4)?,
    })
}
