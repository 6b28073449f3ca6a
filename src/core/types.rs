//! core::types
//!
//! Strong types for the maintainer registry.
//!
//! # Types
//!
//! - [`MaintainerStatus`] - Active, Emeritus or Retired
//! - [`Maturity`] - CNCF project maturity level
//! - [`ProjectId`], [`MaintainerId`], [`ServiceId`], [`CompanyId`] - row identifiers
//! - [`Project`], [`Maintainer`], [`Company`], [`Service`], [`ServiceTeam`] - registry records
//! - [`AuditEvent`] - an action taken on behalf of a project
//!
//! # Validation
//!
//! Status and maturity values are parsed strictly; unknown values cannot be
//! represented and are rejected when read from a spreadsheet or database.
//!
//! # Examples
//!
//! ```
//! use maintainerd::core::types::{Maturity, MaintainerStatus};
//!
//! assert_eq!("Sandbox".parse::<Maturity>().unwrap(), Maturity::Sandbox);
//! assert_eq!("graduated".parse::<Maturity>().unwrap(), Maturity::Graduated);
//! assert!("Alpha".parse::<Maturity>().is_err());
//!
//! assert_eq!(MaintainerStatus::Active.to_string(), "Active");
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Placeholder stored when a maintainer has no e-mail address.
pub const EMAIL_MISSING: &str = "EMAIL_MISSING";

/// Placeholder stored when a maintainer has no GitHub account.
pub const GITHUB_MISSING: &str = "GITHUB_MISSING";

/// Placeholder stored when a project has no mailing list.
pub const MAILING_LIST_MISSING: &str = "MML_MISSING";

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid maintainer status: {0:?}")]
    InvalidStatus(String),

    #[error("invalid maturity: {0:?}")]
    InvalidMaturity(String),
}

/// Lifecycle state of a maintainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MaintainerStatus {
    /// Currently maintaining the project
    #[default]
    Active,
    /// Stepped back but still honoured by the project
    Emeritus,
    /// No longer involved
    Retired,
}

impl MaintainerStatus {
    /// The canonical name stored in the registry.
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintainerStatus::Active => "Active",
            MaintainerStatus::Emeritus => "Emeritus",
            MaintainerStatus::Retired => "Retired",
        }
    }
}

impl std::fmt::Display for MaintainerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MaintainerStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(MaintainerStatus::Active),
            "emeritus" => Ok(MaintainerStatus::Emeritus),
            "retired" => Ok(MaintainerStatus::Retired),
            _ => Err(TypeError::InvalidStatus(s.to_string())),
        }
    }
}

impl TryFrom<String> for MaintainerStatus {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MaintainerStatus> for String {
    fn from(status: MaintainerStatus) -> Self {
        status.as_str().to_string()
    }
}

/// A project's maturity, used by end-users to assess deployability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Maturity {
    Sandbox,
    Incubating,
    Graduated,
    Archived,
}

impl Maturity {
    /// The canonical name stored in the registry.
    pub fn as_str(&self) -> &'static str {
        match self {
            Maturity::Sandbox => "Sandbox",
            Maturity::Incubating => "Incubating",
            Maturity::Graduated => "Graduated",
            Maturity::Archived => "Archived",
        }
    }
}

impl std::fmt::Display for Maturity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Maturity {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Maturity::Sandbox),
            "incubating" => Ok(Maturity::Incubating),
            "graduated" => Ok(Maturity::Graduated),
            "archived" => Ok(Maturity::Archived),
            _ => Err(TypeError::InvalidMaturity(s.to_string())),
        }
    }
}

impl TryFrom<String> for Maturity {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Maturity> for String {
    fn from(maturity: Maturity) -> Self {
        maturity.as_str().to_string()
    }
}

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(
    /// Registry identifier of a project.
    ProjectId
);
row_id!(
    /// Registry identifier of a maintainer.
    MaintainerId
);
row_id!(
    /// Registry identifier of an external service (FOSSA, Snyk, ...).
    ServiceId
);
row_id!(
    /// Registry identifier of a company.
    CompanyId
);

/// A foundation project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub parent_id: Option<ProjectId>,
    pub maturity: Option<Maturity>,
    /// Link to the project's OWNERS/MAINTAINERS file
    pub maintainer_ref: String,
    pub mailing_list: String,
}

/// A leader that can speak for a project.
///
/// An e-mail address is expected at registration. A company affiliation is
/// optional. `import_warnings` lists the spreadsheet columns that were blank
/// when the maintainer was loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maintainer {
    pub id: MaintainerId,
    pub name: String,
    pub email: String,
    pub github_account: String,
    pub status: MaintainerStatus,
    pub company_id: Option<CompanyId>,
    pub import_warnings: String,
}

impl Maintainer {
    /// Whether the registry holds a real e-mail address for this maintainer.
    pub fn has_email(&self) -> bool {
        !self.email.is_empty() && self.email != EMAIL_MISSING
    }
}

/// A maintainer's employer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
}

/// An external service offered to projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub description: String,
}

/// The grouping that holds a project's maintainers on an external service.
///
/// `remote_id` is the service's own identifier (a FOSSA team id, for example).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceTeam {
    pub id: i64,
    pub project_id: ProjectId,
    pub service_id: ServiceId,
    pub remote_id: i64,
    pub remote_name: Option<String>,
}

/// An action taken on behalf of a project, recorded in the audit log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub project_id: Option<ProjectId>,
    pub maintainer_id: Option<MaintainerId>,
    pub service_id: Option<ServiceId>,
    pub action: String,
    pub message: String,
}

impl AuditEvent {
    /// Create an event for an action; the message defaults to the action.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Default::default()
        }
    }

    pub fn project(mut self, id: ProjectId) -> Self {
        self.project_id = Some(id);
        self
    }

    pub fn maintainer(mut self, id: MaintainerId) -> Self {
        self.maintainer_id = Some(id);
        self
    }

    pub fn service(mut self, id: ServiceId) -> Self {
        self.service_id = Some(id);
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// The message to persist: falls back to the action when empty.
    pub fn effective_message(&self) -> &str {
        if self.message.is_empty() {
            &self.action
        } else {
            &self.message
        }
    }
}
