//! core::config::schema
//!
//! Configuration file schema.
//!
//! # Location
//!
//! Searched in order (first hit wins):
//! 1. `--config <path>`
//! 2. `$MAINTAINERD_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/maintainerd/config.toml`
//! 4. `~/.maintainerd/config.toml`
//!
//! # Validation
//!
//! Unknown keys are rejected at parse time. Values are validated after
//! parsing (non-empty names, a URL-shaped API base, a socket address).
//!
//! Secrets never live in the file. Each section names the environment
//! variable that holds its secret instead.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Contents of `config.toml`.
///
/// # Example
///
/// ```toml
/// [database]
/// path = "/data/onboarding.db"
///
/// [fossa]
/// api_base = "https://app.fossa.com/api"
/// organization_id = 162
/// token_env = "FOSSA_API_TOKEN"
///
/// [sheet]
/// spreadsheet_id = "1AbC..."
/// range = "Active!A1:J1639"
///
/// [server]
/// addr = "0.0.0.0:2525"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub database: Option<DatabaseConfig>,
    pub fossa: Option<FossaConfig>,
    pub github: Option<GithubConfig>,
    pub sheet: Option<SheetConfig>,
    pub server: Option<ServerConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(db) = &self.database {
            if let Some(path) = &db.path {
                if path.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidValue(
                        "database.path cannot be empty".to_string(),
                    ));
                }
            }
        }
        if let Some(fossa) = &self.fossa {
            fossa.validate()?;
        }
        if let Some(github) = &self.github {
            non_empty("github.webhook_secret_env", &github.webhook_secret_env)?;
        }
        if let Some(sheet) = &self.sheet {
            non_empty("sheet.spreadsheet_id", &sheet.spreadsheet_id)?;
            non_empty("sheet.range", &sheet.range)?;
            non_empty("sheet.api_key_env", &sheet.api_key_env)?;
            non_empty("sheet.token_env", &sheet.token_env)?;
        }
        if let Some(server) = &self.server {
            if let Some(addr) = &server.addr {
                addr.parse::<SocketAddr>().map_err(|e| {
                    ConfigError::InvalidValue(format!("invalid server.addr '{}': {}", addr, e))
                })?;
            }
        }
        Ok(())
    }
}

/// Registry database settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite file path
    pub path: Option<std::path::PathBuf>,
}

/// FOSSA API settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FossaConfig {
    /// API base URL
    pub api_base: Option<String>,

    /// Organization that invitations are sent for
    pub organization_id: Option<u64>,

    /// Name of the env var holding the API token
    pub token_env: Option<String>,

    /// Registry name of the FOSSA service
    pub service: Option<String>,
}

impl FossaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base) = &self.api_base {
            if !(base.starts_with("http://") || base.starts_with("https://")) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid fossa.api_base '{}', must be an http(s) URL",
                    base
                )));
            }
        }
        if self.organization_id == Some(0) {
            return Err(ConfigError::InvalidValue(
                "fossa.organization_id must be positive".to_string(),
            ));
        }
        non_empty("fossa.token_env", &self.token_env)?;
        non_empty("fossa.service", &self.service)
    }
}

/// GitHub webhook settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GithubConfig {
    /// Name of the env var holding the webhook secret
    pub webhook_secret_env: Option<String>,
}

/// Maintainer spreadsheet settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SheetConfig {
    pub spreadsheet_id: Option<String>,

    /// A1 range, header row included
    pub range: Option<String>,

    /// Name of the env var holding a Sheets API key
    pub api_key_env: Option<String>,

    /// Name of the env var holding an OAuth bearer token
    pub token_env: Option<String>,
}

/// Webhook server settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen address, e.g. `0.0.0.0:2525`
    pub addr: Option<String>,
}

fn non_empty(key: &str, value: &Option<String>) -> Result<(), ConfigError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(ConfigError::InvalidValue(format!(
            "{} cannot be empty",
            key
        ))),
        _ => Ok(()),
    }
}
