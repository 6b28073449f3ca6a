//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Config file
//! 3. Environment variables
//! 4. CLI flags (not handled here)
//!
//! # Config Locations
//!
//! Searched in order:
//! 1. An explicit path (`--config`); it must exist
//! 2. `$MAINTAINERD_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/maintainerd/config.toml`
//! 4. `~/.maintainerd/config.toml`
//!
//! # Environment
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `FOSSA_API_TOKEN` (name set by `fossa.token_env`) | FOSSA API token |
//! | `GITHUB_WEBHOOK_SECRET` (name set by `github.webhook_secret_env`) | webhook secret |
//! | `MD_WORKSHEET` | `sheet.spreadsheet_id` |
//! | `GOOGLE_API_KEY` / `GOOGLE_OAUTH_TOKEN` (names configurable) | Sheets credentials |
//!
//! # Example
//!
//! ```no_run
//! use maintainerd::core::config::Config;
//!
//! let result = Config::load(None).unwrap();
//! let config = result.config;
//!
//! println!("Database: {}", config.database_path().display());
//! println!("FOSSA token set: {}", config.fossa_token().is_some());
//! ```

pub mod schema;

pub use schema::FileConfig;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Default registry database location.
pub const DEFAULT_DB_PATH: &str = "/data/onboarding.db";

/// Default FOSSA API base URL.
pub const DEFAULT_FOSSA_API_BASE: &str = "https://app.fossa.com/api";

/// Default FOSSA organization for invitations.
pub const DEFAULT_FOSSA_ORG_ID: u64 = 162;

/// Registry name of the FOSSA service.
pub const DEFAULT_FOSSA_SERVICE: &str = "FOSSA";

/// Default maintainer sheet range (header row included).
pub const DEFAULT_SHEET_RANGE: &str = "Active!A1:J1639";

/// Default webhook listen address.
pub const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:2525";

/// Env var naming the spreadsheet.
pub const WORKSHEET_ENV: &str = "MD_WORKSHEET";

/// Env var pointing at a config file.
pub const CONFIG_ENV: &str = "MAINTAINERD_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Values read from the environment at load time.
#[derive(Clone, Default)]
struct EnvValues {
    fossa_token: Option<String>,
    webhook_secret: Option<String>,
    spreadsheet_id: Option<String>,
    sheet_api_key: Option<String>,
    sheet_token: Option<String>,
}

impl std::fmt::Debug for EnvValues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvValues")
            .field("fossa_token", &self.fossa_token.as_ref().map(|_| "[REDACTED]"))
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "[REDACTED]"))
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("sheet_api_key", &self.sheet_api_key.as_ref().map(|_| "[REDACTED]"))
            .field("sheet_token", &self.sheet_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Merged configuration from file and environment.
///
/// Accessor methods apply defaults and environment overrides.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed config file (defaults if none was found)
    pub file: FileConfig,
    env: EnvValues,
    /// Path to the config file (if loaded)
    path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the process environment and default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or
    /// parsed, or if an explicit path does not exist. Missing default
    /// config files are not an error.
    pub fn load(explicit: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        Self::load_with_env(explicit, |key| std::env::var(key).ok())
    }

    /// Load configuration using `env` to look up environment variables.
    pub fn load_with_env<F>(
        explicit: Option<&Path>,
        env: F,
    ) -> Result<ConfigLoadResult, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|v| !v.is_empty());
        let mut warnings = Vec::new();

        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => Self::locate(&env, &mut warnings),
        };
        let file = match &path {
            Some(p) => Self::read_file(p)?,
            None => FileConfig::default(),
        };
        file.validate()?;

        let mut config = Config {
            file,
            env: EnvValues::default(),
            path,
        };
        config.env = EnvValues {
            fossa_token: env(config.fossa_token_env()),
            webhook_secret: env(config.webhook_secret_env()),
            spreadsheet_id: env(WORKSHEET_ENV),
            sheet_api_key: env(config.sheet_api_key_env()),
            sheet_token: env(config.sheet_token_env()),
        };

        Ok(ConfigLoadResult { config, warnings })
    }

    fn locate<F>(env: &F, warnings: &mut Vec<ConfigWarning>) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        // 1. $MAINTAINERD_CONFIG
        if let Some(path) = env(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
            warnings.push(ConfigWarning {
                message: format!("${} points at a missing file, ignoring", CONFIG_ENV),
                path,
            });
        }

        // 2. $XDG_CONFIG_HOME/maintainerd/config.toml
        if let Some(xdg_home) = env("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("maintainerd/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. ~/.maintainerd/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".maintainerd/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    fn read_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Registry database path. Defaults to `/data/onboarding.db`.
    pub fn database_path(&self) -> PathBuf {
        self.file
            .database
            .as_ref()
            .and_then(|d| d.path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH))
    }

    pub fn fossa_api_base(&self) -> &str {
        self.file
            .fossa
            .as_ref()
            .and_then(|f| f.api_base.as_deref())
            .unwrap_or(DEFAULT_FOSSA_API_BASE)
    }

    pub fn fossa_organization_id(&self) -> u64 {
        self.file
            .fossa
            .as_ref()
            .and_then(|f| f.organization_id)
            .unwrap_or(DEFAULT_FOSSA_ORG_ID)
    }

    /// Name of the env var holding the FOSSA token. Defaults to `FOSSA_API_TOKEN`.
    pub fn fossa_token_env(&self) -> &str {
        self.file
            .fossa
            .as_ref()
            .and_then(|f| f.token_env.as_deref())
            .unwrap_or("FOSSA_API_TOKEN")
    }

    pub fn fossa_token(&self) -> Option<&str> {
        self.env.fossa_token.as_deref()
    }

    /// Registry name of the FOSSA service. Defaults to `FOSSA`.
    pub fn fossa_service(&self) -> &str {
        self.file
            .fossa
            .as_ref()
            .and_then(|f| f.service.as_deref())
            .unwrap_or(DEFAULT_FOSSA_SERVICE)
    }

    /// Name of the env var holding the webhook secret.
    pub fn webhook_secret_env(&self) -> &str {
        self.file
            .github
            .as_ref()
            .and_then(|g| g.webhook_secret_env.as_deref())
            .unwrap_or("GITHUB_WEBHOOK_SECRET")
    }

    pub fn webhook_secret(&self) -> Option<&str> {
        self.env.webhook_secret.as_deref()
    }

    /// Spreadsheet id; `$MD_WORKSHEET` wins over the file.
    pub fn spreadsheet_id(&self) -> Option<&str> {
        self.env.spreadsheet_id.as_deref().or_else(|| {
            self.file
                .sheet
                .as_ref()
                .and_then(|s| s.spreadsheet_id.as_deref())
        })
    }

    pub fn sheet_range(&self) -> &str {
        self.file
            .sheet
            .as_ref()
            .and_then(|s| s.range.as_deref())
            .unwrap_or(DEFAULT_SHEET_RANGE)
    }

    pub fn sheet_api_key_env(&self) -> &str {
        self.file
            .sheet
            .as_ref()
            .and_then(|s| s.api_key_env.as_deref())
            .unwrap_or("GOOGLE_API_KEY")
    }

    pub fn sheet_api_key(&self) -> Option<&str> {
        self.env.sheet_api_key.as_deref()
    }

    pub fn sheet_token_env(&self) -> &str {
        self.file
            .sheet
            .as_ref()
            .and_then(|s| s.token_env.as_deref())
            .unwrap_or("GOOGLE_OAUTH_TOKEN")
    }

    pub fn sheet_token(&self) -> Option<&str> {
        self.env.sheet_token.as_deref()
    }

    /// Webhook listen address. Defaults to `0.0.0.0:2525`.
    pub fn server_addr(&self) -> &str {
        self.file
            .server
            .as_ref()
            .and_then(|s| s.addr.as_deref())
            .unwrap_or(DEFAULT_SERVER_ADDR)
    }

    /// Get the path to the loaded config file.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Effective configuration with secrets reduced to set/unset markers.
    pub fn redacted(&self) -> EffectiveConfig {
        fn marker(value: Option<&str>) -> &'static str {
            if value.is_some() {
                "<set>"
            } else {
                "<unset>"
            }
        }

        EffectiveConfig {
            loaded_from: self.path.as_ref().map(|p| p.display().to_string()),
            database_path: self.database_path().display().to_string(),
            fossa_api_base: self.fossa_api_base().to_string(),
            fossa_organization_id: self.fossa_organization_id(),
            fossa_service: self.fossa_service().to_string(),
            fossa_token: format!("${} {}", self.fossa_token_env(), marker(self.fossa_token())),
            webhook_secret: format!(
                "${} {}",
                self.webhook_secret_env(),
                marker(self.webhook_secret())
            ),
            spreadsheet_id: self.spreadsheet_id().map(str::to_string),
            sheet_range: self.sheet_range().to_string(),
            sheet_api_key: format!(
                "${} {}",
                self.sheet_api_key_env(),
                marker(self.sheet_api_key())
            ),
            sheet_token: format!("${} {}", self.sheet_token_env(), marker(self.sheet_token())),
            server_addr: self.server_addr().to_string(),
        }
    }
}

/// Printable view of the effective configuration.
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loaded_from: Option<String>,
    pub database_path: String,
    pub fossa_api_base: String,
    pub fossa_organization_id: u64,
    pub fossa_service: String,
    pub fossa_token: String,
    pub webhook_secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,
    pub sheet_range: String,
    pub sheet_api_key: String,
    pub sheet_token: String,
    pub server_addr: String,
}
