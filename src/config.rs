//! Configuration module for atelier.

use serde::Deserialize;
use std::path::Path;

use crate::{AtelierError, Result};

/// Web server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins for the admin frontend.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8088
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/atelier.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// First-run operator account.
///
/// Applied only when the profile table is empty, so an existing installation
/// is never modified by config edits.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapConfig {
    /// Operator email address.
    pub email: String,
    /// Operator password (hashed before storage).
    pub password: String,
    /// Display name shown in the admin panel.
    #[serde(default = "default_bootstrap_name")]
    pub display_name: String,
}

fn default_bootstrap_name() -> String {
    "Site Operator".to_string()
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Path of the persisted session slot (serialized profile).
    #[serde(default = "default_session_file")]
    pub session_file: String,
    /// Timeout for resolving a prior session at startup, in seconds.
    #[serde(default = "default_init_timeout")]
    pub init_timeout_secs: u64,
    /// Path unauthenticated admin requests are redirected to.
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Optional first-run operator account.
    #[serde(default)]
    pub bootstrap: Option<BootstrapConfig>,
}

fn default_session_file() -> String {
    "data/session.json".to_string()
}

fn default_init_timeout() -> u64 {
    10
}

fn default_login_path() -> String {
    "/admin/login".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_file: default_session_file(),
            init_timeout_secs: default_init_timeout(),
            login_path: default_login_path(),
            bootstrap: None,
        }
    }
}

/// Site information configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Name of the site.
    #[serde(default = "default_site_name")]
    pub name: String,
}

fn default_site_name() -> String {
    "Atelier".to_string()
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace / debug / info / warn / error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file path; console-only when absent.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Web server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Authentication settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Site information.
    #[serde(default)]
    pub site: SiteConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AtelierError::Config(e.to_string()))
    }
}
