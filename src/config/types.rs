//! Configuration types.

use crate::auth::password::{MAX_COST, MIN_COST};
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Signing secret used when none is configured. Fine for local development,
/// never for anything reachable by others.
pub const DEFAULT_JWT_SECRET: &str = "supersecret_dev_key";

/// Seven days.
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

/// Listener and storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_db_path() -> PathBuf {
    PathBuf::from("tasks.db")
}

/// Whether task routes require a session token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Accounts, bearer tokens and per-user task scoping.
    #[default]
    Token,
    /// No accounts; every task is visible to every caller.
    Anonymous,
}

impl FromStr for AuthMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "token" => Ok(AuthMode::Token),
            "anonymous" => Ok(AuthMode::Anonymous),
            other => bail!("unknown auth mode '{}' (expected 'token' or 'anonymous')", other),
        }
    }
}

/// Account and session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,

    /// HMAC secret for session tokens.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,

    /// Session token lifetime.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_seconds: u64,

    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            mode: AuthMode::default(),
            jwt_secret: default_jwt_secret(),
            token_ttl_seconds: default_token_ttl(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_token_ttl() -> u64 {
    DEFAULT_TOKEN_TTL_SECONDS
}

fn default_bcrypt_cost() -> u32 {
    10
}

impl AuthConfig {
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

impl Config {
    /// Load configuration from a single YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            bail!("auth.jwt_secret must not be empty");
        }
        if self.auth.token_ttl_seconds == 0 {
            bail!("auth.token_ttl_seconds must be greater than zero");
        }
        if !(MIN_COST..=MAX_COST).contains(&self.auth.bcrypt_cost) {
            bail!(
                "auth.bcrypt_cost must be between {} and {}, got {}",
                MIN_COST,
                MAX_COST,
                self.auth.bcrypt_cost
            );
        }
        Ok(())
    }

    /// `host:port` string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.server.db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
