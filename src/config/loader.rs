//! Configuration loader with tier-based merging.

use super::merge::merge_layers;
use super::types::{AuthMode, Config};
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    Defaults = 0,
    /// `$CWD/task-store/config.yaml`
    Project = 1,
    /// `~/.task-store/config.yaml`
    User = 2,
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover configuration directories from environment and defaults.
    pub fn discover() -> Self {
        let project_dir = std::env::var("TASK_STORE_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("task-store")));

        let user_dir = std::env::var("TASK_STORE_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".task-store")));

        Self {
            project_dir,
            user_dir,
        }
    }

    /// Create paths with explicit directories.
    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }

    fn config_file(&self, tier: ConfigTier) -> Option<PathBuf> {
        let dir = match tier {
            ConfigTier::Project => self.project_dir.as_ref(),
            ConfigTier::User => self.user_dir.as_ref(),
            ConfigTier::Defaults | ConfigTier::Environment => None,
        }?;
        Some(dir.join("config.yaml"))
    }
}

/// Read one tier's YAML file. Missing files are skipped; unreadable or
/// unparsable ones are skipped with a warning.
fn read_tier(path: &Path, tier: ConfigTier) -> Option<Value> {
    if !path.exists() {
        return None;
    }
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(tier = %tier, path = %path.display(), error = %e, "Skipping unreadable config file");
            return None;
        }
    };
    match serde_yaml::from_str::<Value>(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(tier = %tier, path = %path.display(), error = %e, "Skipping invalid config file");
            None
        }
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Highest-priority config file that contributed, if any.
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration from all tiers, including the process environment.
    ///
    /// `TASK_STORE_CONFIG_PATH` replaces the file tiers with a single file.
    pub fn load() -> Result<Self> {
        if let Ok(explicit) = std::env::var("TASK_STORE_CONFIG_PATH") {
            return Self::load_file(explicit);
        }
        let mut loader = Self::load_with_paths(ConfigPaths::discover())?;
        loader.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(loader)
    }

    /// Load a single explicit config file, then the process environment.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let config = Config::load(&path)
            .with_context(|| format!("failed to load config file {}", path.display()))?;
        let mut loader = Self {
            paths: ConfigPaths::with_dirs(None, None),
            config,
            config_path: Some(path),
        };
        loader.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(loader)
    }

    /// Merge defaults, project and user tiers. Does not read the environment.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        let mut layers: Vec<Value> = vec![serde_json::to_value(Config::default())?];
        let mut config_path = None;

        for tier in [ConfigTier::Project, ConfigTier::User] {
            let Some(file) = paths.config_file(tier) else {
                continue;
            };
            if let Some(value) = read_tier(&file, tier) {
                layers.push(value);
                config_path = Some(file);
            }
        }

        let config: Config = serde_json::from_value(merge_layers(layers))
            .context("merged configuration is invalid")?;

        Ok(Self {
            paths,
            config,
            config_path,
        })
    }

    /// Apply environment overrides, reading variables through `lookup`.
    ///
    /// The legacy `PORT` and `JWT_SECRET` names are honored when the prefixed
    /// ones are absent.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = &mut self.config;

        if let Some(db_path) = lookup("TASK_STORE_DB_PATH") {
            config.server.db_path = PathBuf::from(db_path);
        }

        if let Some(host) = lookup("TASK_STORE_HOST") {
            config.server.host = host;
        }

        if let Some(port) = lookup("TASK_STORE_PORT").or_else(|| lookup("PORT")) {
            config.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("invalid port '{}'", port))?;
        }

        if let Some(secret) = lookup("TASK_STORE_JWT_SECRET").or_else(|| lookup("JWT_SECRET")) {
            config.auth.jwt_secret = secret;
        }

        if let Some(mode) = lookup("TASK_STORE_AUTH_MODE") {
            config.auth.mode = mode.parse::<AuthMode>()?;
        }

        Ok(())
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Get the config file path that was used.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_load_defaults_only() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(
            Some(temp.path().join("project")),
            Some(temp.path().join("user")),
        );

        let loader = ConfigLoader::load_with_paths(paths).unwrap();
        let config = loader.config();

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.auth.mode, AuthMode::Token);
        assert!(loader.config_path().is_none());
    }

    #[test]
    fn test_user_config_overrides_project() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("task-store");
        let user_dir = temp.path().join("user");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::create_dir_all(&user_dir).unwrap();

        std::fs::write(
            project_dir.join("config.yaml"),
            r#"
server:
  port: 6000
  db_path: data/project.db
"#,
        )
        .unwrap();
        std::fs::write(
            user_dir.join("config.yaml"),
            r#"
server:
  port: 7000
"#,
        )
        .unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), Some(user_dir.clone()));
        let loader = ConfigLoader::load_with_paths(paths).unwrap();
        let config = loader.config();

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.db_path, PathBuf::from("data/project.db"));
        assert_eq!(loader.config_path(), Some(user_dir.join("config.yaml").as_path()));
    }

    #[test]
    fn test_invalid_tier_is_skipped() {
        let temp = TempDir::new().unwrap();
        let project_dir = temp.path().join("task-store");
        std::fs::create_dir_all(&project_dir).unwrap();
        std::fs::write(project_dir.join("config.yaml"), "server: [unclosed").unwrap();

        let paths = ConfigPaths::with_dirs(Some(project_dir), None);
        let loader = ConfigLoader::load_with_paths(paths).unwrap();
        assert_eq!(loader.config().server.port, 5000);
    }

    #[test]
    fn test_env_overrides() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(Some(temp.path().join("none")), None);
        let mut loader = ConfigLoader::load_with_paths(paths).unwrap();

        loader
            .apply_env_overrides(env(&[
                ("TASK_STORE_PORT", "8080"),
                ("JWT_SECRET", "from-legacy-var"),
                ("TASK_STORE_AUTH_MODE", "anonymous"),
                ("TASK_STORE_DB_PATH", "/tmp/x.db"),
            ]))
            .unwrap();

        let config = loader.config();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.jwt_secret, "from-legacy-var");
        assert_eq!(config.auth.mode, AuthMode::Anonymous);
        assert_eq!(config.server.db_path, PathBuf::from("/tmp/x.db"));
    }

    #[test]
    fn test_prefixed_env_wins_over_legacy() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(Some(temp.path().join("none")), None);
        let mut loader = ConfigLoader::load_with_paths(paths).unwrap();

        loader
            .apply_env_overrides(env(&[("PORT", "1111"), ("TASK_STORE_PORT", "2222")]))
            .unwrap();
        assert_eq!(loader.config().server.port, 2222);
    }

    #[test]
    fn test_bad_env_port_is_an_error() {
        let temp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(Some(temp.path().join("none")), None);
        let mut loader = ConfigLoader::load_with_paths(paths).unwrap();

        assert!(
            loader
                .apply_env_overrides(env(&[("PORT", "not-a-port")]))
                .is_err()
        );
    }

    #[test]
    fn test_load_explicit_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("custom.yaml");
        std::fs::write(
            &file,
            r#"
auth:
  token_ttl_seconds: 3600
"#,
        )
        .unwrap();

        let config = Config::load(&file).unwrap();
        assert_eq!(config.auth.token_ttl_seconds, 3600);
        assert_eq!(config.server.port, 5000);
    }
}
