use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use strum::{Display, EnumString};
use tracing::debug;

use crate::compatibility::CompatibilityPolicy;
use crate::database::connection::DEFAULT_DATABASE_PATH;
use crate::services::pagination::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

pub const ENV_ENVIRONMENT: &str = "CONFIGURATOR_ENV";
pub const ENV_DATABASE: &str = "CONFIGURATOR_DATABASE";
pub const ENV_PORT: &str = "CONFIGURATOR_PORT";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Environment {
    Development,
    #[default]
    Production,
    Test,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            cors_origin: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_DATABASE_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    pub default_limit: u64,
    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: MAX_PAGE_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompatibilityConfig {
    pub policy: CompatibilityPolicy,
}

/// Service configuration. Sources in increasing precedence: defaults, YAML
/// file, `CONFIGURATOR_*` environment variables, command line flags.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub environment: Environment,
    pub pagination: PaginationConfig,
    pub compatibility: CompatibilityConfig,
}

/// Values given on the command line; `None` leaves lower layers in place.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub port: Option<u16>,
    pub database: Option<String>,
    pub cors_origin: Option<String>,
    pub allow_list: bool,
}

impl AppConfig {
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(content).context("Invalid configuration file")?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Resolve the full configuration for a process.
    pub fn load(path: Option<&Path>, overrides: &CliOverrides) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.apply_overrides(overrides);
        debug!("Resolved configuration: {:?}", config);
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(env) = lookup(ENV_ENVIRONMENT) {
            self.environment = env
                .parse()
                .with_context(|| format!("{} must be development, production or test", ENV_ENVIRONMENT))?;
        }
        if let Some(database) = lookup(ENV_DATABASE) {
            self.database.path = database;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port
                .parse()
                .with_context(|| format!("{} must be a port number", ENV_PORT))?;
        }
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: &CliOverrides) {
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(database) = &overrides.database {
            self.database.path = database.clone();
        }
        if let Some(origin) = &overrides.cors_origin {
            self.server.cors_origin = Some(origin.clone());
        }
        if overrides.allow_list {
            self.compatibility.policy = CompatibilityPolicy::AllowList;
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.path, "configurator.db");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.pagination.default_limit, 10);
        assert_eq!(config.compatibility.policy, CompatibilityPolicy::Permissive);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = AppConfig::from_yaml(
            "server:\n  port: 8080\ncompatibility:\n  policy: allow_list\nenvironment: development\n",
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.cors_origin, None);
        assert_eq!(config.compatibility.policy, CompatibilityPolicy::AllowList);
        assert!(config.is_development());
        assert_eq!(config.pagination.max_limit, 100);
    }

    #[test]
    fn test_invalid_yaml_is_an_error() {
        assert!(AppConfig::from_yaml("compatibility:\n  policy: strict\n").is_err());
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "server:\n  port: 4000\ndatabase:\n  path: file.db").unwrap();

        let mut config = AppConfig::from_file(file.path()).unwrap();
        let env: HashMap<&str, &str> = [(ENV_PORT, "5000"), (ENV_DATABASE, "env.db"), (ENV_ENVIRONMENT, "Test")]
            .into_iter()
            .collect();
        config.apply_env(|key| env.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.database.path, "env.db");
        assert_eq!(config.environment, Environment::Test);

        config.apply_overrides(&CliOverrides {
            port: Some(6000),
            allow_list: true,
            ..Default::default()
        });
        assert_eq!(config.server.port, 6000);
        assert_eq!(config.database.path, "env.db");
        assert_eq!(config.compatibility.policy, CompatibilityPolicy::AllowList);
    }

    #[test]
    fn test_bad_env_port() {
        let mut config = AppConfig::default();
        let result = config.apply_env(|key| (key == ENV_PORT).then(|| "not-a-port".to_string()));
        assert!(result.is_err());
    }
}
