//! Layered configuration for the acquisition pipeline.
//!
//! Defaults, then an optional config file, then environment variables
//! (`SHADOW_ATLAS__<SECTION>__<FIELD>`), in that order — the same
//! precedence the `config` crate's `ConfigBuilder` applies layer by layer.

use serde::{Deserialize, Serialize};

/// Per-scraper HTTP discipline (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub max_parallel: usize,
    pub rate_limit: f64,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub backoff_multiplier: f64,
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_parallel: 5,
            rate_limit: 5.0,
            timeout_ms: 5_000,
            max_retries: 3,
            backoff_multiplier: 2.0,
            user_agent: format!("Shadow-Atlas-Acquisition/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("user_agent must not be empty")]
    EmptyUserAgent,
    #[error("max_parallel must be at least 1")]
    ZeroParallelism,
    #[error("rate_limit must be positive")]
    NonPositiveRateLimit,
    #[error("config source error: {0}")]
    Source(#[from] ::config::ConfigError),
}

impl ScraperConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::EmptyUserAgent);
        }
        if self.max_parallel == 0 {
            return Err(ConfigError::ZeroParallelism);
        }
        if self.rate_limit <= 0.0 {
            return Err(ConfigError::NonPositiveRateLimit);
        }
        Ok(())
    }
}

/// Top-level orchestrator run settings (spec §4.10, §5).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub max_concurrent_downloads: usize,
    pub provenance_staging: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { max_concurrent_downloads: 10, provenance_staging: false }
    }
}

/// Postgres connection settings backing the artifact/head store, following
/// the teacher's `DatabaseConfig` shape (host/port/db/user/password/pool
/// bounds plus a `database_url()` builder).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
    pub pool_min: u32,
    pub pool_max: u32,
    pub connection_timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            database: "shadow_atlas".to_string(),
            username: "postgres".to_string(),
            password: String::new(),
            pool_min: 2,
            pool_max: 10,
            connection_timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_min == 0 {
            return Err(ConfigError::Source(::config::ConfigError::Message(
                "pool_min must be at least 1".into(),
            )));
        }
        if self.pool_min > self.pool_max {
            return Err(ConfigError::Source(::config::ConfigError::Message(
                "pool_min cannot exceed pool_max".into(),
            )));
        }
        Ok(())
    }
}

/// The full layered configuration tree.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub scraper: ScraperConfig,
    pub orchestrator: OrchestratorConfig,
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Loads defaults, then `path` if it exists, then environment
    /// variables prefixed `SHADOW_ATLAS` with `__` as the section
    /// separator (e.g. `SHADOW_ATLAS__DATABASE__HOST`).
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder()
            .add_source(::config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = path {
            if std::path::Path::new(path).exists() {
                builder = builder.add_source(::config::File::with_name(path));
            } else {
                tracing::warn!(path, "config file not found, skipping");
            }
        }

        let builder = builder.add_source(
            ::config::Environment::with_prefix("SHADOW_ATLAS")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.scraper.validate()?;
        config.database.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.scraper.validate().unwrap();
        config.database.validate().unwrap();
    }

    #[test]
    fn default_user_agent_carries_crate_version() {
        let config = ScraperConfig::default();
        assert!(config.user_agent.starts_with("Shadow-Atlas-Acquisition/"));
    }

    #[test]
    fn rejects_empty_user_agent() {
        let mut config = ScraperConfig::default();
        config.user_agent.clear();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyUserAgent)));
    }

    #[test]
    fn rejects_pool_min_above_pool_max() {
        let mut db = DatabaseConfig::default();
        db.pool_min = 20;
        db.pool_max = 5;
        assert!(db.validate().is_err());
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.orchestrator.max_concurrent_downloads, 10);
    }
}
