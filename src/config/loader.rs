//! Configuration Loader
//!
//! Environment-aware configuration loading. Discovers `platform.toml` and
//! `platform.{environment}.toml` in the configuration directory, then applies
//! `PLATFORM__SECTION__KEY` environment overrides.

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::{Config, Environment, File};
use tracing::{debug, info};

use super::error::ConfigResult;
use super::PlatformConfig;

/// Loaded, validated configuration shared across the process
#[derive(Debug)]
pub struct ConfigManager {
    config: PlatformConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    ///
    /// Useful in tests that must not touch process-wide environment variables.
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            environment = %environment,
            directory = %config_directory.display(),
            "Loading platform configuration"
        );

        let config = Self::build_config(&config_directory, environment)?;
        config.validate()?;

        let document_store = if config.store.database_url.is_some() {
            "postgres"
        } else {
            "in_memory"
        };
        info!(
            environment = %environment,
            broker = %config.broker.redacted_url(),
            document_store = document_store,
            bind_address = %config.web.bind_address,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Wrap an already-built configuration (tests, embedding)
    pub fn from_config(config: PlatformConfig) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        let environment = if config.environment.is_empty() {
            Self::detect_environment()
        } else {
            config.environment.clone()
        };
        Ok(Arc::new(ConfigManager {
            config,
            environment,
            config_directory: Self::default_config_directory(),
        }))
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    fn build_config(config_directory: &Path, environment: &str) -> ConfigResult<PlatformConfig> {
        let base_file = config_directory.join("platform.toml");
        let env_file = config_directory.join(format!("platform.{environment}.toml"));

        let mut config: PlatformConfig = Config::builder()
            .add_source(File::from(base_file.as_path()).required(false))
            .add_source(File::from(env_file.as_path()).required(false))
            .add_source(
                Environment::with_prefix("PLATFORM")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.environment = environment.to_string();
        Ok(config)
    }

    /// Current environment from `PLATFORM_ENV`, then `APP_ENV`
    pub fn detect_environment() -> String {
        env::var("PLATFORM_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    fn default_config_directory() -> PathBuf {
        env::var("PLATFORM_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_missing_directory_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let manager = ConfigManager::load_from_directory_with_env(
            Some(dir.path().join("does-not-exist")),
            "test",
        )
        .expect("defaults should load");

        assert_eq!(manager.environment(), "test");
        assert_eq!(manager.config().broker.port, 5672);
        assert_eq!(manager.config().environment, "test");
    }

    #[test]
    fn test_environment_file_overrides_base_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("platform.toml"),
            r#"
[broker]
host = "rabbitmq.internal"
port = 5673

[publish]
timeout_ms = 2000
"#,
        )
        .expect("write base");
        fs::write(
            dir.path().join("platform.production.toml"),
            r#"
[publish]
timeout_ms = 3000
max_retries = 2
"#,
        )
        .expect("write env");

        let manager =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "production")
                .expect("config should load");
        let config = manager.config();

        assert_eq!(config.broker.host, "rabbitmq.internal");
        assert_eq!(config.broker.port, 5673);
        assert_eq!(config.publish.timeout_ms, 3000);
        assert_eq!(config.publish.max_retries, 2);
        // untouched sections keep their defaults
        assert_eq!(config.publish.retry_backoff_ms, 500);
    }

    #[test]
    fn test_invalid_file_value_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("platform.toml"),
            "[store]\nquery_timeout_ms = 0\n",
        )
        .expect("write base");

        let result =
            ConfigManager::load_from_directory_with_env(Some(dir.path().to_path_buf()), "test");
        assert!(result.is_err());
    }
}
