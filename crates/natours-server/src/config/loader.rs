//! Configuration loading utilities.

use super::types::ServerConfig;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Load configuration from various sources.
pub struct ConfigLoader {
    config_path: Option<String>,
    env_prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: "NATOURS".to_string(),
        }
    }

    /// Set config file path.
    pub fn with_config_path(mut self, path: impl Into<String>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Set environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load configuration.
    ///
    /// Later sources win: embedded defaults, then the config file, then
    /// `NATOURS__SECTION__KEY` environment variables.
    pub fn load(&self) -> Result<ServerConfig> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::File::from_str(
            include_str!("defaults.toml"),
            config::FileFormat::Toml,
        ));

        if let Some(path) = &self.config_path {
            if Path::new(path).exists() {
                info!(path = %path, "Loading config file");
                builder = builder.add_source(config::File::with_name(path));
            }
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Load configuration from environment.
pub fn load_config() -> Result<ServerConfig> {
    let config_path = std::env::var("CONFIG_PATH").ok();

    let mut loader = ConfigLoader::new();
    if let Some(path) = config_path {
        loader = loader.with_config_path(path);
    }

    loader.load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{Environment, PLACEHOLDER_JWT_SECRET};

    #[test]
    fn test_embedded_defaults_load() {
        // A prefix nothing in the test environment sets.
        let config = ConfigLoader::new()
            .with_env_prefix("NATOURS_LOADER_TEST_UNSET")
            .load()
            .unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.environment, Environment::Development);
        assert_eq!(config.auth.jwt_secret, PLACEHOLDER_JWT_SECRET);
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.body.limit_bytes, 10_240);
        assert_eq!(config.params.whitelist.len(), 6);
        assert_eq!(config.security.default_src, vec!["'self'".to_string()]);
    }

    #[test]
    fn test_missing_config_file_is_skipped() {
        let config = ConfigLoader::new()
            .with_env_prefix("NATOURS_LOADER_TEST_UNSET")
            .with_config_path("/nonexistent/natours.toml")
            .load()
            .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
    }
}
