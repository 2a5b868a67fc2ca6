mod types;

pub use types::*;

use crate::{Error, Result};
use std::{env, path::Path};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Where the loaded configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(String),
    /// `CONFIG_PATH` unset and no `config.yaml` in the working directory.
    Defaults,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => f.write_str(path),
            Self::Defaults => f.write_str("built-in defaults"),
        }
    }
}

/// Load, resolve and validate the configuration.
///
/// Runs before logging is set up, so the source is returned for the caller to report.
pub async fn load() -> Result<(Config, ConfigSource)> {
    let explicit = env::var("CONFIG_PATH").ok();
    let config_path = explicit
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let (mut config, source) = if explicit.is_none() && !Path::new(&config_path).exists() {
        (Config::default(), ConfigSource::Defaults)
    } else {
        let config = load_from(&config_path).await?;
        (config, ConfigSource::File(config_path))
    };

    config.resolve_api_key(|name| env::var(name).ok());
    config.validate()?;

    Ok((config, source))
}

pub async fn load_from(path: &str) -> Result<Config> {
    let config_str = tokio::fs::read_to_string(path).await?;
    from_yaml(&config_str)
}

pub fn from_yaml(yaml: &str) -> Result<Config> {
    // An empty document deserializes to unit, not to a defaulted struct.
    if yaml.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(yaml)?)
}

impl Config {
    /// Fill an empty `llm.api_key` from the variable named by `llm.api_key_env`.
    pub fn resolve_api_key<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if !self.llm.api_key.is_empty() {
            return;
        }
        if let Some(key) = lookup(&self.llm.api_key_env).filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = key;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.llm.api_key.trim().is_empty() {
            return Err(Error::config(format!(
                "LLM API key missing: set llm.api_key or ${}",
                self.llm.api_key_env
            )));
        }
        if self.llm.model.trim().is_empty() {
            return Err(Error::config("llm.model must not be empty"));
        }
        if self.llm.timeout_secs == 0 {
            return Err(Error::config("llm.timeout_secs must be at least 1"));
        }
        if self.vision.top_k == 0 {
            return Err(Error::config("vision.top_k must be at least 1"));
        }
        if self.vision.max_image_dimension == 0 {
            return Err(Error::config("vision.max_image_dimension must be positive"));
        }
        if self.server.max_body_bytes == 0 {
            return Err(Error::config("server.max_body_bytes must be positive"));
        }
        Ok(())
    }
}
