//! Configuration management for refdesk
//!
//! Handles loading, saving, and validating configuration from TOML files.
//! The API credential itself never lives in the file: the config names the
//! environment variable to read it from.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Upstream OpenAI API settings
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// HTTP transport settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Upstream API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Base URL of the upstream API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable name holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Vector store both tools are bound to
    #[serde(default = "default_vector_store_id")]
    pub vector_store_id: String,

    /// Model used for answer generation
    #[serde(default = "default_model")]
    pub model: String,

    /// Output length bound for answer generation
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Sampling temperature for answer generation
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// HTTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind host
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            openai: OpenAiConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            vector_store_id: default_vector_store_id(),
            model: default_model(),
            max_output_tokens: default_max_output_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Config {
    /// Default config file location (e.g. ~/.config/refdesk/config.toml)
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("refdesk")
            .join("config.toml")
    }

    /// Load configuration from a TOML file
    pub fn load(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when no file exists.
    ///
    /// An explicitly given path must exist; the default location is optional
    /// since every field has a workable default and the credential comes from
    /// the environment anyway.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default_path = Self::default_config_path();
                if default_path.exists() {
                    debug!("Loading config from {:?}", default_path);
                    Self::load(&default_path)
                } else {
                    debug!("No config file found, using defaults");
                    Ok(Config::default())
                }
            }
        }
    }

    /// Save configuration to the given path
    pub fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    /// Resolve the API key from the environment.
    ///
    /// An unset or empty variable is a configuration fault; callers construct
    /// the upstream client once at startup, so this is never checked per call.
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.openai.api_key_env) {
            Ok(key) if !key.is_empty() => Ok(key),
            _ => Err(Error::Config(format!(
                "{} environment variable is not set",
                self.openai.api_key_env
            ))),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.openai.base_url.is_empty() {
            return Err(Error::Config("openai.base_url must not be empty".to_string()));
        }

        if self.openai.vector_store_id.is_empty() {
            return Err(Error::Config(
                "openai.vector_store_id must not be empty".to_string(),
            ));
        }

        if self.openai.max_output_tokens == 0 {
            return Err(Error::Config(
                "openai.max_output_tokens must be positive".to_string(),
            ));
        }

        if self.openai.temperature < 0.0 || self.openai.temperature > 2.0 {
            return Err(Error::Config(
                "openai.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.openai.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.openai.model, "gpt-4o-mini");
        assert_eq!(config.openai.max_output_tokens, 2048);
        assert_eq!(config.server.port, 8787);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");

        let mut config = Config::default();
        config.openai.vector_store_id = "vs_test".to_string();
        config.server.port = 9000;

        config.save(&path).unwrap();
        assert!(path.exists());

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.openai.vector_store_id, "vs_test");
        assert_eq!(loaded.server.port, 9000);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[openai]\nmodel = \"gpt-4.1\"\n").unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.openai.model, "gpt-4.1");
        assert_eq!(loaded.openai.max_output_tokens, 2048);
        assert_eq!(loaded.server.host, "127.0.0.1");
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.openai.temperature = 3.0;
        assert!(config.validate().is_err());

        config.openai.temperature = 1.0;
        assert!(config.validate().is_ok());

        config.openai.max_output_tokens = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_config_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nope.toml");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn test_api_key_missing_is_config_fault() {
        let mut config = Config::default();
        config.openai.api_key_env = "REFDESK_TEST_KEY_THAT_IS_NOT_SET".to_string();

        let err = config.api_key().unwrap_err();
        assert!(err.to_string().contains("is not set"));
    }
}
