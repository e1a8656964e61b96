//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::Error;
use crate::upstream::UpstreamFixtures;
use crate::Result;

/// Environment variable holding the Gemini API key
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// LLM provider to use
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Gemini API key; `GOOGLE_API_KEY` takes precedence
    #[serde(default)]
    pub gemini_api_key: String,

    /// Model to use
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum model steps per agent run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Seconds to wait for one model step (0 disables)
    #[serde(default = "default_model_timeout_secs")]
    pub model_timeout_secs: u64,

    /// Seconds to wait for one tool call (0 disables)
    #[serde(default = "default_tool_timeout_secs")]
    pub tool_timeout_secs: u64,

    /// Where `serve` listens
    #[serde(default)]
    pub server: ServerConfig,

    /// Tool server the agent connects to
    #[serde(default = "default_tool_server_url")]
    pub tool_server_url: String,

    /// Data answering lounge and schedule lookups
    #[serde(default)]
    pub upstream: UpstreamFixtures,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
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

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_max_iterations() -> usize {
    20
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_model_timeout_secs() -> u64 {
    60
}

fn default_tool_timeout_secs() -> u64 {
    30
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_tool_server_url() -> String {
    "http://localhost:3000".to_string()
}

fn timeout(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            gemini_api_key: String::new(),
            model: default_model(),
            max_iterations: default_max_iterations(),
            model_timeout_secs: default_model_timeout_secs(),
            tool_timeout_secs: default_tool_timeout_secs(),
            server: ServerConfig::default(),
            tool_server_url: default_tool_server_url(),
            upstream: UpstreamFixtures::default(),
        }
    }
}

impl Config {
    pub fn model_timeout(&self) -> Option<Duration> {
        timeout(self.model_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Option<Duration> {
        timeout(self.tool_timeout_secs)
    }

    /// Apply overrides from the environment.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.gemini_api_key = key.trim().to_string();
            }
        }
    }
}

/// Get the config directory path
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".lounge")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

/// Load configuration from the default location, then the environment
pub fn load() -> Result<Config> {
    let _ = dotenvy::dotenv();
    let mut config = load_from(&config_path())?;
    config.apply_env();
    Ok(config)
}

/// Load configuration from a file; a missing file yields the defaults
pub fn load_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        warn!("Config not found at {:?}, using defaults", path);
        return Ok(Config::default());
    }

    debug!("Loading config from {:?}", path);
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid config at {:?}: {}", path, e)))
}

/// Save configuration to file
pub fn save(config: &Config, path: &Path) -> Result<()> {
    // Create parent directory
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model, "gemini-2.0-flash");
        assert_eq!(config.max_iterations, 20);
        assert_eq!(config.server.bind_addr(), "127.0.0.1:3000");
        assert_eq!(config.tool_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"model_timeout_secs": 0, "server": {"port": 8080}}"#).unwrap();
        assert_eq!(config.model_timeout(), None);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.provider, "gemini");
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.json");

        let mut config = Config::default();
        config
            .upstream
            .lounges
            .insert("s1".to_string(), vec!["LoungeA".to_string()]);
        save(&config, &path).unwrap();

        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded.model, config.model);
        assert_eq!(loaded.upstream.lounges["s1"], vec!["LoungeA"]);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_from(&tmp.path().join("absent.json")).unwrap();
        assert_eq!(config.tool_server_url, "http://localhost:3000");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_from(&path), Err(Error::Config(_))));
    }
}
