//! Configuration management for Bizlink

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::secure_store::SecureStoreConfig;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_NEWS_URL: &str = "https://newsapi.org/v2";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub credentials: SecureStoreConfig,
}

/// Backend REST API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub base_url: String,

    /// Request timeout in seconds; unset means no timeout
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// News aggregation endpoint settings
///
/// The API key is never part of the file. `api_key_env` names the
/// environment variable it is read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    #[serde(default = "default_news_url")]
    pub base_url: String,
    #[serde(default = "default_news_topic")]
    pub topic: String,
    #[serde(default = "default_news_language")]
    pub language: String,
    #[serde(default = "default_news_key_env")]
    pub api_key_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_news_url() -> String {
    DEFAULT_NEWS_URL.to_string()
}

fn default_news_topic() -> String {
    "business".to_string()
}

fn default_news_language() -> String {
    "en".to_string()
}

fn default_news_key_env() -> String {
    "BIZLINK_NEWS_API_KEY".to_string()
}

fn default_storage_path() -> String {
    "~/.local/share/bizlink/state.db".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            timeout_secs: None,
        }
    }
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            base_url: default_news_url(),
            topic: default_news_topic(),
            language: default_news_language(),
            api_key_env: default_news_key_env(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

impl NewsConfig {
    /// Read the news API key from the configured environment variable
    pub fn api_key(&self) -> Result<SecretString> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(SecretString::from(key)),
            _ => Err(ConfigError::MissingField(format!(
                "news API key (set {})",
                self.api_key_env
            ))
            .into()),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from the default location, or fall back to the
    /// built-in defaults when no config file exists yet
    pub fn load_or_default() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if !config_path.exists() {
            tracing::debug!(
                "No config file at {:?}, using default configuration",
                config_path
            );
            return Ok(Self::default_config());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;

        if config.api.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField("api.base_url".to_string()).into());
        }

        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Resolved path of the state database
    pub fn storage_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.storage.path).to_string())
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("BIZLINK_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("bizlink").join("config.toml"))
}

/// Resolve the data directory path following XDG Base Directory spec
pub fn resolve_data_path() -> Result<PathBuf> {
    let data_dir =
        dirs::data_dir().ok_or_else(|| ConfigError::MissingField("data directory".to_string()))?;

    Ok(data_dir.join("bizlink"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secure_store::StorageBackend;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default_config();
        assert_eq!(config.api.base_url, "http://localhost:3000");
        assert_eq!(config.api.timeout_secs, None);
        assert_eq!(config.news.topic, "business");
        assert_eq!(config.news.language, "en");
        assert_eq!(config.news.api_key_env, "BIZLINK_NEWS_API_KEY");
        assert_eq!(config.credentials.storage, StorageBackend::Keyring);
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[api]
base_url = "https://api.example.com"
timeout_secs = 15

[credentials]
storage = "memory"
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config.api.base_url, "https://api.example.com");
        assert_eq!(config.api.timeout_secs, Some(15));
        assert_eq!(config.news.base_url, DEFAULT_NEWS_URL);
        assert_eq!(config.credentials.storage, StorageBackend::Memory);
    }

    #[test]
    fn test_load_rejects_empty_base_url() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[api]\nbase_url = \"\"\n").unwrap();

        let result = Config::load_from_path(&path);
        assert!(matches!(
            result,
            Err(crate::BizlinkError::Config(ConfigError::MissingField(_)))
        ));
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[api\nbase_url = ").unwrap();

        let result = Config::load_from_path(&path);
        assert!(matches!(
            result,
            Err(crate::BizlinkError::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    #[serial]
    fn test_config_path_from_env() {
        std::env::set_var("BIZLINK_CONFIG", "/tmp/bizlink-test/config.toml");
        let path = resolve_config_path().unwrap();
        std::env::remove_var("BIZLINK_CONFIG");
        assert_eq!(path, PathBuf::from("/tmp/bizlink-test/config.toml"));
    }

    #[test]
    #[serial]
    fn test_load_or_default_without_file() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("absent.toml");
        std::env::set_var("BIZLINK_CONFIG", missing.to_str().unwrap());
        let config = Config::load_or_default().unwrap();
        std::env::remove_var("BIZLINK_CONFIG");
        assert_eq!(config.api.base_url, DEFAULT_API_URL);
    }

    #[test]
    #[serial]
    fn test_news_api_key_from_env() {
        let news = NewsConfig {
            api_key_env: "BIZLINK_TEST_NEWS_KEY".to_string(),
            ..NewsConfig::default()
        };

        std::env::remove_var("BIZLINK_TEST_NEWS_KEY");
        assert!(news.api_key().is_err());

        std::env::set_var("BIZLINK_TEST_NEWS_KEY", "k-123");
        let key = news.api_key().unwrap();
        std::env::remove_var("BIZLINK_TEST_NEWS_KEY");
        assert_eq!(key.expose_secret(), "k-123");
    }
}
