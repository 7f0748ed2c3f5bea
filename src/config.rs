use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OrbConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub providers: ProviderConfig,
    pub refresh: RefreshConfig,
    pub memory: MemoryConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ProviderConfig {
    /// Which chat backend generates story text: `azure` or `perplexity`.
    pub generator: String,
    pub azure_endpoint: String,
    pub azure_deployment: String,
    pub azure_tts_deployment: String,
    pub perplexity_model: String,
    pub tts_voice: String,
    /// Upper bound on any single provider HTTP call, in seconds.
    pub request_timeout_secs: u64,
    /// API keys come from the environment only, never from the config file.
    #[serde(skip)]
    pub azure_api_key: Option<String>,
    #[serde(skip)]
    pub perplexity_api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RefreshConfig {
    pub enabled: bool,
    pub interval_minutes: u64,
    /// Minimum cached stories per (category, epoch, language) key.
    pub stories_per_key: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MemoryConfig {
    pub max_entries: usize,
    pub similarity_threshold: f64,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            providers: ProviderConfig::default(),
            refresh: RefreshConfig::default(),
            memory: MemoryConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8787,
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_orb_dir()
            .join("orbgame.db")
            .to_string_lossy()
            .into_owned();
        Self { db_path }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            generator: "azure".into(),
            azure_endpoint: "https://aimcs-foundry.cognitiveservices.azure.com/".into(),
            azure_deployment: "o4-mini".into(),
            azure_tts_deployment: "gpt-4o-mini-tts".into(),
            perplexity_model: "sonar".into(),
            tts_voice: "alloy".into(),
            request_timeout_secs: 30,
            azure_api_key: None,
            perplexity_api_key: None,
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_minutes: 30,
            stories_per_key: 3,
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            similarity_threshold: 0.8,
        }
    }
}

/// Returns `~/.orbgame/`
pub fn default_orb_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".orbgame")
}

/// Returns the default config file path: `~/.orbgame/config.toml`
pub fn default_config_path() -> PathBuf {
    default_orb_dir().join("config.toml")
}

impl OrbConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            OrbConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (ORB_* plus provider credentials).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ORB_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("ORB_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("ORB_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("ORB_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("AZURE_OPENAI_ENDPOINT") {
            self.providers.azure_endpoint = val;
        }
        if let Ok(val) = std::env::var("AZURE_OPENAI_API_KEY") {
            self.providers.azure_api_key = Some(val);
        }
        if let Ok(val) = std::env::var("PERPLEXITY_API_KEY") {
            self.providers.perplexity_api_key = Some(val);
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = OrbConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8787);
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.refresh.stories_per_key, 3);
        assert!(config.storage.db_path.ends_with("orbgame.db"));
        assert!(config.providers.azure_api_key.is_none());
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
port = 9000
log_level = "debug"

[storage]
db_path = "/tmp/test.db"

[providers]
generator = "perplexity"

[refresh]
enabled = true
stories_per_key = 5
"#;
        let config: OrbConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.storage.db_path, "/tmp/test.db");
        assert_eq!(config.providers.generator, "perplexity");
        assert!(config.refresh.enabled);
        assert_eq!(config.refresh.stories_per_key, 5);
        // defaults still apply for unset fields
        assert_eq!(config.providers.tts_voice, "alloy");
        assert_eq!(config.memory.max_entries, 1000);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = OrbConfig::default();
        std::env::set_var("ORB_DB", "/tmp/override.db");
        std::env::set_var("ORB_PORT", "9999");
        std::env::set_var("ORB_LOG_LEVEL", "trace");

        config.apply_env_overrides();

        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.server.log_level, "trace");

        // Clean up
        std::env::remove_var("ORB_DB");
        std::env::remove_var("ORB_PORT");
        std::env::remove_var("ORB_LOG_LEVEL");
    }
}
