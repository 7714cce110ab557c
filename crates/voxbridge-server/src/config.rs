use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

fn default_bind() -> String {
    "0.0.0.0:3002".to_string()
}

fn default_db_path() -> String {
    "data/voxbridge.db".to_string()
}

fn default_true() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    900
}

fn default_startup_delay_secs() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> Vec<u64> {
    vec![5_000, 15_000, 60_000, 5 * 60_000]
}

fn default_vapi_base_url() -> String {
    "https://api.vapi.ai".to_string()
}

fn default_elevenlabs_base_url() -> String {
    "https://api.elevenlabs.io".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            db_path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

impl ProviderSettings {
    pub fn base_url_or(&self, fallback: &str) -> String {
        self.base_url.clone().unwrap_or_else(|| fallback.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_startup_delay_secs")]
    pub startup_delay_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: Vec<u64>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            startup_delay_secs: default_startup_delay_secs(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub vapi: Option<ProviderSettings>,
    #[serde(default)]
    pub elevenlabs: Option<ProviderSettings>,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Missing config file means defaults; a present-but-broken file is an
    /// error the operator should see.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn vapi_base_url(&self) -> String {
        self.vapi
            .as_ref()
            .map(|p| p.base_url_or(&default_vapi_base_url()))
            .unwrap_or_else(default_vapi_base_url)
    }

    pub fn elevenlabs_base_url(&self) -> String {
        self.elevenlabs
            .as_ref()
            .map(|p| p.base_url_or(&default_elevenlabs_base_url()))
            .unwrap_or_else(default_elevenlabs_base_url)
    }
}
