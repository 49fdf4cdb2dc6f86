use config::{Config, ConfigError};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Base URL of the REST endpoint, e.g. `https://db.example.com/rest/v1`
    #[serde(default = "default_store_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Base URL of the object storage endpoint, e.g. `https://db.example.com/storage/v1`
    #[serde(default = "default_storage_url")]
    pub base_url: String,
    #[serde(default = "default_bucket")]
    pub bucket: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_store_url(),
            api_key: None,
            table: default_table(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: default_storage_url(),
            bucket: default_bucket(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

impl SearchConfig {
    /// Configured page size clamped to `1..=max_page_size`.
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, self.max_page_size.max(1))
    }
}

fn default_store_url() -> String {
    "http://localhost:54321/rest/v1".to_string()
}

fn default_storage_url() -> String {
    "http://localhost:54321/storage/v1".to_string()
}

fn default_table() -> String {
    "properties".to_string()
}

fn default_bucket() -> String {
    "property-photos".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> u32 {
    12
}

fn default_max_page_size() -> u32 {
    60
}

impl Settings {
    /// Load settings from an optional file, overridden by `LISTINGS__*` env vars.
    pub fn new(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("LISTINGS").separator("__"))
            .build()?;

        let settings: Settings = config.try_deserialize()?;

        debug!(
            store = %settings.store.base_url,
            table = %settings.store.table,
            page_size = settings.search.page_size,
            "Loaded settings"
        );

        Ok(settings)
    }
}
