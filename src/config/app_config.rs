use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::domain::response_cache::ResponseCacheConfig;
use crate::domain::usage::{ModelPricing, PricingTable};
use crate::domain::DomainError;
use crate::infrastructure::{CostTracker, JsonFileKeyValueStore, ResponseCache};

/// Environment variable prefix, e.g. `TOKENSHIELD__CACHE__MAX_ENTRIES=1000`
pub const ENV_PREFIX: &str = "TOKENSHIELD";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub pricing: PricingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Response cache settings as they appear in configuration sources
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,
    #[serde(default = "default_true")]
    pub scope_by_model: bool,
    #[serde(default = "default_true")]
    pub fuzzy_matching: bool,
    /// JSON file entries are mirrored to; in-memory only when unset
    #[serde(default)]
    pub persistence_path: Option<PathBuf>,
}

/// Pricing overrides applied on top of the built-in table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PricingSettings {
    #[serde(default)]
    pub overrides: Vec<ModelPricing>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_entries() -> usize {
    ResponseCacheConfig::default().max_entries
}

fn default_ttl_ms() -> u64 {
    ResponseCacheConfig::default().ttl_ms
}

fn default_similarity_threshold() -> f64 {
    ResponseCacheConfig::default().similarity_threshold
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: default_max_entries(),
            ttl_ms: default_ttl_ms(),
            similarity_threshold: default_similarity_threshold(),
            scope_by_model: true,
            fuzzy_matching: true,
            persistence_path: None,
        }
    }
}

impl CacheSettings {
    pub fn to_cache_config(&self) -> ResponseCacheConfig {
        ResponseCacheConfig {
            enabled: self.enabled,
            max_entries: self.max_entries,
            ttl_ms: self.ttl_ms,
            similarity_threshold: self.similarity_threshold,
            scope_by_model: self.scope_by_model,
            fuzzy_matching: self.fuzzy_matching,
            ..ResponseCacheConfig::default()
        }
    }
}

impl AppConfig {
    /// Load from `config/default`, `config/local` and `TOKENSHIELD__*`
    /// environment variables, after reading a `.env` file if present
    pub fn load() -> Result<Self, DomainError> {
        dotenvy::dotenv().ok();
        Self::load_from(Path::new("config"))
    }

    /// Same as [`Self::load`] with config files looked up in `dir`
    pub fn load_from(dir: &Path) -> Result<Self, DomainError> {
        let default_file = dir.join("default");
        let local_file = dir.join("local");

        let config = config::Config::builder()
            .add_source(config::File::with_name(&default_file.to_string_lossy()).required(false))
            .add_source(config::File::with_name(&local_file.to_string_lossy()).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| DomainError::configuration(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| DomainError::configuration(e.to_string()))
    }

    /// Built-in pricing with the configured overrides applied
    pub fn pricing_table(&self) -> Result<PricingTable, DomainError> {
        let mut table = PricingTable::with_defaults();
        for pricing in &self.pricing.overrides {
            table.register(pricing.clone())?;
        }
        Ok(table)
    }

    /// Build a response cache from the `cache` section
    pub fn build_cache(&self) -> Result<ResponseCache, DomainError> {
        let mut cache =
            ResponseCache::new(self.cache.to_cache_config())?.with_pricing(self.pricing_table()?);

        if let Some(path) = &self.cache.persistence_path {
            info!(path = %path.display(), "Persisting response cache entries");
            cache = cache.with_store(Arc::new(JsonFileKeyValueStore::open(path)));
        }

        Ok(cache)
    }

    /// Build a cost tracker with the configured pricing
    pub fn build_tracker(&self) -> Result<CostTracker, DomainError> {
        Ok(CostTracker::with_pricing(self.pricing_table()?))
    }
}
