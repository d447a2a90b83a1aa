//! Response cache configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Configuration for the response cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseCacheConfig {
    /// Whether caching is enabled; a disabled cache always misses
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum number of live entries
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Entry time-to-live in milliseconds
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,

    /// Minimum similarity (0.0 to 1.0) for a fuzzy hit
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Partition fingerprints and fuzzy scans by model id
    #[serde(default = "default_true")]
    pub scope_by_model: bool,

    /// Fall back to a fuzzy scan when the exact lookup misses
    #[serde(default = "default_true")]
    pub fuzzy_matching: bool,

    /// Key prefix used when writing entries to a persistence store
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_true() -> bool {
    true
}

fn default_max_entries() -> usize {
    500
}

fn default_ttl_ms() -> u64 {
    60 * 60 * 1000
}

fn default_similarity_threshold() -> f64 {
    0.85
}

fn default_namespace() -> String {
    "tokenshield:cache".to_string()
}

impl Default for ResponseCacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            max_entries: default_max_entries(),
            ttl_ms: default_ttl_ms(),
            similarity_threshold: default_similarity_threshold(),
            scope_by_model: default_true(),
            fuzzy_matching: default_true(),
            namespace: default_namespace(),
        }
    }
}

impl ResponseCacheConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get TTL as Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// Set the TTL (millisecond resolution)
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Set the similarity threshold; out-of-range values are rejected by `validate`
    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_scope_by_model(mut self, scope: bool) -> Self {
        self.scope_by_model = scope;
        self
    }

    pub fn with_fuzzy_matching(mut self, fuzzy: bool) -> Self {
        self.fuzzy_matching = fuzzy;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Reject invalid settings instead of coercing them
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.max_entries == 0 {
            return Err(DomainError::invalid_config(
                "max_entries",
                "must be greater than 0",
            ));
        }

        if self.ttl_ms == 0 {
            return Err(DomainError::invalid_config("ttl_ms", "must be greater than 0"));
        }

        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(DomainError::invalid_config(
                "similarity_threshold",
                format!("{} is outside [0, 1]", self.similarity_threshold),
            ));
        }

        if self.namespace.is_empty() {
            return Err(DomainError::invalid_config("namespace", "cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorKind;

    #[test]
    fn test_default_config() {
        let config = ResponseCacheConfig::default();

        assert!(config.enabled);
        assert_eq!(config.max_entries, 500);
        assert_eq!(config.ttl(), Duration::from_secs(3600));
        assert!((config.similarity_threshold - 0.85).abs() < f64::EPSILON);
        assert!(config.scope_by_model);
        assert!(config.fuzzy_matching);
        assert_eq!(config.namespace, "tokenshield:cache");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ResponseCacheConfig::new()
            .with_enabled(false)
            .with_max_entries(10)
            .with_ttl(Duration::from_millis(1500))
            .with_similarity_threshold(0.9)
            .with_scope_by_model(false)
            .with_fuzzy_matching(false)
            .with_namespace("custom");

        assert!(!config.enabled);
        assert_eq!(config.max_entries, 10);
        assert_eq!(config.ttl_ms, 1500);
        assert!((config.similarity_threshold - 0.9).abs() < f64::EPSILON);
        assert!(!config.scope_by_model);
        assert!(!config.fuzzy_matching);
        assert_eq!(config.namespace, "custom");
    }

    #[test]
    fn test_threshold_not_clamped() {
        let config = ResponseCacheConfig::new().with_similarity_threshold(1.5);
        assert!((config.similarity_threshold - 1.5).abs() < f64::EPSILON);

        let err = config.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidConfig);
        assert!(err.to_string().contains("similarity_threshold"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ResponseCacheConfig::new().with_max_entries(0).validate().is_err());
        assert!(ResponseCacheConfig::new()
            .with_ttl(Duration::ZERO)
            .validate()
            .is_err());
        assert!(ResponseCacheConfig::new()
            .with_similarity_threshold(-0.1)
            .validate()
            .is_err());
        assert!(ResponseCacheConfig::new()
            .with_similarity_threshold(f64::NAN)
            .validate()
            .is_err());
        assert!(ResponseCacheConfig::new().with_namespace("").validate().is_err());
    }

    #[test]
    fn test_threshold_bounds_inclusive() {
        assert!(ResponseCacheConfig::new().with_similarity_threshold(0.0).validate().is_ok());
        assert!(ResponseCacheConfig::new().with_similarity_threshold(1.0).validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ResponseCacheConfig =
            serde_json::from_str(r#"{"max_entries": 42, "scope_by_model": false}"#).unwrap();

        assert_eq!(config.max_entries, 42);
        assert!(!config.scope_by_model);
        assert_eq!(config.ttl_ms, 3_600_000);
    }
}
