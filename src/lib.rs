//! TokenShield
//!
//! Client-side cost controls for LLM calls:
//! - A response cache that reuses completions for identical or near-identical prompts
//! - A cost tracker that prices provider usage and keeps per-model ledgers
//! - Pluggable persistence for cached entries

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::response_cache::{
    CacheEntry, KeyValueStore, LookupResult, MatchType, ResponseCacheConfig, ResponseCacheStats,
};
pub use domain::usage::{CostEstimate, LedgerStat, LedgerStats, ModelPricing, ProviderUsage};
pub use domain::{DomainError, ErrorKind};
pub use infrastructure::{
    default_cache, default_tracker, reset_default_cache, reset_default_tracker, CostTracker,
    ResponseCache,
};
