//! Response cache domain models and traits
//!
//! Matches prompts exactly by fingerprint and, failing that, fuzzily by
//! bigram similarity against previously cached prompts.

mod config;
mod entry;
mod lookup;
mod store;

pub use config::ResponseCacheConfig;
pub use entry::CacheEntry;
pub use lookup::{LookupResult, MatchType, ResponseCacheStats};
pub use store::KeyValueStore;

#[cfg(test)]
pub use store::MockKeyValueStore;
