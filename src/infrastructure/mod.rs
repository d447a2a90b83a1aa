//! Infrastructure layer - Stateful implementations of the domain

pub mod cost;
pub mod defaults;
pub mod key_value;
pub mod logging;
pub mod metrics;
pub mod response_cache;

pub use cost::CostTracker;
pub use defaults::{
    default_cache, default_tracker, reset_default_cache, reset_default_tracker,
    set_default_cache, set_default_tracker,
};
pub use key_value::{InMemoryKeyValueStore, JsonFileKeyValueStore};
pub use response_cache::ResponseCache;
