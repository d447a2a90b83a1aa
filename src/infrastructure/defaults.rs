//! Process-wide default cache and tracker
//!
//! Handles are cheap `Arc` clones. Replacing or resetting a default only
//! affects handles obtained afterwards.

use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use tracing::debug;

use super::cost::CostTracker;
use super::response_cache::ResponseCache;

static DEFAULT_CACHE: Lazy<RwLock<Arc<ResponseCache>>> =
    Lazy::new(|| RwLock::new(Arc::new(ResponseCache::default())));

static DEFAULT_TRACKER: Lazy<RwLock<Arc<CostTracker>>> =
    Lazy::new(|| RwLock::new(Arc::new(CostTracker::default())));

/// Shared default response cache, created with default settings on first use
pub fn default_cache() -> Arc<ResponseCache> {
    DEFAULT_CACHE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Install `cache` as the process-wide default
pub fn set_default_cache(cache: ResponseCache) {
    *DEFAULT_CACHE.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(cache);
}

/// Replace the default cache with a fresh, empty one
pub fn reset_default_cache() {
    set_default_cache(ResponseCache::default());
    debug!("Default response cache reset");
}

/// Shared default cost tracker using the built-in pricing table
pub fn default_tracker() -> Arc<CostTracker> {
    DEFAULT_TRACKER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Install `tracker` as the process-wide default
pub fn set_default_tracker(tracker: CostTracker) {
    *DEFAULT_TRACKER.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(tracker);
}

/// Replace the default tracker with a fresh one
pub fn reset_default_tracker() {
    set_default_tracker(CostTracker::default());
    debug!("Default cost tracker reset");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::usage::{ModelPricing, PricingTable};

    // Single test: the defaults are shared by every test in this binary
    #[test]
    fn test_default_instances_lifecycle() {
        let cache = default_cache();
        assert!(Arc::ptr_eq(&cache, &default_cache()));

        cache.store("shared prompt", "shared response", "gpt-4o", 1, 1);
        assert!(default_cache().lookup("shared prompt", "gpt-4o").hit);

        reset_default_cache();
        let fresh = default_cache();
        assert!(!Arc::ptr_eq(&cache, &fresh));
        assert!(fresh.is_empty());
        // Old handles keep working
        assert!(cache.peek("shared prompt", "gpt-4o").is_some());

        let tracker = default_tracker();
        tracker.record("gpt-4o", 100, 100);
        assert_eq!(default_tracker().stats().aggregate.requests, 1);

        reset_default_tracker();
        assert_eq!(default_tracker().stats().aggregate.requests, 0);

        let mut pricing = PricingTable::new();
        pricing
            .register(ModelPricing::new("only-model", "acme", 1.0, 1.0))
            .unwrap();
        set_default_tracker(CostTracker::with_pricing(pricing));
        assert_eq!(default_tracker().models(), vec!["only-model".to_string()]);

        reset_default_tracker();
        assert!(default_tracker().models().len() > 1);
    }
}
