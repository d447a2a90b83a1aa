//! In-memory response cache with exact and fuzzy prompt matching

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use crate::domain::clock::{Clock, SystemClock};
use crate::domain::response_cache::{
    CacheEntry, KeyValueStore, LookupResult, MatchType, ResponseCacheConfig, ResponseCacheStats,
};
use crate::domain::text::{dice_similarity, fingerprint_normalized, normalize};
use crate::domain::tokenizer::{user_prompt, ChatMessage};
use crate::domain::usage::{clamp_tokens, PricingTable};
use crate::domain::DomainError;
use crate::infrastructure::metrics;

/// Mutable cache state, guarded by a single mutex
#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    hits: u64,
    misses: u64,
    exact_hits: u64,
    fuzzy_hits: u64,
    evictions: u64,
    expirations: u64,
    tokens_saved: u64,
    cost_saved: f64,
}

/// Fingerprints removed while making room or purging
#[derive(Debug, Default)]
struct Removed {
    expired: Vec<String>,
    evicted: Vec<String>,
}

impl Removed {
    fn is_empty(&self) -> bool {
        self.expired.is_empty() && self.evicted.is_empty()
    }

    fn absorb(&mut self, other: Removed) {
        self.expired.extend(other.expired);
        self.evicted.extend(other.evicted);
    }

    fn fingerprints(&self) -> impl Iterator<Item = &String> {
        self.expired.iter().chain(self.evicted.iter())
    }
}

impl CacheState {
    fn purge_expired(&mut self, now: u64, ttl_ms: u64) -> Vec<String> {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now, ttl_ms))
            .map(|(fingerprint, _)| fingerprint.clone())
            .collect();

        for fingerprint in &expired {
            self.entries.remove(fingerprint);
        }
        self.expirations += expired.len() as u64;

        expired
    }

    /// Evict the least recently used entry; ties go to the oldest, then to
    /// the smallest fingerprint
    fn evict_lru(&mut self) -> Option<String> {
        let victim = self
            .entries
            .values()
            .min_by(|a, b| {
                a.last_accessed_at()
                    .cmp(&b.last_accessed_at())
                    .then_with(|| a.created_at().cmp(&b.created_at()))
                    .then_with(|| a.fingerprint().cmp(b.fingerprint()))
            })
            .map(|entry| entry.fingerprint().to_string())?;

        self.entries.remove(&victim);
        self.evictions += 1;

        Some(victim)
    }

    /// Insert or overwrite an entry. Only a new fingerprint at capacity makes
    /// room, first by purging expired entries and then by LRU eviction.
    fn insert(&mut self, entry: CacheEntry, max_entries: usize, now: u64, ttl_ms: u64) -> Removed {
        let mut removed = Removed::default();

        if !self.entries.contains_key(entry.fingerprint()) && self.entries.len() >= max_entries {
            removed.expired = self.purge_expired(now, ttl_ms);

            while self.entries.len() >= max_entries {
                match self.evict_lru() {
                    Some(fingerprint) => removed.evicted.push(fingerprint),
                    None => break,
                }
            }
        }

        self.entries.insert(entry.fingerprint().to_string(), entry);
        removed
    }

    fn record_hit(&mut self, match_type: MatchType, entry: &CacheEntry, cost: f64) {
        self.hits += 1;
        match match_type {
            MatchType::Exact => self.exact_hits += 1,
            MatchType::Fuzzy => self.fuzzy_hits += 1,
        }
        self.tokens_saved = self.tokens_saved.saturating_add(entry.total_tokens());
        self.cost_saved += cost;
    }

    /// Touch the entry under `fingerprint` and return a snapshot of it
    fn touch(&mut self, fingerprint: &str, now: u64) -> Option<CacheEntry> {
        self.entries.get_mut(fingerprint).map(|entry| {
            entry.touch(now);
            entry.clone()
        })
    }

    /// Best-ranked entry in scope whose similarity reaches `threshold`.
    /// Expects expired entries to be purged already.
    fn best_match(
        &self,
        normalized: &str,
        scope: Option<&str>,
        threshold: f64,
    ) -> Option<(String, f64)> {
        let (entry, similarity) = self
            .entries
            .values()
            .filter(|entry| scope.is_none_or(|model| entry.model() == model))
            .map(|entry| (entry, dice_similarity(normalized, entry.normalized_text())))
            .max_by(rank)?;

        (similarity >= threshold).then(|| (entry.fingerprint().to_string(), similarity))
    }

    fn live_len(&self, now: u64, ttl_ms: u64) -> usize {
        self.entries
            .values()
            .filter(|entry| !entry.is_expired(now, ttl_ms))
            .count()
    }
}

/// Highest similarity wins, then most recent access, then most recent
/// creation, then the smallest fingerprint.
fn rank(a: &(&CacheEntry, f64), b: &(&CacheEntry, f64)) -> Ordering {
    a.1.total_cmp(&b.1)
        .then_with(|| a.0.last_accessed_at().cmp(&b.0.last_accessed_at()))
        .then_with(|| a.0.created_at().cmp(&b.0.created_at()))
        .then_with(|| b.0.fingerprint().cmp(a.0.fingerprint()))
}

/// Response cache keyed by normalized prompt fingerprints.
///
/// Lookups try an exact fingerprint match first, then (optionally) revive
/// an entry from the attached [`KeyValueStore`], then fall back to a linear
/// bigram-similarity scan over live entries in the same scope.
pub struct ResponseCache {
    config: ResponseCacheConfig,
    state: Mutex<CacheState>,
    clock: Arc<dyn Clock>,
    store: Option<Arc<dyn KeyValueStore>>,
    pricing: PricingTable,
}

impl fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("persistent", &self.store.is_some())
            .field("priced_models", &self.pricing.len())
            .finish_non_exhaustive()
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::from_valid_config(ResponseCacheConfig::default())
    }
}

impl ResponseCache {
    /// Create a cache, rejecting invalid configuration
    pub fn new(config: ResponseCacheConfig) -> Result<Self, DomainError> {
        config.validate()?;

        info!(
            enabled = config.enabled,
            max_entries = config.max_entries,
            ttl_ms = config.ttl_ms,
            similarity_threshold = config.similarity_threshold,
            scope_by_model = config.scope_by_model,
            "Response cache initialized"
        );

        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: ResponseCacheConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CacheState::default()),
            clock: Arc::new(SystemClock),
            store: None,
            pricing: PricingTable::with_defaults(),
        }
    }

    /// Use a custom time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Mirror entries into a persistence store
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Pricing used to value cache hits in `cost_saved`
    pub fn with_pricing(mut self, pricing: PricingTable) -> Self {
        self.pricing = pricing;
        self
    }

    pub fn config(&self) -> &ResponseCacheConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fingerprint(&self, normalized: &str, model: &str) -> String {
        let scope = self.config.scope_by_model.then_some(model);
        fingerprint_normalized(normalized, scope)
    }

    fn storage_key(&self, fingerprint: &str) -> String {
        format!("{}:{}", self.config.namespace, fingerprint)
    }

    fn saved_cost(&self, entry: &CacheEntry) -> f64 {
        self.pricing
            .resolve(entry.model())
            .map(|pricing| {
                pricing.input_cost(entry.input_tokens()) + pricing.output_cost(entry.output_tokens())
            })
            .unwrap_or(0.0)
    }

    /// Look up a cached response for `prompt` under `model`.
    ///
    /// Purging, the exact check, revival and the fuzzy scan all run under
    /// one acquisition of the state lock, so a lookup never observes a
    /// half-applied `store`. Persistence reads happen before that lock.
    pub fn lookup(&self, prompt: &str, model: &str) -> LookupResult {
        if !self.config.enabled {
            return LookupResult::miss();
        }

        let normalized = normalize(prompt);
        let fingerprint = self.fingerprint(&normalized, model);
        let now = self.clock.now_millis();
        let ttl_ms = self.config.ttl_ms;

        let persisted = self
            .store
            .as_deref()
            .filter(|_| !self.holds_live(&fingerprint, now))
            .and_then(|store| self.load_persisted(store, &fingerprint, now));

        let (result, removed, size) = {
            let mut state = self.state();
            let mut removed = Removed {
                expired: state.purge_expired(now, ttl_ms),
                evicted: Vec::new(),
            };

            let result = if let Some(entry) = state.touch(&fingerprint, now) {
                Some(LookupResult::exact(entry))
            } else if let Some(mut entry) = persisted {
                entry.touch(now);
                removed.absorb(state.insert(entry.clone(), self.config.max_entries, now, ttl_ms));
                debug!(fingerprint = %fingerprint, "Revived persisted cache entry");
                Some(LookupResult::exact(entry))
            } else if self.config.fuzzy_matching {
                let scope = self.config.scope_by_model.then_some(model);
                state
                    .best_match(&normalized, scope, self.config.similarity_threshold)
                    .and_then(|(best, similarity)| {
                        state
                            .touch(&best, now)
                            .map(|entry| LookupResult::fuzzy(entry, similarity))
                    })
            } else {
                None
            };

            match result
                .as_ref()
                .and_then(|hit| hit.match_type.zip(hit.entry.as_ref()))
            {
                Some((match_type, entry)) => {
                    state.record_hit(match_type, entry, self.saved_cost(entry))
                }
                None => state.misses += 1,
            }

            (result, removed, state.entries.len())
        };
        self.after_removal(&removed, size);

        match result {
            Some(result) => self.hit(result),
            None => {
                debug!(model, "Response cache miss");
                metrics::record_cache_lookup(None);
                LookupResult::miss()
            }
        }
    }

    fn hit(&self, result: LookupResult) -> LookupResult {
        debug!(
            match_type = ?result.match_type,
            similarity = ?result.similarity,
            model = ?result.entry.as_ref().map(CacheEntry::model),
            "Response cache hit"
        );
        metrics::record_cache_lookup(result.match_type);
        result
    }

    fn holds_live(&self, fingerprint: &str, now: u64) -> bool {
        self.state()
            .entries
            .get(fingerprint)
            .is_some_and(|entry| !entry.is_expired(now, self.config.ttl_ms))
    }

    /// Read a persisted entry for `fingerprint`, dropping unusable ones
    fn load_persisted(
        &self,
        store: &dyn KeyValueStore,
        fingerprint: &str,
        now: u64,
    ) -> Option<CacheEntry> {
        let key = self.storage_key(fingerprint);

        let raw = match store.get(&key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = %key, "Failed to read persisted cache entry: {}", e);
                return None;
            }
        };

        let persisted = match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = %key, "Discarding unreadable persisted cache entry: {}", e);
                self.delete_persisted(&key);
                return None;
            }
        };

        if persisted.fingerprint() != fingerprint || persisted.is_expired(now, self.config.ttl_ms) {
            self.delete_persisted(&key);
            return None;
        }

        Some(persisted)
    }

    /// Cache `response` for `prompt` under `model`.
    ///
    /// Negative token counts are stored as zero. Overwriting an existing
    /// fingerprint never evicts another entry.
    pub fn store(
        &self,
        prompt: &str,
        response: &str,
        model: &str,
        input_tokens: i64,
        output_tokens: i64,
    ) {
        if !self.config.enabled {
            return;
        }

        let normalized = normalize(prompt);
        let fingerprint = self.fingerprint(&normalized, model);
        let now = self.clock.now_millis();

        let entry = CacheEntry::new(
            fingerprint,
            normalized,
            response,
            model,
            clamp_tokens(input_tokens),
            clamp_tokens(output_tokens),
            now,
        );

        let (removed, size) = {
            let mut state = self.state();
            let removed = state.insert(entry.clone(), self.config.max_entries, now, self.config.ttl_ms);
            (removed, state.entries.len())
        };
        self.after_removal(&removed, size);
        self.persist(&entry);

        debug!(model, fingerprint = entry.fingerprint(), "Stored response");
    }

    /// Look up using the user turns of a chat conversation as the prompt
    pub fn lookup_messages(&self, messages: &[ChatMessage], model: &str) -> LookupResult {
        self.lookup(&user_prompt(messages), model)
    }

    /// Store using the user turns of a chat conversation as the prompt
    pub fn store_messages(
        &self,
        messages: &[ChatMessage],
        response: &str,
        model: &str,
        input_tokens: i64,
        output_tokens: i64,
    ) {
        self.store(&user_prompt(messages), response, model, input_tokens, output_tokens);
    }

    /// Exact lookup that leaves counters and recency untouched
    pub fn peek(&self, prompt: &str, model: &str) -> Option<CacheEntry> {
        let fingerprint = self.fingerprint(&normalize(prompt), model);
        let now = self.clock.now_millis();

        self.state()
            .entries
            .get(&fingerprint)
            .filter(|entry| !entry.is_expired(now, self.config.ttl_ms))
            .cloned()
    }

    /// Remove every entry produced by `model`
    pub fn invalidate_model(&self, model: &str) -> usize {
        let (removed, size) = {
            let mut state = self.state();
            let fingerprints: Vec<String> = state
                .entries
                .values()
                .filter(|entry| entry.model() == model)
                .map(|entry| entry.fingerprint().to_string())
                .collect();

            for fingerprint in &fingerprints {
                state.entries.remove(fingerprint);
            }
            (fingerprints, state.entries.len())
        };

        for fingerprint in &removed {
            self.delete_persisted(&self.storage_key(fingerprint));
        }
        metrics::record_cache_size(size);

        info!(model, removed = removed.len(), "Invalidated cached responses");
        removed.len()
    }

    /// Purge expired entries now instead of on the next lookup
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let (expired, size) = {
            let mut state = self.state();
            let expired = state.purge_expired(now, self.config.ttl_ms);
            (expired, state.entries.len())
        };
        let count = expired.len();

        self.after_removal(
            &Removed {
                expired,
                evicted: Vec::new(),
            },
            size,
        );

        count
    }

    /// Drop all entries and reset every counter
    pub fn clear(&self) {
        let fingerprints: Vec<String> = {
            let mut state = self.state();
            let fingerprints = state.entries.keys().cloned().collect();
            *state = CacheState::default();
            fingerprints
        };

        for fingerprint in &fingerprints {
            self.delete_persisted(&self.storage_key(fingerprint));
        }

        metrics::record_cache_size(0);
        debug!(removed = fingerprints.len(), "Cleared response cache");
    }

    pub fn stats(&self) -> ResponseCacheStats {
        let now = self.clock.now_millis();
        let state = self.state();

        ResponseCacheStats {
            entries: state.live_len(now, self.config.ttl_ms),
            hits: state.hits,
            misses: state.misses,
            exact_hits: state.exact_hits,
            fuzzy_hits: state.fuzzy_hits,
            evictions: state.evictions,
            expirations: state.expirations,
            tokens_saved: state.tokens_saved,
            cost_saved: state.cost_saved,
        }
    }

    /// Number of live entries
    pub fn len(&self) -> usize {
        let now = self.clock.now_millis();
        self.state().live_len(now, self.config.ttl_ms)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Report the new size and drop removed entries from persistence
    fn after_removal(&self, removed: &Removed, size: usize) {
        metrics::record_cache_size(size);
        if removed.is_empty() {
            return;
        }

        if !removed.evicted.is_empty() {
            debug!(count = removed.evicted.len(), "Evicted least recently used entries");
        }
        metrics::record_cache_evictions(removed.evicted.len() as u64);
        metrics::record_cache_expirations(removed.expired.len() as u64);

        for fingerprint in removed.fingerprints() {
            self.delete_persisted(&self.storage_key(fingerprint));
        }
    }

    fn persist(&self, entry: &CacheEntry) {
        let Some(store) = &self.store else {
            return;
        };

        let key = self.storage_key(entry.fingerprint());
        let value = match serde_json::to_string(entry) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, "Failed to serialize cache entry: {}", e);
                return;
            }
        };

        if let Err(e) = store.set(&key, &value) {
            warn!(key = %key, "Failed to persist cache entry: {}", e);
        }
    }

    fn delete_persisted(&self, key: &str) {
        let Some(store) = &self.store else {
            return;
        };

        if let Err(e) = store.delete(key) {
            warn!(key = %key, "Failed to delete persisted cache entry: {}", e);
        }
    }
}
