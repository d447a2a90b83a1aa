//! Cached response entry

use serde::{Deserialize, Serialize};

/// A cached prompt/response pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Hash of the normalized prompt (and model, when scoped)
    fingerprint: String,
    /// Normalized prompt kept for fuzzy comparisons
    normalized_text: String,
    /// The cached completion text
    response: String,
    /// Model that produced the response
    model: String,
    /// Prompt tokens billed when the response was produced
    input_tokens: u64,
    /// Completion tokens billed when the response was produced
    output_tokens: u64,
    /// Creation time in milliseconds
    created_at: u64,
    /// Last hit (or creation) time in milliseconds
    last_accessed_at: u64,
    /// Number of cache hits
    hit_count: u64,
}

impl CacheEntry {
    /// Create a new entry stamped at `now`
    pub fn new(
        fingerprint: impl Into<String>,
        normalized_text: impl Into<String>,
        response: impl Into<String>,
        model: impl Into<String>,
        input_tokens: u64,
        output_tokens: u64,
        now: u64,
    ) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            normalized_text: normalized_text.into(),
            response: response.into(),
            model: model.into(),
            input_tokens,
            output_tokens,
            created_at: now,
            last_accessed_at: now,
            hit_count: 0,
        }
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn normalized_text(&self) -> &str {
        &self.normalized_text
    }

    pub fn response(&self) -> &str {
        &self.response
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn input_tokens(&self) -> u64 {
        self.input_tokens
    }

    pub fn output_tokens(&self) -> u64 {
        self.output_tokens
    }

    /// Tokens a hit on this entry avoids paying for
    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    pub fn created_at(&self) -> u64 {
        self.created_at
    }

    pub fn last_accessed_at(&self) -> u64 {
        self.last_accessed_at
    }

    pub fn hit_count(&self) -> u64 {
        self.hit_count
    }

    /// An entry is expired once it is strictly older than the TTL
    pub fn is_expired(&self, now: u64, ttl_ms: u64) -> bool {
        now.saturating_sub(self.created_at) > ttl_ms
    }

    /// Record a hit at `now`
    pub fn touch(&mut self, now: u64) {
        self.hit_count = self.hit_count.saturating_add(1);
        self.last_accessed_at = self.last_accessed_at.max(now);
    }
}
