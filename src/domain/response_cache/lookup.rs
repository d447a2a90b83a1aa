//! Lookup results and cache statistics

use serde::{Deserialize, Serialize};

use super::CacheEntry;

/// How a cache hit was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Fingerprint equality
    Exact,
    /// Similarity at or above the configured threshold
    Fuzzy,
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Fuzzy => write!(f, "fuzzy"),
        }
    }
}

/// Outcome of a cache lookup
#[derive(Debug, Clone, PartialEq)]
pub struct LookupResult {
    pub hit: bool,
    pub match_type: Option<MatchType>,
    pub similarity: Option<f64>,
    /// Snapshot of the entry after the hit was recorded
    pub entry: Option<CacheEntry>,
}

impl LookupResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            match_type: None,
            similarity: None,
            entry: None,
        }
    }

    pub fn exact(entry: CacheEntry) -> Self {
        Self {
            hit: true,
            match_type: Some(MatchType::Exact),
            similarity: Some(1.0),
            entry: Some(entry),
        }
    }

    pub fn fuzzy(entry: CacheEntry, similarity: f64) -> Self {
        Self {
            hit: true,
            match_type: Some(MatchType::Fuzzy),
            similarity: Some(similarity),
            entry: Some(entry),
        }
    }

    /// Cached response text, if this was a hit
    pub fn response(&self) -> Option<&str> {
        self.entry.as_ref().map(CacheEntry::response)
    }
}

/// Statistics for the response cache
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseCacheStats {
    /// Live entries currently held
    pub entries: usize,
    /// Total cache hits
    pub hits: u64,
    /// Total cache misses
    pub misses: u64,
    /// Hits found by fingerprint
    pub exact_hits: u64,
    /// Hits found by similarity
    pub fuzzy_hits: u64,
    /// Entries removed to make room
    pub evictions: u64,
    /// Entries removed because their TTL elapsed
    pub expirations: u64,
    /// Input plus output tokens of every hit entry
    pub tokens_saved: u64,
    /// USD value of the saved tokens
    pub cost_saved: f64,
}

impl ResponseCacheStats {
    /// hits / (hits + misses), zero before the first lookup
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;

        if total == 0 {
            return 0.0;
        }

        self.hits as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = ResponseCacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };

        assert!((stats.hit_rate() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_hit_rate_no_lookups() {
        assert_eq!(ResponseCacheStats::default().hit_rate(), 0.0);
    }

    #[test]
    fn test_lookup_result_constructors() {
        let entry = CacheEntry::new("fp", "q", "answer", "m", 1, 2, 0);

        let exact = LookupResult::exact(entry.clone());
        assert!(exact.hit);
        assert_eq!(exact.match_type, Some(MatchType::Exact));
        assert_eq!(exact.similarity, Some(1.0));
        assert_eq!(exact.response(), Some("answer"));

        let fuzzy = LookupResult::fuzzy(entry, 0.9);
        assert_eq!(fuzzy.match_type, Some(MatchType::Fuzzy));
        assert_eq!(fuzzy.similarity, Some(0.9));

        let miss = LookupResult::miss();
        assert!(!miss.hit);
        assert!(miss.response().is_none());
    }

    #[test]
    fn test_match_type_display() {
        assert_eq!(MatchType::Exact.to_string(), "exact");
        assert_eq!(MatchType::Fuzzy.to_string(), "fuzzy");
    }
}
