//! Cost estimates and ledger statistics

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ModelPricing;

/// Provider name reported for models missing from the pricing table
pub const UNKNOWN_PROVIDER: &str = "unknown";

/// Usage reported by a provider, already normalized by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderUsage {
    pub model: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    /// Portion of `input_tokens` served from the provider's prompt cache
    #[serde(default)]
    pub cached_input_tokens: i64,
}

impl ProviderUsage {
    pub fn new(model: impl Into<String>, input_tokens: i64, output_tokens: i64) -> Self {
        Self {
            model: model.into(),
            input_tokens,
            output_tokens,
            cached_input_tokens: 0,
        }
    }

    pub fn with_cached_input_tokens(mut self, tokens: i64) -> Self {
        self.cached_input_tokens = tokens;
        self
    }
}

/// Dollar cost of a single request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    /// Whether the model resolved to a pricing entry
    pub known: bool,
    pub provider: String,
    pub model: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cached_input_tokens: u64,
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
}

/// Clamp a signed token count to zero
pub fn clamp_tokens(tokens: i64) -> u64 {
    u64::try_from(tokens).unwrap_or(0)
}

impl CostEstimate {
    /// Estimate for a model without pricing: counted, never charged
    pub fn unknown(model: &str, input_tokens: u64, output_tokens: u64, cached: u64) -> Self {
        Self {
            known: false,
            provider: UNKNOWN_PROVIDER.to_string(),
            model: model.to_string(),
            input_tokens,
            output_tokens,
            cached_input_tokens: cached,
            input_cost: 0.0,
            output_cost: 0.0,
            total_cost: 0.0,
        }
    }

    /// Price a request. `cached_input_tokens` must not exceed `input_tokens`.
    pub fn priced(
        pricing: &ModelPricing,
        model: &str,
        input_tokens: u64,
        output_tokens: u64,
        cached_input_tokens: u64,
    ) -> Self {
        let cached = cached_input_tokens.min(input_tokens);
        let input_cost =
            pricing.input_cost(input_tokens - cached) + pricing.cached_input_cost(cached);
        let output_cost = pricing.output_cost(output_tokens);

        Self {
            known: true,
            provider: pricing.provider.clone(),
            model: model.to_string(),
            input_tokens,
            output_tokens,
            cached_input_tokens: cached,
            input_cost,
            output_cost,
            total_cost: input_cost + output_cost,
        }
    }

    pub fn total_tokens(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// Accumulated usage for one model or for all models
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerStat {
    pub requests: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_cached_input_tokens: u64,
    /// USD
    pub total_cost: f64,
}

impl LedgerStat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a single estimate
    pub fn add(&mut self, estimate: &CostEstimate) {
        self.requests += 1;
        self.total_input_tokens = self.total_input_tokens.saturating_add(estimate.input_tokens);
        self.total_output_tokens = self
            .total_output_tokens
            .saturating_add(estimate.output_tokens);
        self.total_cached_input_tokens = self
            .total_cached_input_tokens
            .saturating_add(estimate.cached_input_tokens);
        self.total_cost += estimate.total_cost;
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_input_tokens
            .saturating_add(self.total_output_tokens)
    }

    /// Mean cost per request, zero when nothing was recorded
    pub fn avg_cost_per_request(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }

        self.total_cost / self.requests as f64
    }
}

/// Snapshot of a cost ledger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerStats {
    /// Totals across every recorded request
    pub aggregate: LedgerStat,
    /// Totals per requested model id
    pub by_model: HashMap<String, LedgerStat>,
    /// Spend avoided (e.g. by cache hits), kept apart from real spend
    pub savings: LedgerStat,
}

impl LedgerStats {
    /// Record an estimate into the aggregate and its model bucket
    pub fn add(&mut self, estimate: &CostEstimate) {
        self.aggregate.add(estimate);
        self.by_model
            .entry(estimate.model.clone())
            .or_default()
            .add(estimate);
    }

    /// Record avoided spend
    pub fn add_savings(&mut self, estimate: &CostEstimate) {
        self.savings.add(estimate);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimate(model: &str, cost: f64) -> CostEstimate {
        CostEstimate {
            known: true,
            provider: "openai".to_string(),
            model: model.to_string(),
            input_tokens: 100,
            output_tokens: 50,
            cached_input_tokens: 0,
            input_cost: cost / 2.0,
            output_cost: cost / 2.0,
            total_cost: cost,
        }
    }

    #[test]
    fn test_clamp_tokens() {
        assert_eq!(clamp_tokens(-5), 0);
        assert_eq!(clamp_tokens(0), 0);
        assert_eq!(clamp_tokens(42), 42);
    }

    #[test]
    fn test_priced_estimate() {
        let pricing = ModelPricing::new("gpt-4o", "openai", 2.5, 10.0);
        let estimate = CostEstimate::priced(&pricing, "gpt-4o-2024-08-06", 1_000_000, 1_000_000, 0);

        assert!(estimate.known);
        assert_eq!(estimate.provider, "openai");
        assert_eq!(estimate.model, "gpt-4o-2024-08-06");
        assert!((estimate.total_cost - 12.5).abs() < 1e-9);
        assert_eq!(estimate.total_tokens(), 2_000_000);
    }

    #[test]
    fn test_priced_estimate_with_cached_input() {
        let pricing =
            ModelPricing::new("gpt-4o", "openai", 2.0, 0.0).with_cached_input_discount(0.5);
        let estimate = CostEstimate::priced(&pricing, "gpt-4o", 1_000_000, 0, 500_000);

        // 0.5M at 2.0 + 0.5M at 1.0
        assert!((estimate.input_cost - 1.5).abs() < 1e-9);
        assert_eq!(estimate.cached_input_tokens, 500_000);
    }

    #[test]
    fn test_cached_tokens_capped_at_input() {
        let pricing = ModelPricing::new("m", "p", 1.0, 1.0).with_cached_input_discount(1.0);
        let estimate = CostEstimate::priced(&pricing, "m", 10, 0, 50);

        assert_eq!(estimate.cached_input_tokens, 10);
        assert_eq!(estimate.input_cost, 0.0);
    }

    #[test]
    fn test_unknown_estimate_is_free() {
        let estimate = CostEstimate::unknown("mystery", 10, 20, 0);

        assert!(!estimate.known);
        assert_eq!(estimate.provider, UNKNOWN_PROVIDER);
        assert_eq!(estimate.input_cost, 0.0);
        assert_eq!(estimate.output_cost, 0.0);
        assert_eq!(estimate.total_cost, 0.0);
    }

    #[test]
    fn test_ledger_stat_add() {
        let mut stat = LedgerStat::new();
        stat.add(&estimate("gpt-4o", 0.01));
        stat.add(&estimate("gpt-4o", 0.02));

        assert_eq!(stat.requests, 2);
        assert_eq!(stat.total_input_tokens, 200);
        assert_eq!(stat.total_output_tokens, 100);
        assert_eq!(stat.total_tokens(), 300);
        assert!((stat.total_cost - 0.03).abs() < 1e-9);
        assert!((stat.avg_cost_per_request() - 0.015).abs() < 1e-9);
    }

    #[test]
    fn test_ledger_stats_buckets_agree() {
        let mut stats = LedgerStats::default();
        stats.add(&estimate("gpt-4o", 0.01));
        stats.add(&estimate("gpt-4o-mini", 0.002));
        stats.add(&estimate("gpt-4o", 0.03));

        let by_model_cost: f64 = stats.by_model.values().map(|s| s.total_cost).sum();
        let by_model_requests: u64 = stats.by_model.values().map(|s| s.requests).sum();

        assert!((by_model_cost - stats.aggregate.total_cost).abs() < 1e-9);
        assert_eq!(by_model_requests, stats.aggregate.requests);
        assert_eq!(stats.by_model["gpt-4o"].requests, 2);
    }

    #[test]
    fn test_savings_kept_apart() {
        let mut stats = LedgerStats::default();
        stats.add_savings(&estimate("gpt-4o", 0.5));

        assert_eq!(stats.aggregate.requests, 0);
        assert_eq!(stats.savings.requests, 1);
        assert!(stats.by_model.is_empty());
    }
}
