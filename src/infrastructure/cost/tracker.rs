//! Cost tracking against a pricing table

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use crate::domain::tokenizer::{ChatMessage, HeuristicTokenCounter, TokenCounter};
use crate::domain::usage::{
    clamp_tokens, CostEstimate, LedgerStats, ModelPricing, PricingTable, ProviderUsage,
};
use crate::domain::DomainError;
use crate::infrastructure::metrics;

/// Estimates request cost and accumulates spend per model.
///
/// Unknown models are counted but never charged: their estimates carry
/// `known: false` and zero cost.
#[derive(Debug)]
pub struct CostTracker {
    pricing: RwLock<PricingTable>,
    ledger: Mutex<LedgerStats>,
    counter: Arc<dyn TokenCounter>,
}

impl Default for CostTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CostTracker {
    /// Tracker using the built-in pricing table
    pub fn new() -> Self {
        Self::with_pricing(PricingTable::with_defaults())
    }

    pub fn with_pricing(pricing: PricingTable) -> Self {
        info!(models = pricing.len(), "Cost tracker initialized");

        Self {
            pricing: RwLock::new(pricing),
            ledger: Mutex::new(LedgerStats::default()),
            counter: Arc::new(HeuristicTokenCounter::default()),
        }
    }

    /// Token counter used by [`Self::estimate_messages`]
    pub fn with_token_counter(mut self, counter: Arc<dyn TokenCounter>) -> Self {
        self.counter = counter;
        self
    }

    fn pricing_table(&self) -> RwLockReadGuard<'_, PricingTable> {
        self.pricing.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn pricing_table_mut(&self) -> RwLockWriteGuard<'_, PricingTable> {
        self.pricing.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn ledger(&self) -> MutexGuard<'_, LedgerStats> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Price a request without recording it
    pub fn estimate_cost(&self, model: &str, input_tokens: i64, output_tokens: i64) -> CostEstimate {
        self.estimate_cost_with_cached(model, input_tokens, output_tokens, 0)
    }

    /// Price a request where `cached_input_tokens` of the input were served
    /// from the provider's prompt cache
    pub fn estimate_cost_with_cached(
        &self,
        model: &str,
        input_tokens: i64,
        output_tokens: i64,
        cached_input_tokens: i64,
    ) -> CostEstimate {
        let input = clamp_tokens(input_tokens);
        let output = clamp_tokens(output_tokens);
        let cached = clamp_tokens(cached_input_tokens).min(input);

        match self.pricing_table().resolve(model) {
            Some(pricing) => CostEstimate::priced(pricing, model, input, output, cached),
            None => CostEstimate::unknown(model, input, output, cached),
        }
    }

    /// Prompt tokens for `messages` according to the configured counter
    pub fn count_tokens(&self, messages: &[ChatMessage]) -> i64 {
        i64::try_from(self.counter.count_messages(messages)).unwrap_or(i64::MAX)
    }

    /// Price a chat request before sending it, counting prompt tokens with
    /// the configured counter and assuming `expected_output_tokens`
    pub fn estimate_messages(
        &self,
        model: &str,
        messages: &[ChatMessage],
        expected_output_tokens: i64,
    ) -> CostEstimate {
        self.estimate_cost(model, self.count_tokens(messages), expected_output_tokens)
    }

    /// Estimate and accumulate a completed request
    pub fn record(&self, model: &str, input_tokens: i64, output_tokens: i64) -> CostEstimate {
        let estimate = self.estimate_cost(model, input_tokens, output_tokens);
        self.commit(estimate)
    }

    /// Record usage as reported by a provider, honoring cached input tokens
    pub fn record_usage(&self, usage: &ProviderUsage) -> CostEstimate {
        let estimate = self.estimate_cost_with_cached(
            &usage.model,
            usage.input_tokens,
            usage.output_tokens,
            usage.cached_input_tokens,
        );
        self.commit(estimate)
    }

    fn commit(&self, estimate: CostEstimate) -> CostEstimate {
        self.ledger().add(&estimate);

        debug!(
            model = %estimate.model,
            known = estimate.known,
            input_tokens = estimate.input_tokens,
            output_tokens = estimate.output_tokens,
            total_cost = estimate.total_cost,
            "Recorded request cost"
        );
        metrics::record_cost(&estimate.model, estimate.total_cost);

        estimate
    }

    /// Record spend that was avoided, e.g. because a cached response was
    /// served instead of calling the provider
    pub fn record_savings(&self, model: &str, input_tokens: i64, output_tokens: i64) -> CostEstimate {
        let estimate = self.estimate_cost(model, input_tokens, output_tokens);
        self.ledger().add_savings(&estimate);

        debug!(model, saved = estimate.total_cost, "Recorded avoided cost");
        estimate
    }

    pub fn stats(&self) -> LedgerStats {
        self.ledger().clone()
    }

    /// Zero all statistics; pricing is kept
    pub fn reset(&self) {
        *self.ledger() = LedgerStats::default();
        debug!("Cost ledger reset");
    }

    /// Add or replace pricing at runtime (last write wins)
    pub fn register_model(&self, pricing: ModelPricing) -> Result<(), DomainError> {
        let model_id = pricing.model_id.clone();
        self.pricing_table_mut().register(pricing)?;

        info!(model = %model_id, "Registered model pricing");
        Ok(())
    }

    /// Pricing that `model` resolves to
    pub fn pricing(&self, model: &str) -> Option<ModelPricing> {
        self.pricing_table().resolve(model).cloned()
    }

    /// Registered model ids, sorted
    pub fn models(&self) -> Vec<String> {
        self.pricing_table().model_ids()
    }
}
