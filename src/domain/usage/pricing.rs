//! Model pricing configuration

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

const TOKENS_PER_MILLION: f64 = 1_000_000.0;

/// Pricing and capabilities for a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    /// Model ID (or ID prefix) this pricing applies to
    pub model_id: String,
    /// Provider name
    pub provider: String,
    /// USD per million input tokens
    pub input_per_million: f64,
    /// USD per million output tokens
    pub output_per_million: f64,
    /// Fraction (0.0 to 1.0) taken off the input price for cached input tokens
    #[serde(default)]
    pub cached_input_discount: f64,
    /// Context window in tokens
    #[serde(default)]
    pub context_window: u64,
    /// Maximum completion tokens
    #[serde(default)]
    pub max_output_tokens: u64,
    #[serde(default)]
    pub supports_vision: bool,
    #[serde(default = "default_true")]
    pub supports_functions: bool,
}

fn default_true() -> bool {
    true
}

impl ModelPricing {
    /// Create new model pricing
    pub fn new(
        model_id: impl Into<String>,
        provider: impl Into<String>,
        input_per_million: f64,
        output_per_million: f64,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            provider: provider.into(),
            input_per_million,
            output_per_million,
            cached_input_discount: 0.0,
            context_window: 0,
            max_output_tokens: 0,
            supports_vision: false,
            supports_functions: true,
        }
    }

    pub fn with_cached_input_discount(mut self, discount: f64) -> Self {
        self.cached_input_discount = discount;
        self
    }

    pub fn with_limits(mut self, context_window: u64, max_output_tokens: u64) -> Self {
        self.context_window = context_window;
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn with_vision(mut self, supports: bool) -> Self {
        self.supports_vision = supports;
        self
    }

    pub fn with_functions(mut self, supports: bool) -> Self {
        self.supports_functions = supports;
        self
    }

    /// USD cost of uncached input tokens
    pub fn input_cost(&self, tokens: u64) -> f64 {
        tokens as f64 / TOKENS_PER_MILLION * self.input_per_million
    }

    /// USD cost of cached input tokens
    pub fn cached_input_cost(&self, tokens: u64) -> f64 {
        tokens as f64 / TOKENS_PER_MILLION
            * self.input_per_million
            * (1.0 - self.cached_input_discount)
    }

    /// USD cost of output tokens
    pub fn output_cost(&self, tokens: u64) -> f64 {
        tokens as f64 / TOKENS_PER_MILLION * self.output_per_million
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.model_id.is_empty() {
            return Err(DomainError::invalid_config("model_id", "cannot be empty"));
        }

        for (field, price) in [
            ("input_per_million", self.input_per_million),
            ("output_per_million", self.output_per_million),
        ] {
            if !price.is_finite() || price < 0.0 {
                return Err(DomainError::invalid_config(
                    field,
                    format!("{} must be a non-negative number", price),
                ));
            }
        }

        if !(0.0..=1.0).contains(&self.cached_input_discount) {
            return Err(DomainError::invalid_config(
                "cached_input_discount",
                format!("{} is outside [0, 1]", self.cached_input_discount),
            ));
        }

        Ok(())
    }
}

/// Registered model prices with longest-prefix resolution
#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    models: HashMap<String, ModelPricing>,
}

impl PricingTable {
    /// An empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table pre-populated with [`default_model_pricing`]
    pub fn with_defaults() -> Self {
        Self {
            models: default_model_pricing(),
        }
    }

    /// Add or replace pricing for a model id (last write wins)
    pub fn register(&mut self, pricing: ModelPricing) -> Result<(), DomainError> {
        pricing.validate()?;
        self.models.insert(pricing.model_id.clone(), pricing);
        Ok(())
    }

    /// Resolve a model id: exact match first, then the longest registered
    /// id that is a prefix of `model`.
    pub fn resolve(&self, model: &str) -> Option<&ModelPricing> {
        if let Some(pricing) = self.models.get(model) {
            return Some(pricing);
        }

        self.models
            .iter()
            .filter(|(id, _)| !id.is_empty() && model.starts_with(id.as_str()))
            .max_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| b.cmp(a)))
            .map(|(_, pricing)| pricing)
    }

    /// Registered model ids, sorted
    pub fn model_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.models.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// Default pricing for common models (USD per million tokens)
pub fn default_model_pricing() -> HashMap<String, ModelPricing> {
    let models = [
        // OpenAI
        ModelPricing::new("gpt-4o", "openai", 2.50, 10.00)
            .with_cached_input_discount(0.5)
            .with_limits(128_000, 16_384)
            .with_vision(true),
        ModelPricing::new("gpt-4o-mini", "openai", 0.15, 0.60)
            .with_cached_input_discount(0.5)
            .with_limits(128_000, 16_384)
            .with_vision(true),
        ModelPricing::new("gpt-4-turbo", "openai", 10.00, 30.00)
            .with_limits(128_000, 4_096)
            .with_vision(true),
        ModelPricing::new("gpt-4", "openai", 30.00, 60.00).with_limits(8_192, 8_192),
        ModelPricing::new("gpt-3.5-turbo", "openai", 0.50, 1.50).with_limits(16_385, 4_096),
        ModelPricing::new("o1", "openai", 15.00, 60.00)
            .with_cached_input_discount(0.5)
            .with_limits(200_000, 100_000)
            .with_vision(true),
        ModelPricing::new("o1-mini", "openai", 3.00, 12.00)
            .with_cached_input_discount(0.5)
            .with_limits(128_000, 65_536)
            .with_functions(false),
        // Anthropic
        ModelPricing::new("claude-3-5-sonnet", "anthropic", 3.00, 15.00)
            .with_cached_input_discount(0.9)
            .with_limits(200_000, 8_192)
            .with_vision(true),
        ModelPricing::new("claude-3-5-haiku", "anthropic", 0.80, 4.00)
            .with_cached_input_discount(0.9)
            .with_limits(200_000, 8_192),
        ModelPricing::new("claude-3-opus", "anthropic", 15.00, 75.00)
            .with_cached_input_discount(0.9)
            .with_limits(200_000, 4_096)
            .with_vision(true),
        ModelPricing::new("claude-3-haiku", "anthropic", 0.25, 1.25)
            .with_cached_input_discount(0.9)
            .with_limits(200_000, 4_096)
            .with_vision(true),
        // Google
        ModelPricing::new("gemini-1.5-pro", "google", 1.25, 5.00)
            .with_cached_input_discount(0.75)
            .with_limits(2_000_000, 8_192)
            .with_vision(true),
        ModelPricing::new("gemini-1.5-flash", "google", 0.075, 0.30)
            .with_cached_input_discount(0.75)
            .with_limits(1_000_000, 8_192)
            .with_vision(true),
        ModelPricing::new("gemini-2.0-flash", "google", 0.10, 0.40)
            .with_cached_input_discount(0.75)
            .with_limits(1_000_000, 8_192)
            .with_vision(true),
    ];

    models
        .into_iter()
        .map(|pricing| (pricing.model_id.clone(), pricing))
        .collect()
}
