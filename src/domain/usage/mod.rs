//! Usage tracking and cost domain
//!
//! Pricing tables, per-request cost estimates and ledger statistics.

mod pricing;
mod record;

pub use pricing::{default_model_pricing, ModelPricing, PricingTable};
pub use record::{
    clamp_tokens, CostEstimate, LedgerStat, LedgerStats, ProviderUsage, UNKNOWN_PROVIDER,
};
