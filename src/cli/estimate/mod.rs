//! Estimate command - prices a single request

use clap::Args;
use tracing::warn;

use crate::domain::tokenizer::ChatMessage;
use crate::domain::usage::CostEstimate;
use crate::infrastructure::CostTracker;

/// Arguments for the estimate command
#[derive(Args, Clone, Debug)]
pub struct EstimateArgs {
    /// Model id; versioned ids resolve by longest prefix
    #[arg(long)]
    pub model: String,

    /// Input (prompt) tokens
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub input: i64,

    /// Output (completion) tokens
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub output: i64,

    /// Input tokens served from the provider's prompt cache
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub cached: i64,

    /// Count input tokens from this prompt instead of using --input
    #[arg(long)]
    pub prompt: Option<String>,
}

/// Run the estimate command
pub fn run(args: EstimateArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let tracker = config.build_tracker()?;

    let estimate = estimate(&tracker, &args);
    if !estimate.known {
        warn!(model = %args.model, "No pricing for model, cost reported as zero");
    }

    super::print_json(&estimate)
}

pub fn estimate(tracker: &CostTracker, args: &EstimateArgs) -> CostEstimate {
    let input = match &args.prompt {
        Some(prompt) => tracker.count_tokens(&[ChatMessage::user(prompt.as_str())]),
        None => args.input,
    };

    tracker.estimate_cost_with_cached(&args.model, input, args.output, args.cached)
}
