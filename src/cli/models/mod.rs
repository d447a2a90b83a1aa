//! Models command - lists the pricing table

use crate::domain::usage::ModelPricing;
use crate::infrastructure::CostTracker;

/// Run the models command
pub fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let tracker = config.build_tracker()?;

    super::print_json(&list(&tracker))
}

/// Every registered model's pricing, sorted by id
pub fn list(tracker: &CostTracker) -> Vec<ModelPricing> {
    tracker
        .models()
        .iter()
        .filter_map(|id| tracker.pricing(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_is_sorted_and_complete() {
        let tracker = CostTracker::new();
        let models = list(&tracker);

        assert_eq!(models.len(), tracker.models().len());
        assert!(models.windows(2).all(|w| w[0].model_id < w[1].model_id));
        assert!(models.iter().any(|m| m.model_id == "claude-3-5-haiku"));
    }
}
