//! Similarity command - explains how the cache compares two prompts

use clap::Args;
use serde::Serialize;

use crate::domain::text::{dice_similarity, normalize, shared_bigrams};

/// Arguments for the similarity command
#[derive(Args, Clone, Debug)]
pub struct SimilarityArgs {
    /// First prompt
    pub first: String,

    /// Second prompt
    pub second: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimilarityReport {
    pub first_normalized: String,
    pub second_normalized: String,
    pub similarity: f64,
    pub threshold: f64,
    /// Whether a cache lookup would treat the pair as a fuzzy match
    pub would_match: bool,
    pub shared_bigrams: Vec<String>,
}

/// Run the similarity command
pub fn run(args: SimilarityArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let report = compare(&args.first, &args.second, config.cache.similarity_threshold);

    super::print_json(&report)
}

pub fn compare(first: &str, second: &str, threshold: f64) -> SimilarityReport {
    let first_normalized = normalize(first);
    let second_normalized = normalize(second);
    let similarity = dice_similarity(&first_normalized, &second_normalized);

    SimilarityReport {
        shared_bigrams: shared_bigrams(&first_normalized, &second_normalized),
        first_normalized,
        second_normalized,
        similarity,
        threshold,
        would_match: similarity >= threshold,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_paraphrase() {
        let report = compare(
            "What is the capital of France?",
            "What's the capital of France?",
            0.85,
        );

        assert_eq!(report.first_normalized, "what is the capital of france");
        assert_eq!(report.second_normalized, "what s the capital of france");
        assert!((report.similarity - 52.0 / 55.0).abs() < 1e-9);
        assert!(report.would_match);
        assert_eq!(report.shared_bigrams.len(), 26);
    }

    #[test]
    fn test_compare_unrelated() {
        let report = compare(
            "What is the capital of France?",
            "Explain quantum computing",
            0.85,
        );

        assert!(!report.would_match);
        assert!(report.similarity < 0.2);
    }
}
