//! Bigram similarity scoring
//!
//! Texts are compared as multisets of adjacent character pairs using the
//! Dice coefficient `2 * |A ∩ B| / (|A| + |B|)`. Inputs are expected to be
//! normalized already (see [`super::normalize`]).

use std::collections::HashMap;

/// Multiset of character bigrams
fn bigram_counts(text: &str) -> HashMap<(char, char), usize> {
    let chars: Vec<char> = text.chars().collect();
    let mut counts = HashMap::with_capacity(chars.len());

    for pair in chars.windows(2) {
        *counts.entry((pair[0], pair[1])).or_insert(0) += 1;
    }

    counts
}

/// Dice coefficient over character bigrams of two normalized strings.
///
/// Returns a value in `[0, 1]`. When either side has no bigrams (fewer than
/// two characters) the score is `1.0` for equal non-empty strings and `0.0`
/// otherwise, so two empty strings score `0.0`.
pub fn dice_similarity(a: &str, b: &str) -> f64 {
    let left = bigram_counts(a);
    let right = bigram_counts(b);

    let left_total: usize = left.values().sum();
    let right_total: usize = right.values().sum();

    if left_total == 0 || right_total == 0 {
        return if !a.is_empty() && a == b { 1.0 } else { 0.0 };
    }

    let shared: usize = left
        .iter()
        .map(|(bigram, count)| right.get(bigram).map_or(0, |other| (*count).min(*other)))
        .sum();

    (2 * shared) as f64 / (left_total + right_total) as f64
}

/// Bigrams present in both strings, with multiplicity, sorted for display
pub fn shared_bigrams(a: &str, b: &str) -> Vec<String> {
    let left = bigram_counts(a);
    let right = bigram_counts(b);

    let mut shared: Vec<String> = left
        .iter()
        .flat_map(|(&(x, y), count)| {
            let n = right.get(&(x, y)).map_or(0, |other| (*count).min(*other));
            std::iter::repeat_n(format!("{}{}", x, y), n)
        })
        .collect();

    shared.sort();
    shared
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::text::normalize;

    fn score(a: &str, b: &str) -> f64 {
        dice_similarity(&normalize(a), &normalize(b))
    }

    #[test]
    fn test_identical_strings_score_one() {
        assert!((score("hello world", "hello world") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_both_empty_scores_zero() {
        assert_eq!(dice_similarity("", ""), 0.0);
    }

    #[test]
    fn test_one_empty_scores_zero() {
        assert_eq!(dice_similarity("hello", ""), 0.0);
        assert_eq!(dice_similarity("", "hello"), 0.0);
    }

    #[test]
    fn test_single_character_edge_case() {
        assert_eq!(dice_similarity("a", "a"), 1.0);
        assert_eq!(dice_similarity("a", "b"), 0.0);
        assert_eq!(dice_similarity("a", "ab"), 0.0);
    }

    #[test]
    fn test_contraction_scores_above_default_threshold() {
        let s = score("What is the capital of France?", "What's the capital of France?");
        assert!((s - 52.0 / 55.0).abs() < 1e-9, "got {}", s);
        assert!(s > 0.85);
    }

    #[test]
    fn test_unrelated_prompts_score_low() {
        let s = score("What is the capital of France?", "Explain quantum computing");
        assert!(s < 0.5, "got {}", s);
    }

    #[test]
    fn test_multiset_semantics() {
        // "aaa" -> {aa, aa}, "aa" -> {aa}: shared 1, total 3
        assert!((dice_similarity("aaa", "aa") - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric_and_bounded() {
        let a = normalize("The quick brown fox");
        let b = normalize("A quick brown dog");
        let ab = dice_similarity(&a, &b);
        let ba = dice_similarity(&b, &a);
        assert!((ab - ba).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&ab));
    }

    #[test]
    fn test_shared_bigrams() {
        assert_eq!(shared_bigrams("night", "nacht"), vec!["ht".to_string()]);
        assert!(shared_bigrams("abc", "xyz").is_empty());
        assert_eq!(shared_bigrams("aaa", "aaaa"), vec!["aa".to_string(), "aa".to_string()]);
    }
}
