//! Prompt normalization and fingerprinting

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

/// Any run of characters that are neither letters nor digits
static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}]+").unwrap());

/// Produce the canonical form of a prompt.
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single space and trims both ends. Total: the empty string maps to itself.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_ALPHANUMERIC
        .replace_all(&lowered, " ")
        .trim()
        .to_string()
}

/// Split normalized text into words
pub fn words(normalized: &str) -> Vec<&str> {
    normalized.split_whitespace().collect()
}

/// Deterministic fingerprint of a prompt, optionally partitioned by a scope key.
///
/// SHA-256 over the length-prefixed scope key followed by the normalized
/// text, so `("a b", None)` and `("b", Some("a"))` can never collide.
pub fn fingerprint(text: &str, scope_key: Option<&str>) -> String {
    fingerprint_normalized(&normalize(text), scope_key)
}

/// Same as [`fingerprint`] for text that is already normalized
pub fn fingerprint_normalized(normalized: &str, scope_key: Option<&str>) -> String {
    let mut hasher = Sha256::new();

    match scope_key {
        Some(scope) => {
            hasher.update([1u8]);
            hasher.update((scope.len() as u64).to_le_bytes());
            hasher.update(scope.as_bytes());
        }
        None => hasher.update([0u8]),
    }

    hasher.update((normalized.len() as u64).to_le_bytes());
    hasher.update(normalized.as_bytes());

    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_lowercases_and_strips_punctuation() {
        assert_eq!(
            normalize("What is the capital of France?"),
            "what is the capital of france"
        );
        assert_eq!(normalize("What's  the\tcapital!!"), "what s the capital");
    }

    #[test]
    fn test_normalize_empty_and_noise_only() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   ?!  ...  "), "");
    }

    #[test]
    fn test_normalize_markup_and_code() {
        assert_eq!(
            normalize("<b>Fix</b> `fn main() {}`"),
            "b fix b fn main"
        );
    }

    #[test]
    fn test_normalize_keeps_unicode_letters_and_digits() {
        assert_eq!(normalize("Ça va? Größe 42"), "ça va größe 42");
    }

    #[test]
    fn test_words() {
        assert_eq!(words("the quick fox"), vec!["the", "quick", "fox"]);
        assert!(words("").is_empty());
    }

    #[test]
    fn test_fingerprint_deterministic() {
        let a = fingerprint("Hello, World!", None);
        let b = fingerprint("hello world", None);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_fingerprint_scope_aware() {
        let a = fingerprint("hello", Some("gpt-4o"));
        let b = fingerprint("hello", Some("gpt-4o-mini"));
        let c = fingerprint("hello", None);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_fingerprint_no_concatenation_collision() {
        let a = fingerprint("b c", Some("a"));
        let b = fingerprint("c", Some("a b"));
        assert_ne!(a, b);
    }
}
