//! Text normalization, fingerprinting and similarity scoring

mod normalizer;
mod similarity;

pub use normalizer::{fingerprint, fingerprint_normalized, normalize, words};
pub use similarity::{dice_similarity, shared_bigrams};
