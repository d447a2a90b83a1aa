//! Token counting
//!
//! Exact BPE tokenizers live outside this crate; they plug in by
//! implementing [`TokenCounter`]. [`HeuristicTokenCounter`] is the built-in
//! character-ratio estimate.

use std::fmt::Debug;

use super::message::ChatMessage;

/// Tokens added per chat message for role and framing
pub const TOKENS_PER_MESSAGE: usize = 4;

/// Tokens that prime the assistant reply after a chat array
pub const REPLY_PRIMING_TOKENS: usize = 3;

/// Counts tokens in text and chat-message arrays
pub trait TokenCounter: Send + Sync + Debug {
    /// Number of tokens in a piece of text
    fn count_text(&self, text: &str) -> usize;

    /// Number of tokens a chat array consumes as model input
    fn count_messages(&self, messages: &[ChatMessage]) -> usize {
        if messages.is_empty() {
            return 0;
        }

        let content: usize = messages
            .iter()
            .map(|m| {
                let name = m.name.as_deref().map_or(0, |n| self.count_text(n));
                TOKENS_PER_MESSAGE + self.count_text(&m.content) + name
            })
            .sum();

        content + REPLY_PRIMING_TOKENS
    }
}

/// Character-ratio token estimate
#[derive(Debug, Clone)]
pub struct HeuristicTokenCounter {
    chars_per_token: f64,
}

impl HeuristicTokenCounter {
    pub const DEFAULT_CHARS_PER_TOKEN: f64 = 4.0;

    /// Create a counter with a custom ratio; non-positive ratios fall back to the default
    pub fn new(chars_per_token: f64) -> Self {
        let chars_per_token = if chars_per_token.is_finite() && chars_per_token > 0.0 {
            chars_per_token
        } else {
            Self::DEFAULT_CHARS_PER_TOKEN
        };

        Self { chars_per_token }
    }

    pub fn chars_per_token(&self) -> f64 {
        self.chars_per_token
    }
}

impl Default for HeuristicTokenCounter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHARS_PER_TOKEN)
    }
}

impl TokenCounter for HeuristicTokenCounter {
    fn count_text(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }

        (text.chars().count() as f64 / self.chars_per_token).ceil() as usize
    }
}
