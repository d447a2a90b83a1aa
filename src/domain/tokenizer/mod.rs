//! Chat messages and token counting

mod counter;
mod message;

pub use counter::{HeuristicTokenCounter, TokenCounter, REPLY_PRIMING_TOKENS, TOKENS_PER_MESSAGE};
pub use message::{user_prompt, ChatMessage, MessageRole};
