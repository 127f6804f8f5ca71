//! Completion API client (OpenAI-compatible legacy `/completions` endpoint).
//!
//! One prompt in, one trimmed candidate out. No streaming.

mod openai;

pub use openai::{build_prompt, CompletionError, OpenAiClient};
