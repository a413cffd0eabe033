//! Completions client, prompt construction and response cleanup.

pub mod client;
pub mod prompt;
pub mod sanitize;

pub use client::{AiClient, CompletionClient};
pub use prompt::{build_user_prompt, enhance_system_prompt};
pub use sanitize::sanitize_response;
