//! quill - A CLI tool that writes git commit and pull request messages with AI.
//!
//! # Overview
//!
//! quill collects the staged diff (or the branch diff for pull requests),
//! sends it to an OpenAI-compatible completions API, and walks the user
//! through confirming, regenerating, editing context, or cancelling the
//! suggested message before committing or opening the pull request.

pub mod config;
pub mod error;
pub mod flow;
pub mod git;
pub mod interact;
pub mod llm;

// Re-export commonly used types
pub use error::{ConfigError, FlowError, GenerateError, GitError, InteractError, ProviderError};
pub use flow::{Action, FinalizeTarget, GenerationOptions, Outcome, run_decision_loop};
pub use git::{ChangeSet, GitCli, VersionControl};
pub use interact::{ConsoleInteraction, Interaction};
pub use llm::{AiClient, CompletionClient};
