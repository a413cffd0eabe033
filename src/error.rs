//! Error types for quill modules using thiserror.

use thiserror::Error;

/// Errors from the completions API client.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Request to the AI provider failed: {0}")]
    RequestFailed(#[source] reqwest::Error),

    #[error("AI provider returned an error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("AI provider returned a malformed response: {0}")]
    MalformedResponse(String),

    #[error("AI provider returned no choices")]
    NoChoices,
}

/// Errors from a single generation attempt.
///
/// Provider failures are folded into the empty-result case: the background
/// task reports them through the completion channel as an empty message, so
/// the caller sees one uniform failure mode that the user answers with
/// "Regenerate".
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("no commit message was generated, try again")]
    EmptyResult,
}

/// Errors from git and gh operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("git not found on PATH. Install git and try again")]
    NotInstalled,

    #[error(
        "GitHub CLI (gh) not found on PATH. Install it from https://cli.github.com or create the pull request manually"
    )]
    GhNotInstalled,

    #[error("Not a git repository. Run quill from within a git repository")]
    NotARepository(#[source] git2::Error),

    #[error("No staged changes found. Stage files with 'git add' or pass --all")]
    NothingStaged,

    #[error("No commits found ahead of '{base}'. Nothing to open a pull request for")]
    NoBranchChanges { base: String },

    #[error("Base branch '{base}' not found: {source}")]
    BaseNotFound {
        base: String,
        #[source]
        source: git2::Error,
    },

    #[error("Failed to stage changes: {0}")]
    StageFailed(#[source] git2::Error),

    #[error("Failed to collect diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("git {operation} failed: {stderr}")]
    CommandFailed { operation: String, stderr: String },

    #[error("Failed to push: {0}")]
    PushFailed(String),

    #[error("Failed to create pull request: {0}")]
    PullRequestFailed(String),
}

/// Errors from persisted configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not determine the platform config directory")]
    NoConfigDir,

    #[error("Failed to read config: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("Failed to write config: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseFailed(#[source] toml_edit::TomlError),

    #[error(
        "API key is not set. Run 'quill config key set <your_api_key>' or export QUILL_API_KEY"
    )]
    MissingApiKey,
}

/// Errors from interactive prompts.
#[derive(Error, Debug)]
pub enum InteractError {
    #[error("Prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),
}

/// Errors surfaced by the decision loop.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error(transparent)]
    Generate(#[from] GenerateError),

    #[error(transparent)]
    Interact(#[from] InteractError),

    #[error(transparent)]
    Git(#[from] GitError),
}
