//! Repository verification, change detection, and finalization.
//!
//! Change detection reads the repository through git2. Finalization shells
//! out to the system `git` and `gh` binaries, inheriting the user's existing
//! git config, hooks, SSH agent, and credential store.

pub mod changes;

pub use changes::{ChangeSet, branch_changes, detect_changes};

use std::process::Command;

use git2::Repository;

use crate::error::GitError;
use crate::flow::options::GenerationOptions;

/// Check that the `git` binary is on PATH.
pub fn verify_git_installed() -> Result<(), GitError> {
    which::which("git").map(|_| ()).map_err(|_| GitError::NotInstalled)
}

/// Open the repository in the current directory.
pub fn open_repository() -> Result<Repository, GitError> {
    Repository::open(".").map_err(GitError::NotARepository)
}

/// The finalization half of version control: turning the accepted message
/// into a commit or a pull request.
///
/// Kept as a trait so the decision loop can be exercised with fakes.
pub trait VersionControl {
    fn commit(&self, message: &str, opts: &GenerationOptions) -> Result<(), GitError>;

    fn open_pull_request(
        &self,
        message: &str,
        opts: &GenerationOptions,
        draft: bool,
    ) -> Result<(), GitError>;
}

/// Finalizer backed by the system `git` and `gh` binaries.
#[derive(Default)]
pub struct GitCli {
    /// Base branch forwarded to `gh pr create --base`; None lets gh pick.
    pub pr_base: Option<String>,
}

impl VersionControl for GitCli {
    fn commit(&self, message: &str, opts: &GenerationOptions) -> Result<(), GitError> {
        if opts.dry_run {
            println!("Dry run enabled. No commit was created.");
            return Ok(());
        }

        let mut args = vec!["commit", "-m", message];
        if opts.no_verify {
            args.push("--no-verify");
        }
        run_git(&args, "commit")?;
        if !opts.quiet {
            println!("Changes committed.");
        }

        if opts.push {
            if let Err(e) = run_git(&["push"], "push") {
                return Err(GitError::PushFailed(e.to_string()));
            }
            if !opts.quiet {
                println!("Changes pushed.");
            }
        }

        Ok(())
    }

    fn open_pull_request(
        &self,
        message: &str,
        opts: &GenerationOptions,
        draft: bool,
    ) -> Result<(), GitError> {
        let (title, body) = split_title_body(message);

        if opts.dry_run {
            println!("Dry run enabled. No pull request was created.");
            println!("Title: {title}");
            if !body.is_empty() {
                println!("Body:\n{body}");
            }
            return Ok(());
        }

        which::which("gh").map_err(|_| GitError::GhNotInstalled)?;

        let mut args = vec!["pr", "create", "--title", title.as_str(), "--body", body.as_str()];
        if draft {
            args.push("--draft");
        }
        if let Some(base) = &self.pr_base {
            args.push("--base");
            args.push(base);
        }

        let output = Command::new("gh")
            .args(&args)
            .output()
            .map_err(|e| GitError::PullRequestFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GitError::PullRequestFailed(stderr.trim().to_string()));
        }

        if !opts.quiet {
            // gh prints the PR URL on stdout.
            let url = String::from_utf8_lossy(&output.stdout);
            let url = url.trim();
            if !url.is_empty() {
                println!("{url}");
            }
            println!("Pull request created.");
        }

        Ok(())
    }
}

/// Split a message into a PR title (first line) and body (the rest).
fn split_title_body(message: &str) -> (String, String) {
    match message.split_once('\n') {
        Some((title, body)) => (title.trim().to_string(), body.trim().to_string()),
        None => (message.trim().to_string(), String::new()),
    }
}

/// Run a git command and return success or a descriptive error.
fn run_git(args: &[&str], operation: &str) -> Result<(), GitError> {
    let output = Command::new("git")
        .args(args)
        .output()
        .map_err(|e| GitError::CommandFailed {
            operation: operation.to_string(),
            stderr: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GitError::CommandFailed {
            operation: operation.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(())
}
