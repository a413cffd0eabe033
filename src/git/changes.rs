//! Change detection from the working tree using git2.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use git2::{Diff, DiffFormat, ErrorCode, Repository, Tree};
use tracing::warn;

use crate::error::GitError;

/// Maximum characters for the unified diff text before truncation.
const MAX_DIFF_LENGTH: usize = 30_000;

/// Everything the generation loop needs to know about pending changes.
///
/// Built once per run and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ChangeSet {
    /// Changed file paths, sorted and deduplicated.
    pub files: Vec<String>,
    /// Unified diff text, capped at [`MAX_DIFF_LENGTH`].
    pub diff: String,
    /// Directory path mapped to a comma-joined listing of that directory's
    /// entries, so the model sees what the changed files sit next to.
    pub related_files: BTreeMap<String, String>,
    /// Issue reference to mention in the message; empty when absent.
    pub issue: String,
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
///
/// Returns `Ok(None)` for repos with no commits (unborn branch / not found),
/// so a first-ever commit still works.
fn head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, GitError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(GitError::DiffFailed(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(GitError::DiffFailed)?;
    Ok(Some(tree))
}

/// Detect staged changes and package them for generation.
///
/// With `stage_all`, tracked modifications and deletions are staged first
/// (the `git add -u` equivalent); untracked files are never picked up
/// implicitly. Only what is in the index ends up in the message, matching
/// what `git commit` would record.
pub fn detect_changes(
    repo: &Repository,
    stage_all: bool,
    issue: &str,
) -> Result<ChangeSet, GitError> {
    if stage_all {
        let mut index = repo.index().map_err(GitError::StageFailed)?;
        index
            .update_all(["*"].iter(), None)
            .map_err(GitError::StageFailed)?;
        index.write().map_err(GitError::StageFailed)?;
    }

    let head = head_tree(repo)?;
    let staged = repo
        .diff_tree_to_index(head.as_ref(), None, None)
        .map_err(GitError::DiffFailed)?;

    let files = changed_paths(&staged);
    if files.is_empty() {
        return Err(GitError::NothingStaged);
    }

    Ok(ChangeSet {
        related_files: related_files_for(repo.workdir(), &files),
        diff: diff_text(&staged),
        files,
        issue: issue.to_string(),
    })
}

/// Collect the branch diff for the pull request flow.
///
/// Diffs the merge base of `base` and HEAD against HEAD, i.e. exactly the
/// commits the pull request would carry. `base` defaults to the remote
/// default branch, falling back to a local `main`/`master`.
pub fn branch_changes(repo: &Repository, base: Option<&str>) -> Result<ChangeSet, GitError> {
    let base_name = match base {
        Some(b) => b.to_string(),
        None => default_base_branch(repo),
    };

    let base_commit = repo
        .revparse_single(&base_name)
        .and_then(|obj| obj.peel_to_commit())
        .map_err(|e| GitError::BaseNotFound {
            base: base_name.clone(),
            source: e,
        })?;
    let head_commit = repo
        .head()
        .and_then(|h| h.peel_to_commit())
        .map_err(GitError::DiffFailed)?;

    let merge_base = repo
        .merge_base(base_commit.id(), head_commit.id())
        .map_err(GitError::DiffFailed)?;
    if merge_base == head_commit.id() {
        return Err(GitError::NoBranchChanges { base: base_name });
    }

    let base_tree = repo
        .find_commit(merge_base)
        .and_then(|c| c.tree())
        .map_err(GitError::DiffFailed)?;
    let head_tree = head_commit.tree().map_err(GitError::DiffFailed)?;

    let diff = repo
        .diff_tree_to_tree(Some(&base_tree), Some(&head_tree), None)
        .map_err(GitError::DiffFailed)?;

    let files = changed_paths(&diff);
    if files.is_empty() {
        return Err(GitError::NoBranchChanges { base: base_name });
    }

    Ok(ChangeSet {
        related_files: related_files_for(repo.workdir(), &files),
        diff: diff_text(&diff),
        files,
        issue: String::new(),
    })
}

/// Pick the base branch for PR diffs: the remote default branch when known,
/// otherwise a local main/master.
fn default_base_branch(repo: &Repository) -> String {
    if let Ok(reference) = repo.find_reference("refs/remotes/origin/HEAD")
        && let Some(target) = reference.symbolic_target()
    {
        return target
            .trim_start_matches("refs/remotes/origin/")
            .to_string();
    }

    for candidate in ["main", "master"] {
        if repo
            .find_branch(candidate, git2::BranchType::Local)
            .is_ok()
        {
            return candidate.to_string();
        }
    }

    "main".to_string()
}

/// Changed file paths from a diff, sorted and deduplicated.
fn changed_paths(diff: &Diff<'_>) -> Vec<String> {
    let mut files = Vec::new();
    for delta in diff.deltas() {
        let path = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .map(|p| p.to_string_lossy().to_string());
        if let Some(path) = path
            && !path.is_empty()
        {
            files.push(path);
        }
    }
    files.sort();
    files.dedup();
    files
}

/// Render a diff as unified patch text, capped at [`MAX_DIFF_LENGTH`].
fn diff_text(diff: &Diff<'_>) -> String {
    let mut text = String::new();
    let mut truncated = false;

    if let Err(e) = diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        if truncated {
            return true;
        }

        let content = std::str::from_utf8(line.content()).unwrap_or("");
        if text.len() + content.len() + 2 > MAX_DIFF_LENGTH {
            truncated = true;
            return true;
        }

        // Include the origin character for context
        let origin = line.origin();
        if origin == '+' || origin == '-' || origin == ' ' {
            text.push(origin);
        }
        text.push_str(content);

        true
    }) {
        warn!("Failed to collect diff text: {e}");
    }

    if truncated {
        warn!("Diff truncated to {MAX_DIFF_LENGTH} characters");
    }

    text
}

/// Map each changed file's parent directory to a listing of its entries.
///
/// Directories are visited once; unreadable directories (e.g. a deleted
/// file's former parent) are skipped. `None` workdir means a bare repo,
/// where there is nothing to list.
fn related_files_for(workdir: Option<&Path>, files: &[String]) -> BTreeMap<String, String> {
    let Some(workdir) = workdir else {
        return BTreeMap::new();
    };

    let mut map = BTreeMap::new();
    for file in files {
        let parent = Path::new(file)
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| ".".to_string());

        if map.contains_key(&parent) {
            continue;
        }

        let Ok(entries) = fs::read_dir(workdir.join(&parent)) else {
            continue;
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        map.insert(parent, names.join(", "));
    }

    map
}
