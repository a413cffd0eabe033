//! Prompt construction for commit and pull request message generation.

use crate::flow::options::GenerationOptions;
use crate::git::changes::ChangeSet;

/// Base system instruction shipped with the binary. Length, language and
/// issue directives are appended per run by [`enhance_system_prompt`].
const SYSTEM_PROMPT: &str = include_str!("system_prompt.md");

/// Build the user-facing prompt from the change set and options.
///
/// Fixed section order: optional intent context, the diff, neighboring files,
/// then the requirements block. The issue line is appended only when an issue
/// reference is present.
pub fn build_user_prompt(changes: &ChangeSet, opts: &GenerationOptions) -> String {
    let context_line = if opts.user_context.is_empty() {
        String::new()
    } else {
        format!(
            "Use the following context to understand intent: {}",
            opts.user_context
        )
    };

    let neighboring: Vec<String> = changes
        .related_files
        .iter()
        .map(|(dir, names)| format!("{dir}/{names}"))
        .collect();

    let mut prompt = format!(
        "{}\n\nCode diff:\n{}\n\nNeighboring files:\n{}\n\nRequirements:\n- Maximum commit message length: {} characters\n- Language: {}",
        context_line,
        changes.diff,
        neighboring.join(", "),
        opts.max_length,
        opts.language,
    );

    if !changes.issue.is_empty() {
        prompt.push_str(&format!("\n- Reference issue: {}", changes.issue));
    }

    prompt
}

/// Append the per-run directives to the base system prompt.
///
/// The language directive is only added for non-default languages; the length
/// directive is always added; the issue directive only when an issue is set.
pub fn enhance_system_prompt(changes: &ChangeSet, opts: &GenerationOptions) -> String {
    let mut prompt = SYSTEM_PROMPT.to_string();

    if opts.language != "english" {
        prompt.push_str(&format!(
            "\n\nIMPORTANT: Generate the commit message in {} language.",
            opts.language
        ));
    }

    prompt.push_str(&format!(
        "\n\nIMPORTANT: Keep the commit message under {} characters.",
        opts.max_length
    ));

    if !changes.issue.is_empty() {
        prompt.push_str(&format!(
            "\n\nIMPORTANT: Reference issue {} in the commit message.",
            changes.issue
        ));
    }

    prompt
}
