//! The interactive generation-and-decision loop.

pub mod generate;
pub mod options;

pub use generate::generate_message;
pub use options::GenerationOptions;

use crate::error::FlowError;
use crate::git::VersionControl;
use crate::git::changes::ChangeSet;
use crate::interact::Interaction;
use crate::llm::client::CompletionClient;

/// The user's (or policy's) disposition toward a generated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Confirm,
    Regenerate,
    EditContext,
    Cancel,
}

/// Clean terminal results of the decision loop. Cancelling is a result,
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Cancelled,
}

/// What accepting a message turns it into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeTarget {
    Commit,
    PullRequest { draft: bool },
}

impl FinalizeTarget {
    fn cancel_notice(&self) -> &'static str {
        match self {
            FinalizeTarget::Commit => "Commit cancelled",
            FinalizeTarget::PullRequest { .. } => "Pull request cancelled",
        }
    }
}

/// Generate, present, and act until the user confirms or cancels.
///
/// Each iteration produces exactly one candidate message. Regenerate and
/// Edit context discard it and loop (Edit context has already rewritten
/// `opts.user_context` by the time it is observed here); Confirm hands the
/// message to the finalizer; Cancel exits cleanly without committing
/// anything. With --yes the decision is forced to Confirm without a prompt,
/// and with --quiet on top the message is not echoed either.
///
/// Iterations are strictly sequential: the next attempt starts only after
/// the previous attempt's result has been consumed.
pub async fn run_decision_loop<C, I, V>(
    client: &C,
    interaction: &I,
    vcs: &V,
    changes: &ChangeSet,
    opts: &mut GenerationOptions,
    target: FinalizeTarget,
) -> Result<Outcome, FlowError>
where
    C: CompletionClient + Clone + Send + Sync + 'static,
    I: Interaction,
    V: VersionControl,
{
    loop {
        let message = generate_message(client, changes, opts).await?;

        let (action, final_message) = if opts.no_confirm {
            if !opts.quiet {
                println!("{message}");
            }
            (Action::Confirm, message)
        } else {
            interaction.present_and_choose(&message, opts)?
        };

        match action {
            Action::Confirm => {
                match target {
                    FinalizeTarget::Commit => vcs.commit(&final_message, opts)?,
                    FinalizeTarget::PullRequest { draft } => {
                        vcs.open_pull_request(&final_message, opts, draft)?
                    }
                }
                return Ok(Outcome::Completed);
            }
            Action::Regenerate | Action::EditContext => continue,
            Action::Cancel => {
                println!("{}", target.cancel_notice());
                return Ok(Outcome::Cancelled);
            }
        }
    }
}
