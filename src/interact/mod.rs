//! Console interaction: message presentation and the action prompt.

use dialoguer::{Input, Select};

use crate::error::InteractError;
use crate::flow::Action;
use crate::flow::options::GenerationOptions;

const ACTIONS: &[&str] = &["Confirm", "Regenerate", "Edit context", "Cancel"];

/// Presenting a candidate message and collecting the user's decision.
///
/// Kept as a trait so the decision loop can be exercised with scripted
/// fakes in tests.
pub trait Interaction {
    /// Show the message and prompt for an action. Choosing "Edit context"
    /// collects new free text into `opts.user_context` before returning.
    /// The returned string is the final message for Confirm and empty for
    /// every other action.
    fn present_and_choose(
        &self,
        message: &str,
        opts: &mut GenerationOptions,
    ) -> Result<(Action, String), InteractError>;
}

/// Interactive terminal implementation backed by dialoguer.
pub struct ConsoleInteraction;

impl ConsoleInteraction {
    pub fn display_detected_files(&self, files: &[String], quiet: bool) {
        if quiet {
            return;
        }
        println!("Detected {} staged file(s):", files.len());
        for file in files {
            println!("  {file}");
        }
    }

    pub fn display_diff(&self, diff: &str) {
        println!("{diff}");
    }
}

impl Interaction for ConsoleInteraction {
    fn present_and_choose(
        &self,
        message: &str,
        opts: &mut GenerationOptions,
    ) -> Result<(Action, String), InteractError> {
        println!();
        println!("{message}");
        println!();

        let choice = Select::new()
            .with_prompt("Use this message?")
            .items(ACTIONS)
            .default(0)
            .interact()?;

        match choice {
            0 => Ok((Action::Confirm, message.to_string())),
            1 => Ok((Action::Regenerate, String::new())),
            2 => {
                let context: String = Input::new()
                    .with_prompt("Additional context")
                    .allow_empty(true)
                    .interact_text()?;
                opts.user_context = context;
                Ok((Action::EditContext, String::new()))
            }
            _ => Ok((Action::Cancel, String::new())),
        }
    }
}
