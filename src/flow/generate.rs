//! A single generation attempt: prompts, background request, wait spinner.

use std::time::Duration;

use indicatif::ProgressBar;
use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::error::GenerateError;
use crate::flow::options::GenerationOptions;
use crate::git::changes::ChangeSet;
use crate::llm::client::CompletionClient;
use crate::llm::prompt::{build_user_prompt, enhance_system_prompt};
use crate::llm::sanitize::sanitize_response;

/// Spinner tick interval while a request is in flight.
const TICK_INTERVAL: Duration = Duration::from_millis(80);

/// Run one generation attempt and return the sanitized message.
///
/// The network call and sanitization run on their own task; the final text
/// travels back through a one-shot channel, with an empty string standing in
/// for any provider failure. The caller blocks on that channel exactly once
/// per attempt, so the spinner never stops before the result is in and no
/// second request can be in flight for this attempt. An empty message after
/// sanitization is the single failure mode, answered by "Regenerate".
pub async fn generate_message<C>(
    client: &C,
    changes: &ChangeSet,
    opts: &GenerationOptions,
) -> Result<String, GenerateError>
where
    C: CompletionClient + Clone + Send + Sync + 'static,
{
    let user_prompt = build_user_prompt(changes, opts);
    let system_prompt = enhance_system_prompt(changes, opts);
    debug!("user prompt length: {} chars", user_prompt.len());

    let (tx, rx) = oneshot::channel::<String>();
    let task_client = client.clone();
    let model = opts.model.clone();
    tokio::spawn(async move {
        let text = match task_client
            .complete(&system_prompt, &user_prompt, &model)
            .await
        {
            Ok(raw) => sanitize_response(&raw),
            Err(err) => {
                error!("generation request failed: {err}");
                String::new()
            }
        };
        let _ = tx.send(text);
    });

    let message = if opts.quiet {
        rx.await.unwrap_or_default()
    } else {
        let spinner = ProgressBar::new_spinner();
        spinner.set_message(format!(
            "AI is analyzing your changes. (Model: {})",
            opts.model
        ));
        spinner.enable_steady_tick(TICK_INTERVAL);
        let message = rx.await.unwrap_or_default();
        spinner.finish_and_clear();
        println!("\nChanges analyzed!");
        message
    };

    if message.is_empty() {
        return Err(GenerateError::EmptyResult);
    }

    Ok(message)
}
