//! Integration tests for the decision loop and generation runner, driven by
//! scripted fakes for the completions client, the interaction, and the
//! version control finalizer.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use quill::error::{FlowError, GenerateError, GitError, InteractError, ProviderError};
use quill::flow::{
    Action, FinalizeTarget, GenerationOptions, Outcome, generate_message, run_decision_loop,
};
use quill::git::{ChangeSet, VersionControl};
use quill::interact::Interaction;
use quill::llm::CompletionClient;

/// Completion client that replays a scripted sequence of responses.
/// `None` entries simulate a provider failure.
#[derive(Clone)]
struct ScriptedClient {
    responses: Arc<Mutex<VecDeque<Option<String>>>>,
    /// (system prompt, user prompt) per call, in order.
    prompts: Arc<Mutex<Vec<(String, String)>>>,
    in_flight: Arc<AtomicUsize>,
    overlapped: Arc<AtomicUsize>,
}

impl ScriptedClient {
    fn new(responses: &[Option<&str>]) -> Self {
        Self {
            responses: Arc::new(Mutex::new(
                responses.iter().map(|r| r.map(String::from)).collect(),
            )),
            prompts: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            overlapped: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    fn user_prompt(&self, call: usize) -> String {
        self.prompts.lock().unwrap()[call].1.clone()
    }

    fn overlapped_calls(&self) -> usize {
        self.overlapped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        _model: &str,
    ) -> Result<String, ProviderError> {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            self.overlapped.fetch_add(1, Ordering::SeqCst);
        }
        // Give any overlapping attempt a window to show up.
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.prompts
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));

        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted client ran out of responses");
        next.ok_or(ProviderError::NoChoices)
    }
}

/// One scripted user decision.
enum Step {
    Choose(Action),
    EditContext(&'static str),
}

/// Interaction double that replays scripted decisions and records what was
/// presented.
struct ScriptedInteraction {
    script: Mutex<VecDeque<Step>>,
    presented: Mutex<Vec<String>>,
}

impl ScriptedInteraction {
    fn new(script: Vec<Step>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            presented: Mutex::new(Vec::new()),
        }
    }

    fn presented(&self) -> Vec<String> {
        self.presented.lock().unwrap().clone()
    }
}

impl Interaction for ScriptedInteraction {
    fn present_and_choose(
        &self,
        message: &str,
        opts: &mut GenerationOptions,
    ) -> Result<(Action, String), InteractError> {
        self.presented.lock().unwrap().push(message.to_string());
        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("present_and_choose called but the script is empty");
        match step {
            Step::Choose(Action::Confirm) => Ok((Action::Confirm, message.to_string())),
            Step::Choose(action) => Ok((action, String::new())),
            Step::EditContext(context) => {
                opts.user_context = context.to_string();
                Ok((Action::EditContext, String::new()))
            }
        }
    }
}

/// Finalizer double that records commits and pull requests.
#[derive(Default)]
struct RecordingVcs {
    commits: Mutex<Vec<String>>,
    pull_requests: Mutex<Vec<(String, bool)>>,
    fail_commit: bool,
}

impl RecordingVcs {
    fn commits(&self) -> Vec<String> {
        self.commits.lock().unwrap().clone()
    }

    fn pull_requests(&self) -> Vec<(String, bool)> {
        self.pull_requests.lock().unwrap().clone()
    }
}

impl VersionControl for RecordingVcs {
    fn commit(&self, message: &str, _opts: &GenerationOptions) -> Result<(), GitError> {
        if self.fail_commit {
            return Err(GitError::CommandFailed {
                operation: "commit".to_string(),
                stderr: "simulated failure".to_string(),
            });
        }
        self.commits.lock().unwrap().push(message.to_string());
        Ok(())
    }

    fn open_pull_request(
        &self,
        message: &str,
        _opts: &GenerationOptions,
        draft: bool,
    ) -> Result<(), GitError> {
        self.pull_requests
            .lock()
            .unwrap()
            .push((message.to_string(), draft));
        Ok(())
    }
}

fn make_changes() -> ChangeSet {
    ChangeSet {
        files: vec!["src/main.rs".to_string()],
        diff: "+fn foo() {}\n".to_string(),
        related_files: BTreeMap::from([("src".to_string(), "main.rs".to_string())]),
        issue: String::new(),
    }
}

fn make_opts() -> GenerationOptions {
    GenerationOptions {
        model: "test-model".to_string(),
        quiet: true,
        ..GenerationOptions::default()
    }
}

#[tokio::test]
async fn confirm_commits_the_presented_message() {
    let client = ScriptedClient::new(&[Some("feat: add foo")]);
    let interaction = ScriptedInteraction::new(vec![Step::Choose(Action::Confirm)]);
    let vcs = RecordingVcs::default();
    let mut opts = make_opts();

    let outcome = run_decision_loop(
        &client,
        &interaction,
        &vcs,
        &make_changes(),
        &mut opts,
        FinalizeTarget::Commit,
    )
    .await
    .unwrap();

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(interaction.presented(), vec!["feat: add foo".to_string()]);
    assert_eq!(vcs.commits(), vec!["feat: add foo".to_string()]);
}

#[tokio::test]
async fn cancel_is_terminal_and_commits_nothing() {
    let client = ScriptedClient::new(&[Some("feat: add foo")]);
    let interaction = ScriptedInteraction::new(vec![Step::Choose(Action::Cancel)]);
    let vcs = RecordingVcs::default();
    let mut opts = make_opts();

    let outcome = run_decision_loop(
        &client,
        &interaction,
        &vcs,
        &make_changes(),
        &mut opts,
        FinalizeTarget::Commit,
    )
    .await
    .unwrap();

    assert_eq!(outcome, Outcome::Cancelled);
    assert!(vcs.commits().is_empty());
    assert!(vcs.pull_requests().is_empty());
}

#[tokio::test]
async fn auto_confirm_with_quiet_skips_presentation_entirely() {
    let client = ScriptedClient::new(&[Some("feat: unattended")]);
    // Empty script: any presentation would panic the test.
    let interaction = ScriptedInteraction::new(vec![]);
    let vcs = RecordingVcs::default();
    let mut opts = make_opts();
    opts.no_confirm = true;
    opts.quiet = true;

    let outcome = run_decision_loop(
        &client,
        &interaction,
        &vcs,
        &make_changes(),
        &mut opts,
        FinalizeTarget::Commit,
    )
    .await
    .unwrap();

    assert_eq!(outcome, Outcome::Completed);
    assert!(interaction.presented().is_empty());
    assert_eq!(vcs.commits(), vec!["feat: unattended".to_string()]);
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn regenerate_discards_and_requests_again() {
    let client = ScriptedClient::new(&[Some("first draft"), Some("second draft")]);
    let interaction = ScriptedInteraction::new(vec![
        Step::Choose(Action::Regenerate),
        Step::Choose(Action::Confirm),
    ]);
    let vcs = RecordingVcs::default();
    let mut opts = make_opts();

    let outcome = run_decision_loop(
        &client,
        &interaction,
        &vcs,
        &make_changes(),
        &mut opts,
        FinalizeTarget::Commit,
    )
    .await
    .unwrap();

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(
        interaction.presented(),
        vec!["first draft".to_string(), "second draft".to_string()]
    );
    assert_eq!(vcs.commits(), vec!["second draft".to_string()]);
    assert_eq!(client.calls(), 2);
    // Attempts are strictly sequential: no request overlapped another.
    assert_eq!(client.overlapped_calls(), 0);
}

#[tokio::test]
async fn edit_context_feeds_the_next_attempt() {
    let client = ScriptedClient::new(&[Some("first draft"), Some("second draft")]);
    let interaction = ScriptedInteraction::new(vec![
        Step::EditContext("focus on the parser rewrite"),
        Step::Choose(Action::Confirm),
    ]);
    let vcs = RecordingVcs::default();
    let mut opts = make_opts();

    run_decision_loop(
        &client,
        &interaction,
        &vcs,
        &make_changes(),
        &mut opts,
        FinalizeTarget::Commit,
    )
    .await
    .unwrap();

    // First attempt had no context; the second carries the edited context.
    assert!(!client.user_prompt(0).contains("Use the following context"));
    assert!(client.user_prompt(1).contains(
        "Use the following context to understand intent: focus on the parser rewrite"
    ));
    assert_eq!(vcs.commits(), vec!["second draft".to_string()]);
    assert_eq!(opts.user_context, "focus on the parser rewrite");
}

#[tokio::test]
async fn generation_failure_aborts_the_loop() {
    // Provider error becomes the empty-result failure; nothing is presented
    // and nothing is committed.
    let client = ScriptedClient::new(&[None]);
    let interaction = ScriptedInteraction::new(vec![]);
    let vcs = RecordingVcs::default();
    let mut opts = make_opts();

    let result = run_decision_loop(
        &client,
        &interaction,
        &vcs,
        &make_changes(),
        &mut opts,
        FinalizeTarget::Commit,
    )
    .await;

    assert!(matches!(
        result,
        Err(FlowError::Generate(GenerateError::EmptyResult))
    ));
    assert!(interaction.presented().is_empty());
    assert!(vcs.commits().is_empty());
}

#[tokio::test]
async fn commit_failure_surfaces_as_flow_error() {
    let client = ScriptedClient::new(&[Some("feat: doomed")]);
    let interaction = ScriptedInteraction::new(vec![Step::Choose(Action::Confirm)]);
    let vcs = RecordingVcs {
        fail_commit: true,
        ..RecordingVcs::default()
    };
    let mut opts = make_opts();

    let result = run_decision_loop(
        &client,
        &interaction,
        &vcs,
        &make_changes(),
        &mut opts,
        FinalizeTarget::Commit,
    )
    .await;

    assert!(matches!(result, Err(FlowError::Git(_))));
}

#[tokio::test]
async fn pull_request_target_invokes_the_pr_finalizer() {
    let client = ScriptedClient::new(&[Some("feat: branch summary\n\ndetails")]);
    let interaction = ScriptedInteraction::new(vec![Step::Choose(Action::Confirm)]);
    let vcs = RecordingVcs::default();
    let mut opts = make_opts();

    let outcome = run_decision_loop(
        &client,
        &interaction,
        &vcs,
        &make_changes(),
        &mut opts,
        FinalizeTarget::PullRequest { draft: true },
    )
    .await
    .unwrap();

    assert_eq!(outcome, Outcome::Completed);
    assert!(vcs.commits().is_empty());
    assert_eq!(
        vcs.pull_requests(),
        vec![("feat: branch summary\n\ndetails".to_string(), true)]
    );
}

#[tokio::test]
async fn empty_provider_output_is_an_empty_result() {
    let client = ScriptedClient::new(&[Some("")]);
    let result = generate_message(&client, &make_changes(), &make_opts()).await;
    assert!(matches!(result, Err(GenerateError::EmptyResult)));
}

#[tokio::test]
async fn fence_only_output_is_an_empty_result() {
    let client = ScriptedClient::new(&[Some("``````")]);
    let result = generate_message(&client, &make_changes(), &make_opts()).await;
    assert!(matches!(result, Err(GenerateError::EmptyResult)));
}

#[tokio::test]
async fn quiet_and_verbose_paths_sanitize_identically() {
    let raw = "```\nfix: update foo\n```";

    let quiet_client = ScriptedClient::new(&[Some(raw)]);
    let quiet_message = generate_message(&quiet_client, &make_changes(), &make_opts())
        .await
        .unwrap();

    let verbose_client = ScriptedClient::new(&[Some(raw)]);
    let mut verbose_opts = make_opts();
    verbose_opts.quiet = false;
    let verbose_message = generate_message(&verbose_client, &make_changes(), &verbose_opts)
        .await
        .unwrap();

    assert_eq!(quiet_message, "fix: update foo");
    assert_eq!(quiet_message, verbose_message);
}
