//! quill - CLI entry point.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use quill::config::{self, ApiSettings, DEFAULT_BASE_URL, DEFAULT_MODEL};
use quill::flow::{FinalizeTarget, GenerationOptions, run_decision_loop};
use quill::git::{self, GitCli};
use quill::interact::ConsoleInteraction;
use quill::llm::AiClient;

/// Write your git commit and pull request messages with AI.
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(about = "CLI that writes your git commit and PR messages for you with AI")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file (default is {config dir}/quill/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(flatten)]
    generation: GenerationArgs,

    /// Stage all changes in tracked files
    #[arg(short = 'a', long = "all")]
    stage_all: bool,

    /// Push committed changes to the remote repository
    #[arg(short = 'p', long)]
    push: bool,

    /// Issue number or title to reference
    #[arg(short = 'i', long, default_value = "")]
    issue: String,

    /// Skip git commit-msg hook verification
    #[arg(long)]
    no_verify: bool,
}

/// Flags shared by the commit and pr flows.
#[derive(Args, Debug)]
struct GenerationArgs {
    /// Skip the confirmation prompt
    #[arg(short = 'y', long = "yes")]
    yes: bool,

    /// Suppress output (only works with --yes)
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Additional context to steer the message
    #[arg(short = 'c', long, default_value = "")]
    context: String,

    /// AI model to use
    #[arg(short = 'm', long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Run the command without making any changes
    #[arg(long)]
    dry_run: bool,

    /// Show the diff before generating
    #[arg(long)]
    show_diff: bool,

    /// Maximum length of the message in characters
    #[arg(short = 'l', long, default_value_t = 72)]
    max_length: usize,

    /// Language of the message
    #[arg(long, default_value = "english")]
    language: String,

    /// Custom base URL for the AI API
    #[arg(long = "baseurl", default_value = DEFAULT_BASE_URL)]
    base_url: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a pull request title and description for the current branch
    Pr(PrArgs),
    /// Manage quill configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args, Debug)]
struct PrArgs {
    #[command(flatten)]
    generation: GenerationArgs,

    /// Open the pull request as a draft
    #[arg(long)]
    draft: bool,

    /// Base branch to compare against (defaults to the remote default branch)
    #[arg(long)]
    base: Option<String>,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Manage the AI API key
    Key {
        #[command(subcommand)]
        command: SetAction,
    },
    /// Manage the default AI model
    Model {
        #[command(subcommand)]
        command: SetAction,
    },
    /// Manage the custom base URL for the AI API
    Baseurl {
        #[command(subcommand)]
        command: SetAction,
    },
}

#[derive(Subcommand, Debug)]
enum SetAction {
    /// Set the value
    Set { value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_file = match cli.config.clone() {
        Some(path) => path,
        None => config::config_path()?,
    };

    match cli.command {
        Some(Commands::Config { command }) => run_config(command, &config_file),
        Some(Commands::Pr(args)) => run_pr(args, &config_file).await,
        None => run_commit(cli, &config_file).await,
    }
}

/// Handle `quill config {key,model,baseurl} set <value>`.
fn run_config(command: ConfigCommands, path: &Path) -> Result<()> {
    let (key, action) = match command {
        ConfigCommands::Key { command } => ("key", command),
        ConfigCommands::Model { command } => ("model", command),
        ConfigCommands::Baseurl { command } => ("baseurl", command),
    };
    let SetAction::Set { value } = action;

    config::set_value(path, key, &value).context("Failed to save config")?;
    println!("Configuration saved to: {}", path.display());
    Ok(())
}

/// The root invocation: generate and create a commit.
async fn run_commit(cli: Cli, config_file: &Path) -> Result<()> {
    let settings = load_settings(config_file)?;
    let mut opts = build_options(&cli.generation, &settings);
    opts.stage_all = cli.stage_all;
    opts.push = cli.push;
    opts.no_verify = cli.no_verify;
    opts.issue = cli.issue;
    opts.reconcile_quiet();

    let client = build_client(&cli.generation, &settings)?;

    git::verify_git_installed()?;
    let repo = git::open_repository()?;

    let changes = git::detect_changes(&repo, opts.stage_all, &opts.issue)?;

    let interaction = ConsoleInteraction;
    interaction.display_detected_files(&changes.files, opts.quiet);
    if opts.show_diff && !opts.quiet {
        interaction.display_diff(&changes.diff);
    }

    run_decision_loop(
        &client,
        &interaction,
        &GitCli::default(),
        &changes,
        &mut opts,
        FinalizeTarget::Commit,
    )
    .await
    .context("Failed to create commit")?;

    Ok(())
}

/// The `pr` subcommand: generate and open a pull request.
async fn run_pr(args: PrArgs, config_file: &Path) -> Result<()> {
    let settings = load_settings(config_file)?;
    let mut opts = build_options(&args.generation, &settings);
    opts.reconcile_quiet();

    let client = build_client(&args.generation, &settings)?;

    git::verify_git_installed()?;
    let repo = git::open_repository()?;

    let changes = git::branch_changes(&repo, args.base.as_deref())?;

    let interaction = ConsoleInteraction;
    if opts.show_diff && !opts.quiet {
        interaction.display_diff(&changes.diff);
    }

    let vcs = GitCli { pr_base: args.base };
    run_decision_loop(
        &client,
        &interaction,
        &vcs,
        &changes,
        &mut opts,
        FinalizeTarget::PullRequest { draft: args.draft },
    )
    .await
    .context("Failed to create pull request")?;

    Ok(())
}

fn load_settings(path: &Path) -> Result<ApiSettings> {
    config::load(path).context("Failed to read config")
}

fn build_options(args: &GenerationArgs, settings: &ApiSettings) -> GenerationOptions {
    GenerationOptions {
        model: config::resolve_model(&args.model, settings),
        user_context: args.context.clone(),
        language: args.language.clone(),
        max_length: args.max_length,
        quiet: args.quiet,
        no_confirm: args.yes,
        dry_run: args.dry_run,
        show_diff: args.show_diff,
        ..GenerationOptions::default()
    }
}

fn build_client(args: &GenerationArgs, settings: &ApiSettings) -> Result<AiClient> {
    let api_key = config::resolve_api_key(settings)?;
    let base_url = config::resolve_base_url(&args.base_url, settings);
    Ok(AiClient::new(base_url, api_key))
}
