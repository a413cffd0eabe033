//! The mutable option bundle shared across decision-loop iterations.

/// Flags and knobs for one decision-loop run.
///
/// Shared by mutable reference across iterations: the edit-context action
/// rewrites `user_context` between generation attempts. Never mutated while
/// a request is in flight.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub model: String,
    pub user_context: String,
    pub language: String,
    pub max_length: usize,
    pub quiet: bool,
    pub no_confirm: bool,
    pub push: bool,
    pub dry_run: bool,
    pub show_diff: bool,
    pub no_verify: bool,
    pub stage_all: bool,
    pub issue: String,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            model: String::new(),
            user_context: String::new(),
            language: "english".to_string(),
            max_length: 72,
            quiet: false,
            no_confirm: false,
            push: false,
            dry_run: false,
            show_diff: false,
            no_verify: false,
            stage_all: false,
            issue: String::new(),
        }
    }
}

impl GenerationOptions {
    /// Quiet only applies to unattended runs: without --yes the confirmation
    /// prompt must stay visible, so quiet is dropped.
    pub fn reconcile_quiet(&mut self) {
        if self.quiet && !self.no_confirm {
            self.quiet = false;
        }
    }
}
