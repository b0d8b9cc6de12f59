//! Command-line and GitHub Action input parsing.
//!
//! Every option falls back to the environment variable the Actions runner
//! sets for the corresponding action input (`INPUT_<NAME>`), so the binary
//! runs unchanged as an action step or from a shell.

use std::path::PathBuf;
use std::time::Duration;

use clap::builder::BoolishValueParser;
use clap::{Parser, ValueEnum};
use collector::RateLimiterConfig;
use github::DEFAULT_API_URL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Living documentation collector for GitHub.
#[derive(Debug, Parser)]
#[command(name = "livdoc-collector", version, about)]
pub struct CliConfig {
    /// Token used for every GitHub API call.
    #[arg(long, env = "INPUT_GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: String,

    /// Enables the `doc-issues` mode.
    #[arg(long, env = "INPUT_DOC_ISSUES", default_value = "false", value_parser = BoolishValueParser::new())]
    pub doc_issues: bool,

    /// JSON array of repositories to mine.
    #[arg(long, env = "INPUT_DOC_ISSUES_REPOSITORIES", default_value = "[]")]
    pub doc_issues_repositories: String,

    /// Also mine the project boards attached to each repository.
    #[arg(
        long,
        env = "INPUT_DOC_ISSUES_PROJECT_STATE_MINING",
        default_value = "false",
        value_parser = BoolishValueParser::new()
    )]
    pub doc_issues_project_state_mining: bool,

    /// Root directory of the collector output.
    #[arg(long, env = "INPUT_OUTPUT_PATH", default_value = "./output")]
    pub output_path: PathBuf,

    /// GitHub REST API base URL.
    #[arg(long, env = "INPUT_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Logs at debug level unless `RUST_LOG` says otherwise.
    #[arg(long, env = "INPUT_VERBOSE_LOGGING", default_value = "false", value_parser = BoolishValueParser::new())]
    pub verbose_logging: bool,

    #[arg(long, value_enum, env = "INPUT_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Remaining calls at or below which a call waits for the budget reset.
    #[arg(long, default_value_t = 10)]
    pub rate_limit_threshold: u64,

    /// Seconds added to the reported budget reset before calling again.
    #[arg(long, default_value_t = 5)]
    pub rate_limit_margin_secs: u64,

    /// Attempts per call before giving up on it.
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: u32,

    #[arg(long, default_value_t = 1)]
    pub initial_backoff_secs: u64,

    #[arg(long, default_value_t = 60)]
    pub max_backoff_secs: u64,
}

impl CliConfig {
    pub fn rate_limiter(&self) -> RateLimiterConfig {
        RateLimiterConfig {
            low_budget_threshold: self.rate_limit_threshold,
            reset_margin: Duration::from_secs(self.rate_limit_margin_secs),
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_secs(self.initial_backoff_secs),
            max_backoff: Duration::from_secs(self.max_backoff_secs),
        }
    }
}
