//! Living documentation collector entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: flags and `INPUT_*` action inputs via [`config::CliConfig`].
//! 2. **Wire observability**: `tracing-subscriber` with a pretty or JSON layer
//!    and, when `OTEL_EXPORTER_OTLP_ENDPOINT` is set, an OTLP span exporter.
//! 3. **Validate inputs**: the repositories JSON parses, the token is
//!    accepted, and every configured repository resolves.
//! 4. **Run the modes**: construct the [`github::GitHubClient`] and hand it to
//!    the [`collector::DocIssuesCollector`] when `doc-issues` is enabled.
//! 5. **Publish the output path** as the `output-path` action output.
//!
//! Exit code is 1 when validation or an enabled mode fails.

mod config;
mod observability;

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::Parser;
use collector::{CollectorConfig, DocIssuesCollector};
use github::{GitHubClient, GitHubClientConfig};
use issues::{parse_repositories, ConfigRepository, DataSourceError, RepositoryDataSource, RunId};
use tracing::{debug, error, info, info_span, Instrument};

use crate::config::CliConfig;

const OUTPUT_PATH_OUTPUT: &str = "output-path";

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliConfig::parse();

    let guard = match observability::init(cli.log_format, cli.verbose_logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::FAILURE;
        }
    };

    let run_id = RunId::new_random();
    let code = match run(cli).instrument(info_span!("livdoc_collector", %run_id)).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = format!("{e:#}"), "Liv-Doc collector for GitHub - failed.");
            ExitCode::FAILURE
        }
    };

    guard.shutdown();
    code
}

async fn run(cli: CliConfig) -> anyhow::Result<ExitCode> {
    info!("Liv-Doc collector for GitHub - starting.");

    let client = Arc::new(GitHubClient::new(
        GitHubClientConfig::new(cli.github_token.clone()).with_api_url(cli.api_url.clone()),
    )?);

    let repositories = match validate(&cli, &client).await {
        Ok(repositories) => repositories,
        Err(e) => {
            error!(error = format!("{e:#}"), "Liv-Doc collector for GitHub - user configuration validation failed.");
            return Ok(ExitCode::FAILURE);
        }
    };

    let output_path = std::path::absolute(&cli.output_path)
        .with_context(|| format!("cannot resolve output path {}", cli.output_path.display()))?;
    let mut all_modes_succeeded = true;

    if cli.doc_issues {
        info!("Liv-Doc collector for GitHub - starting the `doc-issues` mode.");
        let collector = DocIssuesCollector::new(
            client,
            CollectorConfig {
                repositories,
                project_state_mining: cli.doc_issues_project_state_mining,
                output_path: output_path.clone(),
                rate_limiter: cli.rate_limiter(),
            },
        );
        match collector.collect().await {
            Ok(summary) => info!(
                issues = summary.consolidated_issues,
                linked = summary.linked_issues,
                file = %summary.output_file.display(),
                "Liv-Doc collector for GitHub - `doc-issues` mode completed successfully."
            ),
            Err(e) => {
                error!(error = %e, "Liv-Doc collector for GitHub - `doc-issues` mode failed.");
                all_modes_succeeded = false;
            }
        }
    } else {
        info!("Liv-Doc collector for GitHub - `doc-issues` mode disabled.");
    }

    set_action_output(OUTPUT_PATH_OUTPUT, &output_path.display().to_string())?;
    info!(path = %output_path.display(), "Liv-Doc collector for GitHub - root output path set.");
    info!("Liv-Doc collector for GitHub - ending.");

    Ok(if all_modes_succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Checks the user configuration against GitHub before any mode runs.
async fn validate(cli: &CliConfig, client: &GitHubClient) -> anyhow::Result<Vec<ConfigRepository>> {
    debug!("User configuration validation started.");
    let repositories = parse_repositories(&cli.doc_issues_repositories)?;

    client
        .verify_token()
        .await
        .context("can not connect to GitHub; possible cause: invalid GitHub token")?;

    let mut failed = 0;
    for repository in &repositories {
        let id = repository.repository_id();
        match client
            .resolve_repository(&repository.organization_name, &repository.repository_name)
            .await
        {
            Ok(_) => {}
            Err(DataSourceError::NotFound { .. }) => {
                error!(
                    repository = %id,
                    "Repository could not be found on GitHub. Verify that it exists and that the token can read it."
                );
                failed += 1;
            }
            Err(e) => {
                error!(repository = %id, error = %e, "Repository validation failed.");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} configured repositories failed validation");
    }

    debug!(
        doc_issues = cli.doc_issues,
        project_state_mining = cli.doc_issues_project_state_mining,
        repositories = repositories.len(),
        "User configuration validation successfully completed."
    );
    Ok(repositories)
}

/// Publishes an action output when running under the Actions runner.
fn set_action_output(name: &str, value: &str) -> anyhow::Result<()> {
    match std::env::var_os("GITHUB_OUTPUT") {
        Some(file) => append_action_output(&PathBuf::from(file), name, value),
        None => {
            debug!(name, value, "GITHUB_OUTPUT not set; action output skipped.");
            Ok(())
        }
    }
}

fn append_action_output(file: &Path, name: &str, value: &str) -> anyhow::Result<()> {
    let mut output = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .with_context(|| format!("cannot open action output file {}", file.display()))?;
    writeln!(output, "{name}={value}")
        .with_context(|| format!("cannot write action output file {}", file.display()))
}
