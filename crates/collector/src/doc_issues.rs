//! The `doc-issues` run: fetch, consolidate, export.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use issues::{consolidate, CollectorError, ConfigRepository, RepositoryDataSource};
use tracing::info;

use crate::export::{clean_output_directory, export_consolidated, DOC_ISSUES_DIR};
use crate::{IssueFetcher, ProjectFetcher, RateLimiter, RateLimiterConfig};

/// Everything one `doc-issues` run needs to know.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub repositories: Vec<ConfigRepository>,
    pub project_state_mining: bool,
    /// Root output directory; the run owns `{output_path}/doc-issues`.
    pub output_path: PathBuf,
    pub rate_limiter: RateLimiterConfig,
}

/// Counts describing a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSummary {
    /// Raw repository issues fetched, duplicates across labels included.
    pub repository_issues: usize,
    /// Project board rows fetched.
    pub project_issues: usize,
    /// Consolidated issues exported.
    pub consolidated_issues: usize,
    /// Consolidated issues linked to at least one project board.
    pub linked_issues: usize,
    pub output_file: PathBuf,
}

/// Collects documentation issues from the configured repositories.
pub struct DocIssuesCollector {
    repositories: Vec<ConfigRepository>,
    output_dir: PathBuf,
    issue_fetcher: IssueFetcher,
    project_fetcher: ProjectFetcher,
}

impl DocIssuesCollector {
    /// Wires fetchers sharing one rate limiter around `source`.
    pub fn new(source: Arc<dyn RepositoryDataSource>, config: CollectorConfig) -> Self {
        let limiter = Arc::new(RateLimiter::new(source.clone(), config.rate_limiter));
        Self {
            repositories: config.repositories,
            output_dir: config.output_path.join(DOC_ISSUES_DIR),
            issue_fetcher: IssueFetcher::new(source.clone(), limiter.clone()),
            project_fetcher: ProjectFetcher::new(source, limiter, config.project_state_mining),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Runs the whole collection and writes the consolidated output.
    ///
    /// Fetch failures never fail the run (they yield empty data); only
    /// output directory and export failures do.
    pub async fn collect(&self) -> Result<CollectionSummary, CollectorError> {
        clean_output_directory(&self.output_dir)?;

        info!("Fetching repository GitHub issues - started.");
        let repository_issues = self.issue_fetcher.fetch(&self.repositories).await;
        info!("Fetching repository GitHub issues - finished.");

        info!("Fetching GitHub project data - started.");
        let project_issues = self.project_fetcher.fetch(&self.repositories).await;
        info!("Fetching GitHub project data - finished.");

        let repository_issue_count: usize = repository_issues.values().map(Vec::len).sum();
        let project_issue_count: usize = project_issues.values().map(Vec::len).sum();

        info!("Issue and project data consolidation - started.");
        let consolidated = consolidate(repository_issues, project_issues);
        info!("Issue and project data consolidation - finished.");

        info!("Exporting consolidated issues - started.");
        let output_file = export_consolidated(&consolidated, &self.output_dir)?;
        info!("Exporting consolidated issues - finished.");

        Ok(CollectionSummary {
            repository_issues: repository_issue_count,
            project_issues: project_issue_count,
            consolidated_issues: consolidated.len(),
            linked_issues: consolidated.values().filter(|i| i.linked_to_project()).count(),
            output_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::load_catalog;
    use crate::testing::{board, board_row, config_repository, raw_issue, FakeDataSource};

    fn config(output_path: &Path, project_state_mining: bool) -> CollectorConfig {
        CollectorConfig {
            repositories: vec![config_repository("OrgA/RepoA", &[])],
            project_state_mining,
            output_path: output_path.to_path_buf(),
            rate_limiter: RateLimiterConfig::default(),
        }
    }

    fn source() -> Arc<FakeDataSource> {
        let both = ["DocumentedFeature", "DocumentedFunctionality"];
        Arc::new(
            FakeDataSource::new()
                .with_repository("OrgA/RepoA")
                .with_issues("OrgA/RepoA", "DocumentedUserStory", vec![raw_issue(1, &["DocumentedUserStory"])])
                .with_issues("OrgA/RepoA", "DocumentedFeature", vec![raw_issue(2, &both)])
                .with_issues("OrgA/RepoA", "DocumentedFunctionality", vec![raw_issue(2, &both)])
                .with_board(
                    "OrgA/RepoA",
                    board("P1", "Roadmap"),
                    vec![
                        board_row("OrgA/RepoA", 2, "Roadmap", "In Progress"),
                        board_row("OrgA/RepoA", 99, "Roadmap", "Todo"),
                    ],
                ),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn collect_exports_consolidated_issues() {
        let temp = tempfile::tempdir().unwrap();
        let collector = DocIssuesCollector::new(source(), config(temp.path(), true));

        let summary = collector.collect().await.unwrap();

        assert_eq!(summary.repository_issues, 3);
        assert_eq!(summary.project_issues, 2);
        assert_eq!(summary.consolidated_issues, 2);
        assert_eq!(summary.linked_issues, 1);
        assert_eq!(
            summary.output_file,
            temp.path().join("doc-issues").join("doc-issues.json")
        );

        let catalog = load_catalog(&summary.output_file).unwrap();
        let linked = catalog.get_issue("OrgA/RepoA#2").unwrap();
        assert!(linked.linked_to_project);
        assert_eq!(linked.project_statuses.len(), 1);
        assert!(catalog.get_issue("OrgA/RepoA#99").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn collect_without_project_mining_leaves_issues_unlinked() {
        let temp = tempfile::tempdir().unwrap();
        let collector = DocIssuesCollector::new(source(), config(temp.path(), false));

        let summary = collector.collect().await.unwrap();

        assert_eq!(summary.project_issues, 0);
        assert_eq!(summary.linked_issues, 0);
        assert_eq!(summary.consolidated_issues, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unresolvable_repository_exports_empty_catalog() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = config(temp.path(), true);
        config.repositories.push(config_repository("OrgA/Missing", &[]));
        let collector = DocIssuesCollector::new(source(), config);

        let summary = collector.collect().await.unwrap();

        assert_eq!(summary.consolidated_issues, 0);
        assert_eq!(load_catalog(&summary.output_file).unwrap().count(), 0);
    }
}
