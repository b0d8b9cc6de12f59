//! Fetches documentation-labelled issues of every configured repository.

use std::sync::Arc;

use issues::{
    BudgetClass, ConfigRepository, RepositoryDataSource, RepositoryIssues, ISSUE_STATE_ALL,
    SUPPORTED_ISSUE_LABELS,
};
use tracing::{debug, error, info, warn};

use crate::RateLimiter;

/// Retrieves raw issues per repository, one listing per supported label.
pub struct IssueFetcher {
    source: Arc<dyn RepositoryDataSource>,
    limiter: Arc<RateLimiter>,
}

impl IssueFetcher {
    pub fn new(source: Arc<dyn RepositoryDataSource>, limiter: Arc<RateLimiter>) -> Self {
        Self { source, limiter }
    }

    /// Fetches the issues of `repositories`, keyed by repository.
    ///
    /// All-or-nothing: if any repository cannot be resolved the whole fetch
    /// returns an empty map, including repositories already fetched.
    ///
    /// Issues are not de-duplicated across labels; an issue carrying two
    /// supported labels appears twice in its repository's list.
    pub async fn fetch(&self, repositories: &[ConfigRepository]) -> RepositoryIssues {
        let mut fetched = RepositoryIssues::new();
        let mut total = 0usize;

        for config in repositories {
            let repository_id = config.repository_id();

            let Some(repository) = self
                .limiter
                .call(BudgetClass::Core, "resolve_repository", || {
                    self.source
                        .resolve_repository(&config.organization_name, &config.repository_name)
                })
                .await
            else {
                error!(
                    repository = %repository_id,
                    "Fetching repository GitHub issues - repository could not be resolved; discarding all fetched issues."
                );
                return RepositoryIssues::new();
            };

            info!(repository = %repository.full_name, "Fetching repository GitHub issues - from repository.");

            let mut repository_issues = Vec::new();
            for label in SUPPORTED_ISSUE_LABELS {
                debug!(label, "Fetching issues with label.");
                let listed = self
                    .limiter
                    .call(BudgetClass::Core, "list_issues", || {
                        self.source.list_issues(&repository, label, ISSUE_STATE_ALL)
                    })
                    .await;
                match listed {
                    Some(issues) => repository_issues.extend(issues),
                    None => warn!(
                        repository = %repository.full_name,
                        label,
                        "Issues with label could not be listed; continuing without them."
                    ),
                }
            }

            total += repository_issues.len();
            info!(
                repository = %repository.full_name,
                count = repository_issues.len(),
                "Fetching repository GitHub issues - fetched repository issues."
            );
            fetched.insert(repository_id, repository_issues);
        }

        info!(
            count = total,
            "Fetching repository GitHub issues - loaded repository issues in total."
        );
        fetched
    }
}

#[cfg(test)]
mod tests {
    use issues::{DataSourceError, RepositoryId};

    use super::*;
    use crate::testing::{config_repository, raw_issue, repository, Call, FakeDataSource};
    use crate::RateLimiterConfig;

    fn fetcher(source: Arc<FakeDataSource>) -> IssueFetcher {
        let limiter = Arc::new(RateLimiter::new(source.clone(), RateLimiterConfig::default()));
        IssueFetcher::new(source, limiter)
    }

    #[tokio::test(start_paused = true)]
    async fn fetches_each_supported_label_with_all_states() {
        let source = Arc::new(
            FakeDataSource::new()
                .with_repository("OrgA/RepoA")
                .with_issues("OrgA/RepoA", "DocumentedUserStory", vec![raw_issue(1, &["DocumentedUserStory"])])
                .with_issues("OrgA/RepoA", "DocumentedFeature", vec![raw_issue(2, &["DocumentedFeature"])]),
        );

        let fetched = fetcher(source.clone())
            .fetch(&[config_repository("OrgA/RepoA", &[])])
            .await;

        let issues = &fetched[&RepositoryId::parse("OrgA/RepoA").unwrap()];
        let numbers: Vec<_> = issues.iter().map(|i| i.number.as_u64()).collect();
        assert_eq!(numbers, vec![1, 2]);

        let listed: Vec<_> = source
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::ListIssues { label, state, .. } => Some((label, state)),
                _ => None,
            })
            .collect();
        assert_eq!(
            listed,
            vec![
                ("DocumentedUserStory".to_string(), "all".to_string()),
                ("DocumentedFeature".to_string(), "all".to_string()),
                ("DocumentedFunctionality".to_string(), "all".to_string()),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn issue_with_two_labels_appears_twice() {
        let both = ["DocumentedFeature", "DocumentedFunctionality"];
        let source = Arc::new(
            FakeDataSource::new()
                .with_repository("OrgA/RepoA")
                .with_issues("OrgA/RepoA", "DocumentedFeature", vec![raw_issue(7, &both)])
                .with_issues("OrgA/RepoA", "DocumentedFunctionality", vec![raw_issue(7, &both)]),
        );

        let fetched = fetcher(source)
            .fetch(&[config_repository("OrgA/RepoA", &[])])
            .await;

        let issues = &fetched[&RepositoryId::parse("OrgA/RepoA").unwrap()];
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.number.as_u64() == 7));
    }

    #[tokio::test(start_paused = true)]
    async fn unresolvable_repository_discards_everything() {
        let source = Arc::new(
            FakeDataSource::new()
                .with_repository("OrgA/RepoA")
                .with_issues("OrgA/RepoA", "DocumentedFeature", vec![raw_issue(1, &["DocumentedFeature"])])
                .with_repository("OrgA/RepoC"),
        );

        let fetched = fetcher(source.clone())
            .fetch(&[
                config_repository("OrgA/RepoA", &[]),
                config_repository("OrgA/Missing", &[]),
                config_repository("OrgA/RepoC", &[]),
            ])
            .await;

        assert!(fetched.is_empty());
        // the third repository is never touched
        assert_eq!(source.resolve_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_resolution_failure_is_retried() {
        let source = Arc::new(FakeDataSource::new());
        source.push_resolution(
            "OrgA/RepoA",
            Err(DataSourceError::Transport {
                message: "timeout".to_string(),
            }),
        );
        source.push_resolution("OrgA/RepoA", Ok(repository("OrgA/RepoA")));

        let fetched = fetcher(source.clone())
            .fetch(&[config_repository("OrgA/RepoA", &[])])
            .await;

        assert_eq!(fetched.len(), 1);
        assert_eq!(source.resolve_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_label_listing_keeps_other_labels() {
        let source = Arc::new(
            FakeDataSource::new()
                .with_repository("OrgA/RepoA")
                .with_failing_label("OrgA/RepoA", "DocumentedUserStory")
                .with_issues("OrgA/RepoA", "DocumentedFeature", vec![raw_issue(3, &["DocumentedFeature"])]),
        );

        let fetched = fetcher(source)
            .fetch(&[config_repository("OrgA/RepoA", &[])])
            .await;

        let issues = &fetched[&RepositoryId::parse("OrgA/RepoA").unwrap()];
        assert_eq!(issues.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn repository_without_labelled_issues_maps_to_empty_list() {
        let source = Arc::new(FakeDataSource::new().with_repository("test_org/test_repo"));

        let fetched = fetcher(source)
            .fetch(&[config_repository("test_org/test_repo", &[])])
            .await;

        assert_eq!(fetched.len(), 1);
        assert!(fetched[&RepositoryId::parse("test_org/test_repo").unwrap()].is_empty());
    }
}
