//! Fetches project board rows of every configured repository.

use std::sync::Arc;

use issues::{BudgetClass, ConfigRepository, ProjectIssues, RepositoryDataSource};
use tracing::{debug, error, info, warn};

use crate::RateLimiter;

/// Retrieves project board issue rows, keyed by canonical issue key.
pub struct ProjectFetcher {
    source: Arc<dyn RepositoryDataSource>,
    limiter: Arc<RateLimiter>,
    project_state_mining: bool,
}

impl ProjectFetcher {
    /// `project_state_mining` switches the fetcher on; when `false` every
    /// fetch returns an empty map without touching the data source.
    pub fn new(
        source: Arc<dyn RepositoryDataSource>,
        limiter: Arc<RateLimiter>,
        project_state_mining: bool,
    ) -> Self {
        Self {
            source,
            limiter,
            project_state_mining,
        }
    }

    /// Fetches the board rows of every board attached to `repositories`.
    ///
    /// Rows are appended under their key, so an issue on several boards (or
    /// listed by boards of several repositories) accumulates one row per
    /// board. All-or-nothing on repository resolution, like the issue fetcher.
    pub async fn fetch(&self, repositories: &[ConfigRepository]) -> ProjectIssues {
        if !self.project_state_mining {
            info!("Fetching GitHub project data - project mining is not allowed.");
            return ProjectIssues::new();
        }
        debug!("Project data mining allowed.");

        let mut fetched = ProjectIssues::new();

        for config in repositories {
            let repository_id = config.repository_id();
            debug!(
                filter = ?config.projects_title_filter,
                "Filtering projects. If filter is empty, fetching all."
            );

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
                    "Fetching GitHub project data - repository could not be resolved; discarding all project data."
                );
                return ProjectIssues::new();
            };

            debug!(repository = %repository_id, "Fetching GitHub project data - looking for repository projects.");
            let boards = self
                .limiter
                .call(BudgetClass::GraphQl, "list_project_boards", || {
                    self.source
                        .list_project_boards(&repository, &config.projects_title_filter)
                })
                .await
                .unwrap_or_else(|| {
                    warn!(repository = %repository_id, "Project boards could not be listed; continuing without them.");
                    Vec::new()
                });

            if boards.is_empty() {
                info!(
                    repository = %repository.full_name,
                    "Fetching GitHub project data - no project data found for repository."
                );
            } else {
                info!(
                    repository = %repository.full_name,
                    count = boards.len(),
                    "Fetching GitHub project data - found project/s for repository."
                );
            }

            for board in &boards {
                info!(project = %board.title, "Fetching GitHub project data - fetching project data.");
                let Some(rows) = self
                    .limiter
                    .call(BudgetClass::GraphQl, "list_project_issues", || {
                        self.source.list_project_issues(board)
                    })
                    .await
                else {
                    warn!(project = %board.title, "Project issues could not be listed; continuing without them.");
                    continue;
                };

                for row in rows {
                    fetched.entry(row.key()).or_default().push(row);
                }
                info!(
                    project = %board.title,
                    "Fetching GitHub project data - successfully fetched project data."
                );
            }
        }

        fetched
    }
}
