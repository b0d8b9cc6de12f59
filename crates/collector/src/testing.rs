//! In-memory [`RepositoryDataSource`] for collector tests.
//!
//! Responses are registered up front; every call is recorded so tests can
//! assert on what was (and was not) requested.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use issues::{
    BudgetClass, ConfigRepository, DataSourceError, IssueNumber, OrganizationName, ProjectBoard,
    ProjectIssueRecord, ProjectStatus, QuotaSnapshot, RawIssue, Repository, RepositoryId,
    RepositoryName, RepositoryDataSource, Timestamp,
};

/// One recorded call into the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Resolve(String),
    ListIssues { repository: String, label: String, state: String },
    ListBoards { repository: String, title_filter: Vec<String> },
    ListProjectIssues(String),
    Quota(BudgetClass),
}

#[derive(Default)]
pub(crate) struct FakeDataSource {
    repositories: Mutex<HashMap<String, VecDeque<Result<Repository, DataSourceError>>>>,
    issues: Mutex<HashMap<(String, String), Vec<RawIssue>>>,
    failing_issue_labels: Mutex<Vec<(String, String)>>,
    boards: Mutex<HashMap<String, Vec<ProjectBoard>>>,
    board_issues: Mutex<HashMap<String, Vec<ProjectIssueRecord>>>,
    failing_board_listings: Mutex<Vec<String>>,
    failing_boards: Mutex<Vec<String>>,
    quota: Mutex<VecDeque<Result<QuotaSnapshot, DataSourceError>>>,
    observed: Mutex<HashMap<BudgetClass, QuotaSnapshot>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeDataSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Registers a repository that resolves successfully on every call.
    pub(crate) fn with_repository(self, id: &str) -> Self {
        self.push_resolution(id, Ok(repository(id)));
        self
    }

    /// Queues one resolution outcome for `id`; the last queued outcome repeats.
    pub(crate) fn push_resolution(&self, id: &str, outcome: Result<Repository, DataSourceError>) {
        self.repositories
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push_back(outcome);
    }

    pub(crate) fn with_issues(self, id: &str, label: &str, issues: Vec<RawIssue>) -> Self {
        self.issues
            .lock()
            .unwrap()
            .insert((id.to_string(), label.to_string()), issues);
        self
    }

    /// Makes listing `label` of `id` fail with a non-retryable error.
    pub(crate) fn with_failing_label(self, id: &str, label: &str) -> Self {
        self.failing_issue_labels
            .lock()
            .unwrap()
            .push((id.to_string(), label.to_string()));
        self
    }

    pub(crate) fn with_board(self, id: &str, board: ProjectBoard, rows: Vec<ProjectIssueRecord>) -> Self {
        self.board_issues.lock().unwrap().insert(board.id.clone(), rows);
        self.boards
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push(board);
        self
    }

    /// Makes listing the boards of `id` fail with a non-retryable error.
    pub(crate) fn with_failing_boards(self, id: &str) -> Self {
        self.failing_board_listings.lock().unwrap().push(id.to_string());
        self
    }

    /// Makes listing the rows of the board with `board_id` fail with a
    /// non-retryable error.
    pub(crate) fn with_failing_board(self, board_id: &str) -> Self {
        self.failing_boards.lock().unwrap().push(board_id.to_string());
        self
    }

    pub(crate) fn push_quota(&self, outcome: Result<QuotaSnapshot, DataSourceError>) {
        self.quota.lock().unwrap().push_back(outcome);
    }

    pub(crate) fn set_observed_quota(&self, class: BudgetClass, snapshot: QuotaSnapshot) {
        self.observed.lock().unwrap().insert(class, snapshot);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn resolve_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Resolve(_)))
            .count()
    }

    pub(crate) fn quota_queries(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Quota(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RepositoryDataSource for FakeDataSource {
    async fn resolve_repository(
        &self,
        organization: &OrganizationName,
        name: &RepositoryName,
    ) -> Result<Repository, DataSourceError> {
        let id = format!("{organization}/{name}");
        self.record(Call::Resolve(id.clone()));

        let mut repositories = self.repositories.lock().unwrap();
        let not_found = || DataSourceError::NotFound {
            resource: format!("repos/{id}"),
        };
        match repositories.get_mut(&id) {
            Some(outcomes) if outcomes.len() > 1 => outcomes.pop_front().unwrap_or_else(|| Err(not_found())),
            Some(outcomes) => outcomes.front().cloned().unwrap_or_else(|| Err(not_found())),
            None => Err(not_found()),
        }
    }

    async fn list_issues(
        &self,
        repository: &Repository,
        label: &str,
        state: &str,
    ) -> Result<Vec<RawIssue>, DataSourceError> {
        let id = repository.id.to_string();
        self.record(Call::ListIssues {
            repository: id.clone(),
            label: label.to_string(),
            state: state.to_string(),
        });

        let key = (id, label.to_string());
        if self.failing_issue_labels.lock().unwrap().contains(&key) {
            return Err(DataSourceError::Unauthorized {
                message: "label listing refused".to_string(),
            });
        }
        Ok(self.issues.lock().unwrap().get(&key).cloned().unwrap_or_default())
    }

    async fn list_project_boards(
        &self,
        repository: &Repository,
        title_filter: &[String],
    ) -> Result<Vec<ProjectBoard>, DataSourceError> {
        let id = repository.id.to_string();
        self.record(Call::ListBoards {
            repository: id.clone(),
            title_filter: title_filter.to_vec(),
        });

        if self.failing_board_listings.lock().unwrap().contains(&id) {
            return Err(DataSourceError::Query {
                message: "projects listing refused".to_string(),
            });
        }

        let boards = self.boards.lock().unwrap().get(&id).cloned().unwrap_or_default();
        Ok(boards
            .into_iter()
            .filter(|board| title_filter.is_empty() || title_filter.contains(&board.title))
            .collect())
    }

    async fn list_project_issues(
        &self,
        board: &ProjectBoard,
    ) -> Result<Vec<ProjectIssueRecord>, DataSourceError> {
        self.record(Call::ListProjectIssues(board.title.clone()));

        if self.failing_boards.lock().unwrap().contains(&board.id) {
            return Err(DataSourceError::Query {
                message: "project items refused".to_string(),
            });
        }
        Ok(self
            .board_issues
            .lock()
            .unwrap()
            .get(&board.id)
            .cloned()
            .unwrap_or_default())
    }

    async fn remaining_quota(&self, class: BudgetClass) -> Result<QuotaSnapshot, DataSourceError> {
        self.record(Call::Quota(class));
        self.quota
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(quota(5000, Duration::from_secs(3600))))
    }

    fn last_observed_quota(&self, class: BudgetClass) -> Option<QuotaSnapshot> {
        self.observed.lock().unwrap().get(&class).copied()
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

pub(crate) fn quota(remaining: u64, resets_in: Duration) -> QuotaSnapshot {
    let resets_in = chrono::Duration::from_std(resets_in).unwrap();
    QuotaSnapshot {
        remaining,
        limit: 5000,
        reset_at: Timestamp::from_utc(Timestamp::now().as_datetime() + resets_in),
    }
}

pub(crate) fn repository(id: &str) -> Repository {
    Repository {
        id: RepositoryId::parse(id).unwrap(),
        full_name: id.to_string(),
    }
}

pub(crate) fn config_repository(id: &str, title_filter: &[&str]) -> ConfigRepository {
    let id = RepositoryId::parse(id).unwrap();
    ConfigRepository::new(
        id.organization().clone(),
        id.name().clone(),
        title_filter.iter().map(|t| t.to_string()).collect(),
    )
}

pub(crate) fn raw_issue(number: u64, labels: &[&str]) -> RawIssue {
    RawIssue {
        number: IssueNumber::new(number),
        title: format!("Issue {number}"),
        state: "open".to_string(),
        created_at: "2025-01-01T00:00:00Z".to_string(),
        updated_at: "2025-01-02T00:00:00Z".to_string(),
        closed_at: None,
        html_url: format!("https://github.com/issues/{number}"),
        body: Some(format!("Body of issue {number}")),
        labels: labels.iter().map(|l| l.to_string()).collect(),
    }
}

pub(crate) fn board(id: &str, title: &str) -> ProjectBoard {
    ProjectBoard {
        id: id.to_string(),
        number: 1,
        title: title.to_string(),
    }
}

pub(crate) fn board_row(repository: &str, number: u64, board: &str, status: &str) -> ProjectIssueRecord {
    let id = RepositoryId::parse(repository).unwrap();
    ProjectIssueRecord {
        organization: id.organization().clone(),
        repository: id.name().clone(),
        number: IssueNumber::new(number),
        project_status: ProjectStatus {
            project_title: board.to_string(),
            status: status.to_string(),
            ..ProjectStatus::default()
        },
    }
}
