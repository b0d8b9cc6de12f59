//! Port trait for the repository data source.
//!
//! The collector consumes the hosting service only through
//! [`RepositoryDataSource`]. Infrastructure crates implement it; the
//! collector crate's rate-limited caller wraps every call into it.

use async_trait::async_trait;

use crate::{
    BudgetClass, DataSourceError, OrganizationName, ProjectBoard, ProjectIssueRecord,
    QuotaSnapshot, RawIssue, Repository, RepositoryName,
};

/// Read access to repositories, their issues, and their project boards.
///
/// Implementations must be cheap to share behind an `Arc`; all methods take
/// `&self`.
#[async_trait]
pub trait RepositoryDataSource: Send + Sync {
    /// Resolves `organization/name` to a repository handle.
    async fn resolve_repository(
        &self,
        organization: &OrganizationName,
        name: &RepositoryName,
    ) -> Result<Repository, DataSourceError>;

    /// Lists every issue of `repository` carrying `label`, in the given state
    /// filter (`"all"` for open and closed), across all pages.
    async fn list_issues(
        &self,
        repository: &Repository,
        label: &str,
        state: &str,
    ) -> Result<Vec<RawIssue>, DataSourceError>;

    /// Lists the project boards of `repository` whose title is in
    /// `title_filter`, or every board when the filter is empty.
    async fn list_project_boards(
        &self,
        repository: &Repository,
        title_filter: &[String],
    ) -> Result<Vec<ProjectBoard>, DataSourceError>;

    /// Lists the issue rows of `board`, across all pages.
    async fn list_project_issues(
        &self,
        board: &ProjectBoard,
    ) -> Result<Vec<ProjectIssueRecord>, DataSourceError>;

    /// Queries the remaining budget of `class`.
    async fn remaining_quota(&self, class: BudgetClass) -> Result<QuotaSnapshot, DataSourceError>;

    /// Returns the budget of `class` as observed on the most recent response,
    /// if the implementation tracks it.
    fn last_observed_quota(&self, _class: BudgetClass) -> Option<QuotaSnapshot> {
        None
    }
}
