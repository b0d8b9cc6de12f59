//! Shared value types for the living documentation issue domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! data fetched from the hosting service and the records derived from it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{IssueKey, IssueNumber, OrganizationName, RepositoryId, RepositoryName};

/// Placeholder recorded for a project field the board carries no value for.
pub const NO_PROJECT_DATA: &str = "---";

// ---------------------------------------------------------------------------
// Source records
// ---------------------------------------------------------------------------

/// A repository resolved through the data source.
///
/// Acts as the handle passed back into issue and project board listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// Identity of the repository.
    pub id: RepositoryId,
    /// Full name as reported by the host (normally equal to `id`).
    pub full_name: String,
}

/// An issue as returned by the hosting service's issue listing.
///
/// Transient: not retained past one collection run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIssue {
    pub number: IssueNumber,
    pub title: String,
    pub state: String,
    pub created_at: String,
    pub updated_at: String,
    pub closed_at: Option<String>,
    pub html_url: String,
    pub body: Option<String>,
    pub labels: Vec<String>,
}

/// A project board attached to a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectBoard {
    /// Opaque node identifier used to page the board's items.
    pub id: String,
    pub number: u64,
    pub title: String,
}

/// One board's classification of one issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStatus {
    pub project_title: String,
    pub status: String,
    pub priority: String,
    pub size: String,
    pub moscow: String,
}

impl Default for ProjectStatus {
    fn default() -> Self {
        Self {
            project_title: NO_PROJECT_DATA.to_string(),
            status: NO_PROJECT_DATA.to_string(),
            priority: NO_PROJECT_DATA.to_string(),
            size: NO_PROJECT_DATA.to_string(),
            moscow: NO_PROJECT_DATA.to_string(),
        }
    }
}

/// A project board row, carrying enough identity to compute its [`IssueKey`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectIssueRecord {
    pub organization: OrganizationName,
    pub repository: RepositoryName,
    pub number: IssueNumber,
    pub project_status: ProjectStatus,
}

impl ProjectIssueRecord {
    /// Returns the canonical key of the issue this row refers to.
    pub fn key(&self) -> IssueKey {
        IssueKey::new(&self.organization, &self.repository, self.number)
    }
}

// ---------------------------------------------------------------------------
// Consolidated records
// ---------------------------------------------------------------------------

/// A repository issue joined with every project board status found for it.
///
/// Invariant: `linked_to_project()` is `true` exactly when at least one
/// project status has been recorded. The fields are private so the only way
/// to add project data is [`ConsolidatedIssue::update_with_project_data`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidatedIssue {
    repository_id: RepositoryId,
    issue: RawIssue,
    linked_to_project: bool,
    project_issue_statuses: Vec<ProjectStatus>,
}

impl ConsolidatedIssue {
    /// Creates an issue with no project data attached.
    pub fn new(repository_id: RepositoryId, issue: RawIssue) -> Self {
        Self {
            repository_id,
            issue,
            linked_to_project: false,
            project_issue_statuses: Vec::new(),
        }
    }

    pub fn repository_id(&self) -> &RepositoryId {
        &self.repository_id
    }

    pub fn issue(&self) -> &RawIssue {
        &self.issue
    }

    pub fn key(&self) -> IssueKey {
        self.repository_id.issue_key(self.issue.number)
    }

    pub fn linked_to_project(&self) -> bool {
        self.linked_to_project
    }

    /// Project statuses in the order they were recorded.
    pub fn project_issue_statuses(&self) -> &[ProjectStatus] {
        &self.project_issue_statuses
    }

    /// Records one more board's status for this issue.
    pub fn update_with_project_data(&mut self, status: ProjectStatus) {
        self.linked_to_project = true;
        self.project_issue_statuses.push(status);
    }

    /// Converts into the record shape handed to the exporter.
    pub fn to_persisted(&self) -> PersistedIssue {
        PersistedIssue {
            repository_id: self.repository_id.to_string(),
            title: self.issue.title.clone(),
            number: self.issue.number.as_u64(),
            state: self.issue.state.clone(),
            created_at: self.issue.created_at.clone(),
            updated_at: self.issue.updated_at.clone(),
            closed_at: self.issue.closed_at.clone().unwrap_or_default(),
            html_url: self.issue.html_url.clone(),
            body: self.issue.body.clone().unwrap_or_default(),
            labels: self.issue.labels.clone(),
            linked_to_project: self.linked_to_project,
            project_statuses: self.project_issue_statuses.clone(),
        }
    }
}

/// The persisted shape of one consolidated issue.
///
/// Absent optional values are written as empty strings so consumers never
/// have to distinguish `null` from `""`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedIssue {
    pub repository_id: String,
    pub title: String,
    pub number: u64,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub closed_at: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub linked_to_project: bool,
    #[serde(default, alias = "project_status")]
    pub project_statuses: Vec<ProjectStatus>,
}

/// An ordered collection of persisted issues keyed by canonical key.
///
/// Serialises as a JSON object `{ "<key>": { ...issue... } }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueCatalog {
    issues: BTreeMap<String, PersistedIssue>,
}

impl IssueCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the issue stored under `key`.
    pub fn add_issue(&mut self, key: impl Into<String>, issue: PersistedIssue) {
        self.issues.insert(key.into(), issue);
    }

    pub fn get_issue(&self, key: &str) -> Option<&PersistedIssue> {
        self.issues.get(key)
    }

    pub fn all_issues(&self) -> &BTreeMap<String, PersistedIssue> {
        &self.issues
    }

    pub fn count(&self) -> usize {
        self.issues.len()
    }
}

// ---------------------------------------------------------------------------
// Quota
// ---------------------------------------------------------------------------

/// An independently metered quota pool of the hosting service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetClass {
    /// The primary (REST) request budget.
    Core,
    /// The GraphQL point budget.
    GraphQl,
}

impl std::fmt::Display for BudgetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BudgetClass::Core => write!(f, "core"),
            BudgetClass::GraphQl => write!(f, "graphql"),
        }
    }
}

/// Remaining budget of one [`BudgetClass`] at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaSnapshot {
    /// Calls (or points) left before the budget resets.
    pub remaining: u64,
    /// Size of the budget per window.
    pub limit: u64,
    /// When the budget is refilled.
    pub reset_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A UTC wall-clock timestamp.
///
/// Wraps [`chrono::DateTime<Utc>`] so callers never depend on `chrono` types
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Returns the current UTC time as a [`Timestamp`].
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a [`Timestamp`] from a [`DateTime<Utc>`].
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Creates a [`Timestamp`] from seconds since the Unix epoch.
    ///
    /// Returns `None` for values outside chrono's representable range.
    pub fn from_unix_seconds(seconds: i64) -> Option<Self> {
        DateTime::<Utc>::from_timestamp(seconds, 0).map(Self)
    }

    /// Returns the underlying [`DateTime<Utc>`].
    pub fn as_datetime(self) -> DateTime<Utc> {
        self.0
    }

    /// Returns the time left until `self`, or zero if it has already passed.
    pub fn duration_from_now(self) -> std::time::Duration {
        (self.0 - Utc::now()).to_std().unwrap_or_default()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
