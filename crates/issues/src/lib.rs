//! Core domain of the living documentation collector.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, and error type used by the collector, together with the port trait
//! the collector consumes ([`RepositoryDataSource`]) and the pure issue
//! consolidation step ([`consolidate`]). Infrastructure crates implement the
//! port; they never add domain rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`RepositoryId`, `IssueKey`, etc.) |
//! | [`types`] | Fetched records, consolidated records, quota types |
//! | [`errors`] | Data source errors, run errors, retry policy |
//! | [`config`] | Configured repositories and their JSON loader |
//! | [`labels`] | The supported documentation label set |
//! | [`ports`] | The [`RepositoryDataSource`] trait |
//! | [`consolidation`] | The join of repository issues with project rows |

pub mod config;
pub mod consolidation;
pub mod errors;
pub mod identifiers;
pub mod labels;
pub mod ports;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use config::{parse_repositories, ConfigRepository};
pub use consolidation::{consolidate, ConsolidatedIssues, ProjectIssues, RepositoryIssues};
pub use errors::{CollectorError, DataSourceError, RetryPolicy};
pub use identifiers::{IssueKey, IssueNumber, OrganizationName, RepositoryId, RepositoryName, RunId};
pub use labels::{ISSUE_STATE_ALL, SUPPORTED_ISSUE_LABELS};
pub use ports::RepositoryDataSource;
pub use types::{
    BudgetClass, ConsolidatedIssue, IssueCatalog, PersistedIssue, ProjectBoard,
    ProjectIssueRecord, ProjectStatus, QuotaSnapshot, RawIssue, Repository, Timestamp,
    NO_PROJECT_DATA,
};
