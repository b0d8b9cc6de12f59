//! Living documentation collector: fetching, consolidation run, export.
//!
//! This crate sequences calls between the domain logic in the [`issues`]
//! crate and a [`issues::RepositoryDataSource`] implementation. It contains
//! no hosting-service specifics of its own.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Every data source call is routed through the
//! [`RateLimiter`], which owns the quota budgets and the retry policy. The
//! fetchers never fail: a call the limiter gives up on becomes missing data,
//! and an unresolvable repository empties the whole fetch.
//!
//! ## Data Flow
//!
//! ```text
//! repositories ─► IssueFetcher   ─► RepositoryIssues ─┐
//!              └► ProjectFetcher ─► ProjectIssues    ─┴► consolidate ─► export
//! ```
//!
//! Repositories, labels, and boards are visited one at a time.

pub mod doc_issues;
pub mod export;
pub mod issue_fetcher;
pub mod project_fetcher;
pub mod rate_limiter;

#[cfg(test)]
pub(crate) mod testing;

pub use doc_issues::{CollectionSummary, CollectorConfig, DocIssuesCollector};
pub use issue_fetcher::IssueFetcher;
pub use project_fetcher::ProjectFetcher;
pub use rate_limiter::{RateLimiter, RateLimiterConfig};
