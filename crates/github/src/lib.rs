//! GitHub infrastructure adapter.
//!
//! Implements the [`issues::RepositoryDataSource`] port over the GitHub REST
//! API (repositories, issues, rate limits) and the GraphQL API (Projects v2
//! boards and their items) using `reqwest`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules.
//! All GitHub API details (pagination, authentication, response
//! classification, rate-limit headers) are handled here; the collector never
//! sees them. Retrying and waiting for quota are the collector's job: this
//! crate only reports each failure as a [`issues::DataSourceError`] with the
//! information needed to decide.

pub mod client;
pub mod error;
pub mod graphql;
pub mod rate_limit;
pub mod rest;

pub use client::{GitHubClient, GitHubClientConfig, DEFAULT_API_URL};
pub use error::GitHubClientError;
