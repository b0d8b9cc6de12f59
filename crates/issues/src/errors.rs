//! Error and retry-policy types for the living documentation domain.
//!
//! [`DataSourceError`] is what a [`crate::RepositoryDataSource`] reports for a
//! failed operation. The rate-limited caller never lets it escape: it turns it
//! into an absent result after consulting [`DataSourceError::retry_policy`].
//!
//! [`CollectorError`] covers conditions that stop a collection run as a whole
//! (bad configuration, export failure, failed validation).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::BudgetClass;

// ---------------------------------------------------------------------------
// Retry semantics
// ---------------------------------------------------------------------------

/// Whether an error condition is safe to retry and, if so, after what delay.
///
/// - `Retryable` errors: network faults, 5xx responses, rate-limit responses.
/// - `NonRetryable` errors: missing resources, rejected credentials, malformed
///   responses, rejected queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RetryPolicy {
    /// The operation may be retried.
    Retryable {
        /// Minimum back-off before the next attempt (e.g. derived from a
        /// `Retry-After` header). `None` means apply the caller's own schedule.
        after: Option<Duration>,
    },
    /// The operation must not be retried.
    NonRetryable,
}

impl RetryPolicy {
    pub fn is_retryable(&self) -> bool {
        matches!(self, RetryPolicy::Retryable { .. })
    }
}

// ---------------------------------------------------------------------------
// Data source errors
// ---------------------------------------------------------------------------

/// Failure of one operation against the repository data source.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataSourceError {
    /// The requested repository, board, or page does not exist (or is hidden).
    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    /// The credentials were rejected or lack the required scope.
    #[error("Access denied: {message}")]
    Unauthorized { message: String },

    /// The budget of `class` is exhausted.
    #[error("Rate limit exhausted for the {class} budget")]
    RateLimited {
        class: BudgetClass,
        /// Delay advertised by the host before the next request may succeed.
        retry_after: Option<Duration>,
    },

    /// The request never produced a response (connection, TLS, timeout).
    #[error("Transport failure: {message}")]
    Transport { message: String },

    /// The host answered with an unexpected status code.
    #[error("Service error (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    /// The response body could not be decoded.
    #[error("Malformed response: {message}")]
    Decode { message: String },

    /// The host rejected a query (e.g. GraphQL `errors`).
    #[error("Query rejected: {message}")]
    Query { message: String },
}

impl DataSourceError {
    /// Classifies this failure for the rate-limited caller.
    pub fn retry_policy(&self) -> RetryPolicy {
        match self {
            DataSourceError::RateLimited { retry_after, .. } => RetryPolicy::Retryable {
                after: *retry_after,
            },
            DataSourceError::Transport { .. } => RetryPolicy::Retryable { after: None },
            DataSourceError::Service { status, .. } if *status >= 500 => {
                RetryPolicy::Retryable { after: None }
            }
            DataSourceError::NotFound { .. }
            | DataSourceError::Unauthorized { .. }
            | DataSourceError::Service { .. }
            | DataSourceError::Decode { .. }
            | DataSourceError::Query { .. } => RetryPolicy::NonRetryable,
        }
    }
}

// ---------------------------------------------------------------------------
// Run-level errors
// ---------------------------------------------------------------------------

/// Errors that stop a collection run.
///
/// Fetching never produces one of these: fetchers degrade to empty maps.
#[derive(Debug, Error)]
pub enum CollectorError {
    /// The user configuration is invalid; the run never starts.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Configured repositories or credentials could not be verified.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// The consolidated output could not be written or read.
    #[error("Export failed for '{path}': {source}")]
    Export {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The consolidated output could not be encoded or decoded.
    #[error("Export encoding failed for '{path}': {source}")]
    Encoding {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
