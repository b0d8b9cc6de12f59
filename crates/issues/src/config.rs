//! Configuration model for the repositories a run collects from.
//!
//! Repositories arrive as a JSON array of objects:
//!
//! ```json
//! [
//!   { "organization-name": "AbsaOSS", "repository-name": "living-doc",
//!     "projects-title-filter": ["Roadmap"] }
//! ]
//! ```
//!
//! `projects-title-filter` is optional; an empty filter matches every board.

use serde::Deserialize;
use tracing::{debug, error};

use crate::{CollectorError, OrganizationName, RepositoryId, RepositoryName};

/// One repository to collect from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConfigRepository {
    pub organization_name: OrganizationName,
    pub repository_name: RepositoryName,
    #[serde(default)]
    pub projects_title_filter: Vec<String>,
}

impl ConfigRepository {
    pub fn new(
        organization_name: OrganizationName,
        repository_name: RepositoryName,
        projects_title_filter: Vec<String>,
    ) -> Self {
        Self {
            organization_name,
            repository_name,
            projects_title_filter,
        }
    }

    /// Returns the `owner/repo` identity of this repository.
    pub fn repository_id(&self) -> RepositoryId {
        RepositoryId::new(self.organization_name.clone(), self.repository_name.clone())
    }
}

/// Parses the repositories input.
///
/// The input must be a JSON array; anything else is a configuration error.
/// Entries that cannot be loaded are logged and skipped so one malformed
/// entry does not hide the rest.
pub fn parse_repositories(input: &str) -> Result<Vec<ConfigRepository>, CollectorError> {
    let entries: Vec<serde_json::Value> =
        serde_json::from_str(input).map_err(|e| CollectorError::Configuration {
            message: format!("repositories input is not a JSON array: {e}"),
        })?;

    let mut repositories = Vec::with_capacity(entries.len());
    for entry in entries {
        if !entry.is_object() {
            error!(%entry, "The repository JSON input does not have a dictionary structure.");
            continue;
        }
        match serde_json::from_value::<ConfigRepository>(entry.clone()) {
            Ok(repository) => repositories.push(repository),
            Err(e) => error!(%entry, error = %e, "Failed to load repository from JSON."),
        }
    }

    debug!(count = repositories.len(), "Loaded configured repositories.");
    Ok(repositories)
}
