//! Joins repository issues with project board rows on the canonical key.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::{ConsolidatedIssue, IssueKey, ProjectIssueRecord, RawIssue, RepositoryId};

/// Repository issues as fetched: repository → issues (may repeat an issue
/// once per supported label it carries).
pub type RepositoryIssues = BTreeMap<RepositoryId, Vec<RawIssue>>;

/// Project board rows as fetched: key → one row per board the issue is on.
pub type ProjectIssues = BTreeMap<IssueKey, Vec<ProjectIssueRecord>>;

/// One consolidated issue per canonical key.
pub type ConsolidatedIssues = BTreeMap<IssueKey, ConsolidatedIssue>;

/// Merges the two fetched maps into one record per repository issue.
///
/// - Every repository issue produces an entry at its key. A key visited more
///   than once (an issue listed under several labels) keeps the last visit.
/// - Project rows are appended to the matching entry in encounter order and
///   mark it as linked.
/// - Project rows without a matching repository issue are dropped.
///
/// The output key set is exactly the key set of `repository_issues`. Total
/// over any input, including empty maps.
pub fn consolidate(
    repository_issues: RepositoryIssues,
    mut project_issues: ProjectIssues,
) -> ConsolidatedIssues {
    let mut consolidated = ConsolidatedIssues::new();

    for (repository_id, issues) in repository_issues {
        for issue in issues {
            let key = repository_id.issue_key(issue.number);
            consolidated.insert(key, ConsolidatedIssue::new(repository_id.clone(), issue));
        }
    }

    debug!("Updating consolidated issue structure with project data.");
    for (key, issue) in consolidated.iter_mut() {
        if let Some(records) = project_issues.remove(key) {
            for record in records {
                issue.update_with_project_data(record.project_status);
            }
        }
    }

    if !project_issues.is_empty() {
        debug!(
            dropped = project_issues.len(),
            "Project issues without a matching repository issue were dropped."
        );
    }

    info!(
        count = consolidated.len(),
        "Issue and project data consolidation - consolidated repository issues with extra project data."
    );
    consolidated
}
