//! REST payloads and pagination.

use issues::{IssueNumber, RawIssue, Repository, RepositoryId};
use reqwest::header::{HeaderMap, LINK};
use serde::Deserialize;

/// `GET /repos/{owner}/{repo}`, reduced to what the collector needs.
#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryResponse {
    pub full_name: String,
}

impl RepositoryResponse {
    pub fn into_repository(self, id: RepositoryId) -> Repository {
        Repository {
            id,
            full_name: self.full_name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LabelResponse {
    pub name: String,
}

/// One element of `GET /repos/{owner}/{repo}/issues`.
#[derive(Debug, Deserialize)]
pub(crate) struct IssueResponse {
    pub number: u64,
    pub title: String,
    pub state: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default)]
    pub closed_at: Option<String>,
    pub html_url: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<LabelResponse>,
}

impl From<IssueResponse> for RawIssue {
    fn from(issue: IssueResponse) -> Self {
        RawIssue {
            number: IssueNumber::new(issue.number),
            title: issue.title,
            state: issue.state,
            created_at: issue.created_at,
            updated_at: issue.updated_at,
            closed_at: issue.closed_at,
            html_url: issue.html_url,
            body: issue.body,
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

/// Extracts the `rel="next"` target from a `Link` header.
pub fn next_page_url(headers: &HeaderMap) -> Option<String> {
    let link = headers.get(LINK)?.to_str().ok()?;
    link.split(',').find_map(|part| {
        let (target, params) = part.split_once(';')?;
        let is_next = params
            .split(';')
            .any(|p| p.trim().replace(' ', "") == "rel=\"next\"");
        is_next.then(|| {
            target
                .trim()
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_string()
        })
    })
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    #[test]
    fn finds_next_link() {
        let mut headers = HeaderMap::new();
        headers.insert(
            LINK,
            HeaderValue::from_static(
                r#"<https://api.github.com/repositories/1/issues?page=2>; rel="next", <https://api.github.com/repositories/1/issues?page=5>; rel="last""#,
            ),
        );

        assert_eq!(
            next_page_url(&headers).as_deref(),
            Some("https://api.github.com/repositories/1/issues?page=2")
        );
    }

    #[test]
    fn last_page_has_no_next_link() {
        let mut headers = HeaderMap::new();
        headers.insert(
            LINK,
            HeaderValue::from_static(
                r#"<https://api.github.com/repositories/1/issues?page=1>; rel="prev", <https://api.github.com/repositories/1/issues?page=1>; rel="first""#,
            ),
        );

        assert_eq!(next_page_url(&headers), None);
        assert_eq!(next_page_url(&HeaderMap::new()), None);
    }

    #[test]
    fn converts_issue_payload() {
        let payload = r#"{
            "number": 42,
            "title": "Export as PDF",
            "state": "closed",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-02-01T00:00:00Z",
            "closed_at": "2024-02-01T00:00:00Z",
            "html_url": "https://github.com/OrgA/RepoA/issues/42",
            "body": null,
            "labels": [{"id": 1, "name": "DocumentedFeature"}, {"id": 2, "name": "bug"}],
            "user": {"login": "someone"}
        }"#;

        let issue: RawIssue = serde_json::from_str::<IssueResponse>(payload).unwrap().into();

        assert_eq!(issue.number, IssueNumber::new(42));
        assert_eq!(issue.closed_at.as_deref(), Some("2024-02-01T00:00:00Z"));
        assert_eq!(issue.body, None);
        assert_eq!(issue.labels, vec!["DocumentedFeature", "bug"]);
    }
}
