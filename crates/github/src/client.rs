//! [`GitHubClient`]: the reqwest-backed [`RepositoryDataSource`].

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use issues::{
    BudgetClass, DataSourceError, OrganizationName, ProjectBoard, ProjectIssueRecord,
    QuotaSnapshot, RawIssue, Repository, RepositoryDataSource, RepositoryId, RepositoryName,
};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::{classify_response, decode_error, transport_error, GitHubClientError};
use crate::graphql::{
    GraphQlRequest, GraphQlResponse, ProjectItemsData, ProjectItemsVariables, ProjectsData,
    ProjectsVariables, ITEMS_PER_PAGE, PROJECTS_QUERY, PROJECT_ITEMS_QUERY,
};
use crate::rate_limit::{quota_from_headers, RateLimitResponse};
use crate::rest::{next_page_url, IssueResponse, RepositoryResponse};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";

/// Connection settings of a [`GitHubClient`].
#[derive(Debug, Clone)]
pub struct GitHubClientConfig {
    /// REST base URL, e.g. `https://api.github.com` or `https://ghe.example/api/v3`.
    pub api_url: String,
    pub token: String,
    pub user_agent: String,
    /// Issues per REST page (GitHub caps this at 100).
    pub per_page: u32,
    pub timeout: Duration,
}

impl GitHubClientConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            user_agent: concat!("livdoc-collector/", env!("CARGO_PKG_VERSION")).to_string(),
            per_page: 100,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// GraphQL endpoint belonging to `api_url`.
    ///
    /// GitHub Enterprise Server serves REST under `/api/v3` and GraphQL under
    /// `/api/graphql`; github.com serves both from the API host.
    pub fn graphql_url(&self) -> String {
        let base = self.api_url.trim_end_matches('/');
        match base.strip_suffix("/v3") {
            Some(api_root) => format!("{api_root}/graphql"),
            None => format!("{base}/graphql"),
        }
    }
}

/// GitHub REST and GraphQL client.
///
/// Every response's rate-limit headers are recorded, so
/// [`RepositoryDataSource::last_observed_quota`] reflects the latest budget
/// without spending a request.
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    graphql_url: String,
    per_page: u32,
    observed: Mutex<HashMap<BudgetClass, QuotaSnapshot>>,
}

impl GitHubClient {
    pub fn new(config: GitHubClientConfig) -> Result<Self, GitHubClientError> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token)).map_err(|e| {
            GitHubClientError::InvalidToken {
                message: e.to_string(),
            }
        })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).map_err(|e| {
                GitHubClientError::InvalidToken {
                    message: format!("user agent: {e}"),
                }
            })?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            graphql_url: config.graphql_url(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            per_page: config.per_page.clamp(1, 100),
            observed: Mutex::new(HashMap::new()),
        })
    }

    /// Checks that the token is accepted, using the cheapest authenticated call.
    pub async fn verify_token(&self) -> Result<(), DataSourceError> {
        let url = format!("{}/octocat", self.api_url);
        self.send(self.http.get(&url), "octocat", BudgetClass::Core)
            .await
            .map(|_| ())
    }

    fn record_quota(&self, headers: &HeaderMap, class: BudgetClass) {
        if let Some((class, snapshot)) = quota_from_headers(headers, class) {
            self.observed
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(class, snapshot);
        }
    }

    async fn send(
        &self,
        request: RequestBuilder,
        resource: &str,
        class: BudgetClass,
    ) -> Result<Response, DataSourceError> {
        let response = request.send().await.map_err(transport_error)?;
        self.record_quota(response.headers(), class);

        let status = response.status();
        debug!(%status, resource, "GitHub response received.");
        if status.is_success() {
            return Ok(response);
        }

        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        Err(classify_response(status, &headers, &body, resource, class))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        resource: &str,
    ) -> Result<(T, HeaderMap), DataSourceError> {
        let response = self.send(self.http.get(url), resource, BudgetClass::Core).await?;
        let headers = response.headers().clone();
        let body = response.text().await.map_err(transport_error)?;
        let value = serde_json::from_str(&body).map_err(decode_error)?;
        Ok((value, headers))
    }

    async fn graphql<V: Serialize, T: DeserializeOwned>(
        &self,
        query: &str,
        variables: V,
        resource: &str,
    ) -> Result<T, DataSourceError> {
        let request = self
            .http
            .post(&self.graphql_url)
            .json(&GraphQlRequest { query, variables });
        let response = self.send(request, resource, BudgetClass::GraphQl).await?;
        let body = response.text().await.map_err(transport_error)?;
        serde_json::from_str::<GraphQlResponse<T>>(&body)
            .map_err(decode_error)?
            .into_data(resource)
    }

    fn issues_url(&self, repository: &RepositoryId, label: &str, state: &str) -> Result<Url, DataSourceError> {
        let per_page = self.per_page.to_string();
        Url::parse_with_params(
            &format!("{}/repos/{}/issues", self.api_url, repository),
            &[
                ("state", state),
                ("labels", label),
                ("per_page", per_page.as_str()),
                ("page", "1"),
            ],
        )
        .map_err(|e| DataSourceError::Transport {
            message: format!("invalid issues URL: {e}"),
        })
    }
}

#[async_trait]
impl RepositoryDataSource for GitHubClient {
    async fn resolve_repository(
        &self,
        organization: &OrganizationName,
        name: &RepositoryName,
    ) -> Result<Repository, DataSourceError> {
        let id = RepositoryId::new(organization.clone(), name.clone());
        let url = format!("{}/repos/{}", self.api_url, id);
        let resource = format!("repository {id}");
        let (response, _): (RepositoryResponse, _) = self.get_json(&url, &resource).await?;
        Ok(response.into_repository(id))
    }

    async fn list_issues(
        &self,
        repository: &Repository,
        label: &str,
        state: &str,
    ) -> Result<Vec<RawIssue>, DataSourceError> {
        let resource = format!("issues of {} labelled {label}", repository.id);
        let mut issues = Vec::new();
        let mut next = Some(self.issues_url(&repository.id, label, state)?.to_string());

        while let Some(url) = next.take() {
            let (page, headers): (Vec<IssueResponse>, _) = self.get_json(&url, &resource).await?;
            debug!(repository = %repository.id, label, count = page.len(), "Fetched issue page.");
            let full_page = page.len() >= self.per_page as usize;
            issues.extend(page.into_iter().map(RawIssue::from));
            if full_page {
                next = next_page_url(&headers);
            }
        }

        Ok(issues)
    }

    async fn list_project_boards(
        &self,
        repository: &Repository,
        title_filter: &[String],
    ) -> Result<Vec<ProjectBoard>, DataSourceError> {
        let resource = format!("projects of {}", repository.id);
        let variables = ProjectsVariables {
            owner: repository.id.organization().as_str(),
            name: repository.id.name().as_str(),
        };
        let data: ProjectsData = self.graphql(PROJECTS_QUERY, variables, &resource).await?;
        Ok(data.into_boards(title_filter))
    }

    async fn list_project_issues(
        &self,
        board: &ProjectBoard,
    ) -> Result<Vec<ProjectIssueRecord>, DataSourceError> {
        let resource = format!("project {} ({})", board.title, board.id);
        let mut records = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let variables = ProjectItemsVariables {
                project_id: &board.id,
                first: ITEMS_PER_PAGE,
                after: after.as_deref(),
            };
            let data: ProjectItemsData = self.graphql(PROJECT_ITEMS_QUERY, variables, &resource).await?;
            let Some(connection) = data.node.and_then(|node| node.items) else {
                return Err(DataSourceError::NotFound { resource });
            };

            let before = records.len();
            records.extend(
                connection
                    .nodes
                    .into_iter()
                    .flatten()
                    .filter_map(|item| item.into_record(&board.title)),
            );
            debug!(project = %board.title, count = records.len() - before, "Fetched project item page.");

            match (connection.page_info.has_next_page, connection.page_info.end_cursor) {
                (true, Some(cursor)) => after = Some(cursor),
                _ => break,
            }
        }

        Ok(records)
    }

    async fn remaining_quota(&self, class: BudgetClass) -> Result<QuotaSnapshot, DataSourceError> {
        let url = format!("{}/rate_limit", self.api_url);
        let (response, _): (RateLimitResponse, _) = self.get_json(&url, "rate_limit").await?;
        let snapshot = response.snapshot(class).ok_or_else(|| DataSourceError::Decode {
            message: format!("rate limit response lacks the {class} budget"),
        })?;
        self.observed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(class, snapshot);
        Ok(snapshot)
    }

    fn last_observed_quota(&self, class: BudgetClass) -> Option<QuotaSnapshot> {
        self.observed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&class)
            .copied()
    }
}
