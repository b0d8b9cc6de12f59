//! GraphQL queries for Projects (v2) and their payloads.

use issues::{
    BudgetClass, DataSourceError, IssueNumber, OrganizationName, ProjectBoard,
    ProjectIssueRecord, ProjectStatus, RepositoryName,
};
use serde::{Deserialize, Serialize};

/// Page size of project item listings; also the GraphQL maximum.
pub const ITEMS_PER_PAGE: u32 = 100;

pub const PROJECTS_QUERY: &str = r#"
query($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    projectsV2(first: 100) {
      nodes { id number title }
    }
  }
}"#;

pub const PROJECT_ITEMS_QUERY: &str = r#"
query($projectId: ID!, $first: Int!, $after: String) {
  node(id: $projectId) {
    ... on ProjectV2 {
      items(first: $first, after: $after) {
        pageInfo { endCursor hasNextPage }
        nodes {
          content {
            __typename
            ... on Issue {
              number
              repository { name owner { login } }
            }
          }
          fieldValues(first: 100) {
            nodes {
              __typename
              ... on ProjectV2ItemFieldSingleSelectValue {
                name
                field { ... on ProjectV2SingleSelectField { name } }
              }
            }
          }
        }
      }
    }
  }
}"#;

#[derive(Debug, Serialize)]
pub(crate) struct GraphQlRequest<'a, V: Serialize> {
    pub query: &'a str,
    pub variables: V,
}

#[derive(Debug, Serialize)]
pub(crate) struct ProjectsVariables<'a> {
    pub owner: &'a str,
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectItemsVariables<'a> {
    pub project_id: &'a str,
    pub first: u32,
    pub after: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl<T> GraphQlResponse<T> {
    /// Returns the data, or the classified error the response reports.
    ///
    /// A response carrying any `errors` is rejected even when partial data
    /// came along.
    pub fn into_data(self, resource: &str) -> Result<T, DataSourceError> {
        if !self.errors.is_empty() {
            return Err(classify_errors(&self.errors, resource));
        }
        self.data.ok_or_else(|| DataSourceError::Decode {
            message: "GraphQL response carries neither data nor errors".to_string(),
        })
    }
}

fn classify_errors(errors: &[GraphQlError], resource: &str) -> DataSourceError {
    let kinds = || errors.iter().filter_map(|e| e.kind.as_deref());
    if kinds().any(|k| k == "RATE_LIMITED") {
        return DataSourceError::RateLimited {
            class: BudgetClass::GraphQl,
            retry_after: None,
        };
    }
    if kinds().any(|k| k == "NOT_FOUND") {
        return DataSourceError::NotFound {
            resource: resource.to_string(),
        };
    }
    DataSourceError::Query {
        message: errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; "),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectsData {
    pub repository: Option<RepositoryProjects>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepositoryProjects {
    #[serde(rename = "projectsV2")]
    pub projects: Nodes<ProjectNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Nodes<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<Option<T>>,
}

impl<T> Default for Nodes<T> {
    fn default() -> Self {
        Self { nodes: Vec::new() }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectNode {
    pub id: String,
    pub number: u64,
    pub title: String,
}

impl ProjectsData {
    /// Boards whose title is listed in `title_filter`; all boards when the
    /// filter is empty.
    pub fn into_boards(self, title_filter: &[String]) -> Vec<ProjectBoard> {
        self.repository
            .map(|r| r.projects.nodes)
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter(|p| title_filter.is_empty() || title_filter.contains(&p.title))
            .map(|p| ProjectBoard {
                id: p.id,
                number: p.number,
                title: p.title,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectItemsData {
    pub node: Option<ProjectItemsNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProjectItemsNode {
    #[serde(default)]
    pub items: Option<ItemConnection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ItemConnection {
    pub page_info: PageInfo,
    #[serde(default)]
    pub nodes: Vec<Option<ItemNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ItemNode {
    pub content: Option<ItemContent>,
    #[serde(default)]
    pub field_values: Nodes<FieldValue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ItemContent {
    #[serde(rename = "__typename")]
    pub typename: String,
    pub number: Option<u64>,
    pub repository: Option<ContentRepository>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentRepository {
    pub name: String,
    pub owner: Owner,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Owner {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FieldValue {
    pub name: Option<String>,
    pub field: Option<FieldName>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FieldName {
    pub name: Option<String>,
}

/// Reads the single-select values of an item into a status row of `board_title`.
fn project_status(board_title: &str, values: Nodes<FieldValue>) -> ProjectStatus {
    let mut status = ProjectStatus {
        project_title: board_title.to_string(),
        ..ProjectStatus::default()
    };
    for value in values.nodes.into_iter().flatten() {
        let (Some(value), Some(field)) = (value.name, value.field.and_then(|f| f.name)) else {
            continue;
        };
        match field.to_lowercase().as_str() {
            "status" => status.status = value,
            "priority" => status.priority = value,
            "size" => status.size = value,
            "moscow" => status.moscow = value,
            _ => {}
        }
    }
    status
}

impl ItemNode {
    /// Converts the item to a board row; `None` for drafts, pull requests,
    /// and items hidden from the token.
    pub fn into_record(self, board_title: &str) -> Option<ProjectIssueRecord> {
        let content = self.content?;
        if content.typename != "Issue" {
            return None;
        }
        let repository = content.repository?;
        Some(ProjectIssueRecord {
            organization: OrganizationName::new(repository.owner.login)?,
            repository: RepositoryName::new(repository.name)?,
            number: IssueNumber::new(content.number?),
            project_status: project_status(board_title, self.field_values),
        })
    }
}
