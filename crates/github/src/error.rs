//! Translation of GitHub responses and transport faults into [`DataSourceError`].

use issues::{BudgetClass, DataSourceError};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::rate_limit::{budget_class_of, retry_after_from_headers, HEADER_REMAINING, HEADER_RESOURCE};

/// Failure to build a [`crate::GitHubClient`].
#[derive(Debug, Error)]
pub enum GitHubClientError {
    #[error("Invalid GitHub token: {message}")]
    InvalidToken { message: String },

    #[error("Failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn body_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Classifies an unsuccessful HTTP response.
///
/// `resource` names what was requested (used for `NotFound`), `class` is the
/// budget the request was issued under.
pub fn classify_response(
    status: StatusCode,
    headers: &HeaderMap,
    body: &str,
    resource: &str,
    class: BudgetClass,
) -> DataSourceError {
    let message = body_message(body);
    match status {
        StatusCode::NOT_FOUND => DataSourceError::NotFound {
            resource: resource.to_string(),
        },
        StatusCode::UNAUTHORIZED => DataSourceError::Unauthorized { message },
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            let exhausted = headers
                .get(HEADER_REMAINING)
                .and_then(|v| v.to_str().ok())
                .is_some_and(|v| v.trim() == "0");
            let retry_after = retry_after_from_headers(headers);
            if exhausted || retry_after.is_some() || status == StatusCode::TOO_MANY_REQUESTS {
                let class = headers
                    .get(HEADER_RESOURCE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(budget_class_of)
                    .unwrap_or(class);
                DataSourceError::RateLimited { class, retry_after }
            } else {
                DataSourceError::Unauthorized { message }
            }
        }
        other => DataSourceError::Service {
            status: other.as_u16(),
            message,
        },
    }
}

/// Classifies a request that produced no usable response.
pub fn transport_error(err: reqwest::Error) -> DataSourceError {
    if err.is_decode() {
        return DataSourceError::Decode {
            message: err.to_string(),
        };
    }
    DataSourceError::Transport {
        message: err.to_string(),
    }
}

pub fn decode_error(err: serde_json::Error) -> DataSourceError {
    DataSourceError::Decode {
        message: err.to_string(),
    }
}
