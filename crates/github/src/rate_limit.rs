//! GitHub rate-limit bookkeeping: response headers and the `/rate_limit` endpoint.

use std::time::Duration;

use issues::{BudgetClass, QuotaSnapshot, Timestamp};
use reqwest::header::HeaderMap;
use serde::Deserialize;

pub const HEADER_REMAINING: &str = "x-ratelimit-remaining";
pub const HEADER_LIMIT: &str = "x-ratelimit-limit";
pub const HEADER_RESET: &str = "x-ratelimit-reset";
pub const HEADER_RESOURCE: &str = "x-ratelimit-resource";
pub const HEADER_RETRY_AFTER: &str = "retry-after";

/// Maps GitHub's rate-limit resource name to a budget class.
///
/// Resources the collector never uses (`search`, `code_scanning_upload`, ...)
/// have no class.
pub fn budget_class_of(resource: &str) -> Option<BudgetClass> {
    match resource {
        "core" => Some(BudgetClass::Core),
        "graphql" => Some(BudgetClass::GraphQl),
        _ => None,
    }
}

fn header<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

/// Reads the budget reported on a response, with the class it belongs to.
///
/// Responses without a resource header are attributed to `fallback` (the
/// class the request was sent under).
pub fn quota_from_headers(
    headers: &HeaderMap,
    fallback: BudgetClass,
) -> Option<(BudgetClass, QuotaSnapshot)> {
    let remaining = header::<u64>(headers, HEADER_REMAINING)?;
    let reset = header::<i64>(headers, HEADER_RESET)?;
    let limit = header::<u64>(headers, HEADER_LIMIT).unwrap_or(remaining);
    let class = match header::<String>(headers, HEADER_RESOURCE) {
        Some(resource) => budget_class_of(&resource)?,
        None => fallback,
    };
    Some((
        class,
        QuotaSnapshot {
            remaining,
            limit,
            reset_at: Timestamp::from_unix_seconds(reset)?,
        },
    ))
}

/// Delay the host asks for before the next request, if it sent one.
///
/// `retry-after` (seconds) wins; an exhausted budget falls back to the time
/// left until `x-ratelimit-reset`.
pub fn retry_after_from_headers(headers: &HeaderMap) -> Option<Duration> {
    if let Some(seconds) = header::<u64>(headers, HEADER_RETRY_AFTER) {
        return Some(Duration::from_secs(seconds));
    }
    if header::<u64>(headers, HEADER_REMAINING) == Some(0) {
        let reset = Timestamp::from_unix_seconds(header::<i64>(headers, HEADER_RESET)?)?;
        return Some(reset.duration_from_now());
    }
    None
}

/// Body of `GET /rate_limit`.
#[derive(Debug, Deserialize)]
pub(crate) struct RateLimitResponse {
    pub resources: RateLimitResources,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RateLimitResources {
    pub core: RateLimitResource,
    #[serde(default)]
    pub graphql: Option<RateLimitResource>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct RateLimitResource {
    pub limit: u64,
    pub remaining: u64,
    pub reset: i64,
}

impl RateLimitResponse {
    /// Extracts the snapshot of `class`, if the response reports it.
    pub fn snapshot(&self, class: BudgetClass) -> Option<QuotaSnapshot> {
        let resource = match class {
            BudgetClass::Core => Some(self.resources.core),
            BudgetClass::GraphQl => self.resources.graphql,
        }?;
        Some(QuotaSnapshot {
            remaining: resource.remaining,
            limit: resource.limit,
            reset_at: Timestamp::from_unix_seconds(resource.reset)?,
        })
    }
}
