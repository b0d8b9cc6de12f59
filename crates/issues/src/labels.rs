//! The fixed set of issue labels that mark documentation-relevant issues.

/// Label of issues documenting a user story.
pub const DOC_USER_STORY_LABEL: &str = "DocumentedUserStory";
/// Label of issues documenting a feature.
pub const DOC_FEATURE_LABEL: &str = "DocumentedFeature";
/// Label of issues documenting a functionality.
pub const DOC_FUNCTIONALITY_LABEL: &str = "DocumentedFunctionality";

/// Supported labels, in the order the issue fetcher queries them.
pub const SUPPORTED_ISSUE_LABELS: [&str; 3] = [
    DOC_USER_STORY_LABEL,
    DOC_FEATURE_LABEL,
    DOC_FUNCTIONALITY_LABEL,
];

/// Issue state filter covering both open and closed issues.
pub const ISSUE_STATE_ALL: &str = "all";
