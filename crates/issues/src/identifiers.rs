//! Newtype domain identifiers.
//!
//! Every concept with an identity is represented as a distinct newtype so that
//! an organization name cannot be passed where a repository name is expected,
//! and an issue number cannot be confused with any other integer.
//!
//! The canonical issue key ([`IssueKey`]) is the sole join key between the
//! repository issue set and the project board issue set. Its textual format
//! `"{organization}/{repository}#{number}"` is a stable contract with the
//! export consumers.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for validated name newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display,
// TryFrom<String> (used by serde so deserialisation applies the same rules).
// ---------------------------------------------------------------------------
macro_rules! name_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new name, returning `None` if the value is empty or
            /// contains a key separator (`/` or `#`).
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() || v.contains(KEY_SEPARATORS) {
                    None
                } else {
                    Some(Self(v))
                }
            }

            /// Returns the name as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value.clone()).ok_or_else(|| {
                    format!(
                        "invalid {} `{}`: must be non-empty and contain neither '/' nor '#'",
                        stringify!($name),
                        value
                    )
                })
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

/// Characters that delimit the parts of an [`IssueKey`].
const KEY_SEPARATORS: [char; 2] = ['/', '#'];

// ---------------------------------------------------------------------------
// Identifiers: validated names
// ---------------------------------------------------------------------------

name_id! {
    /// A GitHub organization (or user) login, e.g. `"AbsaOSS"`.
    OrganizationName
}

name_id! {
    /// A GitHub repository name without its owner, e.g. `"living-doc"`.
    RepositoryName
}

// ---------------------------------------------------------------------------
// Identifiers: integer-backed
// ---------------------------------------------------------------------------

/// The GitHub-assigned number of an issue within its repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueNumber(u64);

impl IssueNumber {
    /// Creates a new issue number from a raw integer.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying integer value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for IssueNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: composite
// ---------------------------------------------------------------------------

/// Identifies a GitHub repository; displays in `"owner/repo"` format.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RepositoryId {
    organization: OrganizationName,
    name: RepositoryName,
}

impl RepositoryId {
    /// Creates a repository identifier from its validated parts.
    pub fn new(organization: OrganizationName, name: RepositoryName) -> Self {
        Self { organization, name }
    }

    /// Parses `"owner/repo"`, splitting on the first `/`.
    ///
    /// Returns `None` when either part is missing or invalid.
    pub fn parse(value: &str) -> Option<Self> {
        let (organization, name) = value.split_once('/')?;
        Some(Self::new(
            OrganizationName::new(organization)?,
            RepositoryName::new(name)?,
        ))
    }

    /// Returns the owning organization.
    pub fn organization(&self) -> &OrganizationName {
        &self.organization
    }

    /// Returns the repository name.
    pub fn name(&self) -> &RepositoryName {
        &self.name
    }

    /// Returns the canonical key of issue `number` within this repository.
    pub fn issue_key(&self, number: IssueNumber) -> IssueKey {
        IssueKey::new(&self.organization, &self.name, number)
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization, self.name)
    }
}

impl Serialize for RepositoryId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RepositoryId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid repository id `{raw}`: expected `owner/repo`"))
        })
    }
}

// ---------------------------------------------------------------------------

/// The canonical key of one tracked issue: `"{organization}/{repository}#{number}"`.
///
/// Unique across a consolidated map. Consumers recover the parts by splitting
/// on the first `/` and then the last `#`, which is unambiguous because
/// [`OrganizationName`] and [`RepositoryName`] reject both characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueKey(String);

impl IssueKey {
    /// Builds the key for issue `number` of `organization/repository`.
    pub fn new(
        organization: &OrganizationName,
        repository: &RepositoryName,
        number: IssueNumber,
    ) -> Self {
        Self(format!("{organization}/{repository}#{number}"))
    }

    /// Splits a key back into its repository and issue number.
    pub fn parse(value: &str) -> Option<(RepositoryId, IssueNumber)> {
        let (organization, rest) = value.split_once('/')?;
        let (repository, number) = rest.rsplit_once('#')?;
        let number = number.parse::<u64>().ok()?;
        Some((
            RepositoryId::new(
                OrganizationName::new(organization)?,
                RepositoryName::new(repository)?,
            ),
            IssueNumber::new(number),
        ))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single collector invocation.
///
/// Generated fresh for every CLI invocation and attached to the root span so
/// all activity from one run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(org: &str, name: &str) -> RepositoryId {
        RepositoryId::new(
            OrganizationName::new(org).unwrap(),
            RepositoryName::new(name).unwrap(),
        )
    }

    #[test]
    fn names_reject_separators_and_empty_values() {
        assert!(OrganizationName::new("AbsaOSS").is_some());
        assert!(OrganizationName::new("").is_none());
        assert!(OrganizationName::new("a/b").is_none());
        assert!(RepositoryName::new("repo#1").is_none());
    }

    #[test]
    fn name_deserialisation_applies_validation() {
        let ok: RepositoryName = serde_json::from_str("\"living-doc\"").unwrap();
        assert_eq!(ok.as_str(), "living-doc");

        let err = serde_json::from_str::<RepositoryName>("\"a/b\"");
        assert!(err.is_err());
    }

    #[test]
    fn repository_id_displays_owner_slash_repo() {
        assert_eq!(repo("OrgA", "RepoA").to_string(), "OrgA/RepoA");
    }

    #[test]
    fn repository_id_parse_requires_both_parts() {
        assert_eq!(RepositoryId::parse("OrgA/RepoA"), Some(repo("OrgA", "RepoA")));
        assert_eq!(RepositoryId::parse("OrgA"), None);
        assert_eq!(RepositoryId::parse("/RepoA"), None);
        assert_eq!(RepositoryId::parse("OrgA/Repo/A"), None);
    }

    #[test]
    fn issue_key_has_stable_format() {
        let key = repo("OrgA", "RepoA").issue_key(IssueNumber::new(42));
        assert_eq!(key.as_str(), "OrgA/RepoA#42");
    }

    #[test]
    fn issue_key_parse_recovers_parts() {
        let (repository, number) = IssueKey::parse("test_org/test-repo.rs#7").unwrap();
        assert_eq!(repository, repo("test_org", "test-repo.rs"));
        assert_eq!(number, IssueNumber::new(7));
    }

    #[test]
    fn issue_key_parse_rejects_malformed_keys() {
        assert!(IssueKey::parse("OrgA/RepoA").is_none());
        assert!(IssueKey::parse("OrgA#1").is_none());
        assert!(IssueKey::parse("OrgA/RepoA#abc").is_none());
    }

    #[test]
    fn issue_key_serialises_as_plain_string() {
        let key = repo("OrgA", "RepoA").issue_key(IssueNumber::new(1));
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"OrgA/RepoA#1\"");
    }

    #[test]
    fn repository_id_round_trips_through_json_string() {
        let id = repo("OrgA", "RepoA");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"OrgA/RepoA\"");
        assert_eq!(serde_json::from_str::<RepositoryId>(&json).unwrap(), id);
    }
}
