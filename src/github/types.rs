use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// An issue as returned by the GitHub REST API.
/// Field names follow the wire format through serde renames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: u64,
    /// Repository-scoped issue number (e.g., 42)
    pub number: u64,
    pub title: String,
    /// GitHub sends `null` for issues without a description
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
    pub state: IssueState,
    #[serde(rename = "html_url")]
    pub url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub labels: Vec<Label>,
    /// `null` for issues whose author account was deleted
    #[serde(rename = "user", default, deserialize_with = "null_as_default")]
    pub author: Author,
    #[serde(rename = "comments", default)]
    pub comment_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl std::fmt::Display for IssueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IssueState::Open => write!(f, "OPEN"),
            IssueState::Closed => write!(f, "CLOSED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    /// Six hex digits without the leading '#'
    #[serde(rename = "color", default)]
    pub color_hex: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(rename = "login")]
    pub handle: String,
    #[serde(default)]
    pub avatar_url: String,
}

/// Outcome of listing issues. Every variant carries something renderable.
#[derive(Debug, Clone, PartialEq)]
pub enum IssueFetch {
    /// Remote data, verbatim.
    Live(Vec<Issue>),
    /// No repository configured; the built-in sample set.
    Sample(Vec<Issue>),
    /// The remote call failed; the sample set plus the reason.
    Degraded { issues: Vec<Issue>, error: String },
}

impl IssueFetch {
    pub fn issues(&self) -> &[Issue] {
        match self {
            IssueFetch::Live(issues) | IssueFetch::Sample(issues) => issues,
            IssueFetch::Degraded { issues, .. } => issues,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            IssueFetch::Degraded { error, .. } => Some(error.as_str()),
            _ => None,
        }
    }

    pub fn into_parts(self) -> (Vec<Issue>, Option<String>) {
        match self {
            IssueFetch::Live(issues) | IssueFetch::Sample(issues) => (issues, None),
            IssueFetch::Degraded { issues, error } => (issues, Some(error)),
        }
    }
}

/// Outcome of creating an issue.
#[derive(Debug, Clone, PartialEq)]
pub enum IssueCreation {
    Created(Issue),
    /// Refused locally before any network call.
    Rejected(String),
    /// The remote service or the transport failed.
    Failed(String),
}

impl IssueCreation {
    pub fn error(&self) -> Option<&str> {
        match self {
            IssueCreation::Created(_) => None,
            IssueCreation::Rejected(message) | IssueCreation::Failed(message) => Some(message.as_str()),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
