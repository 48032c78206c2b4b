use chrono::{DateTime, Utc};

use crate::github::IssueState;

/// How many issues with a given label are loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCount {
    pub name: String,
    pub count: usize,
}

/// One line of the recent-activity feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecentIssue {
    pub number: u64,
    pub title: String,
    pub state: IssueState,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

/// Dashboard overview of the loaded issues and research notes.
#[derive(Debug)]
pub struct DashboardReport {
    /// "owner/repo", or empty when showing sample data without a repository
    pub repository: String,
    pub open_issues: usize,
    pub closed_issues: usize,
    pub research_notes: usize,
    /// Label distribution, in first-seen order
    pub labels: Vec<LabelCount>,
    /// Most recent issues as returned by the API (at most 3)
    pub recent: Vec<RecentIssue>,
    /// Fetch error shown alongside sample data
    pub warning: Option<String>,
}
