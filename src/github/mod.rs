pub mod sample;
pub mod types;

pub use types::{Issue, IssueCreation, IssueFetch, IssueState};

use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::store::RepoConfig;

const ACCEPT: &str = "application/vnd.github.v3+json";
const API_VERSION: &str = "2022-11-28";
const SAMPLE_DELAY: Duration = Duration::from_millis(800);

pub const NOT_FOUND_MESSAGE: &str =
    "Repository not found. Check spelling or token permissions (Private repos require 'repo' scope).";

/// Lists and creates issues through the GitHub REST API, degrading to the
/// sample dataset or an error string instead of failing.
#[derive(Clone)]
pub struct IssueClient {
    transport: Arc<dyn HttpTransport>,
    api_base: String,
    sample_delay: Duration,
}

impl IssueClient {
    pub fn new(transport: Arc<dyn HttpTransport>, api_base: impl Into<String>) -> Self {
        Self {
            transport,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            sample_delay: SAMPLE_DELAY,
        }
    }

    /// Override the simulated latency of the sample dataset.
    pub fn with_sample_delay(mut self, delay: Duration) -> Self {
        self.sample_delay = delay;
        self
    }

    /// Fetch issues in every state (open and closed) for the configured repository.
    #[instrument(skip(self, config), fields(owner = %config.owner.trim(), repo = %config.repo.trim()))]
    pub async fn fetch_issues(&self, config: &RepoConfig) -> IssueFetch {
        let Some((owner, repo)) = config.repository() else {
            debug!("no repository configured, serving sample issues");
            tokio::time::sleep(self.sample_delay).await;
            return IssueFetch::Sample(sample::sample_issues());
        };

        let url = format!("{}/repos/{owner}/{repo}/issues?state=all&per_page=100", self.api_base);
        let mut request = with_github_headers(HttpRequest::get(url));
        if let Some(token) = config.credential() {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "failed to reach GitHub, serving sample issues");
                return degraded(err.to_string());
            }
        };

        if !response.status.is_success() {
            let message = read_error_message(&response);
            warn!(status = response.status.as_u16(), error = %message, "GitHub API error");
            return degraded(message);
        }

        match serde_json::from_str::<Vec<Issue>>(&response.body) {
            Ok(issues) => {
                debug!(count = issues.len(), "received issues");
                IssueFetch::Live(issues)
            }
            Err(err) => {
                warn!(error = %err, "unexpected issue list payload, serving sample issues");
                degraded(err.to_string())
            }
        }
    }

    /// Create an issue. Never attempted without a repository and a credential.
    #[instrument(skip(self, config, body), fields(owner = %config.owner.trim(), repo = %config.repo.trim()))]
    pub async fn create_issue(&self, config: &RepoConfig, title: &str, body: &str) -> IssueCreation {
        let Some((owner, repo)) = config.repository() else {
            return IssueCreation::Rejected("Owner and Repository must be set.".to_string());
        };
        let Some(token) = config.credential() else {
            return IssueCreation::Rejected(
                "Personal Access Token is required to create issues.".to_string(),
            );
        };

        let url = format!("{}/repos/{owner}/{repo}/issues", self.api_base);
        let request = with_github_headers(HttpRequest::post(url, json!({ "title": title, "body": body })))
            .header("Authorization", format!("Bearer {token}"))
            .header("Content-Type", "application/json");

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "failed to reach GitHub while creating issue");
                return IssueCreation::Failed(err.to_string());
            }
        };

        if !response.status.is_success() {
            let message = body_field(&response, &["message"])
                .unwrap_or_else(|| fallback_status_text(&response));
            warn!(status = response.status.as_u16(), error = %message, "issue creation rejected");
            return IssueCreation::Failed(message);
        }

        match serde_json::from_str::<Issue>(&response.body) {
            Ok(issue) => {
                debug!(number = issue.number, "issue created");
                IssueCreation::Created(issue)
            }
            Err(err) => IssueCreation::Failed(err.to_string()),
        }
    }
}

fn with_github_headers(request: HttpRequest) -> HttpRequest {
    request
        .header("Accept", ACCEPT)
        .header("X-GitHub-Api-Version", API_VERSION)
}

fn degraded(error: String) -> IssueFetch {
    IssueFetch::Degraded {
        issues: sample::sample_issues(),
        error,
    }
}

/// Human-readable reason for a failed read.
fn read_error_message(response: &HttpResponse) -> String {
    if response.status == StatusCode::NOT_FOUND {
        return NOT_FOUND_MESSAGE.to_string();
    }
    if serde_json::from_str::<serde_json::Value>(&response.body).is_err() {
        return format!("HTTP Error {}", response.status.as_u16());
    }
    body_field(response, &["message", "error"]).unwrap_or_else(|| {
        let text = response.status_text();
        if text.is_empty() {
            "Unknown API Error".to_string()
        } else {
            text.to_string()
        }
    })
}

/// First non-empty string among `fields` in a JSON error body.
fn body_field(response: &HttpResponse, fields: &[&str]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(&response.body).ok()?;
    fields
        .iter()
        .filter_map(|field| value.get(*field).and_then(|v| v.as_str()))
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

fn fallback_status_text(response: &HttpResponse) -> String {
    match response.status_text() {
        "" => format!("HTTP Error {}", response.status.as_u16()),
        text => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::FakeTransport;

    const ISSUES_JSON: &str = r#"[
        {"id": 1, "number": 10, "title": "First", "body": "a", "state": "open",
         "html_url": "https://github.com/o/r/issues/10", "created_at": "2024-05-01T10:00:00Z",
         "labels": [], "user": {"login": "u1", "avatar_url": ""}, "comments": 0},
        {"id": 2, "number": 11, "title": "Second", "body": null, "state": "closed",
         "html_url": "https://github.com/o/r/issues/11", "created_at": "2024-05-02T10:00:00Z",
         "labels": [{"name": "bug", "color": "d73a4a"}], "user": {"login": "u2", "avatar_url": ""}, "comments": 4}
    ]"#;

    const CREATED_JSON: &str = r#"{"id": 3, "number": 12, "title": "New", "body": "details", "state": "open",
        "html_url": "https://github.com/o/r/issues/12", "created_at": "2024-05-03T10:00:00Z",
        "labels": [], "user": {"login": "me", "avatar_url": ""}, "comments": 0}"#;

    fn client(fake: &Arc<FakeTransport>) -> IssueClient {
        IssueClient::new(fake.clone(), "https://api.github.test/").with_sample_delay(Duration::ZERO)
    }

    fn config(credential: &str, owner: &str, repo: &str) -> RepoConfig {
        RepoConfig {
            credential: credential.to_string(),
            owner: owner.to_string(),
            repo: repo.to_string(),
        }
    }

    #[tokio::test]
    async fn test_fetch_without_repository_serves_sample() {
        for cfg in [config("", "", "r"), config("tok", "o", "  "), config("tok", "", "")] {
            let fake = Arc::new(FakeTransport::new());
            let outcome = client(&fake).fetch_issues(&cfg).await;
            assert!(matches!(outcome, IssueFetch::Sample(_)));
            assert_eq!(outcome.issues().len(), 3);
            assert!(outcome.error().is_none());
            assert_eq!(fake.call_count(), 0);
        }
    }

    #[tokio::test]
    async fn test_fetch_success_returns_remote_issues() {
        let fake = Arc::new(FakeTransport::new().respond(200, ISSUES_JSON));
        let outcome = client(&fake).fetch_issues(&config("", " o ", "r")).await;
        let expected: Vec<Issue> = serde_json::from_str(ISSUES_JSON).unwrap();
        assert_eq!(outcome, IssueFetch::Live(expected));
        assert!(outcome.error().is_none());

        let request = &fake.requests()[0];
        assert_eq!(request.url, "https://api.github.test/repos/o/r/issues?state=all&per_page=100");
        assert_eq!(request.header_value("Accept"), Some(ACCEPT));
        assert_eq!(request.header_value("X-GitHub-Api-Version"), Some(API_VERSION));
        assert!(request.header_value("Authorization").is_none());
    }

    #[tokio::test]
    async fn test_fetch_keeps_issues_from_deleted_accounts() {
        let body = ISSUES_JSON.replace(r#"{"login": "u2", "avatar_url": ""}"#, "null");
        let fake = Arc::new(FakeTransport::new().respond(200, &body));
        let outcome = client(&fake).fetch_issues(&config("", "o", "r")).await;
        let IssueFetch::Live(issues) = outcome else {
            panic!("expected live issues, got {outcome:?}");
        };
        let numbers: Vec<u64> = issues.iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![10, 11]);
        assert_eq!(issues[1].author.handle, "");
    }

    #[tokio::test]
    async fn test_fetch_attaches_bearer_token_when_present() {
        let fake = Arc::new(FakeTransport::new().respond(200, "[]"));
        client(&fake).fetch_issues(&config(" ghp_abc ", "o", "r")).await;
        assert_eq!(fake.requests()[0].header_value("Authorization"), Some("Bearer ghp_abc"));
    }

    #[tokio::test]
    async fn test_fetch_not_found_hints_at_permissions() {
        let fake = Arc::new(FakeTransport::new().respond(404, r#"{"message":"Not Found"}"#));
        let outcome = client(&fake).fetch_issues(&config("", "o", "private")).await;
        assert_eq!(outcome.issues().len(), 3);
        let error = outcome.error().unwrap();
        assert!(error.contains("'repo' scope"));
    }

    #[tokio::test]
    async fn test_fetch_error_uses_body_message() {
        let fake = Arc::new(FakeTransport::new().respond(403, r#"{"message":"API rate limit exceeded"}"#));
        let outcome = client(&fake).fetch_issues(&config("", "o", "r")).await;
        assert_eq!(outcome.error(), Some("API rate limit exceeded"));
        assert_eq!(outcome.issues().len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_error_falls_back_to_status_text() {
        let fake = Arc::new(FakeTransport::new().respond(401, r#"{"documentation_url":"x"}"#));
        let outcome = client(&fake).fetch_issues(&config("bad", "o", "r")).await;
        assert_eq!(outcome.error(), Some("Unauthorized"));

        let fake = Arc::new(FakeTransport::new().respond(502, "<html>bad gateway</html>"));
        let outcome = client(&fake).fetch_issues(&config("", "o", "r")).await;
        assert_eq!(outcome.error(), Some("HTTP Error 502"));
    }

    #[tokio::test]
    async fn test_fetch_transport_failure_serves_sample_with_reason() {
        let fake = Arc::new(FakeTransport::new().fail("dns lookup failed"));
        let outcome = client(&fake).fetch_issues(&config("", "o", "r")).await;
        assert_eq!(outcome.error(), Some("dns lookup failed"));
        assert_eq!(outcome.issues().len(), 3);
    }

    #[tokio::test]
    async fn test_create_requires_credential() {
        let fake = Arc::new(FakeTransport::new());
        let outcome = client(&fake).create_issue(&config("  ", "o", "r"), "t", "b").await;
        assert!(matches!(outcome, IssueCreation::Rejected(_)));
        assert!(outcome.error().unwrap().contains("Personal Access Token"));
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn test_create_requires_repository() {
        let fake = Arc::new(FakeTransport::new());
        let outcome = client(&fake).create_issue(&config("tok", "o", ""), "t", "b").await;
        assert_eq!(outcome.error(), Some("Owner and Repository must be set."));
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn test_create_success_returns_remote_issue() {
        let fake = Arc::new(FakeTransport::new().respond(201, CREATED_JSON));
        let outcome = client(&fake).create_issue(&config("tok", "o", "r"), "New", "details").await;
        let IssueCreation::Created(issue) = outcome else {
            panic!("expected created issue, got {outcome:?}");
        };
        assert_eq!(issue.number, 12);

        let request = &fake.requests()[0];
        assert_eq!(request.method, reqwest::Method::POST);
        assert_eq!(request.url, "https://api.github.test/repos/o/r/issues");
        assert_eq!(request.header_value("Authorization"), Some("Bearer tok"));
        assert_eq!(request.header_value("Accept"), Some(ACCEPT));
        assert_eq!(request.header_value("X-GitHub-Api-Version"), Some(API_VERSION));
        assert_eq!(request.body, Some(json!({"title": "New", "body": "details"})));
    }

    #[tokio::test]
    async fn test_create_failure_surfaces_server_message() {
        let fake = Arc::new(FakeTransport::new().respond(422, r#"{"message":"Validation Failed"}"#));
        let outcome = client(&fake).create_issue(&config("tok", "o", "r"), "", "").await;
        assert_eq!(outcome, IssueCreation::Failed("Validation Failed".to_string()));

        let fake = Arc::new(FakeTransport::new().respond(500, "{}"));
        let outcome = client(&fake).create_issue(&config("tok", "o", "r"), "t", "").await;
        assert_eq!(outcome.error(), Some("Internal Server Error"));
    }

    #[tokio::test]
    async fn test_create_transport_failure() {
        let fake = Arc::new(FakeTransport::new().fail("connection refused"));
        let outcome = client(&fake).create_issue(&config("tok", "o", "r"), "t", "b").await;
        assert_eq!(outcome, IssueCreation::Failed("connection refused".to_string()));
    }
}
