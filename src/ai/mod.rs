pub mod response;
pub mod types;

pub use types::{IssueAnalysis, PrDraft, Priority};

use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::http::{HttpRequest, HttpTransport, TransportError};

/// Failures inside the AI client. Never returned to callers: every public
/// operation turns these into a placeholder result.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("AI request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("AI service returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("No response from AI")]
    EmptyResponse,

    #[error("Failed to parse AI output: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Summarization, research expansion and PR drafting against the Gemini
/// `generateContent` endpoint. Without an API key nothing is sent.
#[derive(Clone)]
pub struct AiClient {
    transport: Arc<dyn HttpTransport>,
    api_key: Option<String>,
    model: String,
    api_base: String,
}

impl AiClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        api_key: Option<String>,
        model: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            model: model.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Summarize an issue, rate its priority and suggest a fix.
    #[instrument(skip(self, body))]
    pub async fn analyze_issue(&self, title: &str, body: &str) -> IssueAnalysis {
        let Some(api_key) = &self.api_key else {
            return IssueAnalysis {
                summary: "API Key missing. Cannot analyze.".to_string(),
                priority: Priority::Low,
                suggested_fix: "Please configure environment variables.".to_string(),
            };
        };

        let prompt = format!(
            "Analyze the following GitHub issue.\n\
             Title: {title}\n\
             Body: {body}\n\n\
             Return a JSON object with:\n\
             1. A concise summary (max 2 sentences).\n\
             2. A priority level (Low, Medium, High) based on urgency and severity implications.\n\
             3. A suggested technical approach or fix strategy (max 3 bullet points)."
        );
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "summary": { "type": "STRING" },
                "priority": { "type": "STRING", "enum": ["Low", "Medium", "High"] },
                "suggestedFix": { "type": "STRING" }
            },
            "required": ["summary", "priority", "suggestedFix"]
        });

        let result = async {
            let text = self.generate(api_key, prompt, schema).await?;
            if text.trim().is_empty() {
                return Err(AiError::EmptyResponse);
            }
            response::parse_json::<IssueAnalysis>(&text)
        }
        .await;

        result.unwrap_or_else(|err| {
            error!(error = %err, "issue analysis failed");
            IssueAnalysis {
                summary: "Analysis failed.".to_string(),
                priority: Priority::Medium,
                suggested_fix: "Could not generate suggestion.".to_string(),
            }
        })
    }

    /// Ask for five research areas related to `topic`.
    #[instrument(skip(self))]
    pub async fn generate_research_ideas(&self, topic: &str) -> Vec<String> {
        let Some(api_key) = &self.api_key else {
            return vec!["API Key missing".to_string()];
        };

        let prompt = format!(
            "Provide 5 key research areas or technical concepts related to: \"{topic}\" \
             for a senior software engineer. Return a simple JSON array of strings."
        );
        let schema = json!({ "type": "ARRAY", "items": { "type": "STRING" } });

        let result = async {
            let text = self.generate(api_key, prompt, schema).await?;
            if text.trim().is_empty() {
                return Ok(Vec::new());
            }
            response::parse_json::<Vec<String>>(&text)
        }
        .await;

        result.unwrap_or_else(|err| {
            error!(error = %err, "research idea generation failed");
            vec!["Error fetching research ideas.".to_string()]
        })
    }

    /// Draft a pull request that resolves the issue. `suggested_fix` is folded
    /// into the prompt when present.
    #[instrument(skip(self, body, suggested_fix))]
    pub async fn draft_pull_request(
        &self,
        title: &str,
        body: &str,
        suggested_fix: Option<&str>,
    ) -> PrDraft {
        let Some(api_key) = &self.api_key else {
            return PrDraft {
                title: "API Key missing".to_string(),
                description: "Please configure environment variables to draft pull requests."
                    .to_string(),
            };
        };

        let mut prompt = format!(
            "Draft a GitHub pull request that resolves the following issue.\n\
             Issue title: {title}\n\
             Issue body: {body}\n"
        );
        if let Some(fix) = suggested_fix.map(str::trim).filter(|fix| !fix.is_empty()) {
            prompt.push_str(&format!("Proposed fix: {fix}\n"));
        }
        prompt.push_str(
            "\nReturn a JSON object with:\n\
             1. A short imperative pull request title.\n\
             2. A markdown description covering the problem, the change and how it was tested.",
        );
        let schema = json!({
            "type": "OBJECT",
            "properties": {
                "title": { "type": "STRING" },
                "description": { "type": "STRING" }
            },
            "required": ["title", "description"]
        });

        let result = async {
            let text = self.generate(api_key, prompt, schema).await?;
            if text.trim().is_empty() {
                return Err(AiError::EmptyResponse);
            }
            response::parse_json::<PrDraft>(&text)
        }
        .await;

        result.unwrap_or_else(|err| {
            error!(error = %err, "pull request drafting failed");
            PrDraft {
                title: format!("Resolve: {title}"),
                description: "Could not generate pull request description.".to_string(),
            }
        })
    }

    /// One generateContent call constrained to JSON output matching `schema`.
    async fn generate(&self, api_key: &str, prompt: String, schema: Value) -> Result<String, AiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema
            }
        });
        let request = HttpRequest::post(url, body)
            .header("x-goog-api-key", api_key)
            .header("Content-Type", "application/json");

        debug!(model = %self.model, "sending generateContent request");
        let response = self.transport.send(request).await?;
        if !response.status.is_success() {
            return Err(AiError::Status {
                status: response.status,
                body: response.body,
            });
        }
        let text = response::candidate_text(&response.body)?;
        debug!(text_bytes = text.len(), "received AI output");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::FakeTransport;

    fn client(fake: &Arc<FakeTransport>, key: Option<&str>) -> AiClient {
        AiClient::new(
            fake.clone(),
            key.map(String::from),
            "gemini-2.5-flash",
            "https://ai.test/",
        )
    }

    /// Wrap model output text in a generateContent reply envelope.
    fn reply(text: &str) -> String {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }], "role": "model" } }] })
            .to_string()
    }

    #[tokio::test]
    async fn test_missing_key_returns_placeholders_without_network() {
        let fake = Arc::new(FakeTransport::new());
        let ai = client(&fake, None);
        assert!(!ai.has_api_key());

        let analysis = ai.analyze_issue("t", "b").await;
        assert_eq!(analysis.summary, "API Key missing. Cannot analyze.");
        assert_eq!(analysis.priority, Priority::Low);

        assert_eq!(ai.generate_research_ideas("rust").await, vec!["API Key missing"]);

        let draft = ai.draft_pull_request("t", "b", None).await;
        assert_eq!(draft.title, "API Key missing");

        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_key_counts_as_missing() {
        let fake = Arc::new(FakeTransport::new());
        let ai = client(&fake, Some("   "));
        ai.analyze_issue("t", "b").await;
        assert_eq!(fake.call_count(), 0);
    }

    #[tokio::test]
    async fn test_analyze_parses_fenced_json() {
        let text = "```json\n{\"summary\":\"Leak in socket\",\"priority\":\"High\",\"suggestedFix\":\"- remove listeners\"}\n```";
        let fake = Arc::new(FakeTransport::new().respond(200, &reply(text)));
        let analysis = client(&fake, Some("k")).analyze_issue("Leak", "details").await;
        assert_eq!(analysis.summary, "Leak in socket");
        assert_eq!(analysis.priority, Priority::High);
        assert_eq!(analysis.suggested_fix, "- remove listeners");

        let request = &fake.requests()[0];
        assert_eq!(
            request.url,
            "https://ai.test/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(request.header_value("x-goog-api-key"), Some("k"));
        let body = request.body.as_ref().unwrap();
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
        assert!(prompt.contains("Title: Leak"));
        assert!(prompt.contains("Body: details"));
    }

    #[tokio::test]
    async fn test_analyze_degrades_on_malformed_output() {
        let fake = Arc::new(FakeTransport::new().respond(200, &reply("I think this is urgent")));
        let analysis = client(&fake, Some("k")).analyze_issue("t", "b").await;
        assert_eq!(analysis.summary, "Analysis failed.");
        assert_eq!(analysis.priority, Priority::Medium);
        assert_eq!(analysis.suggested_fix, "Could not generate suggestion.");
    }

    #[tokio::test]
    async fn test_analyze_degrades_on_request_failure() {
        let fake = Arc::new(FakeTransport::new().fail("timed out"));
        let analysis = client(&fake, Some("k")).analyze_issue("t", "b").await;
        assert_eq!(analysis.summary, "Analysis failed.");

        let fake = Arc::new(FakeTransport::new().respond(429, r#"{"error":{"code":429}}"#));
        let analysis = client(&fake, Some("k")).analyze_issue("t", "b").await;
        assert_eq!(analysis.priority, Priority::Medium);
    }

    #[tokio::test]
    async fn test_analyze_degrades_on_empty_text() {
        let fake = Arc::new(FakeTransport::new().respond(200, &reply("")));
        let analysis = client(&fake, Some("k")).analyze_issue("t", "b").await;
        assert_eq!(analysis.summary, "Analysis failed.");
    }

    #[tokio::test]
    async fn test_research_ideas_tolerates_any_count() {
        let fake = Arc::new(FakeTransport::new().respond(200, &reply(r#"["a","b","c","d","e","f"]"#)));
        let ideas = client(&fake, Some("k")).generate_research_ideas("caching").await;
        assert_eq!(ideas.len(), 6);

        let body = fake.requests()[0].body.clone().unwrap();
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "ARRAY");
        assert!(body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("\"caching\""));
    }

    #[tokio::test]
    async fn test_research_ideas_empty_text_yields_no_ideas() {
        let fake = Arc::new(FakeTransport::new().respond(200, &reply("  ")));
        assert!(client(&fake, Some("k")).generate_research_ideas("x").await.is_empty());
    }

    #[tokio::test]
    async fn test_research_ideas_failure_placeholder() {
        let fake = Arc::new(FakeTransport::new().respond(200, &reply(r#"{"ideas":"nope"}"#)));
        let ideas = client(&fake, Some("k")).generate_research_ideas("x").await;
        assert_eq!(ideas, vec!["Error fetching research ideas."]);
    }

    #[tokio::test]
    async fn test_draft_includes_suggested_fix_only_when_present() {
        let text = r#"{"title":"Fix socket leak","description":"Removes listeners"}"#;
        let fake = Arc::new(FakeTransport::new().respond(200, &reply(text)).respond(200, &reply(text)));
        let ai = client(&fake, Some("k"));

        let draft = ai.draft_pull_request("Leak", "b", Some("remove listeners")).await;
        assert_eq!(draft.title, "Fix socket leak");
        ai.draft_pull_request("Leak", "b", None).await;

        let requests = fake.requests();
        let with_fix = requests[0].body.as_ref().unwrap()["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .to_string();
        let without_fix = requests[1].body.as_ref().unwrap()["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(with_fix.contains("Proposed fix: remove listeners"));
        assert!(!without_fix.contains("Proposed fix"));
    }

    #[tokio::test]
    async fn test_draft_failure_placeholder() {
        let fake = Arc::new(FakeTransport::new().fail("offline"));
        let draft = client(&fake, Some("k")).draft_pull_request("Leak", "b", None).await;
        assert_eq!(draft.title, "Resolve: Leak");
        assert_eq!(draft.description, "Could not generate pull request description.");
    }
}
