use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::AiError;

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Concatenated text parts of the first candidate of a generateContent reply.
pub fn candidate_text(raw: &str) -> Result<String, AiError> {
    let response: GenerateContentResponse = serde_json::from_str(raw)?;
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts.into_iter().filter_map(|part| part.text).collect())
        .unwrap_or_default();
    Ok(text)
}

/// Drop markdown code fences (```json ... ```) the model may wrap JSON in.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json\n", "")
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

pub fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, AiError> {
    Ok(serde_json::from_str(&strip_code_fences(text))?)
}
