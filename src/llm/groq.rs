//! Groq-style chat-completions client (blocking, JSON response mode).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::model::CandidateEvaluation;

use super::{CandidateScorer, LlmError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const SCORING_SYSTEM_PROMPT: &str = "You are a technical recruiter's assistant. \
Given a search query and excerpts from one candidate's resume, judge how well \
the candidate fits the query. Respond with a JSON object: \
{\"score\": <integer 0-100>, \"rationale\": \"<one or two sentences>\"}. \
Judge only from the excerpts; do not invent experience.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat<'a>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Thin blocking client for an OpenAI-compatible chat-completions endpoint.
pub struct GroqClient {
    http: reqwest::blocking::Client,
    api_base: String,
    api_key: String,
}

impl GroqClient {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Result<Self, LlmError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// One JSON-mode completion: returns the parsed JSON object the model
    /// emitted as its message content.
    pub fn complete_json(
        &self,
        model: &str,
        system: &str,
        user: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<Value, LlmError> {
        let request = ChatRequest {
            model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "user", content: user },
            ],
            temperature,
            max_tokens,
            response_format: ResponseFormat { kind: "json_object" },
        };

        let url = format!("{}/chat/completions", self.api_base);
        debug!(%url, model, "llm request");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::Http { status: status.as_u16(), body });
        }

        let parsed: ChatResponse = response.json()?;
        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| LlmError::Malformed("response had no choices".to_string()))?;
        serde_json::from_str(content)
            .map_err(|err| LlmError::Malformed(format!("content is not JSON: {err}")))
    }
}

/// Scores candidates through a [`GroqClient`].
pub struct GroqScorer {
    client: GroqClient,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl GroqScorer {
    pub fn new(client: GroqClient, model: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
            max_tokens,
        }
    }
}

impl CandidateScorer for GroqScorer {
    fn score(
        &self,
        query: &str,
        name: &str,
        role: &str,
        evidence: &[String],
    ) -> Result<CandidateEvaluation, LlmError> {
        let excerpts = evidence.join("\n---\n");
        let user = format!(
            "Query: {query}\n\nCandidate: {name}\nRole: {role}\n\nResume excerpts:\n{excerpts}"
        );
        let verdict = self.client.complete_json(
            &self.model,
            SCORING_SYSTEM_PROMPT,
            &user,
            self.temperature,
            self.max_tokens,
        )?;

        let score = verdict
            .get("score")
            .and_then(Value::as_i64)
            .ok_or_else(|| LlmError::Malformed("verdict missing integer score".to_string()))?;
        let rationale = verdict
            .get("rationale")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();

        Ok(CandidateEvaluation {
            name: name.to_string(),
            role: (!role.is_empty()).then(|| role.to_string()),
            score: score.clamp(0, 100) as u8,
            rationale,
            evidence: evidence.to_vec(),
        })
    }
}
