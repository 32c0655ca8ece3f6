//! Profile metadata extraction from a resume's opening text.
//!
//! Extraction is infallible by contract: implementations degrade to
//! [`ProfileMetadata::unknown`] rather than failing ingestion over one
//! unreadable profile.

use serde_json::Value;
use tracing::warn;

use crate::ingest::deck::strip_position_tags;
use crate::ingest::segment::{EMAIL_RE, PHONE_RE};
use crate::model::ProfileMetadata;

use super::groq::GroqClient;

/// How much of the document the extractor gets to see. The identity block
/// sits at the top of a resume; the tail is noise for this purpose.
const EXTRACT_WINDOW_CHARS: usize = 2000;

const EXTRACTION_SYSTEM_PROMPT: &str = "You extract identity fields from the \
opening of a resume. Respond with a JSON object: {\"name\": \"<full name or \
Unknown>\", \"role\": \"<current title or null>\", \"email\": \"<or null>\", \
\"phone\": \"<or null>\"}. Use only what the text states.";

pub trait ProfileExtractor {
    fn extract(&self, content: &str) -> ProfileMetadata;
}

/// LLM-backed extractor. Any transport, HTTP, or parse failure degrades to
/// the unknown profile with a warning.
pub struct LlmExtractor {
    client: GroqClient,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl LlmExtractor {
    pub fn new(client: GroqClient, model: impl Into<String>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
            max_tokens,
        }
    }
}

impl ProfileExtractor for LlmExtractor {
    fn extract(&self, content: &str) -> ProfileMetadata {
        let window: String = content.chars().take(EXTRACT_WINDOW_CHARS).collect();
        match self.client.complete_json(
            &self.model,
            EXTRACTION_SYSTEM_PROMPT,
            &window,
            self.temperature,
            self.max_tokens,
        ) {
            Ok(fields) => metadata_from_fields(&fields),
            Err(err) => {
                warn!(%err, "profile extraction failed; storing unknown profile");
                ProfileMetadata::unknown()
            }
        }
    }
}

fn metadata_from_fields(fields: &Value) -> ProfileMetadata {
    let text_field = |key: &str| -> Option<String> {
        fields
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
            .map(str::to_string)
    };
    ProfileMetadata {
        name: text_field("name").unwrap_or_else(|| "Unknown".to_string()),
        role: text_field("role"),
        email: text_field("email"),
        phone: text_field("phone"),
    }
}

/// Offline fallback extractor: first plausible line is the name, second the
/// role, contact fields by pattern match. Good enough to keep the pipeline
/// usable without an API key.
pub struct HeuristicExtractor;

impl ProfileExtractor for HeuristicExtractor {
    fn extract(&self, content: &str) -> ProfileMetadata {
        // Provenance tags are markup, not identity lines.
        let window = strip_position_tags(&content.chars().take(EXTRACT_WINDOW_CHARS).collect::<String>());
        let mut lines = window
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !EMAIL_RE.is_match(line) && !PHONE_RE.is_match(line));

        let name = lines
            .next()
            .map(str::to_string)
            .unwrap_or_else(|| "Unknown".to_string());
        let role = lines.next().map(str::to_string);

        ProfileMetadata {
            name,
            role,
            email: EMAIL_RE.find(&window).map(|m| m.as_str().to_string()),
            phone: PHONE_RE.find(&window).map(|m| m.as_str().to_string()),
        }
    }
}
