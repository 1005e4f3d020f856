use serde::{Deserialize, Serialize};

use crate::config::ResponseFormat;
use crate::error::RelayError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

/// One turn of a conversation, shared by the inbound request, the backend
/// payload and the `candidates` response shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AiRequest {
    pub prompt: Option<String>,
    pub contents: Option<Vec<Content>>,
}

impl AiRequest {
    /// The prompt this request carries: the `prompt` field, or else the
    /// first part of the first content.
    pub fn derive_prompt(&self) -> Result<&str, RelayError> {
        let from_field = self.prompt.as_deref().filter(|p| !p.trim().is_empty());

        let from_contents = move || {
            self.contents
                .as_ref()?
                .first()?
                .parts
                .first()?
                .text
                .as_deref()
                .filter(|t| !t.trim().is_empty())
        };

        from_field
            .or_else(from_contents)
            .ok_or_else(|| RelayError::InvalidInput("Prompt is required".to_string()))
    }

    /// Conversation to forward to the backend.
    pub fn conversation(&self) -> Result<Vec<Content>, RelayError> {
        let prompt = self.derive_prompt()?;

        // An explicit prompt wins over contents, matching derive_prompt
        if self.prompt.as_deref().is_some_and(|p| !p.trim().is_empty()) {
            return Ok(vec![user_turn(prompt)]);
        }

        let contents = self.contents.as_deref().unwrap_or_default();
        let turns = contents
            .iter()
            .map(|content| Content {
                role: Some(content.role.clone().unwrap_or_else(|| "user".to_string())),
                parts: content
                    .parts
                    .iter()
                    .filter(|part| part.text.is_some())
                    .cloned()
                    .collect(),
            })
            .filter(|content| !content.parts.is_empty())
            .collect();

        Ok(turns)
    }
}

pub fn user_turn(text: &str) -> Content {
    Content {
        role: Some("user".to_string()),
        parts: vec![Part::text(text)],
    }
}

#[derive(Debug, Serialize)]
pub struct Candidate {
    pub content: Content,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AiResponse {
    Text { text: String },
    Candidates { candidates: Vec<Candidate> },
}

impl AiResponse {
    pub fn new(text: String, format: ResponseFormat) -> Self {
        match format {
            ResponseFormat::Text => AiResponse::Text { text },
            ResponseFormat::Candidates => AiResponse::Candidates {
                candidates: vec![Candidate {
                    content: Content {
                        role: None,
                        parts: vec![Part::text(text)],
                    },
                }],
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub status: &'static str,
    pub origin: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
    pub model: String,
}
