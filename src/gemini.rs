use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{BotError, Result};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Answers `question` against the given FAQ block, using `model`.
    ///
    /// Any backend failure surfaces as an error; callers are expected to
    /// fall back to [`BotError::user_message`] rather than show the raw
    /// error to the user.
    pub async fn complete(&self, question: &str, faq: &str, model: &str) -> Result<String> {
        debug!("Sending completion request to Gemini model {}", model);

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(question, faq),
                }],
            }],
        };

        let url = format!("{GEMINI_API_BASE}/{model}:generateContent");
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {}", e));
            return Err(BotError::GeminiApi { status, message });
        }

        let api_response: GenerateContentResponse = response.json().await?;
        let reply = extract_text(&api_response)?;

        debug!("Received response from Gemini API");
        Ok(reply)
    }
}

/// Builds the prompt sent to the model: the FAQ block verbatim, then the
/// literal question.
fn build_prompt(question: &str, faq: &str) -> String {
    format!(
        "Answer the user's question using the FAQ content below together \
         with your general knowledge. Prefer information from the FAQ.\n\n\
         --- FAQ START ---\n\
         {faq}\n\
         --- FAQ END ---\n\n\
         The user's question is: \"{question}\""
    )
}

fn extract_text(response: &GenerateContentResponse) -> Result<String> {
    let candidate = response
        .candidates
        .first()
        .ok_or_else(|| BotError::GeminiResponse("No candidates in response".to_string()))?;

    let text = candidate
        .content
        .parts
        .iter()
        .map(|part| part.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    if text.is_empty() {
        return Err(BotError::GeminiResponse(
            "Candidate contained no text".to_string(),
        ));
    }

    Ok(text)
}
