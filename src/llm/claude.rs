use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::llm::provider::{CompletionProvider, CompletionRequest};

pub const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";

pub struct ClaudeProvider {
    client: Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ClaudeMessage<'a>>,
    system: &'a str,
}

#[derive(Serialize)]
struct ClaudeMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    error: Option<ClaudeError>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct ClaudeError {
    message: String,
}

/// Joins the text blocks. An empty text block is still an answer.
fn answer_text(result: ClaudeResponse) -> Result<String> {
    if let Some(error) = result.error {
        return Err(Error::LLMApi(error.message));
    }

    let blocks = result
        .content
        .into_iter()
        .filter(|c| c.content_type == "text")
        .filter_map(|c| c.text)
        .collect::<Vec<_>>();

    if blocks.is_empty() {
        return Err(Error::LLMApi("No text content in Claude response".to_string()));
    }

    Ok(blocks.join(""))
}

impl ClaudeProvider {
    pub fn new(api_key: String, model: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_CLAUDE_MODEL.to_string()),
        })
    }
}

#[async_trait]
impl CompletionProvider for ClaudeProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        tracing::debug!("Sending {} prompt chars to Claude", request.prompt.len());

        let request_body = ClaudeRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system,
            messages: vec![ClaudeMessage {
                role: "user",
                content: &request.prompt,
            }],
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| Error::LLMApi(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::LLMApi(format!(
                "Claude API error ({}): {}",
                status, body
            )));
        }

        let result: ClaudeResponse = response
            .json()
            .await
            .map_err(|e| Error::LLMApi(format!("Failed to parse Claude response: {}", e)))?;

        answer_text(result)
    }

    fn name(&self) -> &str {
        "Claude"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<String> {
        answer_text(serde_json::from_str(body).unwrap())
    }

    #[test]
    fn test_empty_text_block_is_an_answer() {
        let text = parse(r#"{"content": [{"type": "text", "text": ""}]}"#).unwrap();
        assert_eq!(text, "");
    }

    #[test]
    fn test_no_text_block_is_an_error() {
        assert!(parse(r#"{"content": []}"#).is_err());
        assert!(parse(r#"{"content": [], "error": {"message": "overloaded"}}"#).is_err());
    }
}
