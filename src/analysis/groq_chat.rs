use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

use super::{MeetingAnalysis, TextAnalysis, EXTRACTION_PROMPT};

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Chat-completion analysis via Groq's OpenAI-compatible API, with the
/// response constrained to a JSON object.
pub struct GroqChatClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl GroqChatClient {
    pub fn new(
        api_key: String,
        endpoint: Option<String>,
        model: String,
        temperature: f32,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        let base_url = endpoint.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        info!("Initialized Groq chat client with base URL: {}", base_url);

        Self {
            client,
            api_key,
            base_url,
            model,
            temperature,
        }
    }
}

#[async_trait]
impl TextAnalysis for GroqChatClient {
    async fn analyze(&self, transcript: &str) -> Result<MeetingAnalysis> {
        let url = format!("{}/chat/completions", self.base_url);

        let request_body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: EXTRACTION_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: format!(
                        "Analyze this meeting transcript and extract key information:\n\n{}",
                        transcript
                    ),
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
            temperature: self.temperature,
        };

        debug!(
            "Submitting {} chars of transcript for analysis with model {}",
            transcript.len(),
            self.model
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .context("Failed to reach text-analysis service")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read analysis response body")?;

        if !status.is_success() {
            error!("Analysis request failed with status {}: {}", status, body);
            return Err(anyhow!(
                "Analysis request failed with status {}: {}",
                status,
                body
            ));
        }

        let completion: ChatCompletionResponse =
            serde_json::from_str(&body).context("Failed to parse analysis response")?;

        let content = completion
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| anyhow!("No completion choices returned"))?;

        let analysis: MeetingAnalysis = serde_json::from_str(content)
            .context("Analysis response did not match the expected JSON shape")?;

        info!(
            "Analysis complete: {} decisions, {} participants, {} action items",
            analysis.key_decisions.len(),
            analysis.participants.len(),
            analysis.action_items.len()
        );

        Ok(analysis)
    }

    fn name(&self) -> &'static str {
        "Groq Chat API"
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
