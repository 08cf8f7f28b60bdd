use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use crate::error::{ApiError, Result};

/// The exact token the chooser replies with when it declines to pick.
pub const ABSTAIN_TOKEN: &str = "ABSTAIN";

const SYSTEM_PROMPT: &str = "You are a strict title selector. \
Choose exactly one title from the provided list. \
Reply EXACTLY with 'ABSTAIN' only if the request is not about books at all or is pure gibberish. \
Do NOT abstain solely because the BestDistance is moderately high; prefer the closest title. \
Never invent a title.";

/// External judgment over the candidate list: replies with one candidate
/// title verbatim, or with [`ABSTAIN_TOKEN`]. Behind a trait so the selector
/// can be tested with scripted verdicts.
#[async_trait]
pub trait TitleChooser: Send + Sync {
    async fn choose(&self, query: &str, titles: &[String], best_distance: f32) -> Result<String>;
}

/// OpenAI chat-completions client acting as the title classifier.
/// Temperature 0 keeps verdicts reproducible for identical input.
#[derive(Debug, Clone)]
pub struct OpenAiChooser {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl OpenAiChooser {
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }
}

fn user_prompt(query: &str, titles: &[String], best_distance: f32) -> String {
    format!(
        "Request: {}\nCandidates: {}\nBestDistance: {}\nReply with ONE exact title from Candidates, or '{}'.",
        query,
        titles.join(", "),
        best_distance,
        ABSTAIN_TOKEN
    )
}

#[async_trait]
impl TitleChooser for OpenAiChooser {
    async fn choose(&self, query: &str, titles: &[String], best_distance: f32) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt(query, titles, best_distance),
                },
            ],
            temperature: 0.0,
        };

        debug!("Asking chooser to pick among {} titles", titles.len());
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::ExternalService(format!("OpenAI chat request failed: {}", e)))?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("OpenAI chat API error: {}", error_text);
            return Err(ApiError::ExternalService(format!(
                "OpenAI chat API error: {}",
                error_text
            )));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            ApiError::Serialization(format!("Failed to parse OpenAI chat response: {}", e))
        })?;

        let reply = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::ExternalService("OpenAI chat returned no choices".into()))?
            .message
            .content
            .unwrap_or_default();

        Ok(reply.trim().to_string())
    }
}
