// src/extraction/client.rs
use crate::extraction::prompt::{self, ChatMessage};
use crate::extraction::Extractor;
use crate::schedule::models::FundRecord;
use crate::utils::error::ServiceError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const USER_AGENT: &str = concat!("fund_schedule_extractor/", env!("CARGO_PKG_VERSION"));
// Small spacing between requests; the bounded pool does the rest.
const REQUEST_DELAY_MS: u64 = 150;
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Chat-completions backed extractor.
pub struct OpenAiExtractor {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiExtractor {
    pub fn new(api_key: String, model: String, base_url: String) -> Result<Self, ServiceError> {
        Ok(Self {
            client: build_client()?,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Creates a reqwest client configured for the completion API.
fn build_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
}

#[async_trait::async_trait]
impl Extractor for OpenAiExtractor {
    async fn extract(&self, page_text: &str) -> Result<FundRecord, ServiceError> {
        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            messages: prompt::messages(page_text),
            response_format: ResponseFormat { kind: "json_object" },
        };

        tokio::time::sleep(Duration::from_millis(REQUEST_DELAY_MS)).await;

        tracing::debug!("POST {} ({} chars of page text)", url, page_text.len());
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("HTTP error status: {} from {}", status, url);
            if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
                return Err(ServiceError::Unauthorized);
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                tracing::warn!("Received 429 - lower --concurrency or retry later.");
                return Err(ServiceError::RateLimited);
            }
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Http { status, body });
        }

        let body = response.text().await?;
        parse_completion(&body)
    }
}

/// Pulls the record out of a chat-completions response body.
pub fn parse_completion(body: &str) -> Result<FundRecord, ServiceError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ServiceError::MalformedResponse(format!("unexpected completion payload: {}", e)))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(ServiceError::EmptyResponse)?;

    parse_fund_record(&content)
}

/// JSON mode guarantees syntax, not shape, so both are checked here.
pub fn parse_fund_record(content: &str) -> Result<FundRecord, ServiceError> {
    let trimmed = strip_code_fence(content.trim());
    let value: serde_json::Value = serde_json::from_str(trimmed)
        .map_err(|e| ServiceError::MalformedResponse(format!("content is not JSON: {}", e)))?;

    if !value.is_object() {
        return Err(ServiceError::MalformedResponse("content is not a JSON object".to_string()));
    }

    serde_json::from_value(value)
        .map_err(|e| ServiceError::MalformedResponse(format!("content does not match the record shape: {}", e)))
}

fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
