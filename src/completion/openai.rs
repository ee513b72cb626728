use crate::completion::types::{ApiErrorResponse, ChatCompletionRequest, ChatCompletionResponse};
use crate::completion::{CompletionClient, CompletionError, CompletionResult, Conversation};
use crate::config::CompletionConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::instrument;
use tracing::log::{debug, error};

/// OpenAI chat completions client, constructed once at startup and shared read-only.
pub struct OpenAIClient {
    http_client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}
impl OpenAIClient {
    pub fn new(api_key: String, config: &CompletionConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder
            .build()
            .context("Failed to build OpenAI Reqwest client!")?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/chat/completions", config.api_base.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn classify_failure(status: StatusCode, body: &str) -> CompletionError {
        let detail = match serde_json::from_str::<ApiErrorResponse>(body) {
            Ok(response) => {
                let kind = response
                    .error
                    .code
                    .or(response.error.error_type)
                    .unwrap_or_else(|| status.to_string());
                format!("{kind}: {}", response.error.message)
            }
            Err(_) => format!("HTTP {status}: {body}"),
        };

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                CompletionError::Authentication(detail)
            }
            StatusCode::TOO_MANY_REQUESTS => CompletionError::RateLimited(detail),
            _ => CompletionError::Api(detail),
        }
    }

    fn extract_reply(response: ChatCompletionResponse) -> CompletionResult {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::Unclassified("No choices in response".to_string()))?;

        match choice.message.content {
            Some(content) if !content.trim().is_empty() => Ok(content),
            _ => Err(CompletionError::Unclassified(
                "Response choice has no text content".to_string(),
            )),
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAIClient {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, conversation: &Conversation) -> CompletionResult {
        let messages = conversation.messages();
        let request_body = ChatCompletionRequest {
            model: &self.model,
            messages: &messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        debug!("Sending request to OpenAI API");
        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to call OpenAI API: {e}");
                CompletionError::Unclassified(format!("Network error: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let failure = Self::classify_failure(status, &body);
            error!("{failure}");
            return Err(failure);
        }

        let chat_response = response
            .json::<ChatCompletionResponse>()
            .await
            .map_err(|e| {
                error!("Failed to parse OpenAI response: {e}");
                CompletionError::Unclassified(format!("Parse error: {e}"))
            })?;

        debug!("Successfully received OpenAI response");
        Self::extract_reply(chat_response)
    }
}
