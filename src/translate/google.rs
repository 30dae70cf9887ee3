//! Google Cloud Translation (v2 REST) provider.

use super::{TranslationError, Translator};
use crate::config::TranslationConfig;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct TranslateBody<'a> {
    q: &'a str,
    target: &'a str,
    source: &'a str,
    format: &'static str,
}

#[derive(Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Deserialize)]
struct TranslateData {
    translations: Vec<Translation>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

pub struct GoogleTranslator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl GoogleTranslator {
    pub fn new(config: &TranslationConfig) -> Result<Self, TranslationError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TranslationError::Network(format!("failed to build client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            timeout: config.timeout(),
        })
    }
}

/// Map a non-success status to the provider failure it signals.
fn classify_status(status: StatusCode, body: &str) -> TranslationError {
    let message = body.trim().chars().take(300).collect::<String>();
    match status {
        StatusCode::UNAUTHORIZED => TranslationError::Unauthorized(message),
        StatusCode::FORBIDDEN if message.contains("RateLimitExceeded") => {
            TranslationError::QuotaExceeded(message)
        }
        StatusCode::FORBIDDEN => TranslationError::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => TranslationError::QuotaExceeded(message),
        other => TranslationError::Provider {
            status: other.as_u16(),
            message,
        },
    }
}

fn parse_response(body: &str) -> Result<String, TranslationError> {
    let response: TranslateResponse =
        serde_json::from_str(body).map_err(|e| TranslationError::Malformed(e.to_string()))?;

    response
        .data
        .translations
        .into_iter()
        .next()
        .map(|t| t.translated_text)
        .ok_or_else(|| TranslationError::Malformed("response has no translations".to_string()))
}

#[async_trait::async_trait]
impl Translator for GoogleTranslator {
    async fn translate(
        &self,
        text: &str,
        target_language: &str,
        source_language: &str,
    ) -> Result<String, TranslationError> {
        let body = TranslateBody {
            q: text,
            target: target_language,
            source: source_language,
            format: "text",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TranslationError::Timeout(self.timeout)
                } else {
                    TranslationError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TranslationError::Network(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(classify_status(status, &text));
        }

        parse_response(&text)
    }

    fn name(&self) -> &str {
        "google"
    }
}
