pub mod gemini_types;

use anyhow::Context as _;
use log::{debug, info, warn};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::config::BackendConfig;
use crate::error::RelayError;
use crate::web::models::Content;
use gemini_types::{GenerateContentRequest, GenerateContentResponse};

// Client for the Gemini generateContent API
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
    client: Client,
}

impl GeminiClient {
    pub fn from_config(config: &BackendConfig) -> Result<Self, RelayError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(RelayError::BackendUnconfigured)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        info!(
            "Using Gemini model {} at {} (timeout {}s)",
            config.model,
            config.base_url,
            config.timeout.as_secs()
        );

        Ok(Self {
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            timeout: config.timeout,
            client,
        })
    }

    pub async fn generate(&self, contents: Vec<Content>) -> Result<String, RelayError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let payload = GenerateContentRequest { contents };

        debug!("Sending {} turn(s) to {}", payload.contents.len(), url);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let parsed_body = serde_json::from_str::<Value>(&body);

        if !status.is_success() {
            warn!("AI backend returned status {}", status);
            return Err(RelayError::BackendRejected {
                status: status.as_u16(),
                details: parsed_body.unwrap_or(Value::String(body)),
            });
        }

        let json = parsed_body.map_err(|e| {
            RelayError::BackendCallFailure(format!("Invalid JSON from AI backend: {}", e))
        })?;
        debug!("Response JSON: {}", json);

        let parsed: GenerateContentResponse =
            serde_json::from_value(json.clone()).unwrap_or_default();

        if let Some(reason) = parsed.block_reason() {
            warn!("AI backend blocked the prompt: {}", reason);
        }

        match parsed.first_text() {
            Some(text) => {
                info!("Response length: {} characters", text.chars().count());
                Ok(text.to_string())
            }
            None => Err(RelayError::BackendEmptyResponse { details: json }),
        }
    }

    fn map_transport_error(&self, err: reqwest::Error) -> RelayError {
        if err.is_timeout() {
            RelayError::BackendTimeout(self.timeout.as_secs())
        } else {
            RelayError::BackendCallFailure(err.to_string())
        }
    }
}
