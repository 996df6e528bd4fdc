use anyhow::{Context as _, Result, anyhow};
use ghostline_types::{GhostError, PredictorContext};
use reqwest::{Client, RequestBuilder};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use crate::config::PredictorConfig;
use crate::prompt::{SYSTEM_PROMPT, build_user_payload, extract_message_content};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Chat-completions client that turns a partial command line into a raw
/// completion line.
#[derive(Debug, Clone)]
pub struct PredictorClient {
    config: PredictorConfig,
    http: Client,
}

impl PredictorClient {
    pub fn new(config: PredictorConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build http client")?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// Ask the model for a continuation of `context.partial_input`.
    ///
    /// Returns the raw text of the first choice; validation is the caller's job.
    pub async fn complete(&self, context: &PredictorContext) -> Result<String> {
        let messages = vec![
            json!({"role": "system", "content": SYSTEM_PROMPT}),
            json!({"role": "user", "content": build_user_payload(context)}),
        ];
        let builder = self.request_builder(messages)?;

        let res = builder.send().await?.error_for_status()?;
        let data: Value = res.json().await?;
        extract_message_content(&data).ok_or_else(|| anyhow!("Unexpected response {data}"))
    }

    fn request_builder(&self, messages: Vec<Value>) -> Result<RequestBuilder> {
        let api_key = self.config.api_key().ok_or_else(|| {
            GhostError::PredictorNotConfigured("no API key in GHOSTLINE_API_KEY or OPENAI_API_KEY".into())
        })?;

        let body = json!({
            "model": self.config.model(),
            "messages": messages,
            "temperature": self.config.temperature(),
            "max_tokens": 64,
        });

        debug!("req: {:?}", body);

        Ok(self
            .http
            .post(self.config.chat_endpoint())
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&body))
    }
}
