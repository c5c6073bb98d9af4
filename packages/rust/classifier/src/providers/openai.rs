use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use linkenrich_shared::{LinkEnrichError, ModelSettings, Result};

use super::{ModelProvider, http_client, send_json};

const SERVICE: &str = "openai";

/// Chat Completions backend.
pub struct OpenAiProvider {
    client: Client,
    settings: ModelSettings,
}

impl OpenAiProvider {
    pub fn new(settings: &ModelSettings) -> Result<Self> {
        Ok(Self {
            client: http_client(settings)?,
            settings: settings.clone(),
        })
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn name(&self) -> &str {
        SERVICE
    }

    #[instrument(skip_all, fields(model = %self.settings.model))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.settings.base_url);
        let body = json!({
            "model": self.settings.model,
            "max_tokens": self.settings.max_tokens,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let request = self
            .client
            .post(&url)
            .bearer_auth(self.settings.api_key.expose())
            .json(&body);
        let reply = send_json(SERVICE, request).await?;

        let text = reply
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())
            .map(String::from)
            .ok_or_else(|| LinkEnrichError::Classify(format!("{SERVICE}: reply has no text")))?;
        debug!(chars = text.chars().count(), "model replied");
        Ok(text)
    }
}
