use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, instrument};

use linkenrich_shared::{LinkEnrichError, ModelSettings, Result};

use super::{ModelProvider, http_client, send_json};

const SERVICE: &str = "anthropic";
const API_VERSION: &str = "2023-06-01";

/// Messages API backend.
pub struct AnthropicProvider {
    client: Client,
    settings: ModelSettings,
}

impl AnthropicProvider {
    pub fn new(settings: &ModelSettings) -> Result<Self> {
        Ok(Self {
            client: http_client(settings)?,
            settings: settings.clone(),
        })
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    fn name(&self) -> &str {
        SERVICE
    }

    #[instrument(skip_all, fields(model = %self.settings.model))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/messages", self.settings.base_url);
        let body = json!({
            "model": self.settings.model,
            "max_tokens": self.settings.max_tokens,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let request = self
            .client
            .post(&url)
            .header("x-api-key", self.settings.api_key.expose())
            .header("anthropic-version", API_VERSION)
            .json(&body);
        let reply = send_json(SERVICE, request).await?;

        let text = reply_text(&reply)
            .ok_or_else(|| LinkEnrichError::Classify(format!("{SERVICE}: reply has no text")))?;
        debug!(chars = text.chars().count(), "model replied");
        Ok(text)
    }
}

/// Concatenate every `text` block of the reply content.
fn reply_text(reply: &Value) -> Option<String> {
    let text: String = reply
        .get("content")?
        .as_array()?
        .iter()
        .filter(|block| block.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|block| block.get("text").and_then(Value::as_str))
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use linkenrich_shared::{ProviderKind, Secret};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn settings(base_url: &str) -> ModelSettings {
        ModelSettings {
            provider: ProviderKind::Anthropic,
            api_key: Secret::new("sk-ant-test"),
            model: "claude-test".into(),
            base_url: base_url.into(),
            max_tokens: 1000,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn sends_messages_request() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({
                "model": "claude-test",
                "max_tokens": 1000,
                "messages": [{ "role": "user", "content": "hello" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [
                    { "type": "text", "text": "{\"title\": " },
                    { "type": "tool_use", "id": "x" },
                    { "type": "text", "text": "\"T\"}" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = AnthropicProvider::new(&settings(&server.uri())).unwrap();
        assert_eq!(provider.complete("hello").await.unwrap(), "{\"title\": \"T\"}");
    }

    #[tokio::test]
    async fn error_status_is_api_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(529).set_body_json(json!({
                "type": "error",
                "error": { "type": "overloaded_error", "message": "Overloaded" }
            })))
            .mount(&server)
            .await;

        let provider = AnthropicProvider::new(&settings(&server.uri())).unwrap();
        let err = provider.complete("hello").await.unwrap_err();
        assert!(matches!(err, LinkEnrichError::Api { status: 529, .. }));
        assert!(err.to_string().contains("Overloaded"));
    }

    #[tokio::test]
    async fn empty_content_is_classify_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": [] })))
            .mount(&server)
            .await;

        let provider = AnthropicProvider::new(&settings(&server.uri())).unwrap();
        let err = provider.complete("hello").await.unwrap_err();
        assert!(matches!(err, LinkEnrichError::Classify(_)));
    }
}
