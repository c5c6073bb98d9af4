//! Language-model backends.
//!
//! Each backend turns one prompt into the model's raw text reply. Parsing the
//! reply is not their concern.

mod anthropic;
mod openai;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use linkenrich_shared::{LinkEnrichError, ModelSettings, ProviderKind, Result};

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;

/// User-Agent string for model requests.
const USER_AGENT: &str = concat!("linkenrich/", env!("CARGO_PKG_VERSION"));

/// A model that completes a single text prompt.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Send `prompt` and return the reply text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Build the backend selected by `settings.provider`.
pub fn create_provider(settings: &ModelSettings) -> Result<Box<dyn ModelProvider>> {
    Ok(match settings.provider {
        ProviderKind::Anthropic => Box::new(AnthropicProvider::new(settings)?),
        ProviderKind::OpenAi => Box::new(OpenAiProvider::new(settings)?),
    })
}

fn http_client(settings: &ModelSettings) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(settings.timeout)
        .build()
        .map_err(|e| LinkEnrichError::Network(format!("failed to build HTTP client: {e}")))
}

/// Send a JSON request and decode a JSON reply, mapping failures by kind.
async fn send_json(service: &'static str, request: reqwest::RequestBuilder) -> Result<Value> {
    let response = request
        .send()
        .await
        .map_err(|e| LinkEnrichError::Network(format!("{service}: {e}")))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| LinkEnrichError::Network(format!("{service}: failed to read body: {e}")))?;

    if !status.is_success() {
        return Err(LinkEnrichError::api(
            service,
            status.as_u16(),
            error_message(&text),
        ));
    }

    serde_json::from_str(&text)
        .map_err(|e| LinkEnrichError::parse(format!("{service} response: {e}")))
}

/// Both vendors nest the message under `error.message`.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(String::from)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}
