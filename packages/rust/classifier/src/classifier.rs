use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use linkenrich_shared::Classification;

use crate::prompt::build_prompt;
use crate::providers::ModelProvider;
use crate::response::{fallback, parse_reply};

/// Turns a URL into a classification. Never fails.
#[async_trait]
pub trait Classify: Send + Sync {
    async fn classify(&self, url: &str) -> Classification;
}

/// Model-backed classifier with a heuristic fallback.
pub struct Classifier {
    provider: Box<dyn ModelProvider>,
}

impl Classifier {
    pub fn new(provider: Box<dyn ModelProvider>) -> Self {
        Self { provider }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }
}

#[async_trait]
impl Classify for Classifier {
    #[instrument(skip(self), fields(provider = %self.provider.name()))]
    async fn classify(&self, url: &str) -> Classification {
        let prompt = build_prompt(url);

        let raw = match self.provider.complete(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "model call failed, using fallback");
                return fallback(url);
            }
        };

        match parse_reply(url, &raw) {
            Ok(classification) => {
                debug!(title = %classification.title, category = %classification.category, "classified");
                classification
            }
            Err(e) => {
                warn!(error = %e, "model reply unusable, using fallback");
                fallback(url)
            }
        }
    }
}
