//! REST client for a Notion database acting as the record store.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument, warn};

use linkenrich_shared::{LinkEnrichError, Record, RecordUpdate, Result, StoreSettings};

use crate::RecordStore;
use crate::properties::{decode_page, unprocessed_filter, update_body};

/// User-Agent string for store requests.
const USER_AGENT: &str = concat!("linkenrich/", env!("CARGO_PKG_VERSION"));

/// Largest page size the query endpoint accepts.
const PAGE_SIZE: u32 = 100;

const SERVICE: &str = "notion";

/// One page of a database query reply.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Notion database client.
pub struct NotionStore {
    client: Client,
    settings: StoreSettings,
}

impl NotionStore {
    /// Build the HTTP client with auth and version headers preset.
    pub fn new(settings: &StoreSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", settings.api_key.expose()))
            .map_err(|_| LinkEnrichError::config("store API key is not a valid header value"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            HeaderName::from_static("notion-version"),
            HeaderValue::from_str(&settings.api_version).map_err(|_| {
                LinkEnrichError::config(format!(
                    "invalid store API version '{}'",
                    settings.api_version
                ))
            })?,
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| LinkEnrichError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            settings: settings.clone(),
        })
    }

    /// Query every unprocessed record, following pagination cursors.
    ///
    /// Unlike [`RecordStore::list_unprocessed`], failures are returned so the
    /// caller can tell an outage apart from an empty result.
    #[instrument(skip_all, fields(database_id = %self.settings.database_id))]
    pub async fn try_list_unprocessed(&self) -> Result<Vec<Record>> {
        let url = format!(
            "{}/databases/{}/query",
            self.settings.base_url, self.settings.database_id
        );
        let filter = unprocessed_filter(&self.settings.properties);

        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut body = serde_json::json!({ "filter": filter, "page_size": PAGE_SIZE });
            if let Some(c) = &cursor {
                body["start_cursor"] = Value::String(c.clone());
            }

            let page: QueryResponse = self.send_json(self.client.post(&url).json(&body)).await?;

            debug!(results = page.results.len(), has_more = page.has_more, "query page received");
            records.extend(
                page.results
                    .iter()
                    .filter_map(|p| decode_page(p, &self.settings.properties)),
            );

            match (page.has_more, page.next_cursor) {
                (true, Some(next)) if cursor.as_deref() != Some(next.as_str()) => {
                    cursor = Some(next)
                }
                (true, Some(next)) => {
                    warn!(cursor = %next, "store repeated a pagination cursor, stopping");
                    break;
                }
                _ => break,
            }
        }

        info!(count = records.len(), "fetched unprocessed records");
        Ok(records)
    }

    /// Overwrite the classification fields of one page.
    #[instrument(skip_all, fields(record_id = %id))]
    pub async fn update_page(&self, id: &str, update: &RecordUpdate) -> Result<()> {
        if id.trim().is_empty() {
            return Err(LinkEnrichError::Store("cannot update a page without an id".into()));
        }
        let url = format!("{}/pages/{id}", self.settings.base_url);
        let body = update_body(update, &self.settings.properties);

        let _: Value = self.send_json(self.client.patch(&url).json(&body)).await?;
        debug!("page updated");
        Ok(())
    }

    async fn send_json<T>(&self, request: reqwest::RequestBuilder) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let response = request
            .send()
            .await
            .map_err(|e| LinkEnrichError::Network(format!("{SERVICE}: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LinkEnrichError::Network(format!("{SERVICE}: failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(LinkEnrichError::api(
                SERVICE,
                status.as_u16(),
                error_message(&text),
            ));
        }

        serde_json::from_str(&text)
            .map_err(|e| LinkEnrichError::parse(format!("{SERVICE} response: {e}")))
    }
}

/// Pull `message` out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

#[async_trait]
impl RecordStore for NotionStore {
    async fn list_unprocessed(&self) -> Vec<Record> {
        match self.try_list_unprocessed().await {
            Ok(records) => records,
            Err(e) => {
                // Indistinguishable from "nothing to do" for the caller.
                error!(error = %e, "store query failed");
                Vec::new()
            }
        }
    }

    async fn apply_update(&self, id: &str, update: &RecordUpdate) -> Result<()> {
        self.update_page(id, update).await
    }
}
