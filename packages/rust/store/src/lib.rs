//! Record store client: selects unprocessed records and writes results back.
//!
//! This crate provides:
//! - [`RecordStore`]: the store seam the pipeline depends on
//! - [`NotionStore`]: REST implementation against a Notion database
//! - [`extract_url`]: lenient URL resolution for a record

mod notion;
mod properties;

use async_trait::async_trait;

use linkenrich_shared::{Record, RecordUpdate, Result};

pub use notion::NotionStore;
pub use properties::extract_url;

/// Access to the external record store.
///
/// The store is the only durable state; implementations hold no state of
/// their own across calls.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Records whose title OR notes is empty, in the store's order.
    ///
    /// Query failures are logged and yield an empty list.
    async fn list_unprocessed(&self) -> Vec<Record>;

    /// The record's URL, or `None` if it is absent or unusable.
    fn extract_url(&self, record: &Record) -> Option<String> {
        extract_url(record)
    }

    /// Overwrite title, category, content type, notes and date of one record.
    async fn apply_update(&self, id: &str, update: &RecordUpdate) -> Result<()>;
}
