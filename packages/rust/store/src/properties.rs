//! Translation between Notion page properties and domain records.
//!
//! Decoding is lenient: each property is read independently, and a property
//! that is missing or has an unexpected shape decodes as empty instead of
//! failing the whole page.

use chrono::NaiveDate;
use serde_json::{Value, json};
use tracing::warn;
use url::Url;

use linkenrich_shared::{ContentType, PropertyNames, Record, RecordUpdate};

/// Filter selecting records whose title OR notes is empty.
pub(crate) fn unprocessed_filter(props: &PropertyNames) -> Value {
    json!({
        "or": [
            { "property": props.title, "title": { "is_empty": true } },
            { "property": props.notes, "rich_text": { "is_empty": true } },
        ]
    })
}

/// Body of a `PATCH /pages/{id}` request.
pub(crate) fn update_body(update: &RecordUpdate, props: &PropertyNames) -> Value {
    let mut properties = serde_json::Map::new();
    properties.insert(
        props.title.clone(),
        json!({ "title": [{ "text": { "content": update.title } }] }),
    );
    properties.insert(
        props.category.clone(),
        json!({ "select": { "name": update.category.as_str() } }),
    );
    properties.insert(
        props.content_type.clone(),
        json!({ "select": { "name": update.content_type.as_str() } }),
    );
    properties.insert(
        props.notes.clone(),
        json!({ "rich_text": [{ "text": { "content": update.notes } }] }),
    );
    properties.insert(
        props.date.clone(),
        json!({ "date": { "start": update.date.format("%Y-%m-%d").to_string() } }),
    );
    json!({ "properties": properties })
}

/// Decode one page object from a query result.
pub(crate) fn decode_page(page: &Value, props: &PropertyNames) -> Option<Record> {
    let Some(id) = page.get("id").and_then(Value::as_str) else {
        warn!("store returned a page without an id, skipping");
        return None;
    };

    let properties = page.get("properties");
    let prop = |name: &str| properties.and_then(|p| p.get(name));

    Some(Record {
        id: id.to_string(),
        url: prop(&props.url).and_then(url_value),
        title: prop(&props.title)
            .map(|p| plain_text(p, "title"))
            .unwrap_or_default(),
        category: prop(&props.category).and_then(select_name),
        content_type: prop(&props.content_type)
            .and_then(select_name)
            .and_then(|name| ContentType::from_label(&name)),
        notes: prop(&props.notes)
            .map(|p| plain_text(p, "rich_text"))
            .unwrap_or_default(),
        date_classified: prop(&props.date).and_then(date_start),
    })
}

/// Resolve a record's URL. `None` when absent, blank, or not an absolute http(s) URL.
pub fn extract_url(record: &Record) -> Option<String> {
    let raw = record.url.as_deref()?.trim();
    if raw.is_empty() {
        return None;
    }
    match Url::parse(raw) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Some(raw.to_string()),
        Ok(_) | Err(_) => {
            warn!(record_id = %record.id, url = raw, "record URL is malformed");
            None
        }
    }
}

fn url_value(prop: &Value) -> Option<String> {
    if prop.get("type").and_then(Value::as_str) != Some("url") {
        return None;
    }
    prop.get("url").and_then(Value::as_str).map(String::from)
}

/// Concatenate `plain_text` of a title / rich_text array.
fn plain_text(prop: &Value, kind: &str) -> String {
    prop.get(kind)
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| {
                    part.get("plain_text")
                        .or_else(|| part.get("text").and_then(|t| t.get("content")))
                        .and_then(Value::as_str)
                })
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn select_name(prop: &Value) -> Option<String> {
    prop.get("select")
        .and_then(|s| s.get("name"))
        .and_then(Value::as_str)
        .map(String::from)
}

fn date_start(prop: &Value) -> Option<NaiveDate> {
    let start = prop.get("date")?.get("start")?.as_str()?;
    // Date-times carry a time suffix; only the calendar date matters here.
    NaiveDate::parse_from_str(start.get(..10).unwrap_or(start), "%Y-%m-%d").ok()
}
