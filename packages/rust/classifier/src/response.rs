//! Model reply parsing, truncation, and the heuristic fallback.

use std::sync::LazyLock;

use percent_encoding::percent_decode_str;
use regex::Regex;
use serde_json::{Map, Value};
use url::Url;

use linkenrich_shared::{
    Category, Classification, ClassificationSource, LinkEnrichError, Result,
};

use crate::content_type::url_type;

/// Longest title written to the store, in characters.
pub const TITLE_MAX_CHARS: usize = 100;

/// Longest notes written to the store, in characters.
pub const NOTES_MAX_CHARS: usize = 500;

/// Title used when the URL has no usable path segment.
pub const FALLBACK_TITLE: &str = "Untitled";

/// Notes written when automatic analysis did not complete.
pub const FALLBACK_NOTES: &str =
    "Automatic analysis did not complete. Please add a summary manually.";

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```(?:json)?").expect("code fence pattern is valid"));

/// Remove every markdown code-fence marker and surrounding whitespace.
pub fn strip_code_fences(raw: &str) -> String {
    CODE_FENCE.replace_all(raw.trim(), "").trim().to_string()
}

/// Last non-empty path segment of `url`, percent-decoded, or [`FALLBACK_TITLE`].
pub fn fallback_title(url: &str) -> String {
    let segment = match Url::parse(url) {
        Ok(parsed) => parsed.path_segments().and_then(|segments| {
            segments
                .map(decode_segment)
                .filter(|s| !s.trim().is_empty())
                .last()
        }),
        Err(_) => url
            .split('/')
            .map(decode_segment)
            .filter(|s| !s.trim().is_empty())
            .last(),
    };

    match segment {
        Some(s) => truncate_chars(&s, TITLE_MAX_CHARS),
        None => FALLBACK_TITLE.to_string(),
    }
}

fn decode_segment(segment: &str) -> String {
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}

/// The AI-independent classification for `url`.
pub fn fallback(url: &str) -> Classification {
    Classification {
        title: fallback_title(url),
        category: Category::Other,
        content_type: url_type(url),
        notes: FALLBACK_NOTES.to_string(),
        source: ClassificationSource::Fallback,
    }
}

/// Turn the model's raw text into a classification.
///
/// Fails only when the text is not a JSON object; individual fields that are
/// missing, blank, or not strings fall back one by one.
pub fn parse_reply(url: &str, raw: &str) -> Result<Classification> {
    let cleaned = strip_code_fences(raw);
    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|e| LinkEnrichError::parse(format!("model reply is not JSON: {e}")))?;
    let Value::Object(obj) = value else {
        return Err(LinkEnrichError::parse("model reply is not a JSON object"));
    };

    let title = string_field(&obj, "title")
        .map(|t| truncate_chars(t, TITLE_MAX_CHARS))
        .unwrap_or_else(|| fallback_title(url));
    let category = string_field(&obj, "category")
        .map(Category::from_label)
        .unwrap_or_default();
    let notes = string_field(&obj, "notes")
        .map(|n| truncate_chars(n, NOTES_MAX_CHARS))
        .unwrap_or_else(|| FALLBACK_NOTES.to_string());

    Ok(Classification {
        title,
        category,
        content_type: url_type(url),
        notes,
        source: ClassificationSource::Model,
    })
}

fn string_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Keep at most `max` characters (Unicode scalar values, not bytes).
fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
