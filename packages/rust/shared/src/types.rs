//! Core domain types for link enrichment.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ContentType
// ---------------------------------------------------------------------------

/// Coarse content kind, derived from the URL text alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    Video,
    News,
    Blog,
    Article,
}

impl ContentType {
    /// Select option name written to the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "Video",
            Self::News => "News",
            Self::Blog => "Blog",
            Self::Article => "Article",
        }
    }

    /// Parse a store label (case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "video" | "youtube" => Some(Self::Video),
            "news" => Some(Self::News),
            "blog" => Some(Self::Blog),
            "article" => Some(Self::Article),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Topic category. Closed set; anything unrecognised is [`Category::Other`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Development,
    Design,
    Marketing,
    #[serde(rename = "AI/ML")]
    AiMl,
    Business,
    Lifestyle,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Self::Development,
        Self::Design,
        Self::Marketing,
        Self::AiMl,
        Self::Business,
        Self::Lifestyle,
        Self::Other,
    ];

    /// Select option name written to the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "Development",
            Self::Design => "Design",
            Self::Marketing => "Marketing",
            Self::AiMl => "AI/ML",
            Self::Business => "Business",
            Self::Lifestyle => "Lifestyle",
            Self::Other => "Other",
        }
    }

    /// Map free-form model output onto the closed set.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_lowercase();
        match normalized.as_str() {
            "development" | "dev" | "programming" | "engineering" => Self::Development,
            "design" => Self::Design,
            "marketing" => Self::Marketing,
            "ai/ml" | "ai" | "ml" | "ai / ml" | "machine learning" => Self::AiMl,
            "business" => Self::Business,
            "lifestyle" => Self::Lifestyle,
            _ => Self::Other,
        }
    }

    /// Labels joined with `|`, as shown to the model.
    pub fn prompt_choices() -> String {
        Self::ALL
            .iter()
            .map(Category::as_str)
            .collect::<Vec<_>>()
            .join("|")
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One tracked link as read from the external store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Opaque store identifier.
    pub id: String,
    /// Raw URL value, if the URL property exists and has the right type.
    pub url: Option<String>,
    pub title: String,
    /// Raw category label as stored (may be outside the closed set).
    pub category: Option<String>,
    pub content_type: Option<ContentType>,
    pub notes: String,
    pub date_classified: Option<NaiveDate>,
}

impl Record {
    /// A record needs enrichment while its title OR its notes is empty.
    ///
    /// Mirrors the store's `is_empty` filter, so whitespace counts as content.
    pub fn is_unprocessed(&self) -> bool {
        self.title.is_empty() || self.notes.is_empty()
    }
}

/// Fields written back to the store for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordUpdate {
    pub title: String,
    pub category: Category,
    pub content_type: ContentType,
    pub notes: String,
    pub date: NaiveDate,
}

impl RecordUpdate {
    pub fn from_classification(classification: &Classification, date: NaiveDate) -> Self {
        Self {
            title: classification.title.clone(),
            category: classification.category,
            content_type: classification.content_type,
            notes: classification.notes.clone(),
            date,
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Where a classification's title/category/notes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationSource {
    Model,
    Fallback,
}

/// Result of classifying one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub title: String,
    pub category: Category,
    pub content_type: ContentType,
    pub notes: String,
    pub source: ClassificationSource,
}
