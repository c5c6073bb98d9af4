//! Application configuration for linkenrich.
//!
//! User config lives at `~/.linkenrich/linkenrich.toml`. The file only names
//! the environment variables that carry credentials; [`RunConfig::resolve`]
//! reads them once, validates that nothing is missing, and produces the
//! immutable values handed to each component.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LinkEnrichError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "linkenrich.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".linkenrich";

// ---------------------------------------------------------------------------
// Config structs (matching linkenrich.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Record store (Notion) settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Language model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Pipeline pacing.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Name of the env var holding the store API key.
    #[serde(default = "default_store_key_env")]
    pub api_key_env: String,

    /// Name of the env var holding the collection (database) identifier.
    #[serde(default = "default_database_id_env")]
    pub database_id_env: String,

    /// Store API base URL.
    #[serde(default = "default_store_base_url")]
    pub base_url: String,

    /// Value sent in the `Notion-Version` header.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Transport timeout for store calls, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Column names in the store collection.
    #[serde(default)]
    pub properties: PropertyNames,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_store_key_env(),
            database_id_env: default_database_id_env(),
            base_url: default_store_base_url(),
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
            properties: PropertyNames::default(),
        }
    }
}

fn default_store_key_env() -> String {
    "NOTION_API_KEY".into()
}
fn default_database_id_env() -> String {
    "NOTION_DATABASE_ID".into()
}
fn default_store_base_url() -> String {
    "https://api.notion.com/v1".into()
}
fn default_api_version() -> String {
    "2022-06-28".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[store.properties]` section: the collection's column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyNames {
    #[serde(default = "default_title_prop")]
    pub title: String,
    #[serde(default = "default_url_prop")]
    pub url: String,
    #[serde(default = "default_category_prop")]
    pub category: String,
    #[serde(default = "default_content_type_prop")]
    pub content_type: String,
    #[serde(default = "default_notes_prop")]
    pub notes: String,
    #[serde(default = "default_date_prop")]
    pub date: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            title: default_title_prop(),
            url: default_url_prop(),
            category: default_category_prop(),
            content_type: default_content_type_prop(),
            notes: default_notes_prop(),
            date: default_date_prop(),
        }
    }
}

fn default_title_prop() -> String {
    "Title".into()
}
fn default_url_prop() -> String {
    "URL".into()
}
fn default_category_prop() -> String {
    "Category".into()
}
fn default_content_type_prop() -> String {
    "Type".into()
}
fn default_notes_prop() -> String {
    "Notes".into()
}
fn default_date_prop() -> String {
    "Date Added".into()
}

/// Which model API classifies the links.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    #[serde(alias = "claude")]
    Anthropic,
    #[serde(rename = "openai", alias = "gpt")]
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
        }
    }

    /// Env var read when `api_key_env` is not set.
    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Anthropic => "claude-sonnet-4-20250514",
            Self::OpenAi => "gpt-4o-mini",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Anthropic => "https://api.anthropic.com",
            Self::OpenAi => "https://api.openai.com",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `[model]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider variant.
    #[serde(default)]
    pub provider: ProviderKind,

    /// Name of the env var holding the model API key (provider default if unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Model identifier (provider default if unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// API base URL (provider default if unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Upper bound on generated tokens.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-classification timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            api_key_env: None,
            model: None,
            base_url: None,
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_max_tokens() -> u32 {
    1000
}

impl ModelConfig {
    /// Env var name actually consulted for the API key.
    pub fn api_key_env(&self) -> &str {
        self.api_key_env
            .as_deref()
            .unwrap_or_else(|| self.provider.default_api_key_env())
    }
}

/// `[pipeline]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pause between records, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
        }
    }
}

fn default_delay_ms() -> u64 {
    1000
}

// ---------------------------------------------------------------------------
// Resolved runtime settings
// ---------------------------------------------------------------------------

/// A credential read from the environment. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Everything the store client needs.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub api_key: Secret,
    pub database_id: String,
    pub base_url: String,
    pub api_version: String,
    pub timeout: Duration,
    pub properties: PropertyNames,
}

/// Everything a model provider needs.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub provider: ProviderKind,
    pub api_key: Secret,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// Validated configuration for one enrichment run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub store: StoreSettings,
    pub model: ModelSettings,
    /// Pacing delay between records.
    pub delay: Duration,
}

impl RunConfig {
    /// Resolve credentials from the process environment.
    pub fn resolve(config: &AppConfig) -> Result<Self> {
        Self::resolve_with(config, |name| std::env::var(name).ok())
    }

    /// Resolve credentials through `lookup`. Every missing or empty variable
    /// is reported in one error.
    pub fn resolve_with<F>(config: &AppConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();

        let store_key = required(&lookup, &config.store.api_key_env, &mut missing);
        let database_id = required(&lookup, &config.store.database_id_env, &mut missing);
        let model_key = required(&lookup, config.model.api_key_env(), &mut missing);

        match (store_key, database_id, model_key) {
            (Some(store_key), Some(database_id), Some(model_key)) => Ok(Self {
                store: StoreSettings::build(&config.store, store_key, database_id),
                model: ModelSettings::build(&config.model, model_key),
                delay: Duration::from_millis(config.pipeline.delay_ms),
            }),
            _ => Err(missing_error(&missing)),
        }
    }
}

impl StoreSettings {
    /// Resolve only the store settings (used by the read-only `pending` command).
    pub fn resolve_with<F>(config: &StoreConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let api_key = required(&lookup, &config.api_key_env, &mut missing);
        let database_id = required(&lookup, &config.database_id_env, &mut missing);
        match (api_key, database_id) {
            (Some(api_key), Some(database_id)) => Ok(Self::build(config, api_key, database_id)),
            _ => Err(missing_error(&missing)),
        }
    }

    fn build(config: &StoreConfig, api_key: String, database_id: String) -> Self {
        Self {
            api_key: Secret::new(api_key),
            database_id,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            properties: config.properties.clone(),
        }
    }
}

impl ModelSettings {
    /// Resolve only the model settings (used by the single-URL `classify` command).
    pub fn resolve_with<F>(config: &ModelConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        match required(&lookup, config.api_key_env(), &mut missing) {
            Some(key) => Ok(Self::build(config, key)),
            None => Err(missing_error(&missing)),
        }
    }

    fn build(config: &ModelConfig, api_key: String) -> Self {
        let provider = config.provider;
        Self {
            provider,
            api_key: Secret::new(api_key),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| provider.default_model().to_string()),
            base_url: config
                .base_url
                .as_deref()
                .unwrap_or(provider.default_base_url())
                .trim_end_matches('/')
                .to_string(),
            max_tokens: config.max_tokens,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

fn required<F>(lookup: &F, name: &str, missing: &mut Vec<String>) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Some(value),
        _ => {
            missing.push(name.to_string());
            None
        }
    }
}

fn missing_error(missing: &[String]) -> LinkEnrichError {
    LinkEnrichError::config(format!(
        "missing required environment variables: {}",
        missing.join(", ")
    ))
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.linkenrich/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| LinkEnrichError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.linkenrich/linkenrich.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| LinkEnrichError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        LinkEnrichError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| LinkEnrichError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| LinkEnrichError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| LinkEnrichError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
