//! Shared types, error model, and configuration for linkenrich.
//!
//! This crate is the foundation depended on by all other linkenrich crates.
//! It provides:
//! - [`LinkEnrichError`]: the unified error type
//! - Domain types ([`Record`], [`RecordUpdate`], [`Classification`], [`Category`], [`ContentType`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ModelConfig, ModelSettings, PipelineConfig, PropertyNames, ProviderKind,
    RunConfig, Secret, StoreConfig, StoreSettings, config_dir, config_file_path, init_config,
    load_config, load_config_from,
};
pub use error::{LinkEnrichError, Result};
pub use types::{
    Category, Classification, ClassificationSource, ContentType, Record, RecordUpdate,
};
