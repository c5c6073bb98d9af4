//! URL classification: content-type heuristic, model call, and fallback.
//!
//! This crate provides:
//! - [`url_type`]: lexical content-type detection
//! - [`Classify`] / [`Classifier`]: the never-failing classifier
//! - [`ModelProvider`] backends and the [`create_provider`] factory

mod classifier;
mod content_type;
mod prompt;
pub mod providers;
mod response;

pub use classifier::{Classifier, Classify};
pub use content_type::url_type;
pub use prompt::build_prompt;
pub use providers::{ModelProvider, create_provider};
pub use response::{
    FALLBACK_NOTES, FALLBACK_TITLE, NOTES_MAX_CHARS, TITLE_MAX_CHARS, fallback, fallback_title,
    parse_reply, strip_code_fences,
};
