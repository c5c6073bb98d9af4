//! Pipeline orchestration for linkenrich.
//!
//! This crate ties the record store and the classifier together into the
//! enrichment run ([`run`]) and defines the observer seam used to report it.

pub mod pipeline;

pub use pipeline::{
    PipelineObserver, PipelineSettings, RecordOutcome, RecordStatus, RunSummary, SilentObserver,
    run,
};
