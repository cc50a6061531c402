//! Normalizes directories of JSON documents into the record schema expected
//! by vector-database ingestion.
//!
//! The entry point is [`pipeline::Normalizer`]: it wraps each document under
//! a collection identifier, runs every record through the flattener and the
//! [`rules::RuleSet`], and rewrites a file only when something changed.

pub mod changes;
pub mod checks;
pub mod config;
pub mod document;
pub mod error;
pub mod flatten;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod rules;
pub mod summary;

pub use config::{Defaults, NormalizerConfig};
pub use error::NormalizeError;
pub use pipeline::Normalizer;
pub use summary::{FileOutcome, FileReport, RunSummary};
