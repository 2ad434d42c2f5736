// Data processing pipeline: ingestion, processing, and filtering

pub mod filters;
pub mod ingestion;
pub mod pipeline;
pub mod processing;

// Re-export key types from each stage
pub use filters::{filter_by_source, filter_by_time, SourceSelector, TimeWindow};
pub use ingestion::{RawSource, SourceInput, SourceLoader};
pub use pipeline::{IngestOutcome, LoadedSource, Pipeline, SourceTable};
