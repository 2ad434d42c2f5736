pub mod constants;
pub mod config;
pub mod error;
pub mod logging;
pub mod types;

// Ingestion, normalization, derivation and filtering
pub mod pipeline;

// Table-level summaries and source comparison
pub mod analysis;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod infra;

pub mod observability;

pub use error::{ReportError, Result, SkippedSource, SourceError};
pub use pipeline::{IngestOutcome, Pipeline, SourceInput, SourceSelector, TimeWindow};
pub use types::{CanonicalTable, CanonicalTicket, Clock, TicketRecord};
