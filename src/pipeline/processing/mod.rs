// Pipeline processing: header detection, normalization, combining and derived metrics

pub mod header;
pub mod normalize;
pub mod combine;
pub mod enrich;
pub mod quality_gate;

pub use combine::{combine, LabeledTable};
pub use enrich::{DefaultMetricDeriver, MetricDeriver};
pub use header::{locate_header, split_at_header, HeaderedTable};
pub use normalize::{DefaultSchemaNormalizer, SchemaNormalizer};
pub use quality_gate::{DefaultQualityGate, QualityGate, QualityReport};
