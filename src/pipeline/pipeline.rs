use std::time::Instant;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{ReportError, Result, SkippedSource, SourceError};
use crate::observability::metrics;
use crate::pipeline::ingestion::{
    disambiguate_labels, RawSource, SourceFormat, SourceInput, SourceLoader,
};
use crate::pipeline::processing::{
    combine, split_at_header, DefaultMetricDeriver, DefaultQualityGate, DefaultSchemaNormalizer,
    LabeledTable, QualityGate, QualityReport, SchemaNormalizer,
};
use crate::types::{CanonicalTable, Clock, NormalizedTable};

/// One source's normalized, derived rows, kept apart for side-by-side comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceTable {
    pub label: String,
    pub table: NormalizedTable,
}

/// Bookkeeping for a source that made it into the combined table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedSource {
    pub label: String,
    pub sheet: Option<String>,
    pub fingerprint: String,
    pub format: SourceFormat,
    /// Header row position in the raw sheet
    pub header_row: usize,
    pub rows: usize,
}

/// Result of one ingestion run
#[derive(Debug, Clone, Serialize)]
pub struct IngestOutcome {
    pub run_id: Uuid,
    /// The instant used for aging; every row of the run shares it
    pub derived_at: NaiveDateTime,
    pub table: CanonicalTable,
    #[serde(skip)]
    pub per_source: Vec<SourceTable>,
    pub loaded: Vec<LoadedSource>,
    pub skipped: Vec<SkippedSource>,
    pub quality: QualityReport,
}

/// Ingests a batch of uploads into one canonical table.
///
/// Sources fail independently: a file that cannot be read, has no header
/// row, or lacks both key columns is skipped and reported, while the rest of
/// the batch proceeds. The run only fails when nothing usable remains.
pub struct Pipeline {
    loader: SourceLoader,
    normalizer: Box<dyn SchemaNormalizer>,
    gate: Box<dyn QualityGate>,
    clock: Clock,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(SourceLoader::default())
    }
}

impl Pipeline {
    pub fn new(loader: SourceLoader) -> Self {
        Self {
            loader,
            normalizer: Box::new(DefaultSchemaNormalizer::new()),
            gate: Box::new(DefaultQualityGate::new()),
            clock: Clock::System,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(SourceLoader::new(config.ingest.sheet_names.clone()))
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_normalizer(mut self, normalizer: Box<dyn SchemaNormalizer>) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Read and ingest files from disk
    pub fn run(&self, inputs: &[SourceInput]) -> Result<IngestOutcome> {
        let started = Instant::now();
        let mut inputs = inputs.to_vec();
        disambiguate_labels(inputs.iter_mut().map(|input| &mut input.label));

        let mut raw = Vec::with_capacity(inputs.len());
        let mut skipped = Vec::new();
        for input in &inputs {
            match self.loader.load(input) {
                Ok(source) => raw.push(source),
                Err(reason) => skipped.push(Self::skip(&input.label, reason)),
            }
        }

        let outcome = self.ingest(raw, skipped);
        metrics::ingest::duration_recorded(started.elapsed().as_secs_f64());
        outcome
    }

    /// Ingest sources already read into memory
    pub fn run_raw(&self, mut sources: Vec<RawSource>) -> Result<IngestOutcome> {
        disambiguate_labels(sources.iter_mut().map(|source| &mut source.label));
        self.ingest(sources, Vec::new())
    }

    fn ingest(
        &self,
        sources: Vec<RawSource>,
        mut skipped: Vec<SkippedSource>,
    ) -> Result<IngestOutcome> {
        let run_id = Uuid::new_v4();
        info!(%run_id, sources = sources.len() + skipped.len(), "Starting ingestion");

        let mut normalized = Vec::with_capacity(sources.len());
        let mut loaded = Vec::with_capacity(sources.len());
        for source in sources {
            match self.normalize_source(&source) {
                Ok((header_row, table)) => {
                    metrics::ingest::source_loaded(source.format.as_str());
                    loaded.push(LoadedSource {
                        label: source.label.clone(),
                        sheet: source.sheet.clone(),
                        fingerprint: source.fingerprint.clone(),
                        format: source.format,
                        header_row,
                        rows: table.len(),
                    });
                    normalized.push(LabeledTable::new(source.label, table));
                }
                Err(reason) => skipped.push(Self::skip(&source.label, reason)),
            }
        }

        if normalized.is_empty() {
            warn!(%run_id, skipped = skipped.len(), "No usable sources in batch");
            return Err(ReportError::NoUsableData { skipped });
        }

        // One reading of the clock for the whole run
        let deriver = DefaultMetricDeriver::from_clock(&self.clock);
        let derived_at = deriver.now;

        let per_source: Vec<SourceTable> = normalized
            .iter()
            .map(|s| {
                let mut table = s.table.clone();
                deriver.derive_normalized(&mut table);
                SourceTable {
                    label: s.label.clone(),
                    table,
                }
            })
            .collect();

        let mut table = combine(normalized);
        deriver.derive_table(&mut table);
        metrics::quality::rows_derived(table.len());

        let quality = self.gate.assess(&table);
        info!(
            %run_id,
            rows = table.len(),
            loaded = loaded.len(),
            skipped = skipped.len(),
            findings = quality.findings.len(),
            "Ingestion finished"
        );

        Ok(IngestOutcome {
            run_id,
            derived_at,
            table,
            per_source,
            loaded,
            skipped,
            quality,
        })
    }

    #[instrument(skip(self, source), fields(source = %source.label))]
    fn normalize_source(
        &self,
        source: &RawSource,
    ) -> std::result::Result<(usize, NormalizedTable), SourceError> {
        let headered = split_at_header(&source.table)?;
        debug!(header_row = headered.header_index, "Located header row");
        let table = self.normalizer.normalize(&headered)?;
        info!(rows = table.len(), "Normalized source");
        Ok((headered.header_index, table))
    }

    fn skip(label: &str, reason: SourceError) -> SkippedSource {
        warn!(source = %label, reason = reason.code(), "Skipping source: {}", reason);
        metrics::ingest::source_skipped(reason.code());
        SkippedSource {
            label: label.to_string(),
            reason,
        }
    }
}
