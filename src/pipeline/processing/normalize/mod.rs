pub mod coerce;
pub mod mapping;

use tracing::{debug, warn};

use crate::error::SourceError;
use crate::observability::metrics;
use crate::pipeline::processing::header::HeaderedTable;
use crate::types::{CanonicalField, Cell, NormalizedTable, TicketRecord};

pub use mapping::{clean_header, ColumnMapping, ResolvedColumns};

/// Trait for turning a headered raw table into canonical ticket rows
pub trait SchemaNormalizer: Send + Sync {
    fn normalize(&self, table: &HeaderedTable<'_>) -> Result<NormalizedTable, SourceError>;
}

/// Normalizer driven by an ordered column mapping
#[derive(Debug, Clone, Default)]
pub struct DefaultSchemaNormalizer {
    pub mapping: ColumnMapping,
}

impl DefaultSchemaNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mapping(mapping: ColumnMapping) -> Self {
        Self { mapping }
    }

    fn build_record(&self, row: &[Cell], columns: &ResolvedColumns) -> TicketRecord {
        let mut record = TicketRecord::default();

        for (field, index) in &columns.fields {
            let cell = row.get(*index).unwrap_or(&Cell::Empty);
            match field {
                CanonicalField::RequestTime => record.request_time = coerce::parse_timestamp(cell),
                CanonicalField::CloseTime => record.close_time = coerce::parse_timestamp(cell),
                CanonicalField::DueDate => record.due_date = coerce::parse_timestamp(cell),
                CanonicalField::Sla => record.sla = coerce::extract_sla(cell),
                CanonicalField::Ticket => record.ticket = cell.text(),
                CanonicalField::Category => record.category = cell.text(),
                CanonicalField::SubCategory => record.sub_category = cell.text(),
                CanonicalField::ProcessManager => record.process_manager = cell.text(),
                CanonicalField::Status => record.status = cell.text(),
                CanonicalField::Priority => record.priority = cell.text(),
                CanonicalField::Urgency => record.urgency = cell.text(),
                CanonicalField::RequestUser => record.request_user = cell.text(),
                CanonicalField::Title => record.title = cell.text(),
            }
        }

        for (index, name) in &columns.unmapped {
            if let Some(value) = row.get(*index).and_then(Cell::text) {
                record.extra.insert(name.clone(), value);
            }
        }

        record
    }
}

impl SchemaNormalizer for DefaultSchemaNormalizer {
    fn normalize(&self, table: &HeaderedTable<'_>) -> Result<NormalizedTable, SourceError> {
        let columns = self.mapping.resolve(&table.headers);

        if !columns.has(CanonicalField::Ticket) && !columns.has(CanonicalField::RequestTime) {
            return Err(SourceError::MissingRequiredColumns {
                found: table
                    .headers
                    .iter()
                    .map(|h| clean_header(h))
                    .filter(|h| !h.is_empty())
                    .collect(),
            });
        }

        for (field, index) in &columns.fields {
            debug!(field = %field, column = %clean_header(&table.headers[*index]), "Mapped column");
        }
        for index in &columns.superseded {
            warn!(
                column = %clean_header(&table.headers[*index]),
                "Column superseded by a later mapping for the same field"
            );
        }

        let mut records = Vec::with_capacity(table.rows.len());
        let mut dropped = 0;
        for row in table.rows {
            let record = self.build_record(row, &columns);
            if record.is_blank() {
                dropped += 1;
                continue;
            }
            records.push(record);
        }

        if dropped > 0 {
            debug!("Dropped {} empty rows", dropped);
        }
        metrics::normalize::rows_normalized(records.len());
        metrics::normalize::rows_dropped_empty(dropped);

        // A Ticket column with no values carries nothing; exports always add one
        let ticket_seen = records.iter().any(|r| r.ticket.is_some());
        Ok(NormalizedTable {
            columns: columns
                .fields
                .keys()
                .copied()
                .filter(|f| *f != CanonicalField::Ticket || ticket_seen)
                .collect(),
            extra_columns: columns.unmapped.into_iter().map(|(_, name)| name).collect(),
            records,
        })
    }
}
