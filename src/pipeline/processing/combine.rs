use tracing::debug;

use crate::types::{CanonicalTable, CanonicalTicket, NormalizedTable};

/// A normalized table paired with the label of the file it came from
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledTable {
    pub label: String,
    pub table: NormalizedTable,
}

impl LabeledTable {
    pub fn new(label: impl Into<String>, table: NormalizedTable) -> Self {
        Self {
            label: label.into(),
            table,
        }
    }
}

/// Stamp every row with its source label and concatenate in upload order.
/// Rows keep their order within a source; nothing is deduplicated.
pub fn combine(sources: Vec<LabeledTable>) -> CanonicalTable {
    let total: usize = sources.iter().map(|s| s.table.len()).sum();
    let mut rows = Vec::with_capacity(total);
    let mut labels: Vec<String> = Vec::with_capacity(sources.len());

    for LabeledTable { label, table } in sources {
        debug!(source = %label, rows = table.len(), "Combining source");
        rows.extend(
            table
                .records
                .into_iter()
                .map(|record| CanonicalTicket::stamped(label.clone(), record)),
        );
        if !labels.contains(&label) {
            labels.push(label);
        }
    }

    CanonicalTable::from_parts(rows, labels)
}
