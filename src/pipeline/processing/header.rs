use crate::constants::HEADER_MARKERS;
use crate::error::SourceError;
use crate::types::{Cell, RawTable};

/// A raw table split at its header row
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderedTable<'a> {
    /// Index of the header row within the raw table
    pub header_index: usize,
    /// Header cell values as written, not yet cleaned
    pub headers: Vec<String>,
    /// Every row below the header
    pub rows: &'a [Vec<Cell>],
}

/// Find the first row whose first cell is `#` or `Ticket` (trimmed, any case)
pub fn locate_header(table: &RawTable) -> Result<usize, SourceError> {
    table
        .rows
        .iter()
        .position(|row| row.first().is_some_and(is_header_marker))
        .ok_or(SourceError::HeaderNotFound)
}

fn is_header_marker(cell: &Cell) -> bool {
    let value = cell.to_string().trim().to_lowercase();
    HEADER_MARKERS.contains(&value.as_str())
}

/// Locate the header and take its cells as column names. Rows above it are discarded.
pub fn split_at_header(table: &RawTable) -> Result<HeaderedTable<'_>, SourceError> {
    let header_index = locate_header(table)?;
    let headers = table.rows[header_index]
        .iter()
        .map(|cell| cell.to_string())
        .collect();

    Ok(HeaderedTable {
        header_index,
        headers,
        rows: &table.rows[header_index + 1..],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_padded_ticket_marker() {
        let table = RawTable::from_text_rows(vec![
            vec!["IT Service Desk Export", ""],
            vec!["Generated 2025-03-01", ""],
            vec!["", ""],
            vec![" Ticket ", "Request time"],
            vec!["1001", "2025-03-01 09:00"],
        ]);

        assert_eq!(locate_header(&table), Ok(3));
    }

    #[test]
    fn test_hash_marker_and_first_match_wins() {
        let table = RawTable::from_text_rows(vec![
            vec!["#", "Request time"],
            vec!["TICKET", "Request time"],
        ]);

        assert_eq!(locate_header(&table), Ok(0));
    }

    #[test]
    fn test_only_first_cell_is_inspected() {
        let table = RawTable::from_text_rows(vec![vec!["Request time", "Ticket"]]);
        assert_eq!(locate_header(&table), Err(SourceError::HeaderNotFound));
    }

    #[test]
    fn test_marker_must_match_exactly() {
        let table = RawTable::from_text_rows(vec![vec!["Ticket ID", "x"], vec!["#1", "y"]]);
        assert_eq!(locate_header(&table), Err(SourceError::HeaderNotFound));
    }

    #[test]
    fn test_empty_table_has_no_header() {
        assert_eq!(
            locate_header(&RawTable::default()),
            Err(SourceError::HeaderNotFound)
        );
    }

    #[test]
    fn test_split_skips_rows_above_header() {
        let table = RawTable::from_text_rows(vec![
            vec!["Report title", ""],
            vec!["#", "Request time"],
            vec!["1", "2025-01-01"],
            vec!["2", "2025-01-02"],
        ]);

        let split = split_at_header(&table).unwrap();
        assert_eq!(split.header_index, 1);
        assert_eq!(split.headers, vec!["#", "Request time"]);
        assert_eq!(split.rows.len(), 2);
    }
}
