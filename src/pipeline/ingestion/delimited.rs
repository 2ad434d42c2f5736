use csv::ReaderBuilder;

use crate::error::SourceError;
use crate::types::{Cell, RawTable};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Read CSV bytes into raw rows. The first line is data like any other; rows may be ragged.
pub fn read_csv(bytes: &[u8]) -> Result<RawTable, SourceError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(SourceError::unreadable)?;
        rows.push(
            record
                .iter()
                .map(|value| {
                    if value.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(value.to_string())
                    }
                })
                .collect(),
        );
    }
    Ok(RawTable::new(rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ragged_rows_and_bom() {
        let table = read_csv(b"\xEF\xBB\xBFTitle line\n#,Request time\n1,2025-01-01,extra\n").unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[0], vec![Cell::Text("Title line".to_string())]);
        assert_eq!(table.rows[1][0], Cell::Text("#".to_string()));
        assert_eq!(table.rows[2].len(), 3);
    }

    #[test]
    fn test_quoted_fields_and_blanks() {
        let table = read_csv(b"Ticket,Title\n7,\"Printer, 3rd floor\"\n8,  \n").unwrap();
        assert_eq!(table.rows[1][1], Cell::Text("Printer, 3rd floor".to_string()));
        assert_eq!(table.rows[2][1], Cell::Empty);
    }

    #[test]
    fn test_invalid_utf8_is_unreadable() {
        let err = read_csv(b"Ticket\n\xFF\xFE\n").unwrap_err();
        assert!(matches!(err, SourceError::UnreadableFile { .. }));
    }
}
