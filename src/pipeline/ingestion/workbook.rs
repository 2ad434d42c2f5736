use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use tracing::debug;

use crate::error::SourceError;
use crate::types::{Cell, RawTable};

/// Read the ticket worksheet of a workbook held in memory.
/// Returns the chosen sheet name with its rows.
pub fn read_workbook(
    bytes: Vec<u8>,
    sheet_names: &[String],
) -> Result<(String, RawTable), SourceError> {
    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(SourceError::unreadable)?;

    let available = workbook.sheet_names();
    let sheet = select_worksheet(&available, sheet_names)
        .ok_or_else(|| SourceError::NoMatchingWorksheet {
            available: available.clone(),
        })?
        .to_string();
    debug!(sheet = %sheet, "Selected worksheet");

    let range = workbook
        .worksheet_range(&sheet)
        .map_err(SourceError::unreadable)?;
    Ok((sheet, range_to_table(&range)))
}

/// First sheet, in workbook order, whose name matches one of `wanted` ignoring case
pub fn select_worksheet<'a>(available: &'a [String], wanted: &[String]) -> Option<&'a str> {
    available
        .iter()
        .find(|name| {
            wanted
                .iter()
                .any(|w| w.trim().eq_ignore_ascii_case(name.trim()))
        })
        .map(String::as_str)
}

/// Convert a used range to rows anchored at cell A1, so the first cell of
/// each row is always column A even when leading rows or columns are blank.
fn range_to_table(range: &Range<Data>) -> RawTable {
    let (first_row, first_col) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));

    let mut rows: Vec<Vec<Cell>> = vec![Vec::new(); first_row];
    for source_row in range.rows() {
        let mut row = vec![Cell::Empty; first_col];
        row.extend(source_row.iter().map(to_cell));
        rows.push(row);
    }
    RawTable::new(rows)
}

fn to_cell(value: &Data) -> Cell {
    match value {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            if s.trim().is_empty() {
                Cell::Empty
            } else {
                Cell::Text(s.clone())
            }
        }
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => Cell::DateTime(datetime),
            None => Cell::Number(dt.as_f64()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::header::locate_header;
    use calamine::{ExcelDateTime, ExcelDateTimeType};
    use chrono::NaiveDate;

    fn excel_date(serial: f64) -> Data {
        Data::DateTime(ExcelDateTime::new(serial, ExcelDateTimeType::DateTime, false))
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_worksheet_ignores_case() {
        let available = names(&["Summary", "data", "Report"]);
        let wanted = names(&["Data", "Report"]);
        assert_eq!(select_worksheet(&available, &wanted), Some("data"));
    }

    #[test]
    fn test_select_worksheet_uses_workbook_order() {
        let available = names(&["Report", "Data"]);
        let wanted = names(&["Data", "Report"]);
        assert_eq!(select_worksheet(&available, &wanted), Some("Report"));
    }

    #[test]
    fn test_no_matching_worksheet() {
        let available = names(&["Sheet1"]);
        assert_eq!(select_worksheet(&available, &names(&["Data"])), None);
    }

    #[test]
    fn test_garbage_bytes_are_unreadable() {
        let err = read_workbook(b"definitely not a zip".to_vec(), &names(&["Data"])).unwrap_err();
        assert!(matches!(err, SourceError::UnreadableFile { .. }));
    }

    #[test]
    fn test_cell_conversion() {
        assert_eq!(to_cell(&Data::Int(1001)), Cell::Number(1001.0));
        assert_eq!(to_cell(&Data::String("  ".to_string())), Cell::Empty);
        assert_eq!(to_cell(&Data::String("#".to_string())), Cell::Text("#".to_string()));
        assert_eq!(to_cell(&Data::Empty), Cell::Empty);
    }

    #[test]
    fn test_datetime_cells_become_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2025, 1, 1).and_then(|d| d.and_hms_opt(12, 0, 0));
        assert_eq!(to_cell(&excel_date(45658.5)), Cell::DateTime(expected.unwrap()));
        assert_eq!(to_cell(&Data::Float(2.5)), Cell::Number(2.5));
    }

    #[test]
    fn test_used_range_is_anchored_at_a1() {
        let mut range: Range<Data> = Range::new((1, 0), (2, 1));
        range.set_value((1, 0), Data::String("#".to_string()));
        range.set_value((1, 1), Data::String("Request time".to_string()));
        range.set_value((2, 0), Data::Int(1001));
        range.set_value((2, 1), excel_date(45658.5));

        let table = range_to_table(&range);
        assert_eq!(table.len(), 3);
        assert!(table.rows[0].is_empty());
        assert_eq!(table.rows[1][0], Cell::Text("#".to_string()));
        assert_eq!(locate_header(&table), Ok(1));
        assert!(matches!(table.rows[2][1], Cell::DateTime(_)));
    }

    #[test]
    fn test_header_outside_column_a_is_not_found() {
        let mut range: Range<Data> = Range::new((2, 1), (3, 2));
        range.set_value((2, 1), Data::String("#".to_string()));
        range.set_value((2, 2), Data::String("Request time".to_string()));
        range.set_value((3, 1), Data::Int(1));
        range.set_value((3, 2), Data::String("2025-01-01".to_string()));

        let table = range_to_table(&range);
        assert_eq!(table.len(), 4);
        assert_eq!(
            table.rows[2],
            vec![
                Cell::Empty,
                Cell::Text("#".to_string()),
                Cell::Text("Request time".to_string()),
            ]
        );
        assert_eq!(locate_header(&table), Err(SourceError::HeaderNotFound));
    }
}
