//! Shared labels used across ingestion, filtering and the CLI

// Worksheets that hold ticket rows, matched case-insensitively
pub const DATA_SHEET: &str = "Data";
pub const REPORT_SHEET: &str = "Report";

// First-cell values that mark the header row, compared lowercased
pub const HEADER_MARKERS: [&str; 2] = ["#", "ticket"];

// Source selector meaning "every uploaded file"
pub const ALL_REPORTS: &str = "All Reports";

// Time window labels
pub const ALL_TIME: &str = "All Time";
pub const LAST_90_DAYS: &str = "Last 90 Days";
pub const LAST_30_DAYS: &str = "Last 30 Days";
pub const LAST_7_DAYS: &str = "Last 7 Days";

// File extensions handled by the workbook reader
pub const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];
pub const CSV_EXTENSION: &str = "csv";

/// Default worksheet names, in preference order
pub fn default_sheet_names() -> Vec<String> {
    vec![DATA_SHEET.to_string(), REPORT_SHEET.to_string()]
}
