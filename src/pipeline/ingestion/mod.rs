// Pipeline ingestion: reading uploaded files into raw, header-less tables

pub mod delimited;
pub mod workbook;

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::constants;
use crate::error::SourceError;
use crate::types::RawTable;

/// One uploaded file to ingest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInput {
    /// Label stamped on every row from this file
    pub label: String,
    pub path: PathBuf,
}

impl SourceInput {
    /// Use the file name as the label, as uploads are identified by name
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { label, path }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Csv,
    Workbook,
}

impl SourceFormat {
    /// Decide the reader from the file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        if extension == constants::CSV_EXTENSION {
            Some(SourceFormat::Csv)
        } else if constants::WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
            Some(SourceFormat::Workbook)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Csv => "csv",
            SourceFormat::Workbook => "workbook",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file read into untyped rows, before header detection
#[derive(Debug, Clone, PartialEq)]
pub struct RawSource {
    pub label: String,
    /// Worksheet the rows came from; `None` for CSV
    pub sheet: Option<String>,
    /// SHA-256 of the file bytes, hex encoded
    pub fingerprint: String,
    pub format: SourceFormat,
    pub table: RawTable,
}

/// Reads CSV files and spreadsheet workbooks into raw tables
#[derive(Debug, Clone)]
pub struct SourceLoader {
    /// Worksheet names that may hold ticket rows, compared case-insensitively
    pub sheet_names: Vec<String>,
}

impl Default for SourceLoader {
    fn default() -> Self {
        Self {
            sheet_names: constants::default_sheet_names(),
        }
    }
}

impl SourceLoader {
    pub fn new(sheet_names: Vec<String>) -> Self {
        Self { sheet_names }
    }

    pub fn load(&self, input: &SourceInput) -> Result<RawSource, SourceError> {
        let bytes = fs::read(&input.path).map_err(|e| {
            SourceError::unreadable(format!("failed to read {}: {}", input.path.display(), e))
        })?;
        let format = SourceFormat::from_path(&input.path).ok_or_else(|| {
            SourceError::unreadable(format!(
                "unsupported file type '{}'",
                input.path.display()
            ))
        })?;
        self.load_bytes(&input.label, bytes, format)
    }

    /// Parse an in-memory upload
    pub fn load_bytes(
        &self,
        label: &str,
        bytes: Vec<u8>,
        format: SourceFormat,
    ) -> Result<RawSource, SourceError> {
        let fingerprint = fingerprint(&bytes);
        debug!(source = %label, %format, bytes = bytes.len(), "Reading source");

        let (sheet, table) = match format {
            SourceFormat::Csv => (None, delimited::read_csv(&bytes)?),
            SourceFormat::Workbook => {
                let (sheet, table) = workbook::read_workbook(bytes, &self.sheet_names)?;
                (Some(sheet), table)
            }
        };

        Ok(RawSource {
            label: label.to_string(),
            sheet,
            fingerprint,
            format,
            table,
        })
    }
}

/// Give repeated labels in one batch a ` (2)`, ` (3)`, ... suffix so every
/// source stays distinguishable after combining
pub fn disambiguate_labels<'a>(labels: impl IntoIterator<Item = &'a mut String>) {
    let mut seen: HashSet<String> = HashSet::new();
    for label in labels {
        if seen.insert(label.clone()) {
            continue;
        }
        let mut n = 2;
        let renamed = loop {
            let candidate = format!("{} ({})", label, n);
            if seen.insert(candidate.clone()) {
                break candidate;
            }
            n += 1;
        };
        warn!(source = %label, renamed = %renamed, "Duplicate source label renamed");
        *label = renamed;
    }
}

pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Cell;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(SourceFormat::from_path(Path::new("a.CSV")), Some(SourceFormat::Csv));
        assert_eq!(SourceFormat::from_path(Path::new("a.xlsx")), Some(SourceFormat::Workbook));
        assert_eq!(SourceFormat::from_path(Path::new("a.ods")), Some(SourceFormat::Workbook));
        assert_eq!(SourceFormat::from_path(Path::new("a.txt")), None);
        assert_eq!(SourceFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_label_is_file_name() {
        let input = SourceInput::from_path("/tmp/uploads/week 12.xlsx");
        assert_eq!(input.label, "week 12.xlsx");
    }

    #[test]
    fn test_load_csv_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.csv");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "Export,,").unwrap();
        writeln!(file, "#,Request time,Status").unwrap();
        writeln!(file, "1,2025-01-01 08:00,Open").unwrap();

        let source = SourceLoader::default()
            .load(&SourceInput::from_path(&path))
            .unwrap();
        assert_eq!(source.label, "tickets.csv");
        assert_eq!(source.sheet, None);
        assert_eq!(source.format, SourceFormat::Csv);
        assert_eq!(source.fingerprint.len(), 64);
        assert_eq!(source.table.len(), 3);
        assert_eq!(source.table.rows[1][0], Cell::Text("#".to_string()));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let err = SourceLoader::default()
            .load(&SourceInput::from_path("/nonexistent/tickets.xlsx"))
            .unwrap_err();
        assert!(matches!(err, SourceError::UnreadableFile { .. }));
    }

    #[test]
    fn test_unsupported_extension_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "# hello").unwrap();
        let err = SourceLoader::default()
            .load(&SourceInput::from_path(&path))
            .unwrap_err();
        assert_eq!(err.code(), "unreadable_file");
    }

    #[test]
    fn test_repeated_labels_get_suffixes() {
        let mut labels = vec![
            "week.csv".to_string(),
            "week.csv".to_string(),
            "other.csv".to_string(),
            "week.csv".to_string(),
        ];
        disambiguate_labels(labels.iter_mut());
        assert_eq!(labels, vec!["week.csv", "week.csv (2)", "other.csv", "week.csv (3)"]);
    }

    #[test]
    fn test_suffix_skips_labels_already_taken() {
        let mut labels = vec!["a.csv (2)".to_string(), "a.csv".to_string(), "a.csv".to_string()];
        disambiguate_labels(labels.iter_mut());
        assert_eq!(labels, vec!["a.csv (2)", "a.csv", "a.csv (3)"]);
    }

    #[test]
    fn test_fingerprint_is_content_hash() {
        assert_eq!(fingerprint(b"abc"), fingerprint(b"abc"));
        assert_ne!(fingerprint(b"abc"), fingerprint(b"abd"));
    }
}
