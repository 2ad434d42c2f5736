use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants;
use crate::error::{ReportError, Result};
use crate::pipeline::filters::{SourceSelector, TimeWindow};

/// Environment variable naming an alternative config file
pub const CONFIG_PATH_ENV: &str = "TICKET_REPORTS_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub ingest: IngestConfig,
    pub report: ReportConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct IngestConfig {
    /// Worksheets that may hold ticket rows; the first one present in the workbook is read
    pub sheet_names: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            sheet_names: constants::default_sheet_names(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    pub window: String,
    pub source: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            window: constants::ALL_TIME.to_string(),
            source: constants::ALL_REPORTS.to_string(),
        }
    }
}

impl ReportConfig {
    pub fn time_window(&self) -> Result<TimeWindow> {
        self.window.parse()
    }

    pub fn source_selector(&self) -> SourceSelector {
        SourceSelector::from_label(&self.source)
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub directory: String,
    pub file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: "logs".to_string(),
            file_name: "ticket_reports.log".to_string(),
        }
    }
}

impl Config {
    /// Load and validate a config file that must exist
    pub fn load(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            ReportError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit path, else from `TICKET_REPORTS_CONFIG`, else from
    /// `config.toml` when present. Falls back to defaults when no file is found.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.trim().is_empty() {
                return Self::load(&PathBuf::from(path));
            }
        }

        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            return Self::load(default_path);
        }

        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        if self.ingest.sheet_names.is_empty() {
            return Err(ReportError::Config(
                "ingest.sheet_names must list at least one worksheet".to_string(),
            ));
        }
        self.report.time_window()?;
        Ok(())
    }
}
