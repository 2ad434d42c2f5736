use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tracing::info;

use crate::app::ports::ReportSink;
use crate::app::report_use_case::Report;
use crate::error::Result;
use crate::types::AgingBracket;

/// Writes the report as pretty JSON to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonStdoutSink;

impl ReportSink for JsonStdoutSink {
    fn publish(&self, report: &Report) -> Result<()> {
        let json = serde_json::to_string_pretty(report)?;
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", json)?;
        Ok(())
    }
}

/// File-based implementation of ReportSink; writes pretty JSON, replacing any existing file
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ReportSink for JsonFileSink {
    fn publish(&self, report: &Report) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(report)?;
        fs::write(&self.path, json)?;
        info!("Wrote report to {}", self.path.display());
        Ok(())
    }
}

/// Writes a plain-text digest to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct TextStdoutSink;

impl ReportSink for TextStdoutSink {
    fn publish(&self, report: &Report) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        write!(stdout, "{}", render_text(report))?;
        Ok(())
    }
}

/// Human-readable digest of a report
pub fn render_text(report: &Report) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail
    let _ = write_text(&mut out, report);
    out
}

fn write_text(out: &mut String, report: &Report) -> std::fmt::Result {
    writeln!(out, "Ticket report {}", report.run_id)?;
    writeln!(out, "  Window: {}", report.window)?;
    writeln!(out, "  Source: {}", report.source)?;
    writeln!(out, "  Rows:   {}", report.row_count)?;

    if let Some(summary) = &report.summary {
        writeln!(out)?;
        writeln!(
            out,
            "Tickets: {} total, {} open, {} closed, {} reopened",
            summary.total_tickets, summary.open_tickets, summary.closed_tickets, summary.reopened_tickets
        )?;
        writeln!(
            out,
            "SLA: {} met, {} failed ({:.1}% compliance)",
            summary.sla_met_count, summary.sla_fail_count, summary.sla_compliance_pct
        )?;
        match summary.avg_response_time_minutes {
            Some(minutes) => writeln!(out, "Average response time: {:.1} min", minutes)?,
            None => writeln!(out, "Average response time: n/a")?,
        }
        writeln!(out, "Aging:")?;
        for bracket in AgingBracket::ALL {
            let count = summary.aging_brackets.get(&bracket).copied().unwrap_or(0);
            writeln!(out, "  {:<12} {}", bracket.label(), count)?;
        }
        if !summary.top_categories.is_empty() {
            writeln!(out, "Top categories:")?;
            for category in &summary.top_categories {
                writeln!(out, "  {:<24} {}", category.category, category.count)?;
            }
        }
    }

    if !report.comparison.is_empty() {
        writeln!(out)?;
        writeln!(out, "By source:")?;
        for source in &report.comparison {
            write!(
                out,
                "  {}: {} requests, {} open",
                source.label, source.total_requests, source.open_tickets
            )?;
            match &source.response_time {
                Some(stats) => writeln!(
                    out,
                    ", response min/median/mean/max {:.1}/{:.1}/{:.1}/{:.1} min",
                    stats.min, stats.median, stats.mean, stats.max
                )?,
                None => writeln!(out)?,
            }
        }
    }

    if !report.skipped.is_empty() {
        writeln!(out)?;
        writeln!(out, "Skipped sources:")?;
        for skipped in &report.skipped {
            writeln!(out, "  {}: {}", skipped.label, skipped.reason)?;
        }
    }

    if !report.findings.is_empty() {
        writeln!(out)?;
        writeln!(out, "Data quality findings: {}", report.findings.len())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::report_use_case::{build_report, ReportOptions};
    use crate::pipeline::ingestion::{RawSource, SourceFormat};
    use crate::pipeline::{IngestOutcome, Pipeline};
    use crate::types::{Clock, RawTable};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn outcome() -> IngestOutcome {
        let now = NaiveDate::from_ymd_opt(2025, 1, 10)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Pipeline::default()
            .with_clock(Clock::Fixed(now))
            .run_raw(vec![RawSource {
                label: "week.csv".to_string(),
                sheet: None,
                fingerprint: String::new(),
                format: SourceFormat::Csv,
                table: RawTable::from_text_rows(vec![
                    vec!["#", "Request time", "Close time", "SLA", "Category"],
                    vec!["1", "2025-01-01 08:00", "2025-01-01 09:00", "Met", "Email"],
                ]),
            }])
            .unwrap()
    }

    #[test]
    fn test_json_file_sink_writes_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("report.json");
        let report = build_report(&outcome(), &ReportOptions::default()).unwrap();

        JsonFileSink::new(&path).publish(&report).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["row_count"], 1);
        assert_eq!(written["window"], "All Time");
        assert_eq!(written["source"], "All Reports");
        assert_eq!(written["summary"]["sla_met_count"], 1);
        assert_eq!(written["summary"]["aging_brackets"]["0-30 Days"], 1);
    }

    #[test]
    fn test_render_text_digest() {
        let report = build_report(&outcome(), &ReportOptions::default()).unwrap();
        let text = render_text(&report);
        assert!(text.contains("Window: All Time"));
        assert!(text.contains("SLA: 1 met, 0 failed (100.0% compliance)"));
        assert!(text.contains("Average response time: 60.0 min"));
        assert!(text.contains("week.csv: 1 requests, 0 open"));
    }
}
