use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::analysis::{compare_sources, SourceComparison, TableSummary};
use crate::app::ports::ReportSink;
use crate::error::{ReportError, Result, SkippedSource};
use crate::pipeline::processing::quality_gate::QualityFinding;
use crate::pipeline::{filter_by_source, filter_by_time, IngestOutcome, LoadedSource, SourceSelector, TimeWindow};
use crate::types::{CanonicalTicket, Clock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Summary of the filtered table plus the per-source comparison
    #[default]
    Full,
    /// Per-source comparison only
    Comparison,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportOptions {
    pub kind: ReportKind,
    pub window: TimeWindow,
    pub source: SourceSelector,
    /// Attach the filtered rows to the report
    pub include_rows: bool,
    /// Where windows are measured from; `None` uses the ingestion instant
    pub clock: Option<Clock>,
}

/// Everything handed to a sink after one run
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub run_id: Uuid,
    pub kind: ReportKind,
    pub generated_at: NaiveDateTime,
    pub window: TimeWindow,
    pub source: SourceSelector,
    pub row_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<TableSummary>,
    pub comparison: Vec<SourceComparison>,
    pub loaded: Vec<LoadedSource>,
    pub skipped: Vec<SkippedSource>,
    /// Findings for rows inside the report's window and source
    pub findings: Vec<QualityFinding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<CanonicalTicket>>,
}

/// Use case for turning an ingestion outcome into a published report
pub struct ReportUseCase {
    sink: Box<dyn ReportSink>,
}

impl ReportUseCase {
    pub fn new(sink: Box<dyn ReportSink>) -> Self {
        Self { sink }
    }

    /// Filter the table, summarize it and hand the result to the sink
    pub fn execute(&self, outcome: &IngestOutcome, options: &ReportOptions) -> Result<Report> {
        let report = build_report(outcome, options)?;
        self.sink.publish(&report)?;
        info!(
            run_id = %report.run_id,
            rows = report.row_count,
            window = %report.window,
            source = %report.source,
            "Report published"
        );
        Ok(report)
    }
}

pub fn build_report(outcome: &IngestOutcome, options: &ReportOptions) -> Result<Report> {
    let table = &outcome.table;
    if let SourceSelector::Source(label) = &options.source {
        if !table.sources().contains(label) {
            return Err(ReportError::UnknownSource {
                label: label.clone(),
                available: table.sources().to_vec(),
            });
        }
    }

    let now = options
        .clock
        .map_or(outcome.derived_at, |clock| clock.now());
    let view = filter_by_time(
        &filter_by_source(&table.view(), &options.source),
        options.window,
        now,
    );

    let comparison: Vec<SourceComparison> = compare_sources(&outcome.per_source)
        .into_iter()
        .filter(|c| match &options.source {
            SourceSelector::AllReports => true,
            SourceSelector::Source(label) => &c.label == label,
        })
        .collect();

    let summary = match options.kind {
        ReportKind::Full => Some(TableSummary::from_view(&view)),
        ReportKind::Comparison => None,
    };

    // Findings are keyed by position in the combined table
    let visible: HashSet<usize> = view.positions().iter().copied().collect();
    let findings = outcome
        .quality
        .findings
        .iter()
        .filter(|f| visible.contains(&f.row))
        .cloned()
        .collect();

    Ok(Report {
        run_id: outcome.run_id,
        kind: options.kind,
        generated_at: now,
        window: options.window,
        source: options.source.clone(),
        row_count: view.len(),
        summary,
        comparison,
        loaded: outcome.loaded.clone(),
        skipped: outcome.skipped.clone(),
        findings,
        rows: options
            .include_rows
            .then(|| view.rows().iter().map(|r| (*r).clone()).collect()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ingestion::{RawSource, SourceFormat};
    use crate::pipeline::Pipeline;
    use crate::types::RawTable;
    use chrono::NaiveDate;
    use std::sync::{Arc, Mutex};

    struct RecordingSink {
        published: Arc<Mutex<Vec<usize>>>,
    }

    impl ReportSink for RecordingSink {
        fn publish(&self, report: &Report) -> Result<()> {
            self.published.lock().unwrap().push(report.row_count);
            Ok(())
        }
    }

    fn raw(label: &str, rows: Vec<Vec<&str>>) -> RawSource {
        RawSource {
            label: label.to_string(),
            sheet: None,
            fingerprint: String::new(),
            format: SourceFormat::Csv,
            table: RawTable::from_text_rows(rows),
        }
    }

    fn outcome() -> IngestOutcome {
        let now = NaiveDate::from_ymd_opt(2025, 3, 31)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Pipeline::default()
            .with_clock(Clock::Fixed(now))
            .run_raw(vec![
                raw(
                    "a.csv",
                    vec![
                        vec!["#", "Request time", "Close time", "SLA"],
                        vec!["1", "2025-03-30", "2025-03-30 01:00", "Met"],
                        vec!["2", "2024-01-01", "2024-01-02", "Fail"],
                        vec!["3", "", "", ""],
                    ],
                ),
                raw("b.csv", vec![vec!["Ticket", "Request time"], vec!["9", "2025-03-29"]]),
            ])
            .unwrap()
    }

    #[test]
    fn test_window_and_source_narrow_the_summary() {
        let outcome = outcome();
        let report = build_report(
            &outcome,
            &ReportOptions {
                window: TimeWindow::Last30Days,
                source: SourceSelector::from_label("a.csv"),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(report.row_count, 1);
        let summary = report.summary.unwrap();
        assert_eq!(summary.sla_met_count, 1);
        assert_eq!(summary.sla_fail_count, 0);
        assert_eq!(report.comparison.len(), 1);
        // the missing-request-time finding belongs to a row outside the window
        assert!(report.findings.is_empty());
        assert!(report.rows.is_none());
    }

    #[test]
    fn test_all_time_report_includes_rows_and_findings() {
        let outcome = outcome();
        let report = build_report(
            &outcome,
            &ReportOptions {
                include_rows: true,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(report.row_count, 4);
        assert_eq!(report.rows.as_ref().map(Vec::len), Some(4));
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.comparison.len(), 2);
    }

    #[test]
    fn test_window_measured_from_report_clock() {
        let outcome = outcome();
        let later = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let report_at = |window| {
            build_report(
                &outcome,
                &ReportOptions {
                    window,
                    clock: Some(Clock::Fixed(later)),
                    ..Default::default()
                },
            )
            .unwrap()
        };

        let thirty = report_at(TimeWindow::Last30Days);
        assert_eq!(thirty.row_count, 0);
        assert_eq!(thirty.generated_at, later);
        assert_eq!(report_at(TimeWindow::Last90Days).row_count, 2);
    }

    #[test]
    fn test_unknown_source_label() {
        let err = build_report(
            &outcome(),
            &ReportOptions {
                source: SourceSelector::from_label("c.csv"),
                ..Default::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::UnknownSource { .. }));
    }

    #[test]
    fn test_execute_publishes_to_sink() {
        let published = Arc::new(Mutex::new(Vec::new()));
        let use_case = ReportUseCase::new(Box::new(RecordingSink {
            published: published.clone(),
        }));
        use_case
            .execute(
                &outcome(),
                &ReportOptions {
                    kind: ReportKind::Comparison,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(*published.lock().unwrap(), vec![4]);
    }
}
