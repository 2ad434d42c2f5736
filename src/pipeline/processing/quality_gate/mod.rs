use serde::Serialize;
use tracing::warn;

use crate::observability::metrics;
use crate::types::{CanonicalTable, CanonicalTicket};

/// Individual data-quality finding on one canonical row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityFinding {
    /// Source label of the row
    pub source: String,
    /// Ticket identifier, when the row has one
    pub ticket: Option<String>,
    /// Position of the row in the combined table
    pub row: usize,
    pub kind: FindingKind,
    pub severity: QualitySeverity,
    /// Human-readable description of the finding
    pub description: String,
}

/// Types of data-quality findings the gate can raise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Row has no parsable request time, so it cannot be aged or windowed
    MissingRequestTime,
    /// Close time precedes request time
    NegativeAging,
}

impl FindingKind {
    pub fn code(&self) -> &'static str {
        match self {
            FindingKind::MissingRequestTime => "missing_request_time",
            FindingKind::NegativeAging => "negative_aging",
        }
    }
}

/// Severity levels for findings
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum QualitySeverity {
    /// Worth noting, row is still counted as-is
    Info,
    /// Row is kept but its derived metrics are suspect
    Warning,
}

/// Findings for a whole table. Rows are never removed or altered by the gate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QualityReport {
    pub findings: Vec<QualityFinding>,
}

impl QualityReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn count(&self, kind: FindingKind) -> usize {
        self.findings.iter().filter(|f| f.kind == kind).count()
    }
}

/// Trait for implementing data-quality checks over the canonical table
pub trait QualityGate: Send + Sync {
    fn assess(&self, table: &CanonicalTable) -> QualityReport;
}

#[derive(Debug, Clone, Default)]
pub struct DefaultQualityGate;

impl DefaultQualityGate {
    pub fn new() -> Self {
        Self
    }

    fn check_row(&self, row: usize, ticket: &CanonicalTicket) -> Vec<QualityFinding> {
        let record = &ticket.record;
        let mut findings = Vec::new();
        let finding = |kind, severity, description: String| QualityFinding {
            source: ticket.source().to_string(),
            ticket: record.ticket.clone(),
            row,
            kind,
            severity,
            description,
        };

        if record.request_time.is_none() {
            findings.push(finding(
                FindingKind::MissingRequestTime,
                QualitySeverity::Info,
                "request time missing or unparsable; excluded from time windows".to_string(),
            ));
        }

        let aging = record.metrics.as_ref().and_then(|m| m.ticket_aging_days);
        if let Some(days) = aging.filter(|days| *days < 0) {
            findings.push(finding(
                FindingKind::NegativeAging,
                QualitySeverity::Warning,
                format!("close time precedes request time ({} days)", days),
            ));
        }

        findings
    }
}

impl QualityGate for DefaultQualityGate {
    fn assess(&self, table: &CanonicalTable) -> QualityReport {
        let findings: Vec<QualityFinding> = table
            .rows()
            .iter()
            .enumerate()
            .flat_map(|(row, ticket)| self.check_row(row, ticket))
            .collect();

        for finding in &findings {
            metrics::quality::finding_recorded(finding.kind.code());
            if finding.severity >= QualitySeverity::Warning {
                warn!(
                    source = %finding.source,
                    ticket = finding.ticket.as_deref().unwrap_or("-"),
                    kind = finding.kind.code(),
                    "{}",
                    finding.description
                );
            }
        }

        QualityReport { findings }
    }
}
