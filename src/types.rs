use std::collections::BTreeMap;
use std::fmt;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A single spreadsheet cell before any column semantics are applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Empty cells and whitespace-only text both count as empty
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed text rendering, or `None` for empty cells
    pub fn text(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(self.to_string().trim().to_string())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => write!(f, "{}", s),
            // Spreadsheets store ticket numbers as floats; 1001.0 should read as "1001"
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Rows of untyped cells exactly as read from a worksheet, no header yet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Build a table from plain strings; blank strings become `Cell::Empty`
    pub fn from_text_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|value| {
                        let value = value.as_ref();
                        if value.trim().is_empty() {
                            Cell::Empty
                        } else {
                            Cell::Text(value.to_string())
                        }
                    })
                    .collect()
            })
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Canonical ticket fields, in the order the column mapping evaluates them
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CanonicalField {
    RequestTime,
    Ticket,
    Sla,
    CloseTime,
    DueDate,
    Category,
    SubCategory,
    ProcessManager,
    Status,
    Priority,
    Urgency,
    RequestUser,
    Title,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 13] = [
        CanonicalField::RequestTime,
        CanonicalField::Ticket,
        CanonicalField::Sla,
        CanonicalField::CloseTime,
        CanonicalField::DueDate,
        CanonicalField::Category,
        CanonicalField::SubCategory,
        CanonicalField::ProcessManager,
        CanonicalField::Status,
        CanonicalField::Priority,
        CanonicalField::Urgency,
        CanonicalField::RequestUser,
        CanonicalField::Title,
    ];

    /// Column name used in the canonical table
    pub fn label(&self) -> &'static str {
        match self {
            CanonicalField::RequestTime => "Request time",
            CanonicalField::Ticket => "Ticket",
            CanonicalField::Sla => "SLA",
            CanonicalField::CloseTime => "Close time",
            CanonicalField::DueDate => "Due Date",
            CanonicalField::Category => "Category",
            CanonicalField::SubCategory => "Sub-Category",
            CanonicalField::ProcessManager => "Process Manager",
            CanonicalField::Status => "Status",
            CanonicalField::Priority => "Priority",
            CanonicalField::Urgency => "Urgency",
            CanonicalField::RequestUser => "Request user",
            CanonicalField::Title => "Title",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sla {
    Met,
    Fail,
}

impl fmt::Display for Sla {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sla::Met => f.write_str("Met"),
            Sla::Fail => f.write_str("Fail"),
        }
    }
}

/// Reporting bucket for ticket aging
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgingBracket {
    #[serde(rename = "0-30 Days")]
    UpTo30Days,
    #[serde(rename = "30-60 Days")]
    UpTo60Days,
    #[serde(rename = "60-90 Days")]
    UpTo90Days,
    #[serde(rename = "90+ Days")]
    Over90Days,
    Unknown,
}

impl AgingBracket {
    pub const ALL: [AgingBracket; 5] = [
        AgingBracket::UpTo30Days,
        AgingBracket::UpTo60Days,
        AgingBracket::UpTo90Days,
        AgingBracket::Over90Days,
        AgingBracket::Unknown,
    ];

    /// Thresholds are checked from the top down: >90, >60, >30, then the rest.
    /// Missing or negative aging has no bracket.
    pub fn from_aging(aging_days: Option<i64>) -> Self {
        match aging_days {
            Some(days) if days > 90 => AgingBracket::Over90Days,
            Some(days) if days > 60 => AgingBracket::UpTo90Days,
            Some(days) if days > 30 => AgingBracket::UpTo60Days,
            Some(days) if days >= 0 => AgingBracket::UpTo30Days,
            _ => AgingBracket::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgingBracket::UpTo30Days => "0-30 Days",
            AgingBracket::UpTo60Days => "30-60 Days",
            AgingBracket::UpTo90Days => "60-90 Days",
            AgingBracket::Over90Days => "90+ Days",
            AgingBracket::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for AgingBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Columns added by the metric deriver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    /// Minutes from request to close; 0 when either timestamp is missing
    pub response_time_minutes: f64,
    /// Whole days from request to close (or to "now" for open tickets)
    pub ticket_aging_days: Option<i64>,
    pub aging_bracket: AgingBracket,
}

/// One normalized ticket row. Carries no source; that is stamped on by the combiner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub ticket: Option<String>,
    pub request_time: Option<NaiveDateTime>,
    pub close_time: Option<NaiveDateTime>,
    pub due_date: Option<NaiveDateTime>,
    pub sla: Option<Sla>,
    pub category: Option<String>,
    pub sub_category: Option<String>,
    pub process_manager: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub urgency: Option<String>,
    pub request_user: Option<String>,
    pub title: Option<String>,
    /// Columns the mapping did not recognise, keyed by their cleaned header
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<DerivedMetrics>,
}

impl TicketRecord {
    /// A ticket is open while it has no close time
    pub fn is_open(&self) -> bool {
        self.close_time.is_none()
    }

    /// True when every field is empty
    pub fn is_blank(&self) -> bool {
        self.ticket.is_none()
            && self.request_time.is_none()
            && self.close_time.is_none()
            && self.due_date.is_none()
            && self.sla.is_none()
            && self.category.is_none()
            && self.sub_category.is_none()
            && self.process_manager.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.urgency.is_none()
            && self.request_user.is_none()
            && self.title.is_none()
            && self.extra.is_empty()
    }

    /// The field value rendered as a cell, used when exporting back to a raw table
    pub fn cell(&self, field: CanonicalField) -> Cell {
        let text = |value: &Option<String>| match value {
            Some(s) => Cell::Text(s.clone()),
            None => Cell::Empty,
        };
        let timestamp = |value: &Option<NaiveDateTime>| match value {
            Some(dt) => Cell::DateTime(*dt),
            None => Cell::Empty,
        };
        match field {
            CanonicalField::RequestTime => timestamp(&self.request_time),
            CanonicalField::Ticket => text(&self.ticket),
            CanonicalField::Sla => match self.sla {
                Some(sla) => Cell::Text(sla.to_string()),
                None => Cell::Empty,
            },
            CanonicalField::CloseTime => timestamp(&self.close_time),
            CanonicalField::DueDate => timestamp(&self.due_date),
            CanonicalField::Category => text(&self.category),
            CanonicalField::SubCategory => text(&self.sub_category),
            CanonicalField::ProcessManager => text(&self.process_manager),
            CanonicalField::Status => text(&self.status),
            CanonicalField::Priority => text(&self.priority),
            CanonicalField::Urgency => text(&self.urgency),
            CanonicalField::RequestUser => text(&self.request_user),
            CanonicalField::Title => text(&self.title),
        }
    }
}

/// Output of the schema normalizer for a single source
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedTable {
    /// Canonical fields found in the source, in mapping order
    pub columns: Vec<CanonicalField>,
    /// Unmapped column names, in header order
    pub extra_columns: Vec<String>,
    pub records: Vec<TicketRecord>,
}

impl NormalizedTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, field: CanonicalField) -> bool {
        self.columns.contains(&field)
    }

    /// Export as a raw table with a header row. A Ticket column always leads,
    /// empty when the source had none, so the header locator finds the row again.
    pub fn to_raw(&self) -> RawTable {
        let mut fields: Vec<CanonicalField> = Vec::with_capacity(self.columns.len() + 1);
        fields.push(CanonicalField::Ticket);
        fields.extend(
            self.columns
                .iter()
                .copied()
                .filter(|f| *f != CanonicalField::Ticket),
        );

        let mut header: Vec<Cell> = fields
            .iter()
            .map(|f| Cell::Text(f.label().to_string()))
            .collect();
        header.extend(self.extra_columns.iter().map(|c| Cell::Text(c.clone())));

        let mut rows = vec![header];
        for record in &self.records {
            let mut row: Vec<Cell> = fields.iter().map(|f| record.cell(*f)).collect();
            row.extend(self.extra_columns.iter().map(|c| match record.extra.get(c) {
                Some(v) => Cell::Text(v.clone()),
                None => Cell::Empty,
            }));
            rows.push(row);
        }
        RawTable::new(rows)
    }
}

/// A ticket row tagged with the source it came from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalTicket {
    source: String,
    #[serde(flatten)]
    pub record: TicketRecord,
}

impl CanonicalTicket {
    pub(crate) fn stamped(source: String, record: TicketRecord) -> Self {
        Self { source, record }
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

/// The combined, analysis-ready table shared with every downstream consumer
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CanonicalTable {
    rows: Vec<CanonicalTicket>,
    sources: Vec<String>,
}

impl CanonicalTable {
    pub(crate) fn from_parts(rows: Vec<CanonicalTicket>, sources: Vec<String>) -> Self {
        Self { rows, sources }
    }

    pub fn rows(&self) -> &[CanonicalTicket] {
        &self.rows
    }

    /// Mutable access to the ticket fields only; the source stamp stays fixed
    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut TicketRecord> {
        self.rows.iter_mut().map(|row| &mut row.record)
    }

    /// Source labels in upload order
    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// A borrowed view over every row
    pub fn view(&self) -> TableView<'_> {
        TableView {
            rows: self.rows.iter().collect(),
            positions: (0..self.rows.len()).collect(),
        }
    }
}

/// A read-only selection of rows from a canonical table
#[derive(Debug, Clone, Default)]
pub struct TableView<'a> {
    rows: Vec<&'a CanonicalTicket>,
    /// Index of each row in the table the view was taken from
    positions: Vec<usize>,
}

impl<'a> TableView<'a> {
    pub fn rows(&self) -> &[&'a CanonicalTicket] {
        &self.rows
    }

    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// A narrower view keeping the rows that match `keep`
    pub fn retain(&self, keep: impl Fn(&CanonicalTicket) -> bool) -> TableView<'a> {
        let (positions, rows) = self
            .positions
            .iter()
            .zip(&self.rows)
            .filter(|(_, row)| keep(row))
            .map(|(position, row)| (*position, *row))
            .unzip();
        TableView { rows, positions }
    }

    pub fn records(&self) -> impl Iterator<Item = &'a TicketRecord> + '_ {
        self.rows.iter().map(|row| &row.record)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Source of "now" for aging and time-window cutoffs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    /// Local wall-clock time, matching the zone-less timestamps in exports
    #[default]
    System,
    Fixed(NaiveDateTime),
}

impl Clock {
    pub fn now(&self) -> NaiveDateTime {
        match self {
            Clock::System => Local::now().naive_local(),
            Clock::Fixed(now) => *now,
        }
    }
}
