//! Time-window and source filters over the canonical table.
//!
//! Filters never copy or mutate rows; they narrow a borrowed [`TableView`].

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime};
use serde::{Serialize, Serializer};

use crate::constants;
use crate::error::ReportError;
use crate::types::TableView;

/// Reporting window measured back from "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum TimeWindow {
    #[default]
    #[serde(rename = "All Time")]
    AllTime,
    #[serde(rename = "Last 90 Days")]
    Last90Days,
    #[serde(rename = "Last 30 Days")]
    Last30Days,
    #[serde(rename = "Last 7 Days")]
    Last7Days,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 4] = [
        TimeWindow::AllTime,
        TimeWindow::Last90Days,
        TimeWindow::Last30Days,
        TimeWindow::Last7Days,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TimeWindow::AllTime => constants::ALL_TIME,
            TimeWindow::Last90Days => constants::LAST_90_DAYS,
            TimeWindow::Last30Days => constants::LAST_30_DAYS,
            TimeWindow::Last7Days => constants::LAST_7_DAYS,
        }
    }

    /// Window length in days; `None` means unbounded
    pub fn days(&self) -> Option<i64> {
        match self {
            TimeWindow::AllTime => None,
            TimeWindow::Last90Days => Some(90),
            TimeWindow::Last30Days => Some(30),
            TimeWindow::Last7Days => Some(7),
        }
    }

    /// Earliest request time still inside the window
    pub fn cutoff(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        self.days().map(|days| now - Duration::days(days))
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeWindow {
    type Err = ReportError;

    /// Accepts the display labels (any case) and the short forms `all`, `90d`, `30d`, `7d`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        let short = match wanted.to_ascii_lowercase().as_str() {
            "all" => Some(TimeWindow::AllTime),
            "90d" => Some(TimeWindow::Last90Days),
            "30d" => Some(TimeWindow::Last30Days),
            "7d" => Some(TimeWindow::Last7Days),
            _ => None,
        };
        short
            .or_else(|| {
                TimeWindow::ALL
                    .into_iter()
                    .find(|w| w.label().eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| ReportError::UnknownWindow(s.to_string()))
    }
}

/// Which uploaded sources a report covers
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SourceSelector {
    #[default]
    AllReports,
    Source(String),
}

impl SourceSelector {
    /// "All Reports" (any case) or an empty label selects everything
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        if label.is_empty() || label.eq_ignore_ascii_case(constants::ALL_REPORTS) {
            SourceSelector::AllReports
        } else {
            SourceSelector::Source(label.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            SourceSelector::AllReports => constants::ALL_REPORTS,
            SourceSelector::Source(label) => label,
        }
    }
}

impl fmt::Display for SourceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for SourceSelector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Keep rows whose request time is on or after `now - window`.
/// All Time keeps every row, including ones without a request time.
pub fn filter_by_time<'a>(view: &TableView<'a>, window: TimeWindow, now: NaiveDateTime) -> TableView<'a> {
    let Some(cutoff) = window.cutoff(now) else {
        return view.clone();
    };
    view.retain(|row| row.record.request_time.is_some_and(|t| t >= cutoff))
}

/// Keep rows stamped with the selected source label
pub fn filter_by_source<'a>(view: &TableView<'a>, selector: &SourceSelector) -> TableView<'a> {
    match selector {
        SourceSelector::AllReports => view.clone(),
        SourceSelector::Source(label) => view.retain(|row| row.source() == label.as_str()),
    }
}
