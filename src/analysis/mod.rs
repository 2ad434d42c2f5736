//! Table-level summaries computed from any view of the canonical table.
//!
//! Counts that describe a whole table (SLA compliance, aging distribution,
//! volume by month) live here instead of being stamped onto every row.

pub mod comparison;

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::Timelike;
use serde::Serialize;

use crate::types::{AgingBracket, Sla, TableView, TicketRecord};

pub use comparison::{compare_sources, ResponseTimeStats, SourceComparison};

const TOP_CATEGORY_LIMIT: usize = 10;

/// Close time relative to due date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DueDateStatus {
    #[serde(rename = "Before Due Date")]
    BeforeDueDate,
    #[serde(rename = "On Due Date")]
    OnDueDate,
    #[serde(rename = "After Due Date")]
    AfterDueDate,
}

impl DueDateStatus {
    /// `None` unless the ticket has both a close time and a due date
    pub fn of(record: &TicketRecord) -> Option<Self> {
        let (close, due) = (record.close_time?, record.due_date?);
        Some(match close.cmp(&due) {
            Ordering::Less => DueDateStatus::BeforeDueDate,
            Ordering::Equal => DueDateStatus::OnDueDate,
            Ordering::Greater => DueDateStatus::AfterDueDate,
        })
    }
}

/// Coarse grouping of free-text status values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CompletionStatus {
    Completed,
    Pending,
    Other,
}

impl CompletionStatus {
    pub fn from_status(status: Option<&str>) -> Self {
        let Some(status) = status else {
            return CompletionStatus::Other;
        };
        match status.trim().to_ascii_lowercase().as_str() {
            "closed" | "resolved" | "completed" => CompletionStatus::Completed,
            "open" | "in progress" | "pending" => CompletionStatus::Pending,
            _ => CompletionStatus::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// Aggregate figures for a set of tickets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableSummary {
    pub total_tickets: usize,
    pub open_tickets: usize,
    pub closed_tickets: usize,
    pub sla_met_count: usize,
    pub sla_fail_count: usize,
    /// Met / (Met + Fail) as a percentage; 0 when no row has an SLA value
    pub sla_compliance_pct: f64,
    /// Mean minutes from request to close over tickets with both timestamps
    pub avg_response_time_minutes: Option<f64>,
    pub aging_brackets: BTreeMap<AgingBracket, usize>,
    pub due_date_status: BTreeMap<DueDateStatus, usize>,
    pub completion_status: BTreeMap<CompletionStatus, usize>,
    /// Requests per `YYYY-MM` of request time
    pub monthly_volume: BTreeMap<String, usize>,
    /// Requests per hour of day (index 0..24)
    pub hourly_volume: Vec<usize>,
    pub top_categories: Vec<CategoryCount>,
    pub reopened_tickets: usize,
}

impl TableSummary {
    pub fn from_view(view: &TableView<'_>) -> Self {
        Self::from_records(view.records())
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a TicketRecord>) -> Self {
        let records: Vec<&TicketRecord> = records.into_iter().collect();

        let mut aging_brackets: BTreeMap<AgingBracket, usize> =
            AgingBracket::ALL.iter().map(|b| (*b, 0)).collect();
        let mut due_date_status = BTreeMap::new();
        let mut completion_status = BTreeMap::new();
        let mut monthly_volume = BTreeMap::new();
        let mut hourly_volume = vec![0; 24];
        let mut categories: HashMap<&str, usize> = HashMap::new();
        let (mut met, mut fail, mut open) = (0, 0, 0);
        let (mut response_sum, mut response_count) = (0.0, 0usize);

        for record in &records {
            if record.is_open() {
                open += 1;
            }
            match record.sla {
                Some(Sla::Met) => met += 1,
                Some(Sla::Fail) => fail += 1,
                None => {}
            }

            let bracket = record
                .metrics
                .as_ref()
                .map(|m| m.aging_bracket)
                .unwrap_or(AgingBracket::Unknown);
            *aging_brackets.entry(bracket).or_insert(0) += 1;

            if let Some(status) = DueDateStatus::of(record) {
                *due_date_status.entry(status).or_insert(0) += 1;
            }
            *completion_status
                .entry(CompletionStatus::from_status(record.status.as_deref()))
                .or_insert(0) += 1;

            if let Some(requested) = record.request_time {
                *monthly_volume
                    .entry(requested.format("%Y-%m").to_string())
                    .or_insert(0) += 1;
                hourly_volume[requested.hour() as usize] += 1;

                if let Some(metrics) = record.metrics.as_ref().filter(|_| !record.is_open()) {
                    response_sum += metrics.response_time_minutes;
                    response_count += 1;
                }
            }

            if let Some(category) = record.category.as_deref() {
                *categories.entry(category).or_insert(0) += 1;
            }
        }

        let mut top_categories: Vec<CategoryCount> = categories
            .into_iter()
            .map(|(category, count)| CategoryCount {
                category: category.to_string(),
                count,
            })
            .collect();
        top_categories.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
        top_categories.truncate(TOP_CATEGORY_LIMIT);

        let sla_compliance_pct = if met + fail == 0 {
            0.0
        } else {
            met as f64 * 100.0 / (met + fail) as f64
        };

        Self {
            total_tickets: records.len(),
            open_tickets: open,
            closed_tickets: records.len() - open,
            sla_met_count: met,
            sla_fail_count: fail,
            sla_compliance_pct,
            avg_response_time_minutes: (response_count > 0)
                .then(|| response_sum / response_count as f64),
            aging_brackets,
            due_date_status,
            completion_status,
            monthly_volume,
            hourly_volume,
            top_categories,
            reopened_tickets: detect_reopened(&records).iter().filter(|r| **r).count(),
        }
    }
}

/// Flag rows whose (Request user, Category, Sub-Category, Title) all present
/// and shared with at least one other row
pub fn detect_reopened(records: &[&TicketRecord]) -> Vec<bool> {
    let key = |r: &TicketRecord| -> Option<(String, String, String, String)> {
        Some((
            r.request_user.clone()?,
            r.category.clone()?,
            r.sub_category.clone()?,
            r.title.clone()?,
        ))
    };

    let mut counts: HashMap<(String, String, String, String), usize> = HashMap::new();
    let keys: Vec<_> = records.iter().map(|r| key(*r)).collect();
    for k in keys.iter().flatten() {
        *counts.entry(k.clone()).or_insert(0) += 1;
    }

    keys.iter()
        .map(|k| k.as_ref().is_some_and(|k| counts.get(k).copied().unwrap_or(0) > 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processing::enrich::{DefaultMetricDeriver, MetricDeriver};
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn ticket(id: &str) -> TicketRecord {
        TicketRecord {
            ticket: Some(id.to_string()),
            ..Default::default()
        }
    }

    fn derived(mut records: Vec<TicketRecord>) -> Vec<TicketRecord> {
        let deriver = DefaultMetricDeriver::at(now());
        for record in records.iter_mut() {
            deriver.derive(record);
        }
        records
    }

    #[test]
    fn test_sla_counts_and_compliance() {
        let records = derived(vec![
            TicketRecord { sla: Some(Sla::Met), ..ticket("1") },
            TicketRecord { sla: Some(Sla::Met), ..ticket("2") },
            TicketRecord { sla: Some(Sla::Met), ..ticket("3") },
            TicketRecord { sla: Some(Sla::Fail), ..ticket("4") },
            ticket("5"),
        ]);
        let summary = TableSummary::from_records(&records);
        assert_eq!(summary.sla_met_count, 3);
        assert_eq!(summary.sla_fail_count, 1);
        assert_eq!(summary.sla_compliance_pct, 75.0);
        assert_eq!(summary.total_tickets, 5);
    }

    #[test]
    fn test_all_brackets_present_and_counted() {
        let records = derived(vec![
            TicketRecord { request_time: Some(now() - Duration::days(5)), ..ticket("1") },
            TicketRecord { request_time: Some(now() - Duration::days(95)), ..ticket("2") },
            ticket("3"),
        ]);
        let summary = TableSummary::from_records(&records);
        assert_eq!(summary.aging_brackets.len(), 5);
        assert_eq!(summary.aging_brackets[&AgingBracket::UpTo30Days], 1);
        assert_eq!(summary.aging_brackets[&AgingBracket::Over90Days], 1);
        assert_eq!(summary.aging_brackets[&AgingBracket::Unknown], 1);
        assert_eq!(summary.aging_brackets[&AgingBracket::UpTo60Days], 0);
    }

    #[test]
    fn test_response_time_average_over_closed_tickets() {
        let request = now() - Duration::days(2);
        let records = derived(vec![
            TicketRecord {
                request_time: Some(request),
                close_time: Some(request + Duration::minutes(30)),
                ..ticket("1")
            },
            TicketRecord {
                request_time: Some(request),
                close_time: Some(request + Duration::minutes(90)),
                ..ticket("2")
            },
            TicketRecord { request_time: Some(request), ..ticket("3") },
        ]);
        let summary = TableSummary::from_records(&records);
        assert_eq!(summary.avg_response_time_minutes, Some(60.0));
        assert_eq!(summary.open_tickets, 1);
        assert_eq!(summary.closed_tickets, 2);
    }

    #[test]
    fn test_due_date_status_exact_equality() {
        let due = now();
        let at = |close: NaiveDateTime| TicketRecord {
            close_time: Some(close),
            due_date: Some(due),
            ..ticket("x")
        };
        assert_eq!(DueDateStatus::of(&at(due)), Some(DueDateStatus::OnDueDate));
        assert_eq!(
            DueDateStatus::of(&at(due + Duration::seconds(1))),
            Some(DueDateStatus::AfterDueDate)
        );
        assert_eq!(
            DueDateStatus::of(&at(due - Duration::days(1))),
            Some(DueDateStatus::BeforeDueDate)
        );
        assert_eq!(DueDateStatus::of(&ticket("y")), None);
    }

    #[test]
    fn test_completion_status_buckets() {
        assert_eq!(CompletionStatus::from_status(Some(" Resolved ")), CompletionStatus::Completed);
        assert_eq!(CompletionStatus::from_status(Some("IN PROGRESS")), CompletionStatus::Pending);
        assert_eq!(CompletionStatus::from_status(Some("Cancelled")), CompletionStatus::Other);
        assert_eq!(CompletionStatus::from_status(None), CompletionStatus::Other);
    }

    #[test]
    fn test_volume_by_month_and_hour() {
        let at = |y, m, d, h| NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 15, 0);
        let records = derived(vec![
            TicketRecord { request_time: at(2025, 1, 3, 9), ..ticket("1") },
            TicketRecord { request_time: at(2025, 1, 20, 9), ..ticket("2") },
            TicketRecord { request_time: at(2025, 2, 1, 17), ..ticket("3") },
        ]);
        let summary = TableSummary::from_records(&records);
        assert_eq!(summary.monthly_volume["2025-01"], 2);
        assert_eq!(summary.monthly_volume["2025-02"], 1);
        assert_eq!(summary.hourly_volume[9], 2);
        assert_eq!(summary.hourly_volume[17], 1);
        assert_eq!(summary.hourly_volume.iter().sum::<usize>(), 3);
    }

    #[test]
    fn test_top_categories_ordered_by_count() {
        let with_category = |id: &str, c: &str| TicketRecord {
            category: Some(c.to_string()),
            ..ticket(id)
        };
        let records = vec![
            with_category("1", "Email"),
            with_category("2", "Network"),
            with_category("3", "Network"),
            with_category("4", "Access"),
        ];
        let summary = TableSummary::from_records(&records);
        assert_eq!(summary.top_categories[0].category, "Network");
        assert_eq!(summary.top_categories[0].count, 2);
        assert_eq!(summary.top_categories[1].category, "Access");
    }

    #[test]
    fn test_reopened_requires_all_key_fields() {
        let full = |id: &str| TicketRecord {
            request_user: Some("pat".to_string()),
            category: Some("Email".to_string()),
            sub_category: Some("Outlook".to_string()),
            title: Some("Cannot send".to_string()),
            ..ticket(id)
        };
        let partial = TicketRecord { title: None, ..full("3") };
        let partial_twin = TicketRecord { title: None, ..full("4") };
        let records = vec![full("1"), full("2"), partial, partial_twin, ticket("5")];
        let refs: Vec<&TicketRecord> = records.iter().collect();

        assert_eq!(detect_reopened(&refs), vec![true, true, false, false, false]);
        assert_eq!(TableSummary::from_records(&records).reopened_tickets, 2);
    }
}
