use serde::Serialize;

use crate::pipeline::SourceTable;

/// Response-time distribution, in minutes, over closed tickets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseTimeStats {
    pub count: usize,
    pub min: f64,
    pub median: f64,
    pub mean: f64,
    pub max: f64,
}

impl ResponseTimeStats {
    /// `None` for an empty sample
    pub fn from_minutes(mut minutes: Vec<f64>) -> Option<Self> {
        if minutes.is_empty() {
            return None;
        }
        minutes.sort_by(f64::total_cmp);

        let count = minutes.len();
        let mid = count / 2;
        let median = if count % 2 == 0 {
            (minutes[mid - 1] + minutes[mid]) / 2.0
        } else {
            minutes[mid]
        };

        Some(Self {
            count,
            min: minutes[0],
            median,
            mean: minutes.iter().sum::<f64>() / count as f64,
            max: minutes[count - 1],
        })
    }
}

/// Side-by-side figures for one uploaded source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceComparison {
    pub label: String,
    pub total_requests: usize,
    pub open_tickets: usize,
    pub response_time: Option<ResponseTimeStats>,
}

/// Compare sources using each one's own sub-table, in upload order
pub fn compare_sources(sources: &[SourceTable]) -> Vec<SourceComparison> {
    sources
        .iter()
        .map(|source| {
            let records = &source.table.records;
            let closed_minutes: Vec<f64> = records
                .iter()
                .filter(|r| r.request_time.is_some() && r.close_time.is_some())
                .filter_map(|r| r.metrics.as_ref().map(|m| m.response_time_minutes))
                .collect();

            SourceComparison {
                label: source.label.clone(),
                total_requests: records.len(),
                open_tickets: records.iter().filter(|r| r.is_open()).count(),
                response_time: ResponseTimeStats::from_minutes(closed_minutes),
            }
        })
        .collect()
}
