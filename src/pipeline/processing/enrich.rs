use chrono::NaiveDateTime;

use crate::types::{AgingBracket, CanonicalTable, Clock, DerivedMetrics, NormalizedTable, TicketRecord};

const SECONDS_PER_DAY: i64 = 86_400;

/// Trait for adding derived metric columns to ticket rows
pub trait MetricDeriver {
    /// Compute the derived columns for one record, replacing any earlier values
    fn derive(&self, record: &mut TicketRecord);
}

/// Deriver with a fixed "now" so every row in a pass sees the same instant
#[derive(Debug, Clone, Copy)]
pub struct DefaultMetricDeriver {
    pub now: NaiveDateTime,
}

impl DefaultMetricDeriver {
    pub fn at(now: NaiveDateTime) -> Self {
        Self { now }
    }

    /// Reads the clock once; all rows of the pass share that reading
    pub fn from_clock(clock: &Clock) -> Self {
        Self { now: clock.now() }
    }

    pub fn derive_table(&self, table: &mut CanonicalTable) {
        for record in table.records_mut() {
            self.derive(record);
        }
    }

    pub fn derive_normalized(&self, table: &mut NormalizedTable) {
        for record in table.records.iter_mut() {
            self.derive(record);
        }
    }
}

impl MetricDeriver for DefaultMetricDeriver {
    fn derive(&self, record: &mut TicketRecord) {
        let ticket_aging_days = ticket_aging_days(record.request_time, record.close_time, self.now);
        record.metrics = Some(DerivedMetrics {
            response_time_minutes: response_time_minutes(record.request_time, record.close_time),
            ticket_aging_days,
            aging_bracket: AgingBracket::from_aging(ticket_aging_days),
        });
    }
}

/// Minutes from request to close. Zero stands in for "unknown" when either side is missing.
pub fn response_time_minutes(
    request_time: Option<NaiveDateTime>,
    close_time: Option<NaiveDateTime>,
) -> f64 {
    match (request_time, close_time) {
        (Some(request), Some(close)) => (close - request).num_milliseconds() as f64 / 60_000.0,
        _ => 0.0,
    }
}

/// Whole days from request to close, or to `now` while the ticket is open.
/// Floors toward negative infinity; negative results are passed through.
pub fn ticket_aging_days(
    request_time: Option<NaiveDateTime>,
    close_time: Option<NaiveDateTime>,
    now: NaiveDateTime,
) -> Option<i64> {
    let request = request_time?;
    let end = close_time.unwrap_or(now);
    Some((end - request).num_seconds().div_euclid(SECONDS_PER_DAY))
}
