use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{Cell, Sla};

static SLA_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"Met|Fail").unwrap());

const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d-%b-%Y %H:%M:%S",
    "%d-%b-%Y %H:%M",
];

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%m/%d/%Y", "%d-%b-%Y", "%Y/%m/%d"];

// Excel serial day 0; serials above this are past year 9999
const EXCEL_MAX_SERIAL: f64 = 2_958_466.0;

/// Read a cell as a timestamp. Anything unparsable is `None`, never an error.
pub fn parse_timestamp(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::DateTime(dt) => Some(*dt),
        Cell::Number(serial) => from_excel_serial(*serial),
        Cell::Text(text) => parse_timestamp_str(text),
        Cell::Empty | Cell::Bool(_) => None,
    }
}

pub fn parse_timestamp_str(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Convert an Excel serial date (days since 1899-12-30, fraction = time of day)
pub fn from_excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial <= 0.0 || serial >= EXCEL_MAX_SERIAL {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(Duration::milliseconds(millis))
}

/// Pull the first literal `Met` or `Fail` out of free text (case-sensitive)
pub fn extract_sla(cell: &Cell) -> Option<Sla> {
    if cell.is_empty() {
        return None;
    }
    let text = cell.to_string();
    match SLA_TOKEN.find(&text)?.as_str() {
        "Met" => Some(Sla::Met),
        "Fail" => Some(Sla::Fail),
        _ => None,
    }
}
