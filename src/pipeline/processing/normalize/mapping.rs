use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::CanonicalField;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Trim a column name and collapse internal whitespace runs to one space
pub fn clean_header(name: &str) -> String {
    WHITESPACE_RUN.replace_all(name.trim(), " ").into_owned()
}

/// Ordered table of canonical fields and the source column names accepted for each
#[derive(Debug, Clone)]
pub struct ColumnMapping {
    entries: Vec<(CanonicalField, Vec<String>)>,
}

/// How a source's header row maps onto canonical fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedColumns {
    /// Column index feeding each canonical field
    pub fields: BTreeMap<CanonicalField, usize>,
    /// Columns matching a variant that lost to a later mapping for the same field
    pub superseded: Vec<usize>,
    /// Named columns no variant matched, with their cleaned names
    pub unmapped: Vec<(usize, String)>,
}

impl ResolvedColumns {
    pub fn has(&self, field: CanonicalField) -> bool {
        self.fields.contains_key(&field)
    }
}

impl ColumnMapping {
    /// The built-in mapping for known service-desk exports
    pub fn standard() -> Self {
        let table: [(CanonicalField, &[&str]); 13] = [
            (
                CanonicalField::RequestTime,
                &["Request time", "Request Date", "Created Time", "Timestamp"],
            ),
            (
                CanonicalField::Ticket,
                &["#", "Ticket", "Request ID", "Incident ID", "Case Number"],
            ),
            (CanonicalField::Sla, &["SLA", "SLA Compliance", "Met SLA"]),
            (
                CanonicalField::CloseTime,
                &["Close time", "Resolved Time", "Completion Date"],
            ),
            (
                CanonicalField::DueDate,
                &["Due Date", "SLA Due Date", "Deadline"],
            ),
            (CanonicalField::Category, &["Category", "Request Category"]),
            (
                CanonicalField::SubCategory,
                &["Sub-Category", "Request Sub-Category"],
            ),
            (
                CanonicalField::ProcessManager,
                &["Process Manager", "Assigned Manager"],
            ),
            (CanonicalField::Status, &["Status", "State", "Request Status"]),
            (CanonicalField::Priority, &["Priority"]),
            (CanonicalField::Urgency, &["Urgency"]),
            (
                CanonicalField::RequestUser,
                &["Request user", "Requester", "Requested By"],
            ),
            (CanonicalField::Title, &["Title", "Subject", "Summary"]),
        ];

        Self {
            entries: table
                .iter()
                .map(|(field, variants)| {
                    (*field, variants.iter().map(|v| v.to_string()).collect())
                })
                .collect(),
        }
    }

    /// Accept another column name for a field. It is appended, so it wins over
    /// the field's existing variants when both appear in one source.
    pub fn register(&mut self, field: CanonicalField, variant: impl Into<String>) {
        let variant = variant.into();
        match self.entries.iter_mut().find(|(f, _)| *f == field) {
            Some((_, variants)) => variants.push(variant),
            None => self.entries.push((field, vec![variant])),
        }
    }

    pub fn variants(&self, field: CanonicalField) -> &[String] {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, variants)| variants.as_slice())
            .unwrap_or(&[])
    }

    /// Map a header row onto canonical fields.
    ///
    /// Fields are visited in table order and each field's variants in listed
    /// order; every match overwrites the previous one, so the last mapping wins.
    /// Names are compared after whitespace cleaning, ignoring ASCII case.
    pub fn resolve(&self, headers: &[String]) -> ResolvedColumns {
        let cleaned: Vec<String> = headers.iter().map(|h| clean_header(h)).collect();
        let mut resolved = ResolvedColumns::default();
        let mut matched = vec![false; cleaned.len()];

        for (field, variants) in &self.entries {
            for variant in variants {
                let variant = clean_header(variant);
                for (index, header) in cleaned.iter().enumerate() {
                    if header.eq_ignore_ascii_case(&variant) {
                        matched[index] = true;
                        if let Some(previous) = resolved.fields.insert(*field, index) {
                            if previous != index {
                                resolved.superseded.push(previous);
                            }
                        }
                    }
                }
            }
        }

        let claimed: Vec<usize> = resolved.fields.values().copied().collect();
        resolved.superseded.retain(|index| !claimed.contains(index));
        resolved.superseded.sort_unstable();
        resolved.superseded.dedup();

        resolved.unmapped = cleaned
            .into_iter()
            .enumerate()
            .filter(|(index, name)| !matched[*index] && !name.is_empty())
            .collect();

        resolved
    }
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self::standard()
    }
}
