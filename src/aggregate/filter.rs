use chrono::NaiveDate;
use serde::Serialize;

use crate::metrics::DerivedRecord;

/// Row selection applied before aggregation. Empty lists select everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Filter {
    pub locations: Vec<String>,
    pub makes: Vec<String>,
    /// Matched against both the raw asset id and the vehicle id.
    pub assets: Vec<String>,
    /// Inclusive.
    pub from: Option<NaiveDate>,
    /// Inclusive.
    pub to: Option<NaiveDate>,
}

fn selected(choices: &[String], value: &str) -> bool {
    choices.is_empty() || choices.iter().any(|c| c.trim().eq_ignore_ascii_case(value))
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
            && self.makes.is_empty()
            && self.assets.is_empty()
            && self.from.is_none()
            && self.to.is_none()
    }

    pub fn matches(&self, record: &DerivedRecord) -> bool {
        let date = record.timestamp.date();

        selected(&self.locations, &record.location)
            && selected(&self.makes, &record.make)
            && (selected(&self.assets, &record.asset_id)
                || selected(&self.assets, &record.vehicle_id))
            && self.from.is_none_or(|from| date >= from)
            && self.to.is_none_or(|to| date <= to)
    }

    pub fn apply(&self, records: Vec<DerivedRecord>) -> Vec<DerivedRecord> {
        if self.is_empty() {
            return records;
        }
        records.into_iter().filter(|r| self.matches(r)).collect()
    }

    /// Short human description, e.g. `2 location(s), from 2024-01-01`.
    pub fn describe(&self) -> String {
        if self.is_empty() {
            return "all records".to_string();
        }

        let mut parts = Vec::new();
        for (label, list) in [
            ("location", &self.locations),
            ("make", &self.makes),
            ("asset", &self.assets),
        ] {
            if !list.is_empty() {
                parts.push(format!("{} {label}(s)", list.len()));
            }
        }
        if let Some(from) = self.from {
            parts.push(format!("from {from}"));
        }
        if let Some(to) = self.to {
            parts.push(format!("to {to}"));
        }
        parts.join(", ")
    }
}
