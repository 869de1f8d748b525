//! Cell coercion and metadata clean-up for raw export rows.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use crate::config::{Settings, Site};
use crate::error::ValidationError;

pub const UNKNOWN_LOCATION: &str = "Unknown";
pub const UNKNOWN_COORDS: (f64, f64) = (25.0, 55.0);
pub const UNKNOWN_MAKE: &str = "UNKNOWN";
pub const DEFAULT_ROLE: &str = "General Pool";

/// Plate numbers look like `1-98025 RT-198`: an id followed by role notes.
static PLATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z0-9-]+)\s*(.*)$").expect("plate pattern is valid"));

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

/// Splits a raw asset id into `(vehicle_id, role)`.
pub fn split_asset_id(raw: &str) -> (String, String) {
    let raw = raw.trim();
    match PLATE_RE.captures(raw) {
        Some(caps) => {
            let id = caps.get(1).map_or(raw, |m| m.as_str());
            let role = caps.get(2).map(|m| m.as_str().trim()).unwrap_or("");
            let role = if role.is_empty() { DEFAULT_ROLE } else { role };
            (id.to_string(), role.to_string())
        }
        None => (raw.to_string(), DEFAULT_ROLE.to_string()),
    }
}

pub fn normalize_make(raw: Option<&str>) -> String {
    raw.map(|m| m.trim().to_uppercase())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| UNKNOWN_MAKE.to_string())
}

/// Parses an odometer-style reading: finite, non-negative, `,` separators allowed.
pub fn parse_reading(field: &'static str, raw: Option<&str>) -> Result<f64, ValidationError> {
    let raw = raw
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::MissingValue { field })?;

    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    let value: f64 = cleaned
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| ValidationError::InvalidNumber {
            field,
            value: raw.to_string(),
        })?;

    if value < 0.0 {
        return Err(ValidationError::NegativeReading { field, value });
    }

    Ok(value)
}

/// Parses the timestamp formats seen in telematics exports; dates mean midnight.
pub fn parse_timestamp(raw: Option<&str>) -> Result<NaiveDateTime, ValidationError> {
    let raw = raw
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::MissingValue { field: "timestamp" })?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_utc());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(dt);
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Ok(date.and_time(NaiveTime::default()));
        }
    }

    Err(ValidationError::InvalidTimestamp {
        value: raw.to_string(),
    })
}

/// Maps free-text locations onto the configured sites.
#[derive(Debug, Clone)]
pub struct LocationResolver {
    aliases: Vec<(String, String)>,
    sites: Vec<Site>,
}

impl LocationResolver {
    pub fn new(settings: &Settings) -> Self {
        let aliases = settings
            .location_aliases
            .iter()
            .map(|(from, to)| (from.to_uppercase(), to.to_uppercase()))
            .collect();

        LocationResolver {
            aliases,
            sites: settings.sites.clone(),
        }
    }

    /// Returns the canonical site name, or [`UNKNOWN_LOCATION`].
    pub fn resolve(&self, raw: Option<&str>) -> String {
        let Some(raw) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
            return UNKNOWN_LOCATION.to_string();
        };

        let mut upper = raw.to_uppercase();
        for (from, to) in &self.aliases {
            upper = upper.replace(from.as_str(), to);
        }
        let upper = upper.trim();

        self.sites
            .iter()
            .find(|site| site.name.to_uppercase() == upper)
            .map(|site| site.name.clone())
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string())
    }

    pub fn coordinates(&self, location: &str) -> (f64, f64) {
        self.sites
            .iter()
            .find(|site| site.name == location)
            .map_or(UNKNOWN_COORDS, |site| (site.lat, site.lon))
    }
}
