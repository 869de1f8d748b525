//! Data types produced by the aggregation stage.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::metrics::{DerivedRecord, MaintenanceBand, RiskTier};

/// Dimension derived records are grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    #[default]
    Asset,
    Location,
    Make,
    Role,
    Day,
    Week,
    Month,
}

impl GroupBy {
    pub const ALL: [GroupBy; 7] = [
        GroupBy::Asset,
        GroupBy::Location,
        GroupBy::Make,
        GroupBy::Role,
        GroupBy::Day,
        GroupBy::Week,
        GroupBy::Month,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Asset => "asset",
            GroupBy::Location => "location",
            GroupBy::Make => "make",
            GroupBy::Role => "role",
            GroupBy::Day => "day",
            GroupBy::Week => "week",
            GroupBy::Month => "month",
        }
    }

    /// Group key of `record` along this dimension.
    pub fn key(&self, record: &DerivedRecord) -> String {
        match self {
            GroupBy::Asset => record.vehicle_id.clone(),
            GroupBy::Location => record.location.clone(),
            GroupBy::Make => record.make.clone(),
            GroupBy::Role => record.role.clone(),
            GroupBy::Day => bucket(record.timestamp, "%Y-%m-%d"),
            GroupBy::Week => bucket(record.timestamp, "%G-W%V"),
            GroupBy::Month => bucket(record.timestamp, "%Y-%m"),
        }
    }
}

fn bucket(ts: NaiveDateTime, fmt: &str) -> String {
    ts.format(fmt).to_string()
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let wanted = match wanted.as_str() {
            "region" => "location",
            "vehicle" => "asset",
            other => other,
        };
        GroupBy::ALL
            .into_iter()
            .find(|g| g.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = GroupBy::ALL.iter().map(GroupBy::as_str).collect();
                format!("unknown grouping {s:?}, expected one of: {}", known.join(", "))
            })
    }
}

/// Record counts per risk tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl TierCounts {
    pub fn add(&mut self, tier: RiskTier) {
        match tier {
            RiskTier::Low => self.low += 1,
            RiskTier::Medium => self.medium += 1,
            RiskTier::High => self.high += 1,
        }
    }

    pub fn get(&self, tier: RiskTier) -> usize {
        match tier {
            RiskTier::Low => self.low,
            RiskTier::Medium => self.medium,
            RiskTier::High => self.high,
        }
    }

    pub fn total(&self) -> usize {
        self.low + self.medium + self.high
    }
}

/// Summary statistics for one group of derived records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateSummary {
    pub group_key: String,
    pub records: usize,
    /// Distinct vehicles in the group.
    pub assets: usize,
    pub total_distance: f64,
    pub total_cost: f64,
    pub average_utilization: f64,
    pub risk_tier_counts: TierCounts,
}

/// Headline KPIs over the filtered record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FleetSummary {
    pub records: usize,
    pub unique_assets: usize,
    pub active_assets: usize,
    /// Percentage of unique assets with at least one active record.
    pub utilization_rate: f64,
    /// Records with zero distance.
    pub ghost_records: usize,
    pub anomalies: usize,
    pub total_distance: f64,
    pub total_cost: f64,
    pub average_utilization: f64,
    pub utilization_stddev: f64,
    pub risk_tier_counts: TierCounts,
}

/// Distance covered per (location, make) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationMakeTotal {
    pub location: String,
    pub make: String,
    pub total_distance: f64,
}

/// Record count per make → role → maintenance band path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompositionEntry {
    pub make: String,
    pub role: String,
    pub band: MaintenanceBand,
    pub count: usize,
}

/// One map marker per location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationMarker {
    pub location: String,
    pub lat: f64,
    pub lon: f64,
    pub records: usize,
    pub total_distance: f64,
}

/// Utilization target recommendation drawn from active records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetPlan {
    /// 75th percentile of active utilization.
    pub recommended: f64,
    pub average: f64,
    pub best: f64,
    pub sample_size: usize,
}
