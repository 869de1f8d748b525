//! Loader → Deriver → Aggregator, run end to end for each refresh.

use serde::Serialize;
use tracing::{info, warn};

use crate::aggregate::{
    self, AggregateSummary, CompositionEntry, Filter, FleetSummary, GroupBy, LocationMakeTotal,
    LocationMarker, TargetPlan,
};
use crate::config::Settings;
use crate::error::Result;
use crate::loader::{LoadedTable, RowIssue};
use crate::metrics::{DerivedRecord, derive_all};

/// What the presenter needs for one render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub view: String,
    pub group_by: GroupBy,
    pub currency: String,
    pub summary: FleetSummary,
    pub groups: Vec<AggregateSummary>,
    pub trend: Vec<AggregateSummary>,
    pub location_make: Vec<LocationMakeTotal>,
    pub composition: Vec<CompositionEntry>,
    pub workhorses: Vec<DerivedRecord>,
    pub markers: Vec<LocationMarker>,
    pub plan: Option<TargetPlan>,
    /// Filtered records, longest distance first.
    pub registry: Vec<DerivedRecord>,
    pub issues: Vec<RowIssue>,
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Ready(Box<Report>),
    Empty {
        reason: String,
        issues: Vec<RowIssue>,
    },
}

impl Outcome {
    pub fn report(&self) -> Option<&Report> {
        match self {
            Outcome::Ready(report) => Some(report.as_ref()),
            Outcome::Empty { .. } => None,
        }
    }

    pub fn issues(&self) -> &[RowIssue] {
        match self {
            Outcome::Ready(report) => &report.issues,
            Outcome::Empty { issues, .. } => issues,
        }
    }
}

/// Derives and filters the loaded records without aggregating.
pub fn derive_filtered(table: &LoadedTable, settings: &Settings, filter: &Filter) -> Vec<DerivedRecord> {
    filter.apply(derive_all(&table.records, settings))
}

/// Runs the full pipeline over an already-loaded table.
///
/// An empty table, or a filter that removes every record, yields
/// [`Outcome::Empty`] rather than an error.
#[tracing::instrument(skip_all, fields(group_by = %group_by, filter = %filter.describe()))]
pub fn run(
    table: &LoadedTable,
    settings: &Settings,
    filter: &Filter,
    group_by: GroupBy,
) -> Outcome {
    let records = derive_filtered(table, settings, filter);

    let summary = match aggregate::fleet_summary(&records) {
        Ok(summary) => summary,
        Err(error) => {
            let reason = if table.is_empty() {
                "No valid rows were loaded".to_string()
            } else {
                format!("No records match the current filter ({})", filter.describe())
            };
            warn!(%error, %reason, "Nothing to report");
            return Outcome::Empty {
                reason,
                issues: table.issues.clone(),
            };
        }
    };

    info!(
        records = summary.records,
        assets = summary.unique_assets,
        total_distance = summary.total_distance,
        "Pipeline complete"
    );

    Outcome::Ready(Box::new(Report {
        view: filter.describe(),
        group_by,
        currency: settings.currency.clone(),
        groups: aggregate::group_records(&records, group_by),
        trend: aggregate::group_records(&records, GroupBy::Day),
        location_make: aggregate::location_make_breakdown(&records),
        composition: aggregate::composition(&records),
        workhorses: aggregate::top_workhorses(&records),
        markers: aggregate::location_markers(&records),
        plan: aggregate::plan_target(&records),
        registry: aggregate::ranked_by_distance(&records),
        issues: table.issues.clone(),
        summary,
    }))
}

/// Loads `bytes` and runs the pipeline; validation failures that reject the
/// whole load are returned as errors.
pub fn run_bytes(
    bytes: &[u8],
    settings: &Settings,
    filter: &Filter,
    group_by: GroupBy,
) -> Result<Outcome> {
    let table = crate::loader::load_bytes(bytes, settings)?;
    Ok(run(&table, settings, filter, group_by))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
asset_id,start_km,end_km,timestamp,location,make
A1,100,150,2024-01-01,Dubai,
A2,300,200,2024-01-01,Dubai,
B1,0,80,2024-01-02,Sharjah,
A1,150,190,2024-01-03,Dubai,
";

    fn settings() -> Settings {
        Settings {
            cost_per_km: 0.5,
            ..Settings::default()
        }
    }

    #[test]
    fn test_run_produces_report() {
        let outcome = run_bytes(CSV.as_bytes(), &settings(), &Filter::default(), GroupBy::Asset)
            .unwrap();
        let report = outcome.report().expect("report");

        assert_eq!(report.summary.records, 3);
        assert_eq!(report.summary.total_distance, 170.0);
        assert_eq!(report.summary.total_cost, 85.0);
        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.groups[0].group_key, "A1");
        assert_eq!(report.groups[0].total_distance, 90.0);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].line, 3);
        assert_eq!(report.registry[0].vehicle_id, "B1");
        assert_eq!(report.trend.len(), 3);
    }

    #[test]
    fn test_rejected_rows_stay_out_of_aggregates() {
        let outcome = run_bytes(CSV.as_bytes(), &settings(), &Filter::default(), GroupBy::Asset)
            .unwrap();
        let report = outcome.report().unwrap();
        assert!(report.groups.iter().all(|g| g.group_key != "A2"));
        assert!(report.registry.iter().all(|r| r.asset_id != "A2"));
    }

    #[test]
    fn test_run_is_idempotent() {
        let table = crate::loader::load_bytes(CSV.as_bytes(), &settings()).unwrap();
        let first = run(&table, &settings(), &Filter::default(), GroupBy::Location);
        let second = run(&table, &settings(), &Filter::default(), GroupBy::Location);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_table_is_empty_state() {
        let outcome = run(
            &LoadedTable::default(),
            &settings(),
            &Filter::default(),
            GroupBy::Asset,
        );
        match outcome {
            Outcome::Empty { reason, issues } => {
                assert_eq!(reason, "No valid rows were loaded");
                assert!(issues.is_empty());
            }
            Outcome::Ready(_) => panic!("expected empty state"),
        }
    }

    #[test]
    fn test_filter_that_matches_nothing_is_empty_state() {
        let filter = Filter {
            locations: vec!["Fujairah".into()],
            ..Filter::default()
        };
        let outcome = run_bytes(CSV.as_bytes(), &settings(), &filter, GroupBy::Asset).unwrap();
        assert!(outcome.report().is_none());
        assert_eq!(outcome.issues().len(), 1);
    }

    #[test]
    fn test_missing_columns_are_errors() {
        let err = run_bytes(
            b"asset_id,start_km\nA1,1\n",
            &settings(),
            &Filter::default(),
            GroupBy::Asset,
        )
        .unwrap_err();
        assert!(err.is_validation());
    }
}
