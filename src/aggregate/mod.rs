//! Aggregation over derived records.
//!
//! This module filters the derived table, groups it along a chosen dimension,
//! computes fleet-wide KPIs and builds the supporting views the report shows
//! (breakdowns, rankings, map markers and the utilization planner).

pub mod filter;
pub mod fleet;
pub mod grade;
pub mod group;
pub mod planner;
pub mod types;
pub mod utility;

pub use filter::Filter;
pub use fleet::{
    composition, fleet_summary, location_make_breakdown, location_markers, ranked_by_distance,
    top_workhorses,
};
pub use group::group_records;
pub use planner::plan_target;
pub use types::{
    AggregateSummary, CompositionEntry, FleetSummary, GroupBy, LocationMakeTotal, LocationMarker,
    TargetPlan, TierCounts,
};
