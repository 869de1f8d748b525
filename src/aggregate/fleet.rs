use std::collections::{HashMap, HashSet};

use crate::aggregate::types::{
    CompositionEntry, FleetSummary, LocationMakeTotal, LocationMarker, TierCounts,
};
use crate::aggregate::utility::{mean, pct, stddev};
use crate::error::{FleetError, Result};
use crate::metrics::{DerivedRecord, MaintenanceBand};

/// Headline KPIs for the whole filtered set.
///
/// # Errors
///
/// Returns [`FleetError::EmptyData`] when `records` is empty.
pub fn fleet_summary(records: &[DerivedRecord]) -> Result<FleetSummary> {
    if records.is_empty() {
        return Err(FleetError::EmptyData {
            stage: "aggregation",
        });
    }

    let unique: HashSet<&str> = records.iter().map(|r| r.vehicle_id.as_str()).collect();
    let active: HashSet<&str> = records
        .iter()
        .filter(|r| r.active)
        .map(|r| r.vehicle_id.as_str())
        .collect();

    let utilization: Vec<f64> = records.iter().map(|r| r.utilization_score).collect();
    let average_utilization = mean(&utilization);

    let mut risk_tier_counts = TierCounts::default();
    for r in records {
        risk_tier_counts.add(r.risk_tier);
    }

    Ok(FleetSummary {
        records: records.len(),
        unique_assets: unique.len(),
        active_assets: active.len(),
        utilization_rate: pct(active.len(), unique.len()),
        ghost_records: records.iter().filter(|r| r.ghost).count(),
        anomalies: records.iter().filter(|r| r.anomalous).count(),
        total_distance: records.iter().map(|r| r.distance_km).sum(),
        total_cost: records.iter().map(|r| r.estimated_cost).sum(),
        average_utilization,
        utilization_stddev: stddev(&utilization, average_utilization),
        risk_tier_counts,
    })
}

/// Distance per (location, make), in first-occurrence order.
pub fn location_make_breakdown(records: &[DerivedRecord]) -> Vec<LocationMakeTotal> {
    let mut out: Vec<LocationMakeTotal> = Vec::new();
    let mut index: HashMap<(&str, &str), usize> = HashMap::new();

    for r in records {
        let key = (r.location.as_str(), r.make.as_str());
        match index.get(&key) {
            Some(&i) => out[i].total_distance += r.distance_km,
            None => {
                index.insert(key, out.len());
                out.push(LocationMakeTotal {
                    location: r.location.clone(),
                    make: r.make.clone(),
                    total_distance: r.distance_km,
                });
            }
        }
    }

    out
}

/// Record counts along make → role → maintenance band.
pub fn composition(records: &[DerivedRecord]) -> Vec<CompositionEntry> {
    let mut out: Vec<CompositionEntry> = Vec::new();
    let mut index: HashMap<(&str, &str, MaintenanceBand), usize> = HashMap::new();

    for r in records {
        let key = (r.make.as_str(), r.role.as_str(), r.maintenance_band);
        match index.get(&key) {
            Some(&i) => out[i].count += 1,
            None => {
                index.insert(key, out.len());
                out.push(CompositionEntry {
                    make: r.make.clone(),
                    role: r.role.clone(),
                    band: r.maintenance_band,
                    count: 1,
                });
            }
        }
    }

    out
}

/// Records sorted by distance, longest first; ties keep input order.
pub fn ranked_by_distance(records: &[DerivedRecord]) -> Vec<DerivedRecord> {
    let mut ranked = records.to_vec();
    ranked.sort_by(|a, b| b.distance_km.total_cmp(&a.distance_km));
    ranked
}

/// The top 20% of records by distance plus five, capped at the record count.
pub fn top_workhorses(records: &[DerivedRecord]) -> Vec<DerivedRecord> {
    let take = records.len() / 5 + 5;
    let mut ranked = ranked_by_distance(records);
    ranked.truncate(take);
    ranked
}

/// One marker per location with its record count and distance.
pub fn location_markers(records: &[DerivedRecord]) -> Vec<LocationMarker> {
    let mut out: Vec<LocationMarker> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for r in records {
        match index.get(r.location.as_str()) {
            Some(&i) => {
                out[i].records += 1;
                out[i].total_distance += r.distance_km;
            }
            None => {
                index.insert(r.location.as_str(), out.len());
                out.push(LocationMarker {
                    location: r.location.clone(),
                    lat: r.lat,
                    lon: r.lon,
                    records: 1,
                    total_distance: r.distance_km,
                });
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::loader::TripRecord;
    use crate::metrics::{MaintenanceBand, derive_all};
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn derived() -> Vec<DerivedRecord> {
        let trips = vec![
            TripRecord::new("V1", 1_000.0, 1_200.0, ts())
                .with_location("Dubai")
                .with_make("Mazda"),
            TripRecord::new("V2", 60_000.0, 60_000.0, ts())
                .with_location("Dubai")
                .with_make("Mazda"),
            TripRecord::new("V3", 500.0, 505.0, ts())
                .with_location("Ajman")
                .with_make("Ashok Leyland"),
            TripRecord::new("V1", 1_200.0, 1_300.0, ts())
                .with_location("Dubai")
                .with_make("Mazda"),
        ];
        derive_all(&trips, &Settings::default())
    }

    #[test]
    fn test_summary_kpis() {
        let summary = fleet_summary(&derived()).unwrap();
        assert_eq!(summary.records, 4);
        assert_eq!(summary.unique_assets, 3);
        // V1 is active; V2 is parked; V3 covered only 5 km
        assert_eq!(summary.active_assets, 1);
        assert!((summary.utilization_rate - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(summary.ghost_records, 1);
        assert_eq!(summary.anomalies, 0);
        assert_eq!(summary.total_distance, 305.0);
        assert_eq!(summary.risk_tier_counts.total(), 4);
        assert_eq!(summary.risk_tier_counts.medium, 1);
    }

    #[test]
    fn test_summary_of_nothing_is_empty_data() {
        let err = fleet_summary(&[]).unwrap_err();
        assert!(matches!(err, FleetError::EmptyData { .. }));
    }

    #[test]
    fn test_breakdown_sums_per_pair() {
        let breakdown = location_make_breakdown(&derived());
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].location, "Dubai");
        assert_eq!(breakdown[0].make, "MAZDA");
        assert_eq!(breakdown[0].total_distance, 300.0);
        assert_eq!(breakdown[1].make, "ASHOK LEYLAND");
    }

    #[test]
    fn test_composition_counts_bands() {
        let entries = composition(&derived());
        let mazda_mid: Vec<_> = entries
            .iter()
            .filter(|e| e.make == "MAZDA" && e.band == MaintenanceBand::MidLife)
            .collect();
        assert_eq!(mazda_mid.len(), 1);
        assert_eq!(mazda_mid[0].count, 1);
        assert_eq!(entries.iter().map(|e| e.count).sum::<usize>(), 4);
    }

    #[test]
    fn test_composition_keeps_first_occurrence_order() {
        let entries = composition(&derived());
        let keys: Vec<(&str, MaintenanceBand, usize)> = entries
            .iter()
            .map(|e| (e.make.as_str(), e.band, e.count))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("MAZDA", MaintenanceBand::Fresh, 2),
                ("MAZDA", MaintenanceBand::MidLife, 1),
                ("ASHOK LEYLAND", MaintenanceBand::Fresh, 1),
            ]
        );
    }

    #[test]
    fn test_workhorses_are_longest_first() {
        let top = top_workhorses(&derived());
        // 4 / 5 + 5 = 5, capped at 4
        assert_eq!(top.len(), 4);
        assert_eq!(top[0].distance_km, 200.0);
        assert_eq!(top[1].distance_km, 100.0);
        assert_eq!(top[3].distance_km, 0.0);
    }

    #[test]
    fn test_workhorse_count_scales() {
        let ts = ts();
        let trips: Vec<TripRecord> = (0..30)
            .map(|i| TripRecord::new(&format!("V{i}"), 0.0, i as f64, ts))
            .collect();
        let top = top_workhorses(&derive_all(&trips, &Settings::default()));
        assert_eq!(top.len(), 11);
        assert_eq!(top[0].distance_km, 29.0);
    }

    #[test]
    fn test_markers_per_location() {
        let markers = location_markers(&derived());
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].location, "Dubai");
        assert_eq!(markers[0].records, 3);
        assert_eq!(markers[0].total_distance, 300.0);
        assert_eq!((markers[1].lat, markers[1].lon), (25.4052, 55.5136));
    }
}
