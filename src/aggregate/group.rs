use std::collections::{HashMap, HashSet};

use crate::aggregate::types::{AggregateSummary, GroupBy, TierCounts};
use crate::metrics::DerivedRecord;

#[derive(Default)]
struct Accumulator<'a> {
    records: usize,
    assets: HashSet<&'a str>,
    total_distance: f64,
    total_cost: f64,
    utilization_sum: f64,
    tiers: TierCounts,
}

/// Groups `records` by `by`, preserving the order in which keys first appear.
pub fn group_records(records: &[DerivedRecord], by: GroupBy) -> Vec<AggregateSummary> {
    let mut order: Vec<(String, Accumulator)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = by.key(record);
        let slot = match index.get(&key) {
            Some(&i) => i,
            None => {
                index.insert(key.clone(), order.len());
                order.push((key, Accumulator::default()));
                order.len() - 1
            }
        };

        let acc = &mut order[slot].1;
        acc.records += 1;
        acc.assets.insert(record.vehicle_id.as_str());
        acc.total_distance += record.distance_km;
        acc.total_cost += record.estimated_cost;
        acc.utilization_sum += record.utilization_score;
        acc.tiers.add(record.risk_tier);
    }

    order
        .into_iter()
        .map(|(group_key, acc)| {
            let average_utilization = acc.utilization_sum / acc.records as f64;
            AggregateSummary {
                group_key,
                records: acc.records,
                assets: acc.assets.len(),
                total_distance: acc.total_distance,
                total_cost: acc.total_cost,
                average_utilization,
                risk_tier_counts: acc.tiers,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::loader::TripRecord;
    use crate::metrics::derive_all;
    use chrono::NaiveDate;

    fn derived() -> Vec<DerivedRecord> {
        let at = |m: u32, d: u32| {
            NaiveDate::from_ymd_opt(2024, m, d)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap()
        };
        let trips = vec![
            TripRecord::new("B2", 0.0, 40.0, at(1, 1)).with_location("Sharjah"),
            TripRecord::new("A1", 100.0, 150.0, at(1, 1)).with_location("Dubai"),
            TripRecord::new("B2", 40.0, 100.0, at(1, 8)).with_location("Sharjah"),
            TripRecord::new("A1", 150.0, 250.0, at(2, 1)).with_location("Sharjah"),
        ];
        let settings = Settings {
            cost_per_km: 0.5,
            ..Settings::default()
        };
        derive_all(&trips, &settings)
    }

    #[test]
    fn test_group_order_is_first_occurrence() {
        let groups = group_records(&derived(), GroupBy::Asset);
        let keys: Vec<&str> = groups.iter().map(|g| g.group_key.as_str()).collect();
        assert_eq!(keys, vec!["B2", "A1"]);
    }

    #[test]
    fn test_group_totals() {
        let groups = group_records(&derived(), GroupBy::Asset);
        let b2 = &groups[0];
        assert_eq!(b2.records, 2);
        assert_eq!(b2.assets, 1);
        assert_eq!(b2.total_distance, 100.0);
        assert_eq!(b2.total_cost, 50.0);
        assert_eq!(b2.average_utilization, 0.5);
        assert_eq!(b2.risk_tier_counts.low, 2);
    }

    #[test]
    fn test_group_distance_matches_member_sum() {
        let records = derived();
        for group in group_records(&records, GroupBy::Location) {
            let member_sum: f64 = records
                .iter()
                .filter(|r| r.location == group.group_key)
                .map(|r| r.distance_km)
                .sum();
            assert!((group.total_distance - member_sum).abs() < 1e-9);
        }
    }

    #[test]
    fn test_location_groups_count_distinct_assets() {
        let groups = group_records(&derived(), GroupBy::Location);
        assert_eq!(groups[0].group_key, "Sharjah");
        assert_eq!(groups[0].records, 3);
        assert_eq!(groups[0].assets, 2);
        assert_eq!(groups[1].group_key, "Dubai");
    }

    #[test]
    fn test_time_buckets() {
        let records = derived();
        let days: Vec<String> = group_records(&records, GroupBy::Day)
            .into_iter()
            .map(|g| g.group_key)
            .collect();
        assert_eq!(days, vec!["2024-01-01", "2024-01-08", "2024-02-01"]);

        let weeks: Vec<String> = group_records(&records, GroupBy::Week)
            .into_iter()
            .map(|g| g.group_key)
            .collect();
        assert_eq!(weeks, vec!["2024-W01", "2024-W02", "2024-W05"]);

        let months = group_records(&records, GroupBy::Month);
        assert_eq!(months.len(), 2);
        assert_eq!(months[0].total_distance, 150.0);
    }

    #[test]
    fn test_empty_input_has_no_groups() {
        assert!(group_records(&[], GroupBy::Make).is_empty());
    }
}
