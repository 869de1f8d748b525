//! Per-record metric derivation.
//!
//! Every derived field is a pure function of one [`TripRecord`] and the
//! static [`Settings`]; the same input always yields the same output.

pub mod risk;

pub use risk::{MaintenanceBand, RiskTier};

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::config::Settings;
use crate::loader::TripRecord;
use crate::loader::normalize::LocationResolver;

/// A trip record with its derived metrics. Flat so it exports as one CSV row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedRecord {
    pub line: u64,
    pub asset_id: String,
    pub vehicle_id: String,
    pub role: String,
    pub make: String,
    pub location: String,
    pub lat: f64,
    pub lon: f64,
    pub timestamp: NaiveDateTime,
    pub start_km: f64,
    pub end_km: f64,
    pub age_years: Option<f64>,

    pub distance_km: f64,
    pub cost_rate: f64,
    pub estimated_cost: f64,
    pub utilization_score: f64,
    pub risk_score: f64,
    pub risk_tier: RiskTier,
    pub maintenance_band: MaintenanceBand,
    pub active: bool,
    pub ghost: bool,
    pub anomalous: bool,
}

/// Cost per km for `make`: fuel profile if configured, flat rate otherwise.
pub fn cost_rate(make: &str, settings: &Settings) -> f64 {
    match settings.fuel.profiles.get(make) {
        Some(profile) => profile.litres_per_100km / 100.0 * settings.fuel.price(profile.fuel),
        None => settings.cost_per_km,
    }
}

/// `distance / baseline`, or 0.0 when the baseline is not positive.
pub fn utilization_score(distance_km: f64, baseline_km: f64) -> f64 {
    if baseline_km <= 0.0 {
        0.0
    } else {
        distance_km / baseline_km
    }
}

/// Derives metrics for records against one configuration.
pub struct Deriver<'a> {
    settings: &'a Settings,
    locations: LocationResolver,
}

impl<'a> Deriver<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Deriver {
            settings,
            locations: LocationResolver::new(settings),
        }
    }

    pub fn derive(&self, record: &TripRecord) -> DerivedRecord {
        let settings = self.settings;
        let distance_km = record.end_km - record.start_km;
        let rate = cost_rate(&record.make, settings);
        let anomalous = distance_km > settings.max_plausible_km;
        let risk_score = risk::risk_score(record.end_km, record.age_years, anomalous, &settings.risk);
        let (lat, lon) = self.locations.coordinates(&record.location);

        DerivedRecord {
            line: record.line,
            asset_id: record.asset_id.clone(),
            vehicle_id: record.vehicle_id.clone(),
            role: record.role.clone(),
            make: record.make.clone(),
            location: record.location.clone(),
            lat,
            lon,
            timestamp: record.timestamp,
            start_km: record.start_km,
            end_km: record.end_km,
            age_years: record.age_years,

            distance_km,
            cost_rate: rate,
            estimated_cost: distance_km * rate,
            utilization_score: utilization_score(distance_km, settings.expected_distance_km),
            risk_score,
            risk_tier: RiskTier::from_score(risk_score, &settings.risk),
            maintenance_band: MaintenanceBand::from_odometer(record.end_km, &settings.risk),
            active: distance_km > settings.active_threshold_km,
            ghost: distance_km == 0.0,
            anomalous,
        }
    }
}

pub fn derive_all(records: &[TripRecord], settings: &Settings) -> Vec<DerivedRecord> {
    let deriver = Deriver::new(settings);
    records.iter().map(|r| deriver.derive(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn flat_rate(rate: f64) -> Settings {
        Settings {
            cost_per_km: rate,
            ..Settings::default()
        }
    }

    #[test]
    fn test_distance_and_cost_example() {
        let settings = flat_rate(0.5);
        let record = TripRecord::new("A1", 100.0, 150.0, ts());
        let derived = Deriver::new(&settings).derive(&record);

        assert_eq!(derived.distance_km, 50.0);
        assert_eq!(derived.cost_rate, 0.5);
        assert_eq!(derived.estimated_cost, 25.0);
        assert_eq!(derived.utilization_score, 0.5);
        assert!(derived.active);
        assert!(!derived.ghost);
        assert!(!derived.anomalous);
    }

    #[test]
    fn test_fuel_profile_rate() {
        let settings = Settings::default();
        // 8 L/100km petrol at 2.60
        assert!((cost_rate("NISSAN SUNNY", &settings) - 0.208).abs() < 1e-12);
        // 16 L/100km diesel at 2.85
        assert!((cost_rate("ASHOK LEYLAND", &settings) - 0.456).abs() < 1e-12);
        assert_eq!(cost_rate("TESLA", &settings), settings.cost_per_km);
    }

    #[test]
    fn test_cost_is_distance_times_rate() {
        let settings = Settings::default();
        let records = vec![
            TripRecord::new("A1", 0.0, 123.4, ts()).with_make("Mazda"),
            TripRecord::new("A2", 10.0, 10.0, ts()),
            TripRecord::new("A3", 5_000.0, 7_777.7, ts()).with_make("mitsubishi canter"),
        ];
        for derived in derive_all(&records, &settings) {
            assert!(derived.distance_km >= 0.0);
            let expected = derived.distance_km * derived.cost_rate;
            assert!((derived.estimated_cost - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_baseline_falls_back() {
        assert_eq!(utilization_score(50.0, 0.0), 0.0);
        assert_eq!(utilization_score(50.0, -10.0), 0.0);
        assert_eq!(utilization_score(50.0, 200.0), 0.25);
    }

    #[test]
    fn test_ghost_and_anomaly_flags() {
        let settings = Settings::default();
        let deriver = Deriver::new(&settings);

        let parked = deriver.derive(&TripRecord::new("P1", 900.0, 900.0, ts()));
        assert!(parked.ghost);
        assert!(!parked.active);

        let jump = deriver.derive(&TripRecord::new("J1", 0.0, 5_000.0, ts()));
        assert!(jump.anomalous);
        assert!((jump.risk_score - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_location_coordinates_attached() {
        let settings = Settings::default();
        let record = TripRecord::new("A1", 0.0, 20.0, ts()).with_location("Sharjah");
        let derived = Deriver::new(&settings).derive(&record);
        assert_eq!((derived.lat, derived.lon), (25.3463, 55.4209));
    }

    #[test]
    fn test_band_and_tier_from_odometer() {
        let settings = Settings::default();
        let derived =
            Deriver::new(&settings).derive(&TripRecord::new("A1", 120_000.0, 120_050.0, ts()));
        assert_eq!(derived.maintenance_band, MaintenanceBand::EndOfLife);
        assert_eq!(derived.risk_tier, RiskTier::High);
    }
}
