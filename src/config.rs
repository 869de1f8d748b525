//! Static configuration for the metric pipeline.
//!
//! Stored as a JSON object on disk; every field is optional and falls back to
//! the defaults below:
//! ```json
//! {
//!   "cost_per_km": 0.35,
//!   "expected_distance_km": 120,
//!   "risk": { "end_of_life_km": 120000 }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{FleetError, Result};

/// Environment variables that override values from the config file.
pub const ENV_COST_PER_KM: &str = "FLEET_COST_PER_KM";
pub const ENV_EXPECTED_KM: &str = "FLEET_EXPECTED_KM";
pub const ENV_ACTIVE_KM: &str = "FLEET_ACTIVE_KM";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Flat cost per km for makes without a fuel profile.
    pub cost_per_km: f64,
    pub currency: String,
    /// Distance an asset is expected to cover per record; utilization baseline.
    pub expected_distance_km: f64,
    /// Records covering more than this are "active".
    pub active_threshold_km: f64,
    /// Records covering more than this are flagged as anomalous.
    pub max_plausible_km: f64,
    /// Preamble lines before the CSV header; unset means the header row is
    /// detected from the first rows of the file.
    pub skip_rows: Option<usize>,
    /// Reject the whole load on the first bad row.
    pub strict: bool,
    /// Utilization score the fleet is aiming for, used for presentation tones.
    pub utilization_goal: f64,
    pub fuel: FuelSettings,
    pub risk: RiskSettings,
    pub sites: Vec<Site>,
    /// Substring replacements applied to upper-cased raw locations.
    pub location_aliases: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelKind {
    Petrol,
    Diesel,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuelProfile {
    pub litres_per_100km: f64,
    pub fuel: FuelKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelSettings {
    pub petrol_price: f64,
    pub diesel_price: f64,
    /// Keyed by upper-cased make.
    pub profiles: HashMap<String, FuelProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSettings {
    pub mid_life_km: f64,
    pub end_of_life_km: f64,
    pub age_limit_years: f64,
    pub odometer_weight: f64,
    pub age_weight: f64,
    pub anomaly_penalty: f64,
    /// Scores at or above this are Medium.
    pub medium_at: f64,
    /// Scores at or above this are High.
    pub high_at: f64,
}

/// A named operating site with map coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Default for Settings {
    fn default() -> Self {
        let site = |name: &str, lat: f64, lon: f64| Site {
            name: name.to_string(),
            lat,
            lon,
        };
        let alias = |from: &str, to: &str| (from.to_string(), to.to_string());

        Settings {
            cost_per_km: 0.35,
            currency: "AED".to_string(),
            expected_distance_km: 100.0,
            active_threshold_km: 10.0,
            max_plausible_km: 1500.0,
            skip_rows: None,
            strict: false,
            utilization_goal: 0.6,
            fuel: FuelSettings::default(),
            risk: RiskSettings::default(),
            sites: vec![
                site("Dubai", 25.2048, 55.2708),
                site("Abu Dhabi", 24.4539, 54.3773),
                site("Sharjah", 25.3463, 55.4209),
                site("Al Ain", 24.1302, 55.7434),
                site("Ras Al Khaimah", 25.8007, 55.9762),
                site("Fujairah", 25.1288, 56.3265),
                site("Ajman", 25.4052, 55.5136),
                site("Umm Al Quwain", 25.5471, 55.7032),
            ],
            location_aliases: vec![
                alias("CWL-DUBAI", "DUBAI"),
                alias("CWL DUBAI", "DUBAI"),
                alias("SHJ-THAMEEM", "SHARJAH"),
                alias("AUH", "ABU DHABI"),
            ],
        }
    }
}

impl Default for FuelSettings {
    fn default() -> Self {
        let profiles = [
            ("NISSAN SUNNY", 8.0, FuelKind::Petrol),
            ("NISSAN ALTIMA", 8.5, FuelKind::Petrol),
            ("MAZDA", 9.0, FuelKind::Petrol),
            ("ASHOK LEYLAND", 16.0, FuelKind::Diesel),
            ("MITSUBISHI CANTER", 15.0, FuelKind::Diesel),
        ]
        .into_iter()
        .map(|(make, litres_per_100km, fuel)| {
            (
                make.to_string(),
                FuelProfile {
                    litres_per_100km,
                    fuel,
                },
            )
        })
        .collect();

        FuelSettings {
            petrol_price: 2.60,
            diesel_price: 2.85,
            profiles,
        }
    }
}

impl Default for RiskSettings {
    fn default() -> Self {
        RiskSettings {
            mid_life_km: 50_000.0,
            end_of_life_km: 100_000.0,
            age_limit_years: 10.0,
            odometer_weight: 0.7,
            age_weight: 0.3,
            anomaly_penalty: 0.2,
            medium_at: 0.5,
            high_at: 0.9,
        }
    }
}

impl FuelSettings {
    pub fn price(&self, fuel: FuelKind) -> f64 {
        match fuel {
            FuelKind::Petrol => self.petrol_price,
            FuelKind::Diesel => self.diesel_price,
        }
    }
}

impl Settings {
    /// Loads settings from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| FleetError::io(path, e))?;
        let settings: Settings = serde_json::from_str(&content)?;
        debug!(path = %path.display(), "Loaded settings file");
        settings.validate()?;
        Ok(settings)
    }

    /// Applies numeric overrides found through `lookup` (usually `std::env::var`).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let targets: [(&str, &mut f64); 3] = [
            (ENV_COST_PER_KM, &mut self.cost_per_km),
            (ENV_EXPECTED_KM, &mut self.expected_distance_km),
            (ENV_ACTIVE_KM, &mut self.active_threshold_km),
        ];

        for (key, slot) in targets {
            if let Some(raw) = lookup(key) {
                *slot = raw.trim().parse().map_err(|_| FleetError::Config {
                    details: format!("{key} must be a number, got {raw:?}"),
                })?;
                debug!(key, value = *slot, "Applied setting override");
            }
        }

        self.validate()
    }

    /// Rejects values that would make the derived metrics meaningless.
    pub fn validate(&self) -> Result<()> {
        let non_negative = [
            ("cost_per_km", self.cost_per_km),
            ("active_threshold_km", self.active_threshold_km),
            ("max_plausible_km", self.max_plausible_km),
            ("fuel.petrol_price", self.fuel.petrol_price),
            ("fuel.diesel_price", self.fuel.diesel_price),
            ("risk.odometer_weight", self.risk.odometer_weight),
            ("risk.age_weight", self.risk.age_weight),
            ("risk.anomaly_penalty", self.risk.anomaly_penalty),
            ("risk.mid_life_km", self.risk.mid_life_km),
            ("risk.end_of_life_km", self.risk.end_of_life_km),
            ("risk.age_limit_years", self.risk.age_limit_years),
            ("utilization_goal", self.utilization_goal),
        ];
        for (name, value) in non_negative {
            check_non_negative(name, value)?;
        }
        for (make, profile) in &self.fuel.profiles {
            check_non_negative(
                &format!("fuel.profiles.{make}.litres_per_100km"),
                profile.litres_per_100km,
            )?;
        }

        if self.risk.medium_at > self.risk.high_at {
            return Err(FleetError::Config {
                details: format!(
                    "risk.medium_at ({}) must not exceed risk.high_at ({})",
                    self.risk.medium_at, self.risk.high_at
                ),
            });
        }

        if self.risk.mid_life_km > self.risk.end_of_life_km {
            return Err(FleetError::Config {
                details: "risk.mid_life_km must not exceed risk.end_of_life_km".to_string(),
            });
        }

        if self.expected_distance_km <= 0.0 {
            warn!(
                expected_distance_km = self.expected_distance_km,
                "Utilization baseline is not positive; utilization scores will be 0"
            );
        }

        Ok(())
    }
}

fn check_non_negative(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(FleetError::Config {
            details: format!("{name} must be a non-negative number, got {value}"),
        });
    }
    Ok(())
}
