//! Maintenance risk heuristics.
//!
//! The score is a weighted mean of wear (cumulative odometer against the
//! end-of-life mileage) and age (against the configured age limit), each
//! capped at 1. Anomalous readings add a flat penalty. Result is in `[0, 1]`.

use serde::{Deserialize, Serialize};

use crate::config::RiskSettings;

/// Risk tier derived from the score thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [RiskTier::Low, RiskTier::Medium, RiskTier::High];

    pub fn from_score(score: f64, risk: &RiskSettings) -> Self {
        match score {
            s if s >= risk.high_at => RiskTier::High,
            s if s >= risk.medium_at => RiskTier::Medium,
            _ => RiskTier::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Low => "low",
            RiskTier::Medium => "medium",
            RiskTier::High => "high",
        }
    }
}

/// Mileage band, right-inclusive: exactly 50 000 km is still Fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceBand {
    Fresh,
    MidLife,
    EndOfLife,
}

impl MaintenanceBand {
    pub fn from_odometer(end_km: f64, risk: &RiskSettings) -> Self {
        if end_km <= risk.mid_life_km {
            MaintenanceBand::Fresh
        } else if end_km <= risk.end_of_life_km {
            MaintenanceBand::MidLife
        } else {
            MaintenanceBand::EndOfLife
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MaintenanceBand::Fresh => "Fresh",
            MaintenanceBand::MidLife => "Mid-Life",
            MaintenanceBand::EndOfLife => "End-of-Life",
        }
    }
}

fn capped_ratio(value: f64, limit: f64) -> f64 {
    if limit <= 0.0 {
        return 0.0;
    }
    (value / limit).clamp(0.0, 1.0)
}

pub fn risk_score(end_km: f64, age_years: Option<f64>, anomalous: bool, risk: &RiskSettings) -> f64 {
    let wear = capped_ratio(end_km, risk.end_of_life_km);

    let base = match age_years {
        Some(age) => {
            let weight_sum = risk.odometer_weight + risk.age_weight;
            if weight_sum == 0.0 {
                0.0
            } else {
                let age = capped_ratio(age, risk.age_limit_years);
                (wear * risk.odometer_weight + age * risk.age_weight) / weight_sum
            }
        }
        None => wear,
    };

    let penalty = if anomalous { risk.anomaly_penalty } else { 0.0 };
    (base + penalty).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_wear_only_score() {
        let risk = RiskSettings::default();
        assert!(approx(risk_score(0.0, None, false, &risk), 0.0));
        assert!(approx(risk_score(50_000.0, None, false, &risk), 0.5));
        assert!(approx(risk_score(250_000.0, None, false, &risk), 1.0));
    }

    #[test]
    fn test_age_blends_with_wear() {
        let risk = RiskSettings::default();
        // 0.7 * 0.5 + 0.3 * 1.0
        assert!(approx(risk_score(50_000.0, Some(12.0), false, &risk), 0.65));
        assert!(approx(risk_score(0.0, Some(5.0), false, &risk), 0.15));
    }

    #[test]
    fn test_weights_are_normalized() {
        let doubled = RiskSettings {
            odometer_weight: 1.4,
            age_weight: 0.6,
            ..RiskSettings::default()
        };
        assert!(approx(risk_score(50_000.0, Some(12.0), false, &doubled), 0.65));
    }

    #[test]
    fn test_anomaly_penalty_is_clamped() {
        let risk = RiskSettings::default();
        assert!(approx(risk_score(10_000.0, None, true, &risk), 0.3));
        assert!(approx(risk_score(95_000.0, None, true, &risk), 1.0));
    }

    #[test]
    fn test_zero_limits_fall_back() {
        let risk = RiskSettings {
            end_of_life_km: 0.0,
            odometer_weight: 0.0,
            age_weight: 0.0,
            ..RiskSettings::default()
        };
        assert_eq!(risk_score(80_000.0, None, false, &risk), 0.0);
        assert_eq!(risk_score(80_000.0, Some(3.0), false, &risk), 0.0);
    }

    #[test]
    fn test_tier_thresholds() {
        let risk = RiskSettings::default();
        assert_eq!(RiskTier::from_score(0.0, &risk), RiskTier::Low);
        assert_eq!(RiskTier::from_score(0.49, &risk), RiskTier::Low);
        assert_eq!(RiskTier::from_score(0.5, &risk), RiskTier::Medium);
        assert_eq!(RiskTier::from_score(0.9, &risk), RiskTier::High);
        assert_eq!(RiskTier::from_score(1.0, &risk), RiskTier::High);
    }

    #[test]
    fn test_band_boundaries() {
        let risk = RiskSettings::default();
        assert_eq!(MaintenanceBand::from_odometer(0.0, &risk), MaintenanceBand::Fresh);
        assert_eq!(MaintenanceBand::from_odometer(50_000.0, &risk), MaintenanceBand::Fresh);
        assert_eq!(MaintenanceBand::from_odometer(50_001.0, &risk), MaintenanceBand::MidLife);
        assert_eq!(MaintenanceBand::from_odometer(100_000.0, &risk), MaintenanceBand::MidLife);
        assert_eq!(MaintenanceBand::from_odometer(100_001.0, &risk), MaintenanceBand::EndOfLife);
    }
}
