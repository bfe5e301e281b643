//! Score Calculator
//!
//! The single place asset values and risk scores come from. Every read
//! site (registers, filters, reports, exports) calls through here so the
//! derived numbers can never go stale.

use grc_common::{GrcError, Rating};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Asset value: sum of the three CIA ratings, range 3..=15
pub fn asset_value(confidentiality: Rating, integrity: Rating, availability: Rating) -> u8 {
    confidentiality.get() + integrity.get() + availability.get()
}

/// Risk score: likelihood x impact, range 1..=25
pub fn risk_score(likelihood: Rating, impact: Rating) -> u8 {
    likelihood.get() * impact.get()
}

/// Qualitative band for an asset value
///
/// Canonical thresholds, applied uniformly across every view:
/// `<8` Low, `8..=11` Medium, `12..=14` High, `>=15` Critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ValueBand {
    Low,
    Medium,
    High,
    Critical,
}

/// Band an asset value
pub fn value_band(value: u8) -> ValueBand {
    match value {
        v if v >= 15 => ValueBand::Critical,
        v if v >= 12 => ValueBand::High,
        v if v >= 8 => ValueBand::Medium,
        _ => ValueBand::Low,
    }
}

impl fmt::Display for ValueBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
            Self::Critical => write!(f, "Critical"),
        }
    }
}

impl FromStr for ValueBand {
    type Err = GrcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(GrcError::InvalidValue {
                field: "value band",
                value: s.to_string(),
            }),
        }
    }
}

/// Qualitative band for a risk score
///
/// `>=20` High, `11..=19` Medium, `<=10` Low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

/// Band a risk score; used for inherent and residual scores alike
pub fn risk_band(score: u8) -> RiskBand {
    match score {
        s if s >= 20 => RiskBand::High,
        s if s > 10 => RiskBand::Medium,
        _ => RiskBand::Low,
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

impl FromStr for RiskBand {
    type Err = GrcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(GrcError::InvalidValue {
                field: "risk band",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rating(value: u8) -> Rating {
        Rating::new(value).unwrap()
    }

    #[test]
    fn test_asset_value_scenario() {
        // (5,5,5) / (1,1,1) / (3,3,3) -> 15 / 3 / 9 -> Critical / Low / Medium
        let values = [
            asset_value(rating(5), rating(5), rating(5)),
            asset_value(rating(1), rating(1), rating(1)),
            asset_value(rating(3), rating(3), rating(3)),
        ];
        assert_eq!(values, [15, 3, 9]);
        assert_eq!(value_band(values[0]), ValueBand::Critical);
        assert_eq!(value_band(values[1]), ValueBand::Low);
        assert_eq!(value_band(values[2]), ValueBand::Medium);
    }

    #[test]
    fn test_value_band_thresholds() {
        assert_eq!(value_band(7), ValueBand::Low);
        assert_eq!(value_band(8), ValueBand::Medium);
        assert_eq!(value_band(11), ValueBand::Medium);
        assert_eq!(value_band(12), ValueBand::High);
        assert_eq!(value_band(14), ValueBand::High);
        assert_eq!(value_band(15), ValueBand::Critical);
    }

    #[test]
    fn test_risk_score_scenario() {
        // likelihood=5, impact=5 -> 25 -> High; revised 2x3 -> 6 -> Low
        let inherent = risk_score(rating(5), rating(5));
        assert_eq!(inherent, 25);
        assert_eq!(risk_band(inherent), RiskBand::High);

        let residual = risk_score(rating(2), rating(3));
        assert_eq!(residual, 6);
        assert_eq!(risk_band(residual), RiskBand::Low);
    }

    #[test]
    fn test_risk_band_thresholds() {
        assert_eq!(risk_band(10), RiskBand::Low);
        assert_eq!(risk_band(11), RiskBand::Medium);
        assert_eq!(risk_band(19), RiskBand::Medium);
        assert_eq!(risk_band(20), RiskBand::High);
        assert_eq!(risk_band(25), RiskBand::High);
    }

    proptest! {
        #[test]
        fn prop_asset_value_is_sum(c in 1u8..=5, i in 1u8..=5, a in 1u8..=5) {
            let value = asset_value(rating(c), rating(i), rating(a));
            prop_assert_eq!(value, c + i + a);
            prop_assert!((3..=15).contains(&value));
            // deterministic on repeat
            prop_assert_eq!(value, asset_value(rating(c), rating(i), rating(a)));
        }

        #[test]
        fn prop_risk_score_bounds(l in 1u8..=5, i in 1u8..=5) {
            let score = risk_score(rating(l), rating(i));
            prop_assert_eq!(score, l * i);
            prop_assert!((1..=25).contains(&score));
        }

        #[test]
        fn prop_value_band_monotone(s1 in 3u8..=15, s2 in 3u8..=15) {
            if s1 < s2 {
                prop_assert!(value_band(s1) <= value_band(s2));
            }
        }

        #[test]
        fn prop_risk_band_monotone(s1 in 1u8..=25, s2 in 1u8..=25) {
            if s1 < s2 {
                prop_assert!(risk_band(s1) <= risk_band(s2));
            }
        }
    }
}
