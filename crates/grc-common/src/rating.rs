//! Value Objects - Immutable domain primitives with validation

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::GrcError;

/// Ordinal rating (Value Object)
///
/// The 1-to-5 scale used for asset CIA ratings and risk
/// likelihood/impact.
///
/// # Invariants
/// - Range: 1 to 5 inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Create a new rating with validation
    pub fn new(value: u8) -> Result<Self, GrcError> {
        if !(1..=5).contains(&value) {
            return Err(GrcError::InvalidRating(value));
        }
        Ok(Self(value))
    }

    /// Get inner value
    pub const fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = GrcError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_range() {
        for value in 1..=5 {
            assert_eq!(Rating::new(value).unwrap().get(), value);
        }
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(matches!(Rating::new(0), Err(GrcError::InvalidRating(0))));
        assert!(matches!(Rating::new(6), Err(GrcError::InvalidRating(6))));
        assert!(matches!(Rating::new(255), Err(GrcError::InvalidRating(255))));
    }

    #[test]
    fn test_serde_round_trip() {
        let rating = Rating::new(4).unwrap();
        let json = serde_json::to_string(&rating).unwrap();
        assert_eq!(json, "4");
        let back: Rating = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rating);
    }

    #[test]
    fn test_serde_rejects_out_of_range() {
        assert!(serde_json::from_str::<Rating>("0").is_err());
        assert!(serde_json::from_str::<Rating>("9").is_err());
    }
}
