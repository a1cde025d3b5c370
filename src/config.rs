// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Settings shared by all operations, loadable from a JSON file.

use serde::{Deserialize, Serialize};

use crate::{errors::StatError, rngs::middle_square::Normalization, stats::DEFAULT_ALPHA};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Significance level used when an operation does not name one.
    pub alpha: f64,
    /// Number of equal-width intervals a sample is binned into
    /// for the chi squared uniformity test.
    pub bins: usize,
    /// Divisor for middle-square output.
    pub normalization: Normalization,
    /// Number of values a generator battery draws.
    pub battery_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            bins: 10,
            normalization: Normalization::PowerOfTen,
            battery_size: 1000,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn validate(&self) -> Result<(), StatError> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(StatError::InvalidSignificance(self.alpha));
        }
        if self.bins <= 1 {
            return Err(StatError::TooFewIntervals(self.bins));
        }
        if self.battery_size == 0 {
            return Err(StatError::EmptySample {
                needed: 1,
                actual: 0,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{"alpha": 0.01, "normalization": "max_value"}"#)
            .unwrap();
        assert_eq!(settings.alpha, 0.01);
        assert_eq!(settings.bins, 10);
        assert_eq!(settings.normalization, Normalization::MaxValue);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_default_round_trips() {
        let json = serde_json::to_string(&Settings::new()).unwrap();
        assert_eq!(Settings::from_json(&json).unwrap(), Settings::default());
    }

    #[test]
    fn test_validate() {
        let mut settings = Settings::new();
        settings.alpha = 1.0;
        assert_eq!(settings.validate(), Err(StatError::InvalidSignificance(1.0)));
        let mut settings = Settings::new();
        settings.bins = 1;
        assert_eq!(settings.validate(), Err(StatError::TooFewIntervals(1)));
    }
}
