//! Mapping crisp outputs to trading signals

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Discrete trading signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Signal {
    Sell,
    Hold,
    Buy,
}

impl Signal {
    pub const ALL: [Signal; 3] = [Signal::Sell, Signal::Hold, Signal::Buy];

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Sell => "Sell",
            Signal::Hold => "Hold",
            Signal::Buy => "Buy",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision thresholds on the crisp output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Outputs strictly above this are `Buy`
    pub buy: f64,
    /// Outputs strictly below this are `Sell`
    pub sell: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            buy: 0.3,
            sell: -0.3,
        }
    }
}

impl Thresholds {
    pub fn new(sell: f64, buy: f64) -> Self {
        Self { buy, sell }
    }
}

/// Labels crisp values using validated thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionMapper {
    thresholds: Thresholds,
}

impl DecisionMapper {
    pub fn new(thresholds: Thresholds) -> Result<Self, ConfigError> {
        let Thresholds { buy, sell } = thresholds;
        if !buy.is_finite() || !sell.is_finite() || sell > buy {
            return Err(ConfigError::InvalidThresholds { sell, buy });
        }
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn label(&self, crisp: f64) -> Signal {
        if crisp > self.thresholds.buy {
            Signal::Buy
        } else if crisp < self.thresholds.sell {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

impl Default for DecisionMapper {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let mapper = DecisionMapper::default();

        assert_eq!(mapper.label(0.31), Signal::Buy);
        assert_eq!(mapper.label(0.3), Signal::Hold);
        assert_eq!(mapper.label(0.0), Signal::Hold);
        assert_eq!(mapper.label(-0.3), Signal::Hold);
        assert_eq!(mapper.label(-0.31), Signal::Sell);
    }

    #[test]
    fn test_custom_thresholds() {
        let mapper = DecisionMapper::new(Thresholds::new(-0.1, 0.1)).unwrap();

        assert_eq!(mapper.label(0.2), Signal::Buy);
        assert_eq!(mapper.label(-0.2), Signal::Sell);
        assert_eq!(mapper.label(0.05), Signal::Hold);
    }

    #[test]
    fn test_zero_width_hold_band() {
        let mapper = DecisionMapper::new(Thresholds::new(0.0, 0.0)).unwrap();

        assert_eq!(mapper.label(0.0), Signal::Hold);
        assert_eq!(mapper.label(1e-9), Signal::Buy);
    }

    #[test]
    fn test_invalid_thresholds() {
        let err = DecisionMapper::new(Thresholds::new(0.5, -0.5)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidThresholds { .. }));
        assert!(DecisionMapper::new(Thresholds::new(f64::NAN, 0.3)).is_err());
    }

    #[test]
    fn test_signal_display() {
        assert_eq!(Signal::Buy.to_string(), "Buy");
        assert_eq!(Signal::ALL.len(), 3);
    }
}
