//! Severity classification of capacity values for at-a-glance display.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::record::CapacityCell;

/// Severity tier used for visual and report coding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    None,
    Low,
    Medium,
    High,
}

impl Tier {
    /// Display color associated with the tier.
    pub const fn color(&self) -> &'static str {
        match self {
            Self::None => "gray",
            Self::Low => "red",
            Self::Medium => "yellow",
            Self::High => "green",
        }
    }
}

/// Tier floors, in capacity units. A value lands in the highest tier
/// whose floor it reaches; anything below `medium` is `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorThresholds {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
}

impl Default for ColorThresholds {
    fn default() -> Self {
        Self {
            low: 0,
            medium: 100,
            high: 1000,
        }
    }
}

impl ColorThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.low > self.medium || self.medium > self.high {
            return Err(ConfigError::InvalidThresholds {
                low: self.low,
                medium: self.medium,
                high: self.high,
            });
        }
        Ok(())
    }
}

/// Maps capacity cells to severity tiers.
///
/// Total over all cell values: unsupported and failed cells are `None`,
/// every numeric value gets exactly one tier, and zero is `Low` (a SKU
/// that is offered but exhausted is a finding, not an absence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorClassifier {
    thresholds: ColorThresholds,
}

impl ColorClassifier {
    pub fn new(thresholds: ColorThresholds) -> Self {
        Self { thresholds }
    }

    pub fn classify(&self, cell: CapacityCell) -> Tier {
        match cell {
            CapacityCell::NotSupported | CapacityCell::QueryFailed => Tier::None,
            CapacityCell::Available(v) if v >= self.thresholds.high => Tier::High,
            CapacityCell::Available(v) if v >= self.thresholds.medium => Tier::Medium,
            CapacityCell::Available(_) => Tier::Low,
        }
    }
}
