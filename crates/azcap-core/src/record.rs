//! Canonical domain types for capacity data.

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Composite model identity: name plus version.
///
/// Two deployments of the same model name with different versions are
/// distinct rows in the capacity matrix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelKey {
    pub name: String,
    pub version: String,
}

impl ModelKey {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl Display for ModelKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.version.is_empty() {
            write!(f, "{} (N/A)", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.version)
        }
    }
}

/// One raw capacity record as returned by the capacity API, normalized
/// to a fixed shape at the fetch boundary.
///
/// `available_capacity` is `None` when the API omitted the field, which
/// means the SKU is not offered there. That is different from
/// `Some(0)`, which means the SKU is offered but fully consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapacityRecord {
    pub model_name: String,
    pub model_format: String,
    pub model_version: String,
    pub region: String,
    pub sku_name: String,
    pub available_capacity: Option<u64>,
    pub available_finetune_capacity: Option<u64>,
}

impl CapacityRecord {
    pub fn model_key(&self) -> ModelKey {
        ModelKey::new(self.model_name.clone(), self.model_version.clone())
    }
}

/// The resolved value for one (model, version, region, SKU) tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityCell {
    /// Capacity units available; zero means offered but exhausted.
    Available(u64),
    /// No record exists for this tuple.
    NotSupported,
    /// The model's query failed after retries; the value is unknown.
    QueryFailed,
}

impl CapacityCell {
    pub const NA_TOKEN: &'static str = "NA";
    pub const ERROR_TOKEN: &'static str = "ERROR";

    pub const fn value(&self) -> Option<u64> {
        match self {
            Self::Available(v) => Some(*v),
            Self::NotSupported | Self::QueryFailed => None,
        }
    }

    /// Export token: the numeric value, `NA`, or `ERROR`. The latter two
    /// never collapse into the same token.
    pub fn render(&self) -> String {
        match self {
            Self::Available(v) => v.to_string(),
            Self::NotSupported => String::from(Self::NA_TOKEN),
            Self::QueryFailed => String::from(Self::ERROR_TOKEN),
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            Self::NA_TOKEN => Some(Self::NotSupported),
            Self::ERROR_TOKEN => Some(Self::QueryFailed),
            other => other.parse::<u64>().ok().map(Self::Available),
        }
    }
}

impl Default for CapacityCell {
    fn default() -> Self {
        Self::NotSupported
    }
}
