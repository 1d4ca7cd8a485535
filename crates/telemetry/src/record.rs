//! Record types for one simulated palm tree's telemetry snapshot.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::TelemetryError;

// ---------------------------------------------------------------------------
// Variety
// ---------------------------------------------------------------------------

/// Date-palm cultivar grown on the farm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variety {
    Khalas,
    Sagai,
    Medjool,
    Barhi,
    Sultan,
}

impl Variety {
    /// All cultivars, in the order the generator draws from.
    pub const ALL: [Variety; 5] = [
        Variety::Khalas,
        Variety::Sagai,
        Variety::Medjool,
        Variety::Barhi,
        Variety::Sultan,
    ];
}

impl fmt::Display for Variety {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Khalas => write!(f, "khalas"),
            Self::Sagai => write!(f, "sagai"),
            Self::Medjool => write!(f, "medjool"),
            Self::Barhi => write!(f, "barhi"),
            Self::Sultan => write!(f, "sultan"),
        }
    }
}

impl FromStr for Variety {
    type Err = TelemetryError;

    /// Strict, case-insensitive parse. An unknown label is an error, never
    /// a silent default.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "khalas" => Ok(Self::Khalas),
            "sagai" => Ok(Self::Sagai),
            "medjool" => Ok(Self::Medjool),
            "barhi" => Ok(Self::Barhi),
            "sultan" => Ok(Self::Sultan),
            _ => Err(TelemetryError::InvalidArgument(format!(
                "unknown variety '{s}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Coarse health classification shown on the tree cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeStatus {
    Good,
    Watch,
    Thirsty,
}

impl fmt::Display for TreeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Good => write!(f, "good"),
            Self::Watch => write!(f, "watch"),
            Self::Thirsty => write!(f, "thirsty"),
        }
    }
}

impl FromStr for TreeStatus {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "good" => Ok(Self::Good),
            "watch" => Ok(Self::Watch),
            "thirsty" => Ok(Self::Thirsty),
            _ => Err(TelemetryError::InvalidArgument(format!(
                "unknown status '{s}'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One simulated palm tree's telemetry snapshot.
///
/// Every field is an independent draw; in particular `status` and
/// `needs_water` are NOT functions of `soil_moisture_pct`, so a `good` tree
/// can sit in dry soil and still request water.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeRecord {
    pub id: u32,
    pub name: String,
    pub variety: Variety,
    pub age_years: u8,
    pub soil_moisture_pct: f64,
    pub soil_temperature_c: f64,
    pub humidity_pct: f64,
    pub battery_pct: f64,
    pub status: TreeStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub last_irrigation_at: OffsetDateTime,
    pub needs_water: bool,
    pub location_x: f64,
    pub location_y: f64,
}

// ===========================================================================
// Tests
// ===========================================================================
