//! Farm-level analytics backing the reports page.
//!
//! The savings and energy figures are demonstration series in the same
//! spirit as the telemetry generator: plausible shapes for a 50-tree farm,
//! not measurements. Only [`recommendations`] looks at live records.

use serde::Serialize;

use crate::record::TreeRecord;

/// Battery level under which a sensor is flagged for a maintenance visit.
pub const LOW_BATTERY_PCT: f64 = 30.0;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

// ---------------------------------------------------------------------------
// Water savings
// ---------------------------------------------------------------------------

/// Water saved in one month relative to flood irrigation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlySaving {
    /// Calendar month, 1..=12.
    pub month: u8,
    pub label: &'static str,
    pub saving_pct: f64,
}

/// Simulated monthly water savings for a full year, each month drawing
/// uniformly from 70..90 percent. Reproducible when `seed` is given.
pub fn water_savings_series(seed: Option<u64>) -> Vec<MonthlySaving> {
    let mut rng = match seed {
        Some(seed) => fastrand::Rng::with_seed(seed),
        None => fastrand::Rng::new(),
    };
    MONTH_LABELS
        .into_iter()
        .enumerate()
        .map(|(i, label)| MonthlySaving {
            month: i as u8 + 1,
            label,
            saving_pct: 70.0 + 20.0 * rng.f64(),
        })
        .collect()
}

/// Mean saving across the series, or zero for an empty one.
pub fn average_saving_pct(series: &[MonthlySaving]) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    series.iter().map(|m| m.saving_pct).sum::<f64>() / series.len() as f64
}

// ---------------------------------------------------------------------------
// Financial savings
// ---------------------------------------------------------------------------

/// Money saved in one month, in Saudi riyal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FinancialSaving {
    pub label: &'static str,
    pub amount_sar: u32,
}

/// Billed savings for the first half of the year.
pub const FINANCIAL_SAVINGS_SAR: [FinancialSaving; 6] = [
    FinancialSaving { label: "Jan", amount_sar: 1500 },
    FinancialSaving { label: "Feb", amount_sar: 1800 },
    FinancialSaving { label: "Mar", amount_sar: 2100 },
    FinancialSaving { label: "Apr", amount_sar: 1900 },
    FinancialSaving { label: "May", amount_sar: 2200 },
    FinancialSaving { label: "Jun", amount_sar: 2400 },
];

pub fn total_financial_savings_sar() -> u32 {
    FINANCIAL_SAVINGS_SAR.iter().map(|m| m.amount_sar).sum()
}

// ---------------------------------------------------------------------------
// Energy and fleet
// ---------------------------------------------------------------------------

/// Where the system's power comes from. Shares sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyMix {
    pub solar_pct: f64,
    pub battery_pct: f64,
    pub grid_pct: f64,
}

pub fn energy_mix() -> EnergyMix {
    EnergyMix { solar_pct: 85.0, battery_pct: 10.0, grid_pct: 5.0 }
}

/// Deployed field hardware. Sensors report over LoRaWAN through shared
/// gateways, one gateway per ten trees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FleetSummary {
    pub sensor_count: usize,
    pub sensor_active_pct: f64,
    pub gateway_count: usize,
    pub gateway_active_pct: f64,
    pub solar_panel_min_w: u32,
    pub solar_panel_max_w: u32,
}

pub fn fleet_summary(tree_count: usize) -> FleetSummary {
    FleetSummary {
        sensor_count: tree_count,
        sensor_active_pct: 100.0,
        gateway_count: tree_count.div_ceil(10),
        gateway_active_pct: 80.0,
        solar_panel_min_w: 3,
        solar_panel_max_w: 10,
    }
}

// ---------------------------------------------------------------------------
// Headlines
// ---------------------------------------------------------------------------

/// The overview page's banner numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SavingsHeadline {
    /// Water saved versus traditional flood irrigation.
    pub water_saving_pct: f64,
    pub monthly_savings_sar: u32,
    /// Share of operation running on renewable solar power.
    pub solar_pct: f64,
}

pub fn savings_headline() -> SavingsHeadline {
    SavingsHeadline { water_saving_pct: 85.0, monthly_savings_sar: 2100, solar_pct: 100.0 }
}

/// The reports page's scorecard. Solar share differs from the headline
/// because gateways fall back to batteries and grid overnight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerformanceSummary {
    pub water_saving_pct: f64,
    pub monthly_savings_sar: u32,
    pub irrigation_efficiency_pct: f64,
    pub solar_share_pct: f64,
}

pub fn performance_summary() -> PerformanceSummary {
    PerformanceSummary {
        water_saving_pct: 85.0,
        monthly_savings_sar: 2100,
        irrigation_efficiency_pct: 95.0,
        solar_share_pct: 85.0,
    }
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

/// Advisory lines for the operator, derived from the current snapshot.
///
/// Always four lines: irrigation demand by field section, sensor battery
/// health, the preferred watering window, and a weather reminder.
pub fn recommendations(records: &[TreeRecord]) -> Vec<String> {
    let mut lines = Vec::with_capacity(4);

    let north: usize = records
        .iter()
        .filter(|r| r.needs_water && r.location_y >= 50.0)
        .count();
    let south: usize = records
        .iter()
        .filter(|r| r.needs_water && r.location_y < 50.0)
        .count();
    lines.push(match (north, south) {
        (0, 0) => "irrigation demand is fully served; keep the current schedule".to_string(),
        (n, s) if n >= s => {
            format!("increase irrigation time in the northern section ({n} open water requests)")
        }
        (_, s) => {
            format!("increase irrigation time in the southern section ({s} open water requests)")
        }
    });

    let low_battery = records
        .iter()
        .filter(|r| r.battery_pct < LOW_BATTERY_PCT)
        .count();
    lines.push(if low_battery > 0 {
        format!("check {low_battery} sensor(s) reporting battery below {LOW_BATTERY_PCT}%")
    } else {
        format!("all sensor batteries are above {LOW_BATTERY_PCT}%")
    });

    lines.push("best irrigation window: 05:30 to 06:30".to_string());
    lines.push("match the irrigation schedule to the weather forecast".to_string());

    lines
}

// ===========================================================================
// Tests
// ===========================================================================
