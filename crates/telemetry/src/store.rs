//! In-memory telemetry store seeded with simulated palm-tree readings.
//!
//! The generator models what a sensor sweep across the farm would report:
//!
//! - each tree gets one fresh reading per generation pass
//! - sensor values are uniform draws over the hardware's plausible range
//! - health status is weighted toward `good`, with a small `thirsty` tail
//! - `needs_water` is drawn independently of both status and moisture
//! - the last irrigation timestamp falls within the trailing week
//!
//! A store is an owned value. Callers that want to share one hold it behind
//! their own synchronization; nothing in this crate is global.

use time::OffsetDateTime;

use crate::error::TelemetryError;
use crate::record::{TreeRecord, TreeStatus, Variety};

// ---------------------------------------------------------------------------
// Generation parameters
// ---------------------------------------------------------------------------

/// Tree age in whole years, half-open.
const AGE_YEARS: (u8, u8) = (3, 30);
/// Volumetric soil moisture in percent, half-open.
const SOIL_MOISTURE_PCT: (f64, f64) = (15.0, 65.0);
/// Soil temperature in degrees Celsius, half-open.
const SOIL_TEMPERATURE_C: (f64, f64) = (20.0, 45.0);
/// Ambient relative humidity in percent, half-open.
const HUMIDITY_PCT: (f64, f64) = (20.0, 80.0);
/// Sensor battery charge in percent, half-open.
const BATTERY_PCT: (f64, f64) = (20.0, 100.0);
/// Hours since last irrigation, half-open.
const IRRIGATION_AGE_HOURS: (i64, i64) = (0, 168);
/// Field coordinates in meters from the southwest corner, half-open.
const LOCATION_M: (f64, f64) = (0.0, 100.0);

/// Cumulative status weights: 70% good, 25% watch, 5% thirsty.
const STATUS_GOOD_CUTOFF: f64 = 0.70;
const STATUS_WATCH_CUTOFF: f64 = 0.95;

/// Probability that a tree requests water, independent of its status.
const NEEDS_WATER_P: f64 = 0.30;

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Snapshot of the farm's telemetry, one record per tree.
///
/// Records are ordered by ascending `id` starting at 1 and never reordered,
/// so the same seed always yields the same vector.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryStore {
    records: Vec<TreeRecord>,
}

impl TelemetryStore {
    /// Generates a snapshot of `count` trees timestamped against the current
    /// wall clock.
    ///
    /// With `seed` the sensor values are reproducible across runs; without it
    /// each call draws from entropy. Returns `InvalidArgument` when `count`
    /// is zero.
    pub fn generate(count: u32, seed: Option<u64>) -> Result<Self, TelemetryError> {
        Self::generate_at(count, seed, OffsetDateTime::now_utc())
    }

    /// Like [`generate`](Self::generate), but with an explicit `now` so the
    /// irrigation timestamps are reproducible too.
    pub fn generate_at(
        count: u32,
        seed: Option<u64>,
        now: OffsetDateTime,
    ) -> Result<Self, TelemetryError> {
        if count < 1 {
            return Err(TelemetryError::InvalidArgument(
                "tree count must be at least 1".to_string(),
            ));
        }
        let mut rng = match seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        };
        let records = (1..=count).map(|id| draw_record(&mut rng, id, now)).collect();
        tracing::debug!(count, seeded = seed.is_some(), "generated telemetry snapshot");
        Ok(Self { records })
    }

    /// Builds a store from records produced elsewhere. Useful for replaying
    /// a serialized snapshot.
    pub fn from_records(records: Vec<TreeRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[TreeRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a tree by id.
    pub fn get(&self, id: u32) -> Option<&TreeRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Records an irrigation of tree `id` at time `at` and returns the
    /// updated snapshot, leaving `self` untouched.
    ///
    /// The watered tree gets `last_irrigation_at = at` and its water request
    /// cleared; every other field and record is carried over unchanged.
    /// Returns `UnknownTree` when no record has that id.
    pub fn irrigate(&self, id: u32, at: OffsetDateTime) -> Result<Self, TelemetryError> {
        if self.get(id).is_none() {
            return Err(TelemetryError::UnknownTree(id));
        }
        let records = self
            .records
            .iter()
            .map(|r| {
                if r.id == id {
                    let mut watered = r.clone();
                    watered.last_irrigation_at = at;
                    watered.needs_water = false;
                    watered
                } else {
                    r.clone()
                }
            })
            .collect();
        tracing::info!(tree_id = id, "irrigation recorded");
        Ok(Self::from_records(records))
    }
}

// ---------------------------------------------------------------------------
// Draws
// ---------------------------------------------------------------------------

/// Draws one tree's record. The draw order is part of the seeded contract:
/// variety, age, moisture, temperature, humidity, battery, status,
/// irrigation age, water request, then location. Reordering these breaks
/// reproducibility for existing seeds.
fn draw_record(rng: &mut fastrand::Rng, id: u32, now: OffsetDateTime) -> TreeRecord {
    let variety = Variety::ALL[rng.usize(0..Variety::ALL.len())];
    let age_years = rng.u8(AGE_YEARS.0..AGE_YEARS.1);
    let soil_moisture_pct = uniform(rng, SOIL_MOISTURE_PCT);
    let soil_temperature_c = uniform(rng, SOIL_TEMPERATURE_C);
    let humidity_pct = uniform(rng, HUMIDITY_PCT);
    let battery_pct = uniform(rng, BATTERY_PCT);
    let status = draw_status(rng);
    let hours_ago = rng.i64(IRRIGATION_AGE_HOURS.0..IRRIGATION_AGE_HOURS.1);
    let needs_water = rng.f64() < NEEDS_WATER_P;
    let location_x = uniform(rng, LOCATION_M);
    let location_y = uniform(rng, LOCATION_M);

    TreeRecord {
        id,
        name: format!("Palm {id}"),
        variety,
        age_years,
        soil_moisture_pct,
        soil_temperature_c,
        humidity_pct,
        battery_pct,
        status,
        last_irrigation_at: now - time::Duration::hours(hours_ago),
        needs_water,
        location_x,
        location_y,
    }
}

fn uniform(rng: &mut fastrand::Rng, (lo, hi): (f64, f64)) -> f64 {
    lo + (hi - lo) * rng.f64()
}

fn draw_status(rng: &mut fastrand::Rng) -> TreeStatus {
    let roll = rng.f64();
    if roll < STATUS_GOOD_CUTOFF {
        TreeStatus::Good
    } else if roll < STATUS_WATCH_CUTOFF {
        TreeStatus::Watch
    } else {
        TreeStatus::Thirsty
    }
}

// ===========================================================================
// Tests
// ===========================================================================
