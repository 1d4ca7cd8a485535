//! Read-side queries over a telemetry snapshot.
//!
//! Every function here takes a plain record slice, so callers can query a
//! whole store, a filtered subset, or records deserialized from elsewhere
//! without going through [`TelemetryStore`](crate::store::TelemetryStore).

use serde::Serialize;

use crate::error::TelemetryError;
use crate::record::{TreeRecord, TreeStatus, Variety};

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Criteria for selecting trees out of a snapshot. All criteria must hold
/// for a record to pass; the default filter passes everything.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TreeFilter {
    pub variety: Option<Variety>,
    pub status: Option<TreeStatus>,
    /// Inclusive lower bound on soil moisture, in percent.
    pub min_moisture_pct: f64,
}

impl TreeFilter {
    pub fn matches(&self, record: &TreeRecord) -> bool {
        if let Some(variety) = self.variety {
            if record.variety != variety {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        record.soil_moisture_pct >= self.min_moisture_pct
    }
}

/// Returns the records matching `filter`, cloned, in their original order.
pub fn filter(records: &[TreeRecord], filter: &TreeFilter) -> Vec<TreeRecord> {
    records.iter().filter(|r| filter.matches(r)).cloned().collect()
}

// ---------------------------------------------------------------------------
// Moisture histogram
// ---------------------------------------------------------------------------

/// Hard ceiling on the number of histogram buckets a caller may request.
/// The bucket vector is allocated up front, so the count has to be bounded
/// before it reaches the allocator.
pub const MAX_BINS: usize = 1_000;

/// One bar of the moisture distribution chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBucket {
    pub lower_pct: f64,
    pub upper_pct: f64,
    pub count: usize,
}

/// Buckets soil moisture into `bins` equal-width ranges spanning the
/// observed minimum to the observed maximum.
///
/// The observed maximum is counted in the last bucket, so every record lands
/// in exactly one bucket and the counts sum to `records.len()`. When all
/// readings are identical the span collapses and everything lands in the
/// first bucket. An empty slice yields no buckets.
///
/// Returns `InvalidArgument` when `bins` is zero or exceeds [`MAX_BINS`].
pub fn moisture_histogram(
    records: &[TreeRecord],
    bins: usize,
) -> Result<Vec<HistogramBucket>, TelemetryError> {
    if bins < 1 {
        return Err(TelemetryError::InvalidArgument(
            "histogram bin count must be at least 1".to_string(),
        ));
    }
    if bins > MAX_BINS {
        return Err(TelemetryError::InvalidArgument(format!(
            "histogram bin count {bins} exceeds the {MAX_BINS} bucket limit"
        )));
    }
    if records.is_empty() {
        return Ok(Vec::new());
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for r in records {
        min = min.min(r.soil_moisture_pct);
        max = max.max(r.soil_moisture_pct);
    }
    let span = max - min;
    let width = span / bins as f64;

    let mut counts = vec![0usize; bins];
    for r in records {
        let idx = if span == 0.0 {
            0
        } else {
            let raw = ((r.soil_moisture_pct - min) / span * bins as f64) as usize;
            raw.min(bins - 1)
        };
        counts[idx] += 1;
    }

    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBucket {
            lower_pct: min + width * i as f64,
            // The final edge is the observed max itself, not an accumulated
            // sum of widths, so it is exact even after float rounding.
            upper_pct: if i == bins - 1 { max } else { min + width * (i + 1) as f64 },
            count,
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Summary metrics
// ---------------------------------------------------------------------------

/// Record counts broken down by health status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub good: usize,
    pub watch: usize,
    pub thirsty: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.good + self.watch + self.thirsty
    }
}

/// Headline numbers for the farm overview panel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub total_count: usize,
    /// Share of trees requesting water, 0..=100.
    pub pct_needing_water: f64,
    pub avg_battery_pct: f64,
    pub status_counts: StatusCounts,
}

/// Computes the overview metrics. An empty slice yields all zeros rather
/// than an error, so a dashboard over a fully filtered-out view still
/// renders.
pub fn summary_metrics(records: &[TreeRecord]) -> SummaryMetrics {
    if records.is_empty() {
        return SummaryMetrics::default();
    }

    let total = records.len();
    let needing = records.iter().filter(|r| r.needs_water).count();
    let battery_sum: f64 = records.iter().map(|r| r.battery_pct).sum();

    let mut status_counts = StatusCounts::default();
    for r in records {
        match r.status {
            TreeStatus::Good => status_counts.good += 1,
            TreeStatus::Watch => status_counts.watch += 1,
            TreeStatus::Thirsty => status_counts.thirsty += 1,
        }
    }

    SummaryMetrics {
        total_count: total,
        pct_needing_water: needing as f64 / total as f64 * 100.0,
        avg_battery_pct: battery_sum / total as f64,
        status_counts,
    }
}

// ---------------------------------------------------------------------------
// Temperature quartiles
// ---------------------------------------------------------------------------

/// Five-number summary of the soil temperature distribution, in degrees
/// Celsius. Feeds the dashboard's box plot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quartiles {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

/// Computes the soil temperature five-number summary, interpolating the
/// quartiles linearly between the two nearest order statistics. Returns
/// `None` for an empty slice.
pub fn soil_temperature_quartiles(records: &[TreeRecord]) -> Option<Quartiles> {
    if records.is_empty() {
        return None;
    }
    let mut sorted: Vec<f64> = records.iter().map(|r| r.soil_temperature_c).collect();
    sorted.sort_by(f64::total_cmp);
    Some(Quartiles {
        min: sorted[0],
        q1: percentile(&sorted, 0.25),
        median: percentile(&sorted, 0.50),
        q3: percentile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
    })
}

/// `sorted` must be non-empty and ascending.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = (sorted.len() - 1) as f64 * p;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let weight = rank - lo as f64;
        sorted[lo] * (1.0 - weight) + sorted[hi] * weight
    }
}

// ===========================================================================
// Tests
// ===========================================================================
