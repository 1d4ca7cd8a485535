//! Simulated telemetry for a palm-orchard drip irrigation system.
//!
//! The crate owns the read side of the farm dashboard:
//!
//! - a seeded generator producing one [`TreeRecord`] per palm
//! - filtering and aggregation over record slices
//! - canned savings and fleet analytics for the reports page
//! - an immutable irrigation command that yields an updated snapshot
//!
//! There is no global state. Each caller constructs its own
//! [`TelemetryStore`] and decides how, or whether, to share it:
//!
//! ```
//! use palm_telemetry::{summary_metrics, TelemetryStore};
//!
//! let store = TelemetryStore::generate(50, Some(1))?;
//! let summary = summary_metrics(store.records());
//! assert_eq!(summary.total_count, 50);
//! # Ok::<(), palm_telemetry::TelemetryError>(())
//! ```

pub mod error;
pub mod query;
pub mod record;
pub mod reports;
pub mod store;

pub use error::TelemetryError;
pub use query::{
    filter, moisture_histogram, soil_temperature_quartiles, summary_metrics, HistogramBucket,
    Quartiles, StatusCounts, SummaryMetrics, TreeFilter, MAX_BINS,
};
pub use record::{TreeRecord, TreeStatus, Variety};
pub use store::TelemetryStore;
