use palm_telemetry::{
    reports, summary_metrics, Quartiles, SummaryMetrics, TelemetryStore,
};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::config::Config;

/// Maximum number of events retained in the ring buffer.
const MAX_EVENTS: usize = 200;

// ---------------------------------------------------------------------------
// Public type alias
// ---------------------------------------------------------------------------

pub type SharedState = Arc<RwLock<DashboardState>>;

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

pub struct DashboardState {
    pub started_at: Instant,
    pub config: Config,
    pub store: TelemetryStore,
    pub events: VecDeque<DashboardEvent>,
}

#[derive(Clone, Serialize)]
pub struct DashboardEvent {
    #[serde(with = "time::serde::rfc3339")]
    pub ts: OffsetDateTime,
    pub kind: EventKind,
    pub detail: String,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    System,
    Irrigation,
}

// ---------------------------------------------------------------------------
// JSON response (what the summary API returns)
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct StatusResponse {
    pub farm_name: String,
    pub uptime_secs: u64,
    pub summary: SummaryMetrics,
    pub headline: reports::SavingsHeadline,
    pub soil_temperature: Option<Quartiles>,
}

// ---------------------------------------------------------------------------
// Construction & mutation
// ---------------------------------------------------------------------------

impl DashboardState {
    pub fn new(config: Config, store: TelemetryStore) -> Self {
        Self {
            started_at: Instant::now(),
            config,
            store,
            events: VecDeque::with_capacity(MAX_EVENTS),
        }
    }

    /// Swap in the post-irrigation snapshot and log the run.
    pub fn record_irrigation(
        &mut self,
        snapshot: TelemetryStore,
        tree_id: u32,
        duration_min: u32,
        volume_liters: u32,
    ) {
        self.store = snapshot;
        self.push_event(
            EventKind::Irrigation,
            format!("tree {tree_id} watered for {duration_min} min ({volume_liters} L)"),
        );
    }

    /// Record a generic system event.
    pub fn record_system(&mut self, detail: String) {
        self.push_event(EventKind::System, detail);
    }

    /// Build the JSON-serialisable overview snapshot.
    pub fn to_status(&self) -> StatusResponse {
        StatusResponse {
            farm_name: self.config.farm.name.clone(),
            uptime_secs: self.started_at.elapsed().as_secs(),
            summary: summary_metrics(self.store.records()),
            headline: reports::savings_headline(),
            soil_temperature: palm_telemetry::soil_temperature_quartiles(self.store.records()),
        }
    }

    /// Events newest-first, the order the activity feed renders them.
    pub fn events_newest_first(&self) -> Vec<DashboardEvent> {
        self.events.iter().rev().cloned().collect()
    }

    fn push_event(&mut self, kind: EventKind, detail: String) {
        if self.events.len() >= MAX_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(DashboardEvent {
            ts: OffsetDateTime::now_utc(),
            kind,
            detail,
        });
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn state_with_trees(count: u32) -> DashboardState {
        let store =
            TelemetryStore::generate_at(count, Some(1), datetime!(2024-06-15 12:00 UTC)).unwrap();
        DashboardState::new(Config::default(), store)
    }

    #[test]
    fn status_reflects_store_and_config() {
        let state = state_with_trees(12);
        let status = state.to_status();
        assert_eq!(status.farm_name, "My Smart Farm");
        assert_eq!(status.summary.total_count, 12);
        assert!(status.soil_temperature.is_some());
        assert_eq!(status.headline.monthly_savings_sar, 2100);
    }

    #[test]
    fn irrigation_swaps_snapshot_and_logs() {
        let mut state = state_with_trees(5);
        let watered = state
            .store
            .irrigate(3, datetime!(2024-06-16 05:30 UTC))
            .unwrap();
        state.record_irrigation(watered, 3, 30, 200);

        assert!(!state.store.get(3).unwrap().needs_water);
        assert_eq!(state.events.len(), 1);
        let event = &state.events[0];
        assert_eq!(event.kind, EventKind::Irrigation);
        assert!(event.detail.contains("tree 3"));
        assert!(event.detail.contains("30 min"));
    }

    #[test]
    fn event_ring_drops_oldest_beyond_capacity() {
        let mut state = state_with_trees(1);
        for i in 0..(MAX_EVENTS + 10) {
            state.record_system(format!("event {i}"));
        }
        assert_eq!(state.events.len(), MAX_EVENTS);
        assert_eq!(state.events.front().unwrap().detail, "event 10");
        assert_eq!(
            state.events.back().unwrap().detail,
            format!("event {}", MAX_EVENTS + 9)
        );
    }

    #[test]
    fn feed_returns_newest_first() {
        let mut state = state_with_trees(1);
        state.record_system("first".into());
        state.record_system("second".into());
        let feed = state.events_newest_first();
        assert_eq!(feed[0].detail, "second");
        assert_eq!(feed[1].detail, "first");
    }
}
