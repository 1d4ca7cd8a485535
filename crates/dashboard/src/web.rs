use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use std::env;
use std::net::SocketAddr;
use time::OffsetDateTime;
use tokio::net::TcpListener;

use palm_telemetry::{
    filter, moisture_histogram, reports, HistogramBucket, TelemetryError, TreeFilter, TreeRecord,
    TreeStatus, Variety,
};

use crate::config::VOLUME_RANGE_LITERS;
use crate::state::{DashboardEvent, SharedState, StatusResponse};

const INDEX_HTML: &str = include_str!("ui/index.html");

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// A handler failure, rendered as `{"error": "..."}` with a matching status.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: message.into() }
    }
}

impl From<TelemetryError> for ApiError {
    fn from(err: TelemetryError) -> Self {
        match err {
            TelemetryError::InvalidArgument(_) => Self::bad_request(err.to_string()),
            TelemetryError::UnknownTree(_) => Self::not_found(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/summary", get(api_summary))
        .route("/api/trees", get(api_trees))
        .route("/api/trees/{id}/irrigate", post(api_irrigate))
        .route("/api/histogram", get(api_histogram))
        .route("/api/reports", get(api_reports))
        .route("/api/events", get(api_events))
        .with_state(state)
}

async fn index() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/html; charset=utf-8")], INDEX_HTML)
}

async fn api_summary(State(state): State<SharedState>) -> Json<StatusResponse> {
    let st = state.read().await;
    Json(st.to_status())
}

#[derive(Debug, Deserialize)]
struct TreesQuery {
    variety: Option<String>,
    status: Option<String>,
    min_moisture: Option<f64>,
}

async fn api_trees(
    State(state): State<SharedState>,
    Query(query): Query<TreesQuery>,
) -> Result<Json<Vec<TreeRecord>>, ApiError> {
    let tree_filter = TreeFilter {
        variety: query.variety.as_deref().map(str::parse::<Variety>).transpose()?,
        status: query.status.as_deref().map(str::parse::<TreeStatus>).transpose()?,
        min_moisture_pct: query.min_moisture.unwrap_or(0.0),
    };
    let st = state.read().await;
    Ok(Json(filter(st.store.records(), &tree_filter)))
}

#[derive(Debug, Deserialize)]
struct HistogramQuery {
    bins: Option<usize>,
}

async fn api_histogram(
    State(state): State<SharedState>,
    Query(query): Query<HistogramQuery>,
) -> Result<Json<Vec<HistogramBucket>>, ApiError> {
    let st = state.read().await;
    let bins = query.bins.unwrap_or(st.config.dashboard.histogram_bins);
    Ok(Json(moisture_histogram(st.store.records(), bins)?))
}

#[derive(serde::Serialize)]
struct ReportsResponse {
    water_savings: Vec<reports::MonthlySaving>,
    average_saving_pct: f64,
    financial_savings: Vec<reports::FinancialSaving>,
    total_financial_sar: u32,
    energy: reports::EnergyMix,
    fleet: reports::FleetSummary,
    performance: reports::PerformanceSummary,
    recommendations: Vec<String>,
}

async fn api_reports(State(state): State<SharedState>) -> Json<ReportsResponse> {
    let st = state.read().await;
    let water_savings = reports::water_savings_series(st.config.farm.seed);
    let average_saving_pct = reports::average_saving_pct(&water_savings);
    Json(ReportsResponse {
        water_savings,
        average_saving_pct,
        financial_savings: reports::FINANCIAL_SAVINGS_SAR.to_vec(),
        total_financial_sar: reports::total_financial_savings_sar(),
        energy: reports::energy_mix(),
        fleet: reports::fleet_summary(st.store.len()),
        performance: reports::performance_summary(),
        recommendations: reports::recommendations(st.store.records()),
    })
}

async fn api_events(State(state): State<SharedState>) -> Json<Vec<DashboardEvent>> {
    let st = state.read().await;
    Json(st.events_newest_first())
}

#[derive(Debug, Default, Deserialize)]
struct IrrigateBody {
    duration_min: Option<u32>,
    volume_liters: Option<u32>,
}

async fn api_irrigate(
    State(state): State<SharedState>,
    Path(id): Path<u32>,
    Json(body): Json<IrrigateBody>,
) -> Result<Json<TreeRecord>, ApiError> {
    let mut st = state.write().await;

    let duration_min = body.duration_min.unwrap_or(st.config.irrigation.default_duration_min);
    let max_duration = st.config.irrigation.max_duration_min;
    if duration_min < 1 || duration_min > max_duration {
        return Err(ApiError::bad_request(format!(
            "duration_min {duration_min} out of range [1, {max_duration}]"
        )));
    }

    let volume_liters = body.volume_liters.unwrap_or(st.config.irrigation.default_volume_liters);
    let (volume_min, volume_max) = VOLUME_RANGE_LITERS;
    if !(volume_min..=volume_max).contains(&volume_liters) {
        return Err(ApiError::bad_request(format!(
            "volume_liters {volume_liters} out of range [{volume_min}, {volume_max}]"
        )));
    }

    let watered = st.store.irrigate(id, OffsetDateTime::now_utc())?;
    let record = watered
        .get(id)
        .cloned()
        .ok_or_else(|| ApiError::not_found(format!("unknown tree id {id}")))?;
    st.record_irrigation(watered, id, duration_min, volume_liters);

    Ok(Json(record))
}

// ---------------------------------------------------------------------------
// Server entry-point
// ---------------------------------------------------------------------------

pub async fn serve(state: SharedState) {
    let port: u16 = env::var("WEB_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await.expect("failed to bind web port");

    tracing::info!("dashboard listening on http://{addr}");

    axum::serve(listener, router(state))
        .await
        .expect("web server error");
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::state::DashboardState;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use palm_telemetry::TelemetryStore;
    use std::sync::Arc;
    use time::macros::datetime;
    use tokio::sync::RwLock;
    use tower::ServiceExt;

    const TREES: u32 = 30;

    fn shared_state() -> SharedState {
        let store =
            TelemetryStore::generate_at(TREES, Some(1), datetime!(2024-06-15 12:00 UTC)).unwrap();
        Arc::new(RwLock::new(DashboardState::new(Config::default(), store)))
    }

    async fn get_json(state: SharedState, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    async fn post_json(
        state: SharedState,
        uri: &str,
        body: &str,
    ) -> (StatusCode, serde_json::Value) {
        let response = router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// Pulls one tree out of a `/api/trees` response body.
    fn find_tree(listing: &serde_json::Value, id: u32) -> &serde_json::Value {
        listing
            .as_array()
            .unwrap()
            .iter()
            .find(|t| t["id"] == id)
            .unwrap()
    }

    // -- index --------------------------------------------------------------

    #[tokio::test]
    async fn index_serves_embedded_html() {
        let response = router(shared_state())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
    }

    // -- summary ------------------------------------------------------------

    #[tokio::test]
    async fn summary_reports_the_whole_farm() {
        let (status, json) = get_json(shared_state(), "/api/summary").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["farm_name"], "My Smart Farm");
        assert_eq!(json["summary"]["total_count"], TREES);
        assert_eq!(json["headline"]["monthly_savings_sar"], 2100);
        assert!(json["soil_temperature"]["median"].is_f64());
    }

    // -- trees --------------------------------------------------------------

    #[tokio::test]
    async fn trees_without_filters_returns_everything() {
        let (status, json) = get_json(shared_state(), "/api/trees").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), TREES as usize);
    }

    #[tokio::test]
    async fn trees_variety_slices_partition_the_farm() {
        let state = shared_state();
        let mut seen = 0;
        for variety in ["khalas", "sagai", "medjool", "barhi", "sultan"] {
            let (status, json) =
                get_json(state.clone(), &format!("/api/trees?variety={variety}")).await;
            assert_eq!(status, StatusCode::OK);
            let slice = json.as_array().unwrap();
            assert!(slice.iter().all(|t| t["variety"] == variety));
            seen += slice.len();
        }
        assert_eq!(seen, TREES as usize);
    }

    #[tokio::test]
    async fn trees_moisture_bound_excludes_dry_limit() {
        let (status, json) = get_json(shared_state(), "/api/trees?min_moisture=100").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn trees_status_filter_matches_only_that_status() {
        let (status, json) = get_json(shared_state(), "/api/trees?status=good").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json.as_array().unwrap().iter().all(|t| t["status"] == "good"));
    }

    #[tokio::test]
    async fn trees_unknown_variety_is_rejected() {
        let (status, json) = get_json(shared_state(), "/api/trees?variety=oak").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("unknown variety"));
    }

    #[tokio::test]
    async fn trees_unknown_status_is_rejected() {
        let (status, _) = get_json(shared_state(), "/api/trees?status=great").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    // -- histogram ----------------------------------------------------------

    #[tokio::test]
    async fn histogram_defaults_to_configured_bins() {
        let (status, json) = get_json(shared_state(), "/api/histogram").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 20);
    }

    #[tokio::test]
    async fn histogram_honors_explicit_bins_and_conserves_trees() {
        let (status, json) = get_json(shared_state(), "/api/histogram?bins=5").await;
        assert_eq!(status, StatusCode::OK);
        let buckets = json.as_array().unwrap();
        assert_eq!(buckets.len(), 5);
        let total: u64 = buckets.iter().map(|b| b["count"].as_u64().unwrap()).sum();
        assert_eq!(total, TREES as u64);
    }

    #[tokio::test]
    async fn histogram_zero_bins_is_rejected() {
        let (status, json) = get_json(shared_state(), "/api/histogram?bins=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("bin count"));
    }

    #[tokio::test]
    async fn histogram_oversized_bins_is_rejected() {
        let state = shared_state();
        for uri in [
            "/api/histogram?bins=1001",
            "/api/histogram?bins=10000000000",
            "/api/histogram?bins=18446744073709551615",
        ] {
            let (status, json) = get_json(state.clone(), uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "uri: {uri}");
            assert!(json["error"].as_str().unwrap().contains("bucket limit"));
        }
    }

    // -- reports ------------------------------------------------------------

    #[tokio::test]
    async fn reports_cover_every_panel() {
        let (status, json) = get_json(shared_state(), "/api/reports").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["water_savings"].as_array().unwrap().len(), 12);
        assert_eq!(json["total_financial_sar"], 11_900);
        assert_eq!(json["energy"]["solar_pct"], 85.0);
        assert_eq!(json["fleet"]["sensor_count"], TREES);
        assert_eq!(json["fleet"]["gateway_count"], 3);
        assert_eq!(json["performance"]["irrigation_efficiency_pct"], 95.0);
        assert_eq!(json["recommendations"].as_array().unwrap().len(), 4);
    }

    // -- irrigate -----------------------------------------------------------

    #[tokio::test]
    async fn irrigate_clears_request_and_logs_event() {
        let state = shared_state();
        let (status, json) = post_json(state.clone(), "/api/trees/3/irrigate", "{}").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["id"], 3);
        assert_eq!(json["needs_water"], false);

        let st = state.read().await;
        assert!(!st.store.get(3).unwrap().needs_water);
        assert_eq!(st.events.len(), 1);
        assert!(st.events[0].detail.contains("30 min"));
        assert!(st.events[0].detail.contains("200 L"));
    }

    #[tokio::test]
    async fn irrigate_round_trips_through_tree_listing() {
        let state = shared_state();
        let (_, before) = get_json(state.clone(), "/api/trees").await;
        let original_stamp = find_tree(&before, 3)["last_irrigation_at"].clone();

        let (status, posted) = post_json(state.clone(), "/api/trees/3/irrigate", "{}").await;
        assert_eq!(status, StatusCode::OK);

        let (status, after) = get_json(state, "/api/trees").await;
        assert_eq!(status, StatusCode::OK);
        let listed = find_tree(&after, 3);
        assert_eq!(listed["needs_water"], false);
        assert_eq!(listed["last_irrigation_at"], posted["last_irrigation_at"]);
        assert_ne!(listed["last_irrigation_at"], original_stamp);
    }

    #[tokio::test]
    async fn irrigate_accepts_explicit_run_parameters() {
        let state = shared_state();
        let (status, _) = post_json(
            state.clone(),
            "/api/trees/1/irrigate",
            r#"{"duration_min": 45, "volume_liters": 500}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let st = state.read().await;
        assert!(st.events[0].detail.contains("45 min"));
        assert!(st.events[0].detail.contains("500 L"));
    }

    #[tokio::test]
    async fn irrigate_unknown_tree_is_not_found() {
        let (status, json) = post_json(shared_state(), "/api/trees/999/irrigate", "{}").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].as_str().unwrap().contains("999"));
    }

    #[tokio::test]
    async fn irrigate_rejects_out_of_range_duration() {
        let state = shared_state();
        for body in [r#"{"duration_min": 0}"#, r#"{"duration_min": 61}"#] {
            let (status, json) = post_json(state.clone(), "/api/trees/1/irrigate", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
            assert!(json["error"].as_str().unwrap().contains("duration_min"));
        }
    }

    #[tokio::test]
    async fn irrigate_rejects_out_of_range_volume() {
        let (status, json) = post_json(
            shared_state(),
            "/api/trees/1/irrigate",
            r#"{"volume_liters": 5}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("volume_liters"));
    }

    #[tokio::test]
    async fn rejected_irrigation_changes_nothing() {
        let state = shared_state();
        let before = state.read().await.store.clone();
        let _ = post_json(state.clone(), "/api/trees/1/irrigate", r#"{"duration_min": 0}"#).await;
        let st = state.read().await;
        assert_eq!(st.store, before);
        assert!(st.events.is_empty());
    }

    // -- events -------------------------------------------------------------

    #[tokio::test]
    async fn events_feed_runs_newest_first() {
        let state = shared_state();
        let _ = post_json(state.clone(), "/api/trees/1/irrigate", "{}").await;
        let _ = post_json(state.clone(), "/api/trees/2/irrigate", "{}").await;

        let (status, json) = get_json(state, "/api/events").await;
        assert_eq!(status, StatusCode::OK);
        let feed = json.as_array().unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0]["kind"], "irrigation");
        assert!(feed[0]["detail"].as_str().unwrap().contains("tree 2"));
        assert!(feed[1]["detail"].as_str().unwrap().contains("tree 1"));
    }
}
