// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. The browser dashboard is the only
// client, so there is no authentication layer; CORS is permissive.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::analysis::{normalize_ticker, run_analysis, PROVIDER_FAILURE_MESSAGE};
use crate::app_state::AppState;
use crate::chart::{ChartFrame, OverlaySelection};
use crate::indicators::IndicatorSet;

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/analysis", post(analyze))
        .route("/api/v1/analysis/latest", get(latest_analysis))
        .route("/api/v1/chart", get(latest_chart))
        .route("/api/v1/chart/synthetic", get(synthetic_chart))
        .route("/api/v1/overlays", get(get_overlays))
        .route("/api/v1/overlays", post(set_overlays))
        .route("/api/v1/errors", get(recent_errors))
        .route("/api/v1/ws", get(crate::api::ws::ws_handler))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Overlay query parameters
// =============================================================================

/// Per-request overlay switches; anything left out uses the configured
/// default.
#[derive(Debug, Default, Deserialize)]
struct OverlayQuery {
    sma_fast: Option<bool>,
    sma_slow: Option<bool>,
    rsi: Option<bool>,
}

impl OverlayQuery {
    fn resolve(&self, defaults: OverlaySelection) -> OverlaySelection {
        OverlaySelection {
            sma_fast: self.sma_fast.unwrap_or(defaults.sma_fast),
            sma_slow: self.sma_slow.unwrap_or(defaults.sma_slow),
            rsi: self.rsi.unwrap_or(defaults.rsi),
        }
    }
}

fn selection(state: &AppState, query: &OverlayQuery) -> OverlaySelection {
    let defaults = state.runtime_config.read().default_overlays;
    query.resolve(defaults)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    provider: &'static str,
    state_version: u64,
    uptime_secs: u64,
    latest_ticker: Option<String>,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        provider: state.provider.name(),
        state_version: state.current_state_version(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        latest_ticker: state.latest_snapshot().map(|s| s.ticker.clone()),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Analysis
// =============================================================================

#[derive(Deserialize)]
struct AnalyzeRequest {
    ticker: String,
}

async fn analyze(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OverlayQuery>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    normalize_ticker(&req.ticker).map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let snapshot = run_analysis(&state, &req.ticker)
        .await
        .map_err(|_| api_error(StatusCode::BAD_GATEWAY, PROVIDER_FAILURE_MESSAGE))?;

    Ok(Json(snapshot.view(selection(&state, &query))))
}

async fn latest_analysis(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OverlayQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state
        .latest_snapshot()
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "No analysis available yet"))?;
    Ok(Json(snapshot.view(selection(&state, &query))))
}

// =============================================================================
// Chart
// =============================================================================

async fn latest_chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OverlayQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state
        .latest_snapshot()
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "No analysis available yet"))?;
    Ok(Json(snapshot.chart(selection(&state, &query))))
}

// Overlay switches are repeated here rather than flattened: flattened fields
// lose their typed parsing under `serde_urlencoded`.
#[derive(Deserialize)]
struct SyntheticQuery {
    price: Option<f64>,
    seed: Option<u64>,
    ticker: Option<String>,
    sma_fast: Option<bool>,
    sma_slow: Option<bool>,
    rsi: Option<bool>,
}

impl SyntheticQuery {
    fn overlays(&self) -> OverlayQuery {
        OverlayQuery {
            sma_fast: self.sma_fast,
            sma_slow: self.sma_slow,
            rsi: self.rsi,
        }
    }
}

/// Chart from an explicit anchor, without consulting the provider.
async fn synthetic_chart(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SyntheticQuery>,
) -> impl IntoResponse {
    let mut rng = match query.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let series = state.generator.generate(query.price, &mut rng);
    let periods = state.runtime_config.read().indicators.periods();
    let indicators = IndicatorSet::compute(&series, periods);
    let ticker = query.ticker.as_deref().unwrap_or("SYNTHETIC");

    Json(ChartFrame::build(
        ticker,
        &series,
        &indicators,
        selection(&state, &query.overlays()),
    ))
}

// =============================================================================
// Default overlays
// =============================================================================

async fn get_overlays(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.runtime_config.read().default_overlays)
}

async fn set_overlays(
    State(state): State<Arc<AppState>>,
    Json(update): Json<OverlayQuery>,
) -> impl IntoResponse {
    let updated = {
        let mut config = state.runtime_config.write();
        let updated = update.resolve(config.default_overlays);
        if updated == config.default_overlays {
            return Json(updated);
        }
        config.default_overlays = updated;
        updated
    };

    info!(overlays = ?updated, "Default overlays updated");
    if let Some(store) = &state.config_store {
        if let Err(e) = store.update(|c| c.default_overlays = updated) {
            warn!(error = %e, "Failed to save default overlays to disk");
        }
    }
    state.increment_version();

    Json(updated)
}

// =============================================================================
// Error log
// =============================================================================

async fn recent_errors(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.recent_errors())
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::runtime_config::{ConfigStore, RuntimeConfig};
    use crate::sentiment::models::{SentimentAnalysis, SentimentLabel};
    use crate::sentiment::{FixtureSentimentProvider, SentimentReport};

    fn report() -> SentimentReport {
        SentimentReport {
            analysis: SentimentAnalysis {
                ticker: "HDFCBANK".to_string(),
                name: "HDFC Bank Limited".to_string(),
                score: 0.55,
                label: SentimentLabel::Bullish,
                summary: "Deposit growth recovering.".to_string(),
                key_drivers: vec![],
                risk_factors: vec![],
                recommendation: "Buy".to_string(),
                current_price: Some(1688.2),
                nse_price: None,
                bse_price: None,
                price_change: None,
                price_change_percent: None,
                last_updated: None,
                exchange: None,
            },
            sources: vec![],
        }
    }

    fn state() -> AppState {
        let provider =
            FixtureSentimentProvider::new(vec![("HDFCBANK".to_string(), report())]);
        AppState::new(RuntimeConfig::default(), Arc::new(provider)).unwrap()
    }

    fn app() -> Router {
        router(Arc::new(state()))
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_analysis(ticker: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/analysis")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::json!({ "ticker": ticker }).to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_reports_provider() {
        let resp = app()
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["provider"], "fixtures");
    }

    #[tokio::test]
    async fn analysis_returns_anchored_chart() {
        let resp = app().oneshot(post_analysis(" hdfcbank ")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        let points = json["chart"]["points"].as_array().unwrap();
        assert_eq!(points.len(), 25);
        assert_eq!(points[24]["price"], 1688.2);
        assert_eq!(points[24]["time"], "15:30");
        assert_eq!(json["tone"], "bullish");
        assert_eq!(json["analysis"]["ticker"], "HDFCBANK");
    }

    #[tokio::test]
    async fn blank_ticker_is_bad_request() {
        let resp = app().oneshot(post_analysis("   ")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn provider_failure_is_bad_gateway() {
        let resp = app().oneshot(post_analysis("UNKNOWN")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(resp).await;
        assert_eq!(json["error"], PROVIDER_FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn latest_chart_missing_before_first_search() {
        let resp = app()
            .oneshot(Request::get("/api/v1/chart").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn latest_chart_honours_overlay_query() {
        let app = app();
        let resp = app.clone().oneshot(post_analysis("HDFCBANK")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(
                Request::get("/api/v1/chart?rsi=false&sma_fast=false")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert!(json.get("rsi_panel").is_none());
        assert!(json["points"][24].get("rsi").is_none());
        assert!(json["points"][24].get("sma_fast").is_none());
        assert!(json["points"][24].get("sma_slow").is_some());
    }

    #[tokio::test]
    async fn synthetic_chart_is_seeded_and_anchored() {
        let app = app();
        let uri = "/api/v1/chart/synthetic?price=512.35&seed=9";
        let a = body_json(
            app.clone()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap(),
        )
        .await;
        let b = body_json(
            app.oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(a, b);
        assert_eq!(a["points"][24]["price"], 512.35);
        assert_eq!(a["simulated"], true);
        assert_eq!(a["ticker"], "SYNTHETIC");
    }

    #[tokio::test]
    async fn synthetic_chart_without_price_uses_fallback() {
        let resp = app()
            .oneshot(
                Request::get("/api/v1/chart/synthetic?price=-4")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let json = body_json(resp).await;
        assert_eq!(json["points"][24]["price"], 1000.0);
    }

    #[tokio::test]
    async fn synthetic_chart_overlay_switches() {
        let resp = app()
            .oneshot(
                Request::get("/api/v1/chart/synthetic?price=250&seed=1&rsi=false")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert!(json.get("rsi_panel").is_none());
        assert_eq!(json["overlays"]["rsi"], false);
        assert_eq!(json["overlays"]["sma_fast"], true);
    }

    fn post_overlays(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/overlays")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn overlay_defaults_update_persist_and_bump_version() {
        let dir = std::env::temp_dir().join(format!("sentix-rest-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sentix_config.json");

        let store = ConfigStore::new(&path, RuntimeConfig::default());
        let state = Arc::new(state().with_config_store(Some(store)));
        let before = state.current_state_version();

        let resp = router(state.clone())
            .oneshot(post_overlays(serde_json::json!({ "rsi": false })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json, serde_json::json!({ "sma_fast": true, "sma_slow": true, "rsi": false }));

        assert_eq!(state.current_state_version(), before + 1);
        assert!(!state.runtime_config.read().default_overlays.rsi);
        let saved = RuntimeConfig::load(&path).unwrap();
        assert!(!saved.default_overlays.rsi);
        assert!(saved.default_overlays.sma_fast);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn unchanged_overlays_do_not_bump_version() {
        let state = Arc::new(state());
        let before = state.current_state_version();
        let resp = router(state.clone())
            .oneshot(post_overlays(serde_json::json!({ "sma_fast": true })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(state.current_state_version(), before);
    }

    #[tokio::test]
    async fn overlay_defaults_apply_to_later_charts() {
        let state = Arc::new(state());
        let app = router(state);
        app.clone()
            .oneshot(post_overlays(serde_json::json!({ "sma_slow": false })))
            .await
            .unwrap();
        let json = body_json(
            app.oneshot(
                Request::get("/api/v1/chart/synthetic?price=100&seed=3")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap(),
        )
        .await;
        assert_eq!(json["overlays"]["sma_slow"], false);
        assert!(json["points"][24].get("sma_slow").is_none());
    }
}
