//! HTTP/JSON API: simulation, screening, health.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::error::EngineError;
use crate::market::{KlineInterval, KlineSource, MarketDataError, SymbolUniverse};
use crate::screening::{
    ScreeningConfig, ScreeningError, ScreeningOrchestrator, ScreeningRequest, TaskRegistry,
    TaskStatus,
};
use crate::search::{LatticeConfig, ParameterSearchEngine, SearchResult};
use crate::sim::PerformanceMetrics;

/// Fewest bars a request may ask for.
const MIN_LIMIT: usize = 100;

/// Most bars a request may ask for (eleven 1000-bar exchange pages).
const MAX_LIMIT: usize = 11_000;

const MIN_TRAIN_RATIO: Decimal = dec!(0.5);
const MAX_TRAIN_RATIO: Decimal = dec!(0.9);

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    klines: Arc<dyn KlineSource>,
    registry: Arc<TaskRegistry>,
    orchestrator: Arc<ScreeningOrchestrator>,
}

impl AppState {
    /// Wire the market collaborators into a fresh registry/orchestrator.
    #[must_use]
    pub fn new(
        klines: Arc<dyn KlineSource>,
        universe: Arc<dyn SymbolUniverse>,
        screening: ScreeningConfig,
    ) -> Self {
        let registry = Arc::new(TaskRegistry::new());
        let orchestrator = Arc::new(ScreeningOrchestrator::new(
            Arc::clone(&klines),
            universe,
            Arc::clone(&registry),
            screening,
        ));
        Self {
            klines,
            registry,
            orchestrator,
        }
    }
}

/// Build the API router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/simulation/{symbol}", post(simulate))
        .route("/v1/screening", post(launch_screening))
        .route(
            "/v1/screening/{task_id}",
            get(screening_status).delete(cancel_screening),
        )
        .with_state(state)
}

/// API error with a stable HTTP status and JSON body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl From<MarketDataError> for ApiError {
    fn from(e: MarketDataError) -> Self {
        let status = match e {
            MarketDataError::UnknownInterval(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::BAD_GATEWAY,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl From<ScreeningError> for ApiError {
    fn from(e: ScreeningError) -> Self {
        let status = match &e {
            ScreeningError::AlreadyRunning { .. } => StatusCode::CONFLICT,
            ScreeningError::TaskNotFound(_) => StatusCode::NOT_FOUND,
            ScreeningError::UniverseUnavailable(_) | ScreeningError::Market(_) => {
                StatusCode::BAD_GATEWAY
            }
            ScreeningError::Engine(_) => StatusCode::BAD_REQUEST,
            ScreeningError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SimulationRequest {
    interval: String,
    limit: usize,
    total_amount: Decimal,
    train_ratio: Option<Decimal>,
    grid_levels_options: Option<Vec<u32>>,
    sell_percentage_options: Option<Vec<Decimal>>,
}

#[derive(Debug, Serialize)]
struct SimulationResponse {
    symbol: String,
    best_params: PerformanceMetrics,
    test_result: PerformanceMetrics,
    top_results: Vec<PerformanceMetrics>,
    train_size: usize,
    test_size: usize,
    kline_interval: KlineInterval,
    computed_in_ms: u64,
}

#[derive(Debug, Deserialize)]
struct ScreeningLaunchRequest {
    interval: String,
    limit: usize,
    total_amount: Decimal,
}

#[derive(Debug, Serialize)]
struct ScreeningLaunchResponse {
    task_id: Uuid,
    message: String,
}

#[derive(Debug, Serialize)]
struct ScreeningStatusResponse {
    task_id: Uuid,
    status: TaskStatus,
    progress: Decimal,
    total_symbols: usize,
    processed_symbols: usize,
    results: Vec<crate::screening::SymbolScreenResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

async fn health() -> &'static str {
    "OK"
}

async fn simulate(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Json(request): Json<SimulationRequest>,
) -> Result<Json<SimulationResponse>, ApiError> {
    let interval: KlineInterval = request
        .interval
        .parse()
        .map_err(|e: MarketDataError| ApiError::bad_request(e.to_string()))?;
    validate_common(request.limit, request.total_amount)?;

    let mut lattice = LatticeConfig::default_profile();
    if let Some(levels) = request.grid_levels_options {
        if levels.is_empty() {
            return Err(ApiError::bad_request("grid_levels_options must be non-empty"));
        }
        lattice.grid_levels = levels;
    }
    if let Some(percentages) = request.sell_percentage_options {
        if percentages.is_empty() {
            return Err(ApiError::bad_request(
                "sell_percentage_options must be non-empty",
            ));
        }
        lattice.sell_percentages = percentages;
    }

    let mut engine = ParameterSearchEngine::new(lattice);
    if let Some(ratio) = request.train_ratio {
        if !(MIN_TRAIN_RATIO..=MAX_TRAIN_RATIO).contains(&ratio) {
            return Err(ApiError::bad_request(format!(
                "train_ratio must be between {MIN_TRAIN_RATIO} and {MAX_TRAIN_RATIO}"
            )));
        }
        engine = engine.with_train_ratio(ratio);
    }

    let symbol = symbol.to_uppercase();
    info!(symbol, interval = %interval, limit = request.limit, "Simulation requested");

    let bars = state.klines.get_bars(&symbol, interval, request.limit).await?;

    let search_symbol = symbol.clone();
    let total_amount = request.total_amount;
    let search: SearchResult = tokio::task::spawn_blocking(move || {
        engine.search(&search_symbol, &bars, interval, total_amount)
    })
    .await
    .map_err(|e| ApiError::internal(e.to_string()))??;

    Ok(Json(SimulationResponse {
        symbol,
        best_params: search.best,
        test_result: search.test_result,
        top_results: search.top_results,
        train_size: search.train_size,
        test_size: search.test_size,
        kline_interval: search.interval,
        computed_in_ms: search.computed_in_ms,
    }))
}

async fn launch_screening(
    State(state): State<AppState>,
    Json(request): Json<ScreeningLaunchRequest>,
) -> Result<Json<ScreeningLaunchResponse>, ApiError> {
    let interval: KlineInterval = request
        .interval
        .parse()
        .map_err(|e: MarketDataError| ApiError::bad_request(e.to_string()))?;
    validate_common(request.limit, request.total_amount)?;

    let task_id = state.orchestrator.launch(ScreeningRequest {
        interval,
        limit: request.limit,
        total_amount: request.total_amount,
    })?;

    Ok(Json(ScreeningLaunchResponse {
        task_id,
        message: "screening started".to_string(),
    }))
}

async fn screening_status(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<ScreeningStatusResponse>, ApiError> {
    let task = state
        .registry
        .get(task_id)
        .ok_or(ScreeningError::TaskNotFound(task_id))?;

    Ok(Json(ScreeningStatusResponse {
        task_id: task.id,
        status: task.status,
        progress: task.progress(),
        total_symbols: task.total_symbols,
        processed_symbols: task.processed_symbols,
        results: task.results.clone(),
        error: task.error.clone(),
        started_at: task.started_at,
        completed_at: task.completed_at,
    }))
}

async fn cancel_screening(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<ScreeningLaunchResponse>, ApiError> {
    state.orchestrator.cancel(task_id)?;
    Ok(Json(ScreeningLaunchResponse {
        task_id,
        message: "cancellation requested".to_string(),
    }))
}

fn validate_common(limit: usize, total_amount: Decimal) -> Result<(), ApiError> {
    if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::bad_request(format!(
            "limit must be between {MIN_LIMIT} and {MAX_LIMIT}"
        )));
    }
    if total_amount <= Decimal::ZERO {
        return Err(ApiError::bad_request("total_amount must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, header};
    use rust_decimal_macros::dec;
    use tower::ServiceExt;

    use crate::market::{Bar, InMemoryMarketData};

    use super::*;

    fn oscillating_bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| {
                let phase = (i % 40) as u64;
                let price = Decimal::from(100 + if phase < 20 { phase } else { 40 - phase });
                Bar {
                    open_time: i as i64,
                    open: price,
                    high: price + dec!(1),
                    low: price - dec!(1),
                    close: price,
                    volume: dec!(10),
                }
            })
            .collect()
    }

    fn app_with(provider: InMemoryMarketData) -> Router {
        let provider = Arc::new(provider);
        router(AppState::new(
            provider.clone(),
            provider,
            ScreeningConfig::default(),
        ))
    }

    fn app() -> Router {
        app_with(InMemoryMarketData::new().with_symbol("BTCUSDC", oscillating_bars(250)))
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn simulation_body() -> serde_json::Value {
        json!({"interval": "1h", "limit": 250, "total_amount": "1000"})
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn simulation_returns_best_params_and_split_sizes() {
        let response = app()
            .oneshot(post_json("/v1/simulation/btcusdc", simulation_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["symbol"], "BTCUSDC");
        assert_eq!(body["kline_interval"], "1h");
        assert_eq!(body["train_size"], 175);
        assert_eq!(body["test_size"], 75);
        assert!(body["best_params"]["total_pnl"].is_string());
        assert!(body["best_params"]["grid_levels"].is_number());
        assert!(body["top_results"].as_array().unwrap().len() <= 10);
        assert!(body["computed_in_ms"].is_number());
    }

    #[tokio::test]
    async fn unknown_interval_is_rejected() {
        let response = app()
            .oneshot(post_json(
                "/v1/simulation/BTCUSDC",
                json!({"interval": "2h", "limit": 250, "total_amount": "1000"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn limit_outside_bounds_is_rejected() {
        for limit in [0, 99, 11_001] {
            let response = app()
                .oneshot(post_json(
                    "/v1/simulation/BTCUSDC",
                    json!({"interval": "1h", "limit": limit, "total_amount": "1000"}),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn non_positive_amount_is_rejected() {
        let response = app()
            .oneshot(post_json(
                "/v1/simulation/BTCUSDC",
                json!({"interval": "1h", "limit": 250, "total_amount": "0"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn train_ratio_outside_bounds_is_rejected() {
        let response = app()
            .oneshot(post_json(
                "/v1/simulation/BTCUSDC",
                json!({"interval": "1h", "limit": 250, "total_amount": "1000", "train_ratio": "0.95"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn lattice_overrides_must_be_non_empty() {
        let response = app()
            .oneshot(post_json(
                "/v1/simulation/BTCUSDC",
                json!({"interval": "1h", "limit": 250, "total_amount": "1000", "grid_levels_options": []}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upstream_symbol_failure_maps_to_bad_gateway() {
        let app = app_with(InMemoryMarketData::new().with_failing_symbol("DOWNUSDC"));
        let response = app
            .oneshot(post_json("/v1/simulation/DOWNUSDC", simulation_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn too_short_history_maps_to_bad_request() {
        let app = app_with(
            InMemoryMarketData::new().with_symbol("THINUSDC", oscillating_bars(50)),
        );
        let response = app
            .oneshot(post_json("/v1/simulation/THINUSDC", simulation_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn screening_lifecycle_over_http() {
        let app = app();

        let response = app
            .clone()
            .oneshot(post_json("/v1/screening", simulation_body()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let task_id = body["task_id"].as_str().unwrap().to_string();

        // Poll until the run settles.
        let mut status = json!(null);
        for _ in 0..500 {
            let response = app
                .clone()
                .oneshot(
                    Request::get(format!("/v1/screening/{task_id}"))
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            status = body_json(response).await;
            if status["status"] == "completed" || status["status"] == "failed" {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        assert_eq!(status["status"], "completed");
        assert_eq!(status["total_symbols"], 1);
        assert_eq!(status["processed_symbols"], 1);
        assert_eq!(status["results"].as_array().unwrap().len(), 1);
        assert_eq!(status["results"][0]["symbol"], "BTCUSDC");
        assert!(status["started_at"].is_string());
    }

    #[tokio::test]
    async fn concurrent_screening_launch_conflicts() {
        let app = app_with(
            InMemoryMarketData::new()
                .with_symbol("BTCUSDC", oscillating_bars(250))
                .with_latency(Duration::from_millis(200)),
        );

        let first = app
            .clone()
            .oneshot(post_json("/v1/screening", simulation_body()))
            .await
            .unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app
            .oneshot(post_json("/v1/screening", simulation_body()))
            .await
            .unwrap();
        assert_eq!(second.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_task_is_not_found() {
        let response = app()
            .oneshot(
                Request::get(format!("/v1/screening/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cancelling_unknown_task_is_not_found() {
        let response = app()
            .oneshot(
                Request::delete(format!("/v1/screening/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
