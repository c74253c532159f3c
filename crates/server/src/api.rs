//! HTTP API: rating prediction, health checks and Prometheus metrics

use crate::controllers::GameRatingController;
use esrb_lib::{
    health::{ComponentStatus, HealthRegistry},
    observability::{PredictorMetrics, StructuredLogger},
    EsrbPredictor, GameInfo, ModelWrapper, PredictionResult, PredictorError,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Route of the minimal prediction endpoint
pub const PREDICT_ROUTE: &str = "/esrb-predictor";

/// Shared application state
pub struct AppState {
    /// Requests are serialized against the single predictor
    pub predictor: Mutex<EsrbPredictor>,
    pub health_registry: HealthRegistry,
    pub metrics: PredictorMetrics,
    pub logger: StructuredLogger,
}

impl AppState {
    pub fn new(
        predictor: EsrbPredictor,
        health_registry: HealthRegistry,
        metrics: PredictorMetrics,
        logger: StructuredLogger,
    ) -> Self {
        Self {
            predictor: Mutex::new(predictor),
            health_registry,
            metrics,
            logger,
        }
    }
}

/// Error returned to HTTP clients as `{"error": "..."}`
#[derive(Debug)]
pub struct ApiError(PredictorError);

impl From<PredictorError> for ApiError {
    fn from(err: PredictorError) -> Self {
        Self(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        if self.0.is_not_ready() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// Predict the rating of one game with the shared predictor
pub async fn predict_game(state: &AppState, game: &GameInfo) -> Result<PredictionResult, ApiError> {
    let result = state.predictor.lock().await.predict(game);
    match result {
        Ok(prediction) => {
            state
                .logger
                .log_prediction(&game.title, &prediction.esrb_rating, prediction.confidence());
            Ok(prediction)
        }
        Err(e) => {
            warn!(title = %game.title, error = %e, "Prediction request failed");
            Err(e.into())
        }
    }
}

/// Minimal prediction endpoint
async fn esrb_predictor(
    State(state): State<Arc<AppState>>,
    Json(game): Json<GameInfo>,
) -> Result<Json<PredictionResult>, ApiError> {
    predict_game(&state, &game).await.map(Json)
}

/// Health check - 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check - 200 once a model is loaded, 503 otherwise
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics() -> Response {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; charset=utf-8")],
        buffer,
    )
        .into_response()
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(PREDICT_ROUTE, post(esrb_predictor))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .merge(GameRatingController::routes())
        .with_state(state)
}

/// Start the API server
pub async fn serve(addr: String, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
