//! `GameRating` controller

use crate::api::{predict_game, ApiError, AppState};
use axum::{extract::State, routing::post, Json, Router};
use esrb_lib::{GameInfo, PredictionResult};
use std::sync::Arc;

/// Serves `POST /GameRating` with the same contract as the minimal endpoint
pub struct GameRatingController;

impl GameRatingController {
    pub const ROUTE: &'static str = "/GameRating";

    pub fn routes() -> Router<Arc<AppState>> {
        Router::new().route(Self::ROUTE, post(Self::post))
    }

    async fn post(
        State(state): State<Arc<AppState>>,
        Json(game): Json<GameInfo>,
    ) -> Result<Json<PredictionResult>, ApiError> {
        predict_game(&state, &game).await.map(Json)
    }
}
