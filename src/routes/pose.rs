use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;

use crate::extractors::JsonBody;
use crate::pose::landmarks::LandmarkSet;
use crate::pose::position::check_position;
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::validation::validate_landmarks;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/classify", post(classify))
        .route("/position", post(position))
}

#[derive(Debug, Deserialize)]
struct LandmarksRequest {
    landmarks: LandmarkSet,
}

/// 单帧判定，不计数
async fn classify(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LandmarksRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_landmarks(&req.landmarks).map_err(AppError::validation)?;
    Ok(ok(state.classifier().classify(&req.landmarks)))
}

async fn position(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LandmarksRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_landmarks(&req.landmarks).map_err(AppError::validation)?;
    let thresholds = state.classifier().thresholds();
    Ok(ok(check_position(
        &req.landmarks,
        &thresholds.position,
        thresholds.visibility,
    )))
}
