use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::extractors::JsonBody;
use crate::pose::landmarks::LandmarkSet;
use crate::pose::rep_counter::RepCounts;
use crate::pose::tracker::FrameOutcome;
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::validation::{validate_batch_size, validate_landmarks, validate_user_id};
use crate::workouts::WorkoutError;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(start_workout))
        .route("/:id", get(get_workout))
        .route("/:id/frames", post(process_frame))
        .route("/:id/frames/batch", post(process_frames_batch))
        .route("/:id/end", post(end_workout))
}

impl From<WorkoutError> for AppError {
    fn from(value: WorkoutError) -> Self {
        match value {
            WorkoutError::Capacity { limit } => AppError::conflict(
                "TOO_MANY_WORKOUTS",
                &format!("Too many active workouts (limit {limit})"),
            ),
            WorkoutError::NotFound(_) => AppError::not_found("Workout not found"),
            WorkoutError::Store(e) => e.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartWorkoutRequest {
    user_id: Option<String>,
}

async fn start_workout(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<StartWorkoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = req.user_id.filter(|u| !u.is_empty());
    if let Some(user_id) = user_id.as_deref() {
        validate_user_id(user_id).map_err(AppError::validation)?;
    }
    let view = state.workouts().start(user_id, Utc::now()).await?;
    Ok(created(view))
}

async fn get_workout(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let workout = state.workouts().get(&id).await?;
    let view = workout.lock().await.view();
    Ok(ok(view))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrameRequest {
    landmarks: LandmarkSet,
    timestamp_ms: u64,
}

async fn process_frame(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<FrameRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_landmarks(&req.landmarks).map_err(AppError::validation)?;
    let workout = state.workouts().get(&id).await?;
    let outcome = workout
        .lock()
        .await
        .process(&req.landmarks, req.timestamp_ms, Utc::now());
    Ok(ok(outcome))
}

#[derive(Debug, Deserialize)]
struct BatchRequest {
    frames: Vec<FrameRequest>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchResponse {
    outcomes: Vec<FrameOutcome>,
    counts: RepCounts,
}

/// 按给定顺序处理，整批持有同一把锁
async fn process_frames_batch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<BatchRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_batch_size(req.frames.len()).map_err(AppError::validation)?;
    for frame in &req.frames {
        validate_landmarks(&frame.landmarks).map_err(AppError::validation)?;
    }

    let workout = state.workouts().get(&id).await?;
    let mut workout = workout.lock().await;
    let now = Utc::now();
    let outcomes: Vec<FrameOutcome> = req
        .frames
        .iter()
        .map(|frame| workout.process(&frame.landmarks, frame.timestamp_ms, now))
        .collect();
    let counts = outcomes
        .last()
        .map(|o| o.reps.counts)
        .unwrap_or_default();

    Ok(ok(BatchResponse { outcomes, counts }))
}

async fn end_workout(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let finished = state
        .workouts()
        .finish(state.store(), &id, Utc::now())
        .await?;
    Ok(ok(finished))
}
