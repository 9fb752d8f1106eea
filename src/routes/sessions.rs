use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::extractors::{JsonBody, QueryParams};
use crate::pose::form::FormErrorKind;
use crate::response::{created, ok, AppError};
use crate::services::summaries;
use crate::state::AppState;
use crate::store::operations::session_records::SessionRecord;
use crate::validation::{validate_rep_counts, validate_time_range, validate_user_id};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_session_by_query).post(create_session))
        .route("/:id", get(get_session))
        .route("/:id/summary", get(get_session_summary))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest {
    total_reps: u32,
    correct_reps: u32,
    incorrect_reps: u32,
    duration: u64,
    errors: Vec<FormErrorKind>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    user_id: Option<String>,
}

async fn create_session(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();
    let started_at = req.started_at.unwrap_or(now);
    validate_time_range(started_at, req.ended_at).map_err(AppError::validation)?;
    validate_rep_counts(req.total_reps, req.correct_reps, req.incorrect_reps)
        .map_err(AppError::validation)?;

    let user_id = req.user_id.filter(|u| !u.is_empty());
    if let Some(user_id) = user_id.as_deref() {
        validate_user_id(user_id).map_err(AppError::validation)?;
    }

    let record = SessionRecord {
        id: uuid::Uuid::new_v4().to_string(),
        user_id,
        total_reps: req.total_reps,
        correct_reps: req.correct_reps,
        incorrect_reps: req.incorrect_reps,
        duration: req.duration,
        errors: req.errors,
        started_at,
        ended_at: req.ended_at,
        created_at: now,
    };
    state.store().create_session_record(&record)?;

    tracing::info!(session_id = %record.id, total_reps = record.total_reps, "Session created");
    Ok(created(record))
}

#[derive(Debug, Deserialize)]
struct SessionIdQuery {
    id: Option<String>,
}

async fn get_session_by_query(
    State(state): State<AppState>,
    QueryParams(q): QueryParams<SessionIdQuery>,
) -> Result<impl IntoResponse, AppError> {
    let id = q
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::bad_request("MISSING_SESSION_ID", "Session ID is required"))?;
    Ok(ok(load_record(&state, &id)?))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(load_record(&state, &id)?))
}

async fn get_session_summary(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = load_record(&state, &id)?;
    let summary = summaries::summarize_record(state.store(), &record)?;
    Ok(ok(summary))
}

fn load_record(state: &AppState, id: &str) -> Result<SessionRecord, AppError> {
    // 非法 id 不可能存在于库中，直接按未找到处理
    match state.store().get_session_record(id) {
        Ok(Some(record)) => Ok(record),
        Ok(None) | Err(crate::store::StoreError::Validation(_)) => {
            Err(AppError::not_found("Session not found"))
        }
        Err(e) => Err(e.into()),
    }
}
