use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::extractors::QueryParams;
use crate::response::{paginated, AppError};
use crate::state::AppState;
use crate::validation::{normalize_pagination, validate_user_id};

pub fn router() -> Router<AppState> {
    Router::new().route("/:user_id/sessions", get(list_user_sessions))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListSessionsQuery {
    page: Option<u64>,
    per_page: Option<u64>,
}

async fn list_user_sessions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    QueryParams(q): QueryParams<ListSessionsQuery>,
) -> Result<impl IntoResponse, AppError> {
    validate_user_id(&user_id).map_err(AppError::validation)?;
    let (page, per_page) = normalize_pagination(q.page, q.per_page);
    let limit = per_page as usize;
    let offset = page.saturating_sub(1).saturating_mul(per_page) as usize;

    let records = state
        .store()
        .list_session_records_for_user(&user_id, limit, offset)?;
    let total = state.store().count_session_records_for_user(&user_id)?;
    Ok(paginated(records, total, page, per_page))
}
