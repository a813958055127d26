//! Ask API Handler

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    response::IntoResponse,
};
use tracing::debug;

use crate::{
    api::{app_state::AppState, dto::ask_dto::*},
    error::AppError,
};

/// Resolve a query
///
/// POST /ask
pub async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload?;
    let query = state.validator.validate_query(&request.query)?;
    debug!("Resolving query of {} chars", query.chars().count());

    let resolution = state.resolver.resolve(&query).await?;
    Ok(Json(AskResponse::from(resolution)))
}
