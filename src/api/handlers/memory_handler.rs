//! Memory API Handlers
//!
//! Inspection and reset of the memo store.

use axum::{Json, extract::State, response::IntoResponse};
use tracing::{debug, info};

use crate::{
    api::{app_state::AppState, dto::memory_dto::*},
    error::AppError,
};

/// List memo entries in insertion order
///
/// GET /memory
pub async fn list_memory(State(state): State<AppState>) -> impl IntoResponse {
    let entries = state.memory.snapshot().await;
    debug!("Listing {} memory entries", entries.len());
    Json(MemoryListResponse::new(entries, state.memory.capacity()))
}

/// Remove every memo entry
///
/// DELETE /memory
pub async fn clear_memory(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let removed = state.memory.clear().await.inspect_err(|_| {
        state.metrics.record_persistence_error();
    })?;
    info!("Memory cleared via API, {} entries removed", removed);

    Ok(Json(ClearMemoryResponse {
        cleared: true,
        removed,
    }))
}
