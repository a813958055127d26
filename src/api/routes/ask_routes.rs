//! Ask Routes

use axum::{Router, routing::post};

use crate::api::app_state::AppState;
use crate::api::handlers::ask_handler::*;

/// 创建问答路由器
pub fn create_ask_router() -> Router<AppState> {
    Router::new().route("/ask", post(ask))
}
