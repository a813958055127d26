//! Memory Routes
//!
//! 定义记忆相关的 API 路由。

use axum::{Router, routing::get};

use crate::api::app_state::AppState;
use crate::api::handlers::memory_handler::*;

/// 创建记忆路由器
pub fn create_memory_router() -> Router<AppState> {
    Router::new().route("/memory", get(list_memory).delete(clear_memory))
}
