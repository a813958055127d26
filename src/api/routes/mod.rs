//! Routes 模块
//!
//! 定义 API 路由。

pub mod ask_routes;
pub mod memory_routes;
