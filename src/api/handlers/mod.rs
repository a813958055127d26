//! Handlers 模块
//!
//! HTTP 请求处理程序。

pub mod ask_handler;
pub mod memory_handler;

pub use ask_handler::*;
pub use memory_handler::*;
