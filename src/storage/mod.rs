//! 存储层模块
//!
//! 为记忆存储提供持久化后端：JSON 文件与内存实现。

pub mod json_file;
pub mod repository;

pub use json_file::JsonFileRepository;
pub use repository::{InMemoryRepository, MemoryRepository};
