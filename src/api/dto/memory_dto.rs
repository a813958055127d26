//! 记忆 DTO
//!
//! API 请求和响应的数据传输对象

use serde::{Deserialize, Serialize};

use crate::models::memory::MemoryRecord;

/// 记忆列表响应，条目按插入顺序排列
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryListResponse {
    pub entries: Vec<MemoryRecord>,

    /// 条目总数
    pub total: usize,

    /// 容量上限，未配置时为空
    pub capacity: Option<usize>,
}

impl MemoryListResponse {
    pub fn new(entries: Vec<MemoryRecord>, capacity: Option<usize>) -> Self {
        Self {
            total: entries.len(),
            entries,
            capacity,
        }
    }
}

/// 清空记忆响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearMemoryResponse {
    pub cleared: bool,

    /// 被删除的条目数
    pub removed: usize,
}
