//! 记忆数据模型
//!
//! 查询到答案的精确匹配记录。

use serde::{Deserialize, Serialize};

/// 将原始查询规范化为记忆键：大小写不敏感的精确匹配，不做分词
pub fn normalize_query(query: &str) -> String {
    query.to_lowercase()
}

/// 持久化记录
///
/// 早期版本的记忆文件使用 `question` 字段，读取时同样接受。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    #[serde(alias = "question")]
    pub query: String,
    pub answer: String,
}

impl MemoryRecord {
    pub fn new(query: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            answer: answer.into(),
        }
    }
}

/// 内存中的记忆条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryEntry {
    /// 规范化后的查询
    pub query: String,
    pub answer: String,
    /// 插入序号，单调递增，决定淘汰顺序
    pub sequence: u64,
}

impl MemoryEntry {
    pub fn to_record(&self) -> MemoryRecord {
        MemoryRecord::new(self.query.clone(), self.answer.clone())
    }
}
