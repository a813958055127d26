//! 问答 DTO

use serde::{Deserialize, Serialize};

use crate::services::resolver::{AnswerSource, Resolution};

/// 问答请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskRequest {
    /// 查询文本，兼容旧字段名 `question`
    #[serde(default, alias = "question")]
    pub query: String,
}

/// 问答响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,

    /// 答案来源
    pub source: AnswerSource,

    /// 分类器接受时的意图标签
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl From<Resolution> for AskResponse {
    fn from(resolution: Resolution) -> Self {
        Self {
            answer: resolution.answer,
            source: resolution.source,
            intent: resolution.intent,
            confidence: resolution.confidence,
        }
    }
}
