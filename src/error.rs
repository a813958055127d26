//! 错误处理模块
//!
//! 定义应用程序的错误类型和错误处理逻辑。

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用程序错误类型
#[derive(Error, Debug)]
pub enum AppError {
    /// 配置错误（网络维度不一致、类别缺失等），启动阶段致命
    #[error("配置错误: {0}")]
    Config(String),

    /// 参数验证错误
    #[error("参数验证失败: {0}")]
    Validation(String),

    /// 持久化失败
    ///
    /// 计算出的答案仍随错误一起返回，调用方可以选择展示。
    #[error("持久化失败: {message}")]
    Persistence {
        message: String,
        answer: Option<String>,
    },

    /// 外部检索失败（仅在服务内部使用，不会直接暴露给调用方）
    #[error("外部检索失败: {0}")]
    External(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),

    /// 内部错误
    #[error("内部错误: {0}")]
    Internal(String),

    /// IO 错误
    #[error("IO 错误: {0}")]
    Io(String),
}

impl AppError {
    /// 为持久化错误附加已经计算出的答案
    pub fn with_answer(self, answer: &str) -> Self {
        match self {
            AppError::Persistence { message, .. } => AppError::Persistence {
                message,
                answer: Some(answer.to_string()),
            },
            other => other,
        }
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        AppError::Persistence {
            message: message.into(),
            answer: None,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Serialization(e.to_string())
    }
}

impl From<figment::Error> for AppError {
    fn from(e: figment::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::External(e.to_string())
    }
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("background task failed: {}", e))
    }
}

/// Axum response implementation for AppError
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = (&self).into();
        let mut body = ErrorResponse::new(&code, &self.to_string());
        if let AppError::Persistence {
            answer: Some(answer),
            ..
        } = &self
        {
            body = body.with_answer(answer);
        }
        (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Json(body),
        )
            .into_response()
    }
}

/// 错误响应
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// 错误消息
    pub error: String,
    /// 错误代码
    pub code: String,
    /// 持久化失败时仍然交付的答案
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

impl ErrorResponse {
    /// 创建新错误响应
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            error: message.to_string(),
            code: code.to_string(),
            answer: None,
        }
    }

    /// 附加答案
    pub fn with_answer(mut self, answer: &str) -> Self {
        self.answer = Some(answer.to_string());
        self
    }
}

/// HTTP 状态码映射
impl From<&AppError> for (u16, String) {
    fn from(err: &AppError) -> (u16, String) {
        match err {
            AppError::Validation(_) => (400, "BAD_REQUEST".to_string()),
            AppError::Persistence { .. } => (500, "PERSISTENCE_ERROR".to_string()),
            AppError::External(_) => (502, "EXTERNAL_ERROR".to_string()),
            AppError::Config(_) => (500, "CONFIG_ERROR".to_string()),
            _ => (500, "INTERNAL_ERROR".to_string()),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let (status, code) = (&AppError::Validation("empty".into())).into();
        assert_eq!(status, 400);
        assert_eq!(code, "BAD_REQUEST");

        let (status, code) = (&AppError::persistence("disk full")).into();
        assert_eq!(status, 500);
        assert_eq!(code, "PERSISTENCE_ERROR");
    }

    #[test]
    fn test_with_answer_only_touches_persistence() {
        let err = AppError::persistence("disk full").with_answer("Hi!");
        match err {
            AppError::Persistence { answer, .. } => assert_eq!(answer.as_deref(), Some("Hi!")),
            other => panic!("unexpected error: {:?}", other),
        }

        let err = AppError::Validation("empty".into()).with_answer("Hi!");
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_error_response_serialization() {
        let body = ErrorResponse::new("BAD_REQUEST", "Query cannot be empty");
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "Query cannot be empty");
        assert!(json.get("answer").is_none());
    }
}
