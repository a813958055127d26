//! 可观测性模块
//!
//! 提供 Prometheus 指标、结构化日志、周期状态汇报和健康检查。

pub mod logging;

pub use logging::{init_tracing, spawn_status_reporter};

use axum::{Json, Router, extract::State, response::IntoResponse, routing::get};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;

// ===== Simple Metrics (atomics, rendered in Prometheus text format) =====

/// 简单应用指标
#[derive(Debug, Default)]
pub struct AppMetrics {
    pub http_requests_total: AtomicU64,
    pub http_request_duration_sum: AtomicU64,
    pub queries_total: AtomicU64,
    pub cache_hits_total: AtomicU64,
    pub cache_misses_total: AtomicU64,
    pub model_accepted_total: AtomicU64,
    pub model_rejected_total: AtomicU64,
    pub inference_total: AtomicU64,
    pub inference_duration_sum: AtomicU64,
    pub external_calls_total: AtomicU64,
    pub external_failures_total: AtomicU64,
    pub persistence_errors_total: AtomicU64,
    pub errors_total: AtomicU64,
}

/// 指标快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub model_accepted: u64,
    pub model_rejected: u64,
    pub external_calls: u64,
    pub external_failures: u64,
    pub persistence_errors: u64,
}

impl AppMetrics {
    /// 记录 HTTP 请求
    pub fn record_http_request(&self, duration_ms: u64) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);
        self.http_request_duration_sum
            .fetch_add(duration_ms, Ordering::Relaxed);
    }

    pub fn record_query(&self) {
        self.queries_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_lookup(&self, hit: bool) {
        if hit {
            self.cache_hits_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_misses_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_decision(&self, accepted: bool) {
        if accepted {
            self.model_accepted_total.fetch_add(1, Ordering::Relaxed);
        } else {
            self.model_rejected_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// 记录一次前向推理
    pub fn record_inference(&self, duration_ms: u64) {
        self.inference_total.fetch_add(1, Ordering::Relaxed);
        self.inference_duration_sum
            .fetch_add(duration_ms, Ordering::Relaxed);
    }

    pub fn record_external_call(&self, failed: bool) {
        self.external_calls_total.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.external_failures_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_persistence_error(&self) {
        self.persistence_errors_total.fetch_add(1, Ordering::Relaxed);
        self.record_error();
    }

    /// 记录错误
    pub fn record_error(&self) {
        self.errors_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries: self.queries_total.load(Ordering::Relaxed),
            cache_hits: self.cache_hits_total.load(Ordering::Relaxed),
            cache_misses: self.cache_misses_total.load(Ordering::Relaxed),
            model_accepted: self.model_accepted_total.load(Ordering::Relaxed),
            model_rejected: self.model_rejected_total.load(Ordering::Relaxed),
            external_calls: self.external_calls_total.load(Ordering::Relaxed),
            external_failures: self.external_failures_total.load(Ordering::Relaxed),
            persistence_errors: self.persistence_errors_total.load(Ordering::Relaxed),
        }
    }

    /// 生成 Prometheus 格式指标
    pub fn gather(&self) -> String {
        let snapshot = self.snapshot();
        let inference_total = self.inference_total.load(Ordering::Relaxed);
        format!(
            r#"# HELP http_requests_total Total HTTP requests
# TYPE http_requests_total counter
http_requests_total {}
# HELP http_request_duration_seconds HTTP request duration in seconds
# TYPE http_request_duration_seconds summary
http_request_duration_seconds_sum {}
http_request_duration_seconds_count {}
# HELP queries_total Total resolved queries
# TYPE queries_total counter
queries_total {}
# HELP cache_hits_total Queries answered from memory
# TYPE cache_hits_total counter
cache_hits_total {}
# HELP cache_misses_total Queries not found in memory
# TYPE cache_misses_total counter
cache_misses_total {}
# HELP model_decisions_total Classifier decisions by outcome
# TYPE model_decisions_total counter
model_decisions_total{{outcome="accepted"}} {}
model_decisions_total{{outcome="rejected"}} {}
# HELP inference_duration_seconds Forward pass duration in seconds
# TYPE inference_duration_seconds summary
inference_duration_seconds_sum {}
inference_duration_seconds_count {}
# HELP external_calls_total External resolver calls
# TYPE external_calls_total counter
external_calls_total {}
# HELP external_failures_total Failed external resolver calls
# TYPE external_failures_total counter
external_failures_total {}
# HELP persistence_errors_total Failed memory flushes
# TYPE persistence_errors_total counter
persistence_errors_total {}
# HELP errors_total Total errors
# TYPE errors_total counter
errors_total {}
"#,
            self.http_requests_total.load(Ordering::Relaxed),
            self.http_request_duration_sum.load(Ordering::Relaxed) as f64 / 1000.0,
            self.http_requests_total.load(Ordering::Relaxed),
            snapshot.queries,
            snapshot.cache_hits,
            snapshot.cache_misses,
            snapshot.model_accepted,
            snapshot.model_rejected,
            self.inference_duration_sum.load(Ordering::Relaxed) as f64 / 1000.0,
            inference_total,
            snapshot.external_calls,
            snapshot.external_failures,
            snapshot.persistence_errors,
            self.errors_total.load(Ordering::Relaxed),
        )
    }
}

// ===== Health Check =====

/// 健康检查状态
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub uptime_seconds: f64,
    pub checks: Vec<HealthCheck>,
}

/// 单个健康检查项
#[derive(Debug, Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    pub message: Option<String>,
}

/// 健康检查结果
#[derive(Debug, Clone)]
pub struct HealthCheckResult {
    pub name: String,
    pub healthy: bool,
    pub message: String,
}

/// 可观测性状态
#[derive(Clone)]
pub struct ObservabilityState {
    pub metrics: Arc<AppMetrics>,
    pub health_checks: Arc<Mutex<Vec<HealthCheckResult>>>,
    pub start_time: DateTime<Utc>,
    pub version: String,
}

impl ObservabilityState {
    pub fn new(version: String, metrics: Arc<AppMetrics>) -> Self {
        Self {
            metrics,
            health_checks: Arc::new(Mutex::new(Vec::new())),
            start_time: Utc::now(),
            version,
        }
    }

    /// 添加健康检查结果，同名检查被覆盖
    pub async fn add_health_check(&self, result: HealthCheckResult) {
        let mut checks = self.health_checks.lock().await;
        checks.retain(|c| c.name != result.name);
        checks.push(result);
    }

    /// 获取应用正常运行时间
    pub fn uptime_seconds(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

// ===== Health Check Handlers =====

/// 获取完整健康状态
pub async fn health_check(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    let checks = state.health_checks.lock().await;
    let all_healthy = checks.iter().all(|c| c.healthy);

    let health_status = HealthStatus {
        status: if all_healthy {
            "healthy".to_string()
        } else {
            "unhealthy".to_string()
        },
        timestamp: Utc::now().to_rfc3339(),
        version: state.version.clone(),
        uptime_seconds: state.uptime_seconds(),
        checks: checks
            .iter()
            .map(|c| HealthCheck {
                name: c.name.clone(),
                status: if c.healthy {
                    "healthy".to_string()
                } else {
                    "unhealthy".to_string()
                },
                message: Some(c.message.clone()),
            })
            .collect(),
    };

    let status_code = if all_healthy {
        axum::http::StatusCode::OK
    } else {
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(health_status))
}

/// 简单存活检查
pub async fn liveness() -> impl IntoResponse {
    "OK"
}

/// Prometheus 指标端点
pub async fn metrics(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    (axum::http::StatusCode::OK, state.metrics.gather())
}

/// 版本信息端点
pub async fn version(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "version": state.version,
        "uptime_seconds": state.uptime_seconds(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// 创建可观测性路由
pub fn create_observability_router(state: Arc<ObservabilityState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
        .route("/metrics", get(metrics))
        .route("/version", get(version))
        .with_state(state)
}

// ===== Request Metrics Middleware =====

/// 记录请求指标的中间件
pub async fn metrics_middleware(
    State(metrics): State<Arc<AppMetrics>>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let start = std::time::Instant::now();
    let response = next.run(req).await;

    metrics.record_http_request(start.elapsed().as_millis() as u64);
    if response.status().is_server_error() {
        metrics.record_error();
    }

    response
}
