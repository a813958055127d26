//! 结构化日志与周期状态汇报

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::config::LoggingConfig;
use crate::error::{AppError, Result};
use crate::observability::AppMetrics;

/// 初始化结构化日志
///
/// `RUST_LOG` 优先于配置中的级别。配置了 `log_dir` 时额外按天滚动写入
/// JSON 日志文件，返回的 guard 必须在进程退出前保持存活。
pub fn init_tracing(config: &LoggingConfig, service_name: &str) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "info,{}={},tower_http=info",
            service_name, config.level
        ))
    });

    let console = if config.structured {
        fmt::layer().json().with_target(true).boxed()
    } else {
        fmt::layer().with_target(true).with_line_number(true).boxed()
    };

    let (file_layer, guard) = match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, format!("{}.log", service_name));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .with(filter)
        .try_init()
        .map_err(|e| AppError::Internal(format!("failed to set tracing subscriber: {}", e)))?;

    Ok(guard)
}

/// 启动周期状态汇报任务
///
/// 只读取指标，不持有任何请求处理状态。间隔为 0 时不启动。
pub fn spawn_status_reporter(
    metrics: Arc<AppMetrics>,
    interval: Duration,
) -> Option<JoinHandle<()>> {
    if interval.is_zero() {
        return None;
    }

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let snapshot = metrics.snapshot();
            info!(
                queries = snapshot.queries,
                cache_hits = snapshot.cache_hits,
                cache_misses = snapshot.cache_misses,
                model_accepted = snapshot.model_accepted,
                model_rejected = snapshot.model_rejected,
                external_calls = snapshot.external_calls,
                external_failures = snapshot.external_failures,
                persistence_errors = snapshot.persistence_errors,
                "Status report"
            );
        }
    }))
}
