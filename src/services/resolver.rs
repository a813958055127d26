//! 查询解析编排
//!
//! 每个请求的流程：
//!
//! ```text
//! RECEIVED → CACHE_LOOKUP ─┬─ hit  ─────────────────────────────────────→ RESPONDED
//!                          └─ miss → ENCODE → EVALUATE → DECIDE ─┬─ accepted ──────┐
//!                                                                └─ rejected → EXTERNAL
//!                                                                                  ↓
//!                                                                   RECORD → RESPONDED
//! ```
//!
//! 同一规范化查询同时只允许一个解析在进行，其余请求等待它完成后直接
//! 命中记忆。前向推理在阻塞线程池中执行，并受信号量限制并发数量。

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard, Semaphore};
use tracing::{debug, info, warn};

use crate::config::config::AppConfig;
use crate::error::{AppError, Result};
use crate::inference::{Decision, IntentClassifier};
use crate::models::memory::normalize_query;
use crate::observability::AppMetrics;
use crate::services::external::ExternalResolver;
use crate::services::memoization::MemoizationStore;

/// 答案来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerSource {
    /// 命中记忆
    Memory,
    /// 分类器以足够置信度给出
    Model,
    /// 外部检索
    External,
    /// 固定兜底回复
    Fallback,
}

/// 一次解析的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub answer: String,
    pub source: AnswerSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Resolution {
    fn new(answer: String, source: AnswerSource) -> Self {
        Self {
            answer,
            source,
            intent: None,
            confidence: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// 没有外部检索时的回复
    pub fallback_message: String,
    /// 外部检索没有结果时的回复
    pub not_found_message: String,
    pub max_concurrent_inferences: usize,
}

impl ResolverOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            fallback_message: config.model.fallback_message.clone(),
            not_found_message: config.search.not_found_message.clone(),
            max_concurrent_inferences: config.model.max_concurrent_inferences.max(1),
        }
    }
}

type FlightSlots = DashMap<String, Arc<Mutex<()>>>;

/// 单次飞行许可，释放时清理无人等待的槽位
struct FlightPermit {
    key: String,
    slots: Arc<FlightSlots>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for FlightPermit {
    fn drop(&mut self) {
        self.guard.take();
        self.slots
            .remove_if(&self.key, |_, slot| Arc::strong_count(slot) == 1);
    }
}

pub struct Resolver {
    classifier: Arc<IntentClassifier>,
    memory: Arc<MemoizationStore>,
    external: Option<Arc<dyn ExternalResolver>>,
    metrics: Arc<AppMetrics>,
    options: ResolverOptions,
    inference_permits: Arc<Semaphore>,
    inflight: Arc<FlightSlots>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("classifier", &"Arc<IntentClassifier>")
            .field("memory", &self.memory)
            .field("external", &self.external.is_some())
            .field("options", &self.options)
            .finish()
    }
}

impl Resolver {
    pub fn new(
        classifier: Arc<IntentClassifier>,
        memory: Arc<MemoizationStore>,
        external: Option<Arc<dyn ExternalResolver>>,
        metrics: Arc<AppMetrics>,
        options: ResolverOptions,
    ) -> Self {
        let inference_permits = Arc::new(Semaphore::new(options.max_concurrent_inferences.max(1)));
        Self {
            classifier,
            memory,
            external,
            metrics,
            options,
            inference_permits,
            inflight: Arc::new(DashMap::new()),
        }
    }

    pub fn memory(&self) -> &Arc<MemoizationStore> {
        &self.memory
    }

    /// 解析查询
    ///
    /// 未命中记忆的请求恰好写入一次记忆；落盘失败时返回
    /// [`AppError::Persistence`]，其中仍携带计算出的答案。
    pub async fn resolve(&self, query: &str) -> Result<Resolution> {
        if query.trim().is_empty() {
            return Err(AppError::Validation("Query cannot be empty".to_string()));
        }
        self.metrics.record_query();

        if let Some(answer) = self.memory.lookup(query).await {
            self.metrics.record_cache_lookup(true);
            debug!(query = %query, "Memory hit");
            return Ok(Resolution::new(answer, AnswerSource::Memory));
        }

        let _permit = self.begin_flight(query).await;

        // another request for the same query may have finished while we waited
        if let Some(answer) = self.memory.lookup(query).await {
            self.metrics.record_cache_lookup(true);
            debug!(query = %query, "Memory hit after waiting for in-flight resolution");
            return Ok(Resolution::new(answer, AnswerSource::Memory));
        }
        self.metrics.record_cache_lookup(false);

        let decision = self.infer(query).await?;
        self.metrics.record_decision(decision.is_accepted());

        let resolution = match self.accepted_response(&decision) {
            Some(resolution) => resolution,
            None => self.fall_back(query).await,
        };

        self.record(query, &resolution.answer).await?;

        info!(
            query = %query,
            source = ?resolution.source,
            confidence = decision.confidence,
            "Query resolved"
        );
        Ok(resolution)
    }

    async fn begin_flight(&self, query: &str) -> FlightPermit {
        let key = normalize_query(query);
        let slot = self.inflight.entry(key.clone()).or_default().clone();
        let guard = slot.lock_owned().await;
        FlightPermit {
            key,
            slots: self.inflight.clone(),
            guard: Some(guard),
        }
    }

    async fn infer(&self, query: &str) -> Result<Decision> {
        let _permit = self
            .inference_permits
            .acquire()
            .await
            .map_err(|e| AppError::Internal(format!("inference pool closed: {}", e)))?;

        let classifier = self.classifier.clone();
        let text = query.to_string();
        let started = Instant::now();
        let decision = tokio::task::spawn_blocking(move || classifier.classify(&text)).await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        self.metrics.record_inference(elapsed_ms);
        debug!(elapsed_ms, confidence = decision.confidence, "Forward pass finished");
        Ok(decision)
    }

    fn accepted_response(&self, decision: &Decision) -> Option<Resolution> {
        let intent = self.classifier.intent(decision)?;
        let answer = {
            let mut rng = rand::thread_rng();
            intent.pick_response(&mut rng).to_string()
        };
        Some(Resolution {
            answer,
            source: AnswerSource::Model,
            intent: Some(intent.tag.clone()),
            confidence: Some(decision.confidence),
        })
    }

    async fn fall_back(&self, query: &str) -> Resolution {
        let Some(external) = &self.external else {
            return Resolution::new(
                self.options.fallback_message.clone(),
                AnswerSource::Fallback,
            );
        };

        match external.search(query).await {
            Ok(Some(answer)) => {
                self.metrics.record_external_call(false);
                Resolution::new(answer, AnswerSource::External)
            }
            Ok(None) => {
                self.metrics.record_external_call(false);
                debug!(query = %query, "External resolver had no answer");
                Resolution::new(
                    self.options.not_found_message.clone(),
                    AnswerSource::Fallback,
                )
            }
            Err(e) => {
                self.metrics.record_external_call(true);
                warn!(query = %query, error = %e, "External resolver failed");
                Resolution::new(
                    self.options.not_found_message.clone(),
                    AnswerSource::Fallback,
                )
            }
        }
    }

    /// 在独立任务中写入，请求被取消也不会让内存索引与磁盘分叉
    async fn record(&self, query: &str, answer: &str) -> Result<()> {
        let memory = self.memory.clone();
        let query = query.to_string();
        let stored = answer.to_string();
        let outcome = tokio::spawn(async move { memory.record(&query, &stored).await }).await?;

        outcome.map_err(|e| {
            self.metrics.record_persistence_error();
            e.with_answer(answer)
        })
    }
}
