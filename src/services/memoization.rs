//! 记忆存储服务
//!
//! 规范化查询到答案的精确匹配缓存。可选容量上限，超出时按插入顺序
//! （FIFO）淘汰最早的条目，与访问频率无关。
//!
//! 内存索引与持久化后端保持严格一致：写操作先在索引副本上完成，
//! 后端确认落盘后才替换当前索引；落盘失败时索引保持不变。

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::models::memory::{MemoryEntry, MemoryRecord, normalize_query};
use crate::storage::repository::MemoryRepository;

#[derive(Debug, Clone, Default)]
struct MemoryIndex {
    by_query: HashMap<String, u64>,
    entries: BTreeMap<u64, MemoryEntry>,
    next_sequence: u64,
}

impl MemoryIndex {
    fn get(&self, key: &str) -> Option<&MemoryEntry> {
        self.by_query
            .get(key)
            .and_then(|sequence| self.entries.get(sequence))
    }

    /// 插入或覆盖，条目移动到插入顺序末尾；返回因容量被淘汰的条目
    fn insert(&mut self, key: String, answer: String, capacity: Option<usize>) -> Vec<MemoryEntry> {
        if let Some(previous) = self.by_query.remove(&key) {
            self.entries.remove(&previous);
        }

        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.by_query.insert(key.clone(), sequence);
        self.entries.insert(
            sequence,
            MemoryEntry {
                query: key,
                answer,
                sequence,
            },
        );

        self.enforce(capacity)
    }

    fn enforce(&mut self, capacity: Option<usize>) -> Vec<MemoryEntry> {
        let mut evicted = Vec::new();
        if let Some(capacity) = capacity {
            while self.entries.len() > capacity {
                match self.entries.pop_first() {
                    Some((_, oldest)) => {
                        self.by_query.remove(&oldest.query);
                        evicted.push(oldest);
                    }
                    None => break,
                }
            }
        }
        evicted
    }

    fn records(&self) -> Vec<MemoryRecord> {
        self.entries.values().map(MemoryEntry::to_record).collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// 记忆存储
pub struct MemoizationStore {
    repository: Arc<dyn MemoryRepository>,
    capacity: Option<usize>,
    index: RwLock<MemoryIndex>,
}

impl std::fmt::Debug for MemoizationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoizationStore")
            .field("repository", &"Arc<dyn MemoryRepository>")
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl MemoizationStore {
    /// 从后端加载已有记录
    ///
    /// 重复的规范化查询以后出现者为准；加载后超出容量的旧条目被淘汰并立即落盘。
    pub async fn open(
        repository: Arc<dyn MemoryRepository>,
        capacity: Option<usize>,
    ) -> Result<Self> {
        let records = repository.load().await?;
        let loaded = records.len();

        let mut index = MemoryIndex::default();
        let mut evicted = 0;
        for record in records {
            evicted += index
                .insert(normalize_query(&record.query), record.answer, capacity)
                .len();
        }

        if evicted > 0 || index.len() != loaded {
            repository.save(&index.records()).await?;
        }

        info!(entries = index.len(), capacity = ?capacity, evicted, "Memory store opened");

        Ok(Self {
            repository,
            capacity,
            index: RwLock::new(index),
        })
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// 大小写不敏感的精确匹配
    pub async fn lookup(&self, query: &str) -> Option<String> {
        let key = normalize_query(query);
        let index = self.index.read().await;
        index.get(&key).map(|entry| entry.answer.clone())
    }

    /// 写入记录并同步落盘
    ///
    /// 返回 `Ok` 时记录已经持久化；落盘失败时内存索引不变。
    pub async fn record(&self, query: &str, answer: &str) -> Result<()> {
        let key = normalize_query(query);
        let mut index = self.index.write().await;

        let mut next = index.clone();
        let evicted = next.insert(key.clone(), answer.to_string(), self.capacity);

        if let Err(e) = self.repository.save(&next.records()).await {
            warn!(query = %key, error = %e, "Failed to persist memory entry");
            return Err(e);
        }

        for entry in &evicted {
            debug!(query = %entry.query, "Evicted oldest memory entry");
        }
        debug!(query = %key, entries = next.len(), "Memory entry recorded");

        *index = next;
        Ok(())
    }

    /// 清空存储，返回被删除的条目数
    pub async fn clear(&self) -> Result<usize> {
        let mut index = self.index.write().await;
        self.repository.save(&[]).await?;

        let removed = index.len();
        *index = MemoryIndex {
            next_sequence: index.next_sequence,
            ..MemoryIndex::default()
        };
        info!(removed, "Memory store cleared");
        Ok(removed)
    }

    /// 按插入顺序返回全部记录
    pub async fn snapshot(&self) -> Vec<MemoryRecord> {
        self.index.read().await.records()
    }

    pub async fn len(&self) -> usize {
        self.index.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
