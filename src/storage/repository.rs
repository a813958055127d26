use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::memory::MemoryRecord;

/// 记忆持久化仓储 trait
///
/// 保存的是完整的有序集合；`save` 返回即表示数据已经落盘。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MemoryRepository: Send + Sync {
    /// 读取全部记录，后端不存在或为空时返回空集合
    async fn load(&self) -> Result<Vec<MemoryRecord>>;

    /// 以 `records` 整体替换已持久化的内容
    async fn save(&self, records: &[MemoryRecord]) -> Result<()>;
}

/// 仅存在于内存中的仓储，用于测试和临时实例
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    records: Mutex<Vec<MemoryRecord>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<MemoryRecord>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    /// 当前已保存的内容
    pub async fn saved(&self) -> Vec<MemoryRecord> {
        self.records.lock().await.clone()
    }
}

#[async_trait]
impl MemoryRepository for InMemoryRepository {
    async fn load(&self) -> Result<Vec<MemoryRecord>> {
        Ok(self.records.lock().await.clone())
    }

    async fn save(&self, records: &[MemoryRecord]) -> Result<()> {
        *self.records.lock().await = records.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_round_trip() {
        let repository = InMemoryRepository::new();
        assert!(repository.load().await.unwrap().is_empty());

        let records = vec![MemoryRecord::new("a", "1"), MemoryRecord::new("b", "2")];
        repository.save(&records).await.unwrap();
        assert_eq!(repository.load().await.unwrap(), records);

        repository.save(&[]).await.unwrap();
        assert!(repository.saved().await.is_empty());
    }
}
