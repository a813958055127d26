//! JSON 文件仓储
//!
//! 记录以有序 JSON 数组保存。写入先落到同目录的临时文件并 `fsync`，
//! 再原子地重命名覆盖目标文件，崩溃后不会留下半写的内容。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{AppError, Result};
use crate::models::memory::MemoryRecord;
use crate::storage::repository::MemoryRepository;

#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "memory.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl MemoryRepository for JsonFileRepository {
    async fn load(&self) -> Result<Vec<MemoryRecord>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "Memory file not found, starting empty");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(AppError::persistence(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<MemoryRecord> = serde_json::from_str(&content).map_err(|e| {
            AppError::persistence(format!("corrupt memory file {}: {}", self.path.display(), e))
        })?;
        info!(path = %self.path.display(), entries = records.len(), "Loaded memory file");
        Ok(records)
    }

    async fn save(&self, records: &[MemoryRecord]) -> Result<()> {
        let json = serde_json::to_vec_pretty(records)?;
        let temp_path = self.temp_path();

        let write = async {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            let mut file = tokio::fs::File::create(&temp_path).await?;
            file.write_all(&json).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&temp_path, &self.path).await
        };

        write.await.map_err(|e: std::io::Error| {
            AppError::persistence(format!("failed to write {}: {}", self.path.display(), e))
        })?;

        debug!(path = %self.path.display(), entries = records.len(), "Memory file flushed");
        Ok(())
    }
}
