//! 核心数据模型模块
//!
//! 定义 Synapse 的核心数据结构：词表、意图、稠密网络、模型文档与记忆条目。

pub mod intent;
pub mod memory;
pub mod model_document;
pub mod network;
pub mod vocabulary;

pub use intent::{Intent, IntentSet};
pub use memory::{MemoryEntry, MemoryRecord, normalize_query};
pub use model_document::{LayerDocument, ModelDocument};
pub use network::{Activation, Layer, Network};
pub use vocabulary::Vocabulary;
