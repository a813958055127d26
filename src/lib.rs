//! Synapse - 推理与记忆混合问答服务
//!
//! 词袋编码的前馈网络负责意图分类，置信度不足时转向外部检索；
//! 每个新查询的答案都写入可持久化的记忆，重复提问直接命中记忆。

pub mod api;
pub mod config;
pub mod error;
pub mod inference;
pub mod models;
pub mod observability;
pub mod security;
pub mod services;
pub mod storage;
