//! 意图（类别）模型

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// 意图：标签与候选回复
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub tag: String,
    pub responses: Vec<String>,
}

impl Intent {
    pub fn new(tag: impl Into<String>, responses: Vec<String>) -> Result<Self> {
        let tag = tag.into();
        if responses.is_empty() {
            return Err(AppError::Config(format!(
                "intent '{}' has no responses",
                tag
            )));
        }
        Ok(Self { tag, responses })
    }

    /// 从候选回复中均匀随机选取一条
    pub fn pick_response<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        // responses is non-empty by construction
        self.responses
            .choose(rng)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// 按输出顺序排列的意图集合，下标与网络输出一一对应
#[derive(Debug, Clone, Default)]
pub struct IntentSet {
    intents: Vec<Intent>,
}

impl IntentSet {
    pub fn new(intents: Vec<Intent>) -> Result<Self> {
        for intent in &intents {
            if intent.responses.is_empty() {
                return Err(AppError::Config(format!(
                    "intent '{}' has no responses",
                    intent.tag
                )));
            }
        }
        Ok(Self { intents })
    }

    /// 按 `tags` 指定的顺序重新排列意图
    pub fn ordered_by(intents: Vec<Intent>, tags: &[String]) -> Result<Self> {
        let ordered = tags
            .iter()
            .map(|tag| {
                intents
                    .iter()
                    .find(|intent| &intent.tag == tag)
                    .cloned()
                    .ok_or_else(|| {
                        AppError::Config(format!("tag '{}' has no matching intent", tag))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(ordered)
    }

    pub fn get(&self, index: usize) -> Option<&Intent> {
        self.intents.get(index)
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }
}
