//! 词表

use std::collections::HashMap;

use crate::error::{AppError, Result};

/// 有序且唯一的词表，词的位置即其在向量中的下标
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    tokens: Vec<String>,
    positions: HashMap<String, usize>,
}

impl Vocabulary {
    pub fn new(tokens: Vec<String>) -> Result<Self> {
        let mut positions = HashMap::with_capacity(tokens.len());
        for (index, token) in tokens.iter().enumerate() {
            if positions.insert(token.clone(), index).is_some() {
                return Err(AppError::Config(format!(
                    "duplicate vocabulary token '{}' at position {}",
                    token, index
                )));
            }
        }

        Ok(Self { tokens, positions })
    }

    pub fn position(&self, token: &str) -> Option<usize> {
        self.positions.get(token).copied()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}
