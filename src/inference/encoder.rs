//! 词袋编码

use regex::Regex;
use std::sync::OnceLock;

use crate::models::vocabulary::Vocabulary;

fn non_word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // word characters are ASCII letters, digits and underscore
    PATTERN.get_or_init(|| Regex::new(r"[^A-Za-z0-9_\s]").expect("static regex is valid"))
}

/// 将文本转换为小写、去标点后的词序列
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    non_word_pattern()
        .replace_all(&lowered, "")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// 基于固定词表的词袋编码器
#[derive(Debug, Clone)]
pub struct VectorEncoder {
    vocabulary: Vocabulary,
}

impl VectorEncoder {
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self { vocabulary }
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    /// 编码为长度为 `|vocabulary|` 的 0/1 向量
    ///
    /// 未知词被忽略，重复词不会累加。
    pub fn encode(&self, text: &str) -> Vec<f64> {
        let mut bag = vec![0.0; self.vocabulary.len()];
        if bag.is_empty() {
            return bag;
        }

        for token in tokenize(text) {
            if let Some(position) = self.vocabulary.position(&token) {
                bag[position] = 1.0;
            }
        }

        bag
    }
}
