//! 模型数据文档
//!
//! 词表、意图与各层权重的可序列化形式。除通用的 `layers` 列表外，
//! 也接受早期固定三层格式的 `weights_h1` / `bias_h1` / `weights_h2` /
//! `bias_h2` / `weights_out` / `bias_out` 字段。

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::intent::{Intent, IntentSet};
use crate::models::network::{Activation, Layer};
use crate::models::vocabulary::Vocabulary;

/// 随包附带的默认模型数据（只有词表与意图，不含权重）
const BUILTIN_MODEL_DATA: &str = include_str!("../../data/model_data.json");

/// 单层的序列化形式，`weights` 为 输入 × 输出 矩阵
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerDocument {
    pub weights: Vec<Vec<f64>>,
    pub biases: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation: Option<Activation>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelDocument {
    pub vocabulary: Vec<String>,
    pub intents: Vec<Intent>,
    /// 输出下标到意图标签的映射；为空时使用意图声明顺序
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub layers: Vec<LayerDocument>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub weights_h1: Vec<Vec<f64>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bias_h1: Vec<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub weights_h2: Vec<Vec<f64>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bias_h2: Vec<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub weights_out: Vec<Vec<f64>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bias_out: Vec<f64>,
}

impl ModelDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_MODEL_DATA)
    }

    pub fn vocabulary(&self) -> Result<Vocabulary> {
        Vocabulary::new(self.vocabulary.clone())
    }

    pub fn intent_set(&self) -> Result<IntentSet> {
        if self.tags.is_empty() {
            IntentSet::new(self.intents.clone())
        } else {
            IntentSet::ordered_by(self.intents.clone(), &self.tags)
        }
    }

    /// 文档中没有任何权重时视为结构上为空，需要随机初始化
    pub fn has_weights(&self) -> bool {
        !self.layers.is_empty() || !self.weights_h1.is_empty()
    }

    /// 将文档中的权重转换为层
    ///
    /// 未声明激活函数时，最后一层使用 `exp`，其余使用 `relu`。
    pub fn to_layers(&self) -> Result<Vec<Layer>> {
        let documents = if !self.layers.is_empty() {
            self.layers.clone()
        } else if !self.weights_h1.is_empty() {
            vec![
                LayerDocument {
                    weights: self.weights_h1.clone(),
                    biases: self.bias_h1.clone(),
                    activation: Some(Activation::Relu),
                },
                LayerDocument {
                    weights: self.weights_h2.clone(),
                    biases: self.bias_h2.clone(),
                    activation: Some(Activation::Relu),
                },
                LayerDocument {
                    weights: self.weights_out.clone(),
                    biases: self.bias_out.clone(),
                    activation: Some(Activation::Exp),
                },
            ]
        } else {
            Vec::new()
        };

        let last = documents.len().saturating_sub(1);
        documents
            .into_iter()
            .enumerate()
            .map(|(index, doc)| {
                let activation = doc.activation.unwrap_or(if index == last {
                    Activation::Exp
                } else {
                    Activation::Relu
                });
                Layer::from_rows(doc.weights, doc.biases, activation)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_document_is_well_formed() {
        let doc = ModelDocument::builtin().unwrap();
        assert!(!doc.has_weights());
        let vocab = doc.vocabulary().unwrap();
        let intents = doc.intent_set().unwrap();
        assert!(!vocab.is_empty());
        assert_eq!(intents.len(), 5);
    }

    #[test]
    fn test_layers_with_default_activations() {
        let doc = ModelDocument::from_json(
            r#"{
                "vocabulary": ["hi", "bye"],
                "intents": [{"tag": "greeting", "responses": ["Hello"]}],
                "layers": [
                    {"weights": [[0.1, 0.2], [0.3, 0.4]], "biases": [0.0, 0.0]},
                    {"weights": [[1.0], [1.0]], "biases": [0.5]}
                ]
            }"#,
        )
        .unwrap();

        let layers = doc.to_layers().unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].activation(), Activation::Relu);
        assert_eq!(layers[1].activation(), Activation::Exp);
        assert_eq!(layers[1].input_size(), 2);
        assert_eq!(layers[1].output_size(), 1);
    }

    #[test]
    fn test_legacy_three_layer_keys() {
        let doc = ModelDocument::from_json(
            r#"{
                "vocabulary": ["hi"],
                "tags": ["greeting"],
                "intents": [{"tag": "greeting", "responses": ["Hello"]}],
                "weights_h1": [[0.5, 0.5]],
                "bias_h1": [0.0, 0.0],
                "weights_h2": [[1.0], [1.0]],
                "bias_h2": [0.0],
                "weights_out": [[2.0]],
                "bias_out": [0.0]
            }"#,
        )
        .unwrap();

        assert!(doc.has_weights());
        let layers = doc.to_layers().unwrap();
        assert_eq!(layers.len(), 3);
        assert_eq!(layers[2].activation(), Activation::Exp);
    }

    #[test]
    fn test_empty_legacy_weights_are_structurally_empty() {
        let doc = ModelDocument::from_json(
            r#"{"vocabulary": ["hi"], "intents": [], "weights_h1": [], "bias_h1": []}"#,
        )
        .unwrap();
        assert!(!doc.has_weights());
        assert!(doc.to_layers().unwrap().is_empty());
    }
}
