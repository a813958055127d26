//! 推理模块
//!
//! 词袋编码 → 稠密前向传播 → 归一化与置信度判定。

pub mod encoder;
pub mod evaluator;
pub mod output;
pub mod weights;

pub use encoder::{VectorEncoder, tokenize};
pub use evaluator::ForwardEvaluator;
pub use output::{DEFAULT_THRESHOLD, Decision, OutputResolver};
pub use weights::{WeightOrigin, WeightStore, load_model_document};

use rand::Rng;
use tracing::debug;

use crate::config::config::ModelConfig;
use crate::error::{AppError, Result};
use crate::models::intent::{Intent, IntentSet};
use crate::models::model_document::ModelDocument;
use crate::models::network::Network;

/// 意图分类器
///
/// 构造后只读，可以在线程间共享而无需加锁。
#[derive(Debug)]
pub struct IntentClassifier {
    encoder: VectorEncoder,
    network: Network,
    intents: IntentSet,
    evaluator: ForwardEvaluator,
    output: OutputResolver,
}

impl IntentClassifier {
    pub fn new(
        encoder: VectorEncoder,
        network: Network,
        intents: IntentSet,
        threshold: f64,
    ) -> Result<Self> {
        if network.input_size() != encoder.dimension() {
            return Err(AppError::Config(format!(
                "network expects {} inputs but the vocabulary has {} tokens",
                network.input_size(),
                encoder.dimension()
            )));
        }

        if network.output_size() != intents.len() {
            return Err(AppError::Config(format!(
                "network produces {} outputs but {} intents are declared",
                network.output_size(),
                intents.len()
            )));
        }

        Ok(Self {
            encoder,
            network,
            intents,
            evaluator: ForwardEvaluator,
            output: OutputResolver::new(threshold),
        })
    }

    /// 由模型文档构造，文档没有权重时按 `config.hidden_sizes` 随机初始化
    pub fn from_document(document: &ModelDocument, config: &ModelConfig) -> Result<Self> {
        let vocabulary = document.vocabulary()?;
        let intents = document.intent_set()?;

        let mut sizes = Vec::with_capacity(config.hidden_sizes.len() + 2);
        sizes.push(vocabulary.len());
        sizes.extend_from_slice(&config.hidden_sizes);
        sizes.push(intents.len());

        let store = WeightStore::from_document(document, &sizes, config.seed)?;
        Self::new(
            VectorEncoder::new(vocabulary),
            store.into_network(),
            intents,
            config.threshold,
        )
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn threshold(&self) -> f64 {
        self.output.threshold()
    }

    /// 编码、前向传播并判定
    pub fn classify(&self, text: &str) -> Decision {
        let input = self.encoder.encode(text);
        let raw = self.evaluator.evaluate(&self.network, &input);
        let decision = self.output.resolve(&raw);
        debug!(
            category = ?decision.category.and_then(|i| self.intents.get(i)).map(|i| &i.tag),
            confidence = decision.confidence,
            "Classified query"
        );
        decision
    }

    pub fn intent(&self, decision: &Decision) -> Option<&Intent> {
        decision.category.and_then(|index| self.intents.get(index))
    }

    /// 被接受的类别随机选取一条回复
    pub fn respond<R: Rng + ?Sized>(&self, decision: &Decision, rng: &mut R) -> Option<String> {
        self.intent(decision)
            .map(|intent| intent.pick_response(rng).to_string())
    }
}
