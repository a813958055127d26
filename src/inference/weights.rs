//! 权重存储
//!
//! 会话期间不可变。权重来自模型文档；文档缺失或没有权重时，按给定层
//! 大小做一次均匀分布 `[-0.5, 0.5)` 的随机初始化。传入种子即可复现。

use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::models::model_document::ModelDocument;
use crate::models::network::{Activation, Layer, Network};

/// 随机初始化的取值范围
pub const INIT_RANGE: f64 = 0.5;

/// 权重的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightOrigin {
    Loaded,
    RandomlyInitialized,
}

#[derive(Debug, Clone)]
pub struct WeightStore {
    network: Network,
    origin: WeightOrigin,
}

impl WeightStore {
    /// 从文档构造；文档没有权重时随机初始化 `sizes` 描述的各层
    ///
    /// `sizes` 为完整的层大小序列：输入、隐藏层……、输出。
    pub fn from_document(
        document: &ModelDocument,
        sizes: &[usize],
        seed: Option<u64>,
    ) -> Result<Self> {
        if document.has_weights() {
            let network = Network::new(document.to_layers()?)?;
            info!(
                layers = network.layers().len(),
                input = network.input_size(),
                output = network.output_size(),
                "Loaded network weights"
            );
            return Ok(Self {
                network,
                origin: WeightOrigin::Loaded,
            });
        }

        Self::random(sizes, seed)
    }

    /// 随机初始化：隐藏层使用 relu，最后一层使用 exp
    pub fn random(sizes: &[usize], seed: Option<u64>) -> Result<Self> {
        if sizes.len() < 2 {
            return Err(AppError::Config(
                "random initialization needs at least an input and an output size".into(),
            ));
        }

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let last = sizes.len() - 2;
        let layers = sizes
            .windows(2)
            .enumerate()
            .map(|(index, pair)| {
                let activation = if index == last {
                    Activation::Exp
                } else {
                    Activation::Relu
                };
                random_layer(&mut rng, pair[0], pair[1], activation)
            })
            .collect::<Result<Vec<_>>>()?;

        let network = Network::new(layers)?;
        info!(
            neurons = sizes.iter().sum::<usize>(),
            multiply_accumulates = network.multiply_accumulates(),
            seeded = seed.is_some(),
            "Randomly initialized network weights"
        );

        Ok(Self {
            network,
            origin: WeightOrigin::RandomlyInitialized,
        })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn into_network(self) -> Network {
        self.network
    }

    pub fn origin(&self) -> WeightOrigin {
        self.origin
    }
}

fn random_layer<R: Rng>(
    rng: &mut R,
    input_size: usize,
    output_size: usize,
    activation: Activation,
) -> Result<Layer> {
    let weights = (0..input_size * output_size)
        .map(|_| rng.gen_range(-INIT_RANGE..INIT_RANGE))
        .collect();
    let biases = (0..output_size)
        .map(|_| rng.gen_range(-INIT_RANGE..INIT_RANGE))
        .collect();
    Layer::new(input_size, weights, biases, activation)
}

/// 读取模型文档
///
/// 文件不存在或内容为空时使用内置文档。
pub async fn load_model_document(path: &Path) -> Result<ModelDocument> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) if content.trim().is_empty() => {
            warn!(path = %path.display(), "Model file is empty, using built-in model data");
            ModelDocument::builtin()
        }
        Ok(content) => {
            info!(path = %path.display(), "Loading model data");
            ModelDocument::from_json(&content)
                .map_err(|e| AppError::Config(format!("invalid model file: {}", e)))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Model file not found, using built-in model data");
            ModelDocument::builtin()
        }
        Err(e) => Err(e.into()),
    }
}
