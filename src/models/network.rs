//! 稠密网络模型
//!
//! 每一层的权重以行优先的连续数组存储：第 `i` 行对应第 `i` 个输入，
//! 第 `j` 列对应第 `j` 个输出单元。连接关系完全由下标隐含。

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// 激活函数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// `max(0, x)`，用于隐藏层
    Relu,
    /// `e^x`，用于输出层，得到未归一化的 softmax 分子
    Exp,
}

impl Activation {
    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Relu => x.max(0.0),
            Activation::Exp => x.exp(),
        }
    }
}

/// 单个稠密层
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    input_size: usize,
    output_size: usize,
    weights: Vec<f64>,
    biases: Vec<f64>,
    activation: Activation,
}

impl Layer {
    /// 由行优先的扁平权重构造
    pub fn new(
        input_size: usize,
        weights: Vec<f64>,
        biases: Vec<f64>,
        activation: Activation,
    ) -> Result<Self> {
        let output_size = biases.len();
        if weights.len() != input_size * output_size {
            return Err(AppError::Config(format!(
                "layer weights hold {} values, expected {} x {}",
                weights.len(),
                input_size,
                output_size
            )));
        }

        Ok(Self {
            input_size,
            output_size,
            weights,
            biases,
            activation,
        })
    }

    /// 由 `input_size` 行、每行 `output_size` 列的矩阵构造
    pub fn from_rows(rows: Vec<Vec<f64>>, biases: Vec<f64>, activation: Activation) -> Result<Self> {
        let input_size = rows.len();
        let output_size = biases.len();
        let mut weights = Vec::with_capacity(input_size * output_size);
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != output_size {
                return Err(AppError::Config(format!(
                    "weight row {} has {} columns, expected {}",
                    index,
                    row.len(),
                    output_size
                )));
            }
            weights.extend(row);
        }
        Self::new(input_size, weights, biases, activation)
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    /// 第 `i` 个输入对应的权重行
    #[inline]
    pub fn row(&self, input: usize) -> &[f64] {
        let start = input * self.output_size;
        &self.weights[start..start + self.output_size]
    }

    pub fn weight(&self, input: usize, output: usize) -> f64 {
        self.weights[input * self.output_size + output]
    }
}

/// 有序的层序列，相邻层维度一致
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    layers: Vec<Layer>,
}

impl Network {
    pub fn new(layers: Vec<Layer>) -> Result<Self> {
        if layers.is_empty() {
            return Err(AppError::Config("network has no layers".into()));
        }

        for (index, pair) in layers.windows(2).enumerate() {
            if pair[0].output_size != pair[1].input_size {
                return Err(AppError::Config(format!(
                    "layer {} outputs {} units but layer {} expects {} inputs",
                    index,
                    pair[0].output_size,
                    index + 1,
                    pair[1].input_size
                )));
            }
        }

        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].input_size
    }

    pub fn output_size(&self) -> usize {
        self.layers[self.layers.len() - 1].output_size
    }

    /// 一次前向传播需要的乘加次数
    pub fn multiply_accumulates(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| layer.input_size * layer.output_size)
            .sum()
    }
}
