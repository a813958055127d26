//! 前向传播
//!
//! 纯 CPU 计算，没有任何挂起点。对于上千单元的隐藏层，一次评估需要
//! 数百万次乘加运算，调用方应当把它放到阻塞线程池中执行
//! （见 [`crate::services::resolver`]），避免占住异步工作线程。

use crate::models::network::{Layer, Network};

/// 计算单层输出：`activation(Σ_i input[i] * w[i][j] + b[j])`
///
/// 按行累加以顺序访问连续内存；值为 0 的输入（词袋中的缺失词、被 relu
/// 截断的单元）不会改变累加结果，直接跳过。
pub fn propagate_layer(layer: &Layer, input: &[f64]) -> Vec<f64> {
    debug_assert_eq!(input.len(), layer.input_size());

    let mut sums = vec![0.0; layer.output_size()];
    for (i, &x) in input.iter().enumerate() {
        if x == 0.0 {
            continue;
        }
        for (sum, &w) in sums.iter_mut().zip(layer.row(i)) {
            *sum += x * w;
        }
    }

    let activation = layer.activation();
    for (sum, &bias) in sums.iter_mut().zip(layer.biases()) {
        *sum = activation.apply(*sum + bias);
    }
    sums
}

/// 依次执行网络的每一层
#[derive(Debug, Clone, Copy, Default)]
pub struct ForwardEvaluator;

impl ForwardEvaluator {
    /// 返回最后一层的原始输出（长度等于类别数）
    ///
    /// 输入长度必须等于网络输入维度；网络构造时已经校验了层间维度。
    pub fn evaluate(&self, network: &Network, input: &[f64]) -> Vec<f64> {
        let mut activations = input.to_vec();
        for layer in network.layers() {
            activations = propagate_layer(layer, &activations);
        }
        activations
    }
}
