//! 输出解析：归一化、取最大值、置信度门限

use serde::Serialize;

/// 默认置信度阈值
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// 将 `exp` 层的原始输出归一化为概率分布
///
/// 总和恰好为 0 时返回全 0 向量，不做除法。
pub fn normalize(raw: &[f64]) -> Vec<f64> {
    let sum: f64 = raw.iter().sum();
    if sum == 0.0 {
        return vec![0.0; raw.len()];
    }
    raw.iter().map(|value| value / sum).collect()
}

/// 取最大值下标，相同值取第一个出现的位置
pub fn arg_max(values: &[f64]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &value) in values.iter().enumerate() {
        match best {
            Some((_, current)) if value <= current => {}
            _ if value.is_nan() => {}
            _ => best = Some((index, value)),
        }
    }
    best
}

/// 一次分类判定的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    /// 被接受的类别下标；置信度不足时为 `None`
    pub category: Option<usize>,
    /// 最大概率
    pub confidence: f64,
    pub probabilities: Vec<f64>,
}

impl Decision {
    pub fn is_accepted(&self) -> bool {
        self.category.is_some()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OutputResolver {
    threshold: f64,
}

impl Default for OutputResolver {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl OutputResolver {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// 最大概率严格大于阈值时接受该类别
    pub fn resolve(&self, raw: &[f64]) -> Decision {
        let probabilities = normalize(raw);
        let (category, confidence) = match arg_max(&probabilities) {
            Some((index, probability)) if probability > self.threshold => {
                (Some(index), probability)
            }
            Some((_, probability)) => (None, probability),
            None => (None, 0.0),
        };

        Decision {
            category,
            confidence,
            probabilities,
        }
    }
}
