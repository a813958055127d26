use crate::config::config::AppConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "SYNAPSE_CONFIG";

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 合并顺序：
    /// 1. 开发环境默认值
    /// 2. `SYNAPSE_CONFIG` 指定的文件，或 ./config.toml
    /// 3. `SYNAPSE_` 前缀的环境变量（`__` 表示嵌套）
    pub fn load() -> Result<AppConfig, figment::Error> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_config_path());
        Self::load_from(&path)
    }

    /// 从指定路径加载配置
    pub fn load_from(path: &Path) -> Result<AppConfig, figment::Error> {
        Self::figment(path).extract()
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::development()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("SYNAPSE_").ignore(&["CONFIG"]).split("__"))
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if !(0.0..=1.0).contains(&config.model.threshold) {
            return Err(ConfigValidationError::InvalidThreshold(
                config.model.threshold,
            ));
        }

        if config.model.hidden_sizes.iter().any(|&size| size == 0) {
            return Err(ConfigValidationError::EmptyHiddenLayer);
        }

        if config.model.max_concurrent_inferences == 0 {
            return Err(ConfigValidationError::InvalidConcurrency);
        }

        if config.memory.capacity == Some(0) {
            return Err(ConfigValidationError::InvalidCapacity);
        }

        if config.memory.path.as_os_str().is_empty() {
            return Err(ConfigValidationError::InvalidPath("memory.path".into()));
        }

        Ok(())
    }
}

/// 配置验证错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("服务端口无效，必须大于 0")]
    InvalidPort,

    #[error("置信度阈值必须位于 [0, 1]，当前为 {0}")]
    InvalidThreshold(f64),

    #[error("隐藏层大小必须大于 0")]
    EmptyHiddenLayer,

    #[error("并发推理数量必须大于 0")]
    InvalidConcurrency,

    #[error("记忆容量必须大于 0")]
    InvalidCapacity,

    #[error("配置路径无效: {0}")]
    InvalidPath(String),
}

/// 获取默认配置文件路径
pub fn default_config_path() -> PathBuf {
    PathBuf::from("config.toml")
}
