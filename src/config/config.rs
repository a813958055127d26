use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务地址
    pub host: String,
    /// 服务端口
    pub port: u16,
    /// 允许的 CORS 来源，为空时允许任意来源
    pub cors_origins: Vec<String>,
    /// 查询文本的最大长度（字符数）
    pub max_query_length: usize,
}

/// 模型配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ModelConfig {
    /// 模型数据文件（词表、意图、权重）
    pub path: PathBuf,
    /// 随机初始化时的隐藏层大小
    pub hidden_sizes: Vec<usize>,
    /// 随机初始化种子，未设置时使用系统熵
    pub seed: Option<u64>,
    /// 置信度阈值，最大概率必须严格大于该值
    pub threshold: f64,
    /// 无外部检索可用时的兜底回复
    pub fallback_message: String,
    /// 同时进行的前向推理数量上限
    pub max_concurrent_inferences: usize,
}

/// 记忆存储配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MemoryConfig {
    /// 持久化文件路径
    pub path: PathBuf,
    /// 容量上限，超过后按插入顺序淘汰
    pub capacity: Option<usize>,
}

/// 外部检索配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SearchConfig {
    /// 是否启用外部检索
    pub enabled: bool,
    /// Instant Answer API 地址
    pub base_url: String,
    /// 请求超时（秒）
    pub timeout_secs: u64,
    /// 外部检索无结果时的回复
    pub not_found_message: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: String,
    /// 结构化（JSON）日志格式
    pub structured: bool,
    /// 日志文件目录
    pub log_dir: Option<PathBuf>,
    /// 状态汇报间隔（秒），0 表示关闭
    pub status_interval_secs: u64,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// 服务器配置
    pub server: ServerConfig,
    /// 模型配置
    pub model: ModelConfig,
    /// 记忆存储配置
    pub memory: MemoryConfig,
    /// 外部检索配置
    pub search: SearchConfig,
    /// 日志配置
    pub logging: LoggingConfig,
    /// 应用名称
    pub app_name: String,
    /// 环境
    pub environment: String,
}

impl AppConfig {
    /// 创建开发环境配置
    pub fn development() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 3000,
                cors_origins: Vec::new(),
                max_query_length: 2048,
            },
            model: ModelConfig {
                path: PathBuf::from("model_data.json"),
                hidden_sizes: vec![1500, 1500],
                seed: None,
                threshold: 0.7,
                fallback_message: "Sorry, I didn't understand. My neural network is still simple!"
                    .into(),
                max_concurrent_inferences: 4,
            },
            memory: MemoryConfig {
                path: PathBuf::from("memory.json"),
                capacity: None,
            },
            search: SearchConfig {
                enabled: true,
                base_url: "https://api.duckduckgo.com/".into(),
                timeout_secs: 10,
                not_found_message:
                    "Sorry, I couldn't find an exact answer, but I can learn from you!".into(),
            },
            logging: LoggingConfig {
                level: "debug".into(),
                structured: false,
                log_dir: None,
                status_interval_secs: 60,
            },
            app_name: "synapse".into(),
            environment: "development".into(),
        }
    }

    /// 创建生产环境配置
    pub fn production() -> Self {
        let mut config = Self::development();
        config.environment = "production".into();
        config.server.host = "0.0.0.0".into();
        config.logging.level = "info".into();
        config.logging.structured = true;
        config.model.max_concurrent_inferences = std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4);
        config
    }
}
