//! 统一配置中心
//!
//! 提供服务的全局配置，包括：
//! - 监听地址与跨域设置
//! - 消息历史容量和事件流缓冲
//! - 可选的 PostgreSQL 归档
//!
//! 加载顺序：内置默认值 -> `CHAT_CONFIG_FILE` 指定的文件 -> `CHAT_` 前缀的环境变量
//! （嵌套字段用 `__` 分隔，例如 `CHAT_SERVER__PORT=3000`）。

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// 全局应用配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
}

/// 服务器配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 允许的跨域来源，`*` 表示任意
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
            cors_origins: vec!["*".into()],
        }
    }
}

/// 消息与事件流配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// 内存中保留的消息条数
    pub history_capacity: usize,
    /// 每个流连接最多缓冲的帧数，写满视为投递失败
    pub stream_buffer: usize,
    /// 发布接口的请求体上限（字节）
    pub max_body_bytes: usize,
    /// 历史接口默认返回条数
    pub history_limit: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            stream_buffer: 64,
            max_body_bytes: 10 * 1024,
            history_limit: 50,
        }
    }
}

/// 数据库配置；未设置 `url` 时不启用归档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 5,
        }
    }
}

/// 归档清理配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    pub retain_count: usize,
    pub cleanup_interval_secs: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            retain_count: 1000,
            cleanup_interval_secs: 3600,
        }
    }
}

impl AppConfig {
    /// 组装配置来源，不做解析
    pub fn figment() -> Figment {
        let mut fig = Figment::from(Serialized::defaults(AppConfig::default()));
        if let Ok(path) = std::env::var("CHAT_CONFIG_FILE") {
            if path.ends_with(".yml") || path.ends_with(".yaml") {
                fig = fig.merge(Yaml::file(path));
            } else if path.ends_with(".json") {
                fig = fig.merge(Json::file(path));
            } else {
                fig = fig.merge(Toml::file(path));
            }
        }
        fig.merge(Env::prefixed("CHAT_").split("__"))
    }

    /// 加载并验证配置
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: AppConfig = figment
            .extract()
            .map_err(|err| ConfigError::Load(Box::new(err)))?;
        config.validate()?;
        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::InvalidServerConfig(
                "host cannot be empty".to_string(),
            ));
        }
        if self.server.port == 0 {
            return Err(ConfigError::InvalidServerConfig(
                "port must be greater than 0".to_string(),
            ));
        }

        if self.chat.history_capacity == 0 {
            return Err(ConfigError::InvalidChatConfig(
                "history_capacity must be greater than 0".to_string(),
            ));
        }
        if self.chat.stream_buffer == 0 {
            return Err(ConfigError::InvalidChatConfig(
                "stream_buffer must be greater than 0".to_string(),
            ));
        }
        if self.chat.max_body_bytes == 0 {
            return Err(ConfigError::InvalidChatConfig(
                "max_body_bytes must be greater than 0".to_string(),
            ));
        }
        if self.chat.history_limit == 0 {
            return Err(ConfigError::InvalidChatConfig(
                "history_limit must be greater than 0".to_string(),
            ));
        }

        if let Some(url) = &self.database.url {
            if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
                return Err(ConfigError::InvalidDatabaseUrl(
                    "database url must use the postgres:// scheme".to_string(),
                ));
            }
            if self.database.max_connections == 0 {
                return Err(ConfigError::InvalidDatabaseConfig(
                    "max_connections must be greater than 0".to_string(),
                ));
            }
            if self.archive.cleanup_interval_secs == 0 {
                return Err(ConfigError::InvalidDatabaseConfig(
                    "cleanup_interval_secs must be greater than 0".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// 监听地址
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 适合写入日志的配置描述，隐藏数据库凭据
    pub fn sanitized(&self) -> String {
        let mut redacted = self.clone();
        if let Some(url) = redacted.database.url.as_mut() {
            if let Some(at) = url.rfind('@') {
                let scheme_end = url.find("://").map(|i| i + 3).unwrap_or(0);
                url.replace_range(scheme_end..at, "[REDACTED]");
            }
        }
        format!("{:?}", redacted)
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[source] Box<figment::Error>),
    #[error("Invalid server configuration: {0}")]
    InvalidServerConfig(String),
    #[error("Invalid chat configuration: {0}")]
    InvalidChatConfig(String),
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),
    #[error("Invalid database configuration: {0}")]
    InvalidDatabaseConfig(String),
}
