//! 统一配置中心
//!
//! 提供应用的全局配置管理，包括：
//! - 服务监听地址
//! - Redis 连接
//! - 会话令牌密钥
//! - 聊天行为参数（时区、心跳、延迟、长度限制）
//!
//! 加载顺序：内置默认值 -> `CHATROOM_CONFIG_FILE` 指定的 YAML 文件 -> `CHATROOM_*` 环境变量。

use std::time::Duration;

use chrono_tz::Tz;
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务配置
    pub server: ServerConfig,
    /// Redis配置
    pub redis: RedisConfig,
    /// 会话令牌配置
    pub session: SessionConfig,
    /// 聊天行为配置
    pub chat: ChatConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Redis配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

/// 会话令牌配置（HS256 JWT）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub expiration_hours: i64,
}

/// 聊天行为配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// 显示时间所用时区
    pub timezone: String,
    /// 显示时间格式（chrono strftime）
    pub time_format: String,
    pub heartbeat_interval_secs: u64,
    /// 拒绝通知的发送延迟
    pub rejection_delay_ms: u64,
    /// 定向掷骰结果的发送延迟
    pub roll_delay_ms: u64,
    pub max_message_length: usize,
    /// 历史消息最多返回条数
    pub history_limit: usize,
    pub chatbot_delay_min_secs: u64,
    pub chatbot_delay_max_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            timezone: "Europe/Paris".to_string(),
            time_format: "%d/%m à %H:%M:%S".to_string(),
            heartbeat_interval_secs: 50,
            rejection_delay_ms: 500,
            roll_delay_ms: 50,
            max_message_length: 1000,
            history_limit: 200,
            chatbot_delay_min_secs: 5,
            chatbot_delay_max_secs: 15,
        }
    }
}

impl ChatConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn rejection_delay(&self) -> Duration {
        Duration::from_millis(self.rejection_delay_ms)
    }

    pub fn roll_delay(&self) -> Duration {
        Duration::from_millis(self.roll_delay_ms)
    }

    /// 解析时区名称
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone.parse::<Tz>().map_err(|_| {
            ConfigError::InvalidChatConfig(format!("unknown timezone: {}", self.timezone))
        })
    }
}

impl Default for AppConfig {
    /// 默认配置使用开发环境版本
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            redis: RedisConfig {
                url: "redis://127.0.0.1:6379".to_string(),
            },
            session: SessionConfig {
                secret: "dev-secret-key-not-for-production-use-minimum-32-chars".to_string(),
                expiration_hours: 24,
            },
            chat: ChatConfig::default(),
        }
    }
}

impl AppConfig {
    /// 按优先级加载配置：默认值 -> YAML 文件 -> 环境变量
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));
        if let Ok(path) = std::env::var("CHATROOM_CONFIG_FILE") {
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment.merge(Env::prefixed("CHATROOM_").split("__"));
        Self::from_figment(figment)
    }

    /// 从任意 figment 提取并验证
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| ConfigError::Extraction(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.is_empty() {
            return Err(ConfigError::InvalidServerConfig(
                "host cannot be empty".to_string(),
            ));
        }

        if self.redis.url.is_empty() {
            return Err(ConfigError::InvalidRedisUrl(
                "Redis URL cannot be empty".to_string(),
            ));
        }

        // 令牌密钥至少 256 位
        if self.session.secret.len() < 32 {
            return Err(ConfigError::InvalidSessionSecret(
                "session secret must be at least 32 characters long".to_string(),
            ));
        }

        if self.session.expiration_hours <= 0 {
            return Err(ConfigError::InvalidSessionSecret(
                "expiration_hours must be positive".to_string(),
            ));
        }

        let chat = &self.chat;
        chat.tz()?;

        if chat.heartbeat_interval_secs == 0 {
            return Err(ConfigError::InvalidChatConfig(
                "heartbeat interval must be greater than 0".to_string(),
            ));
        }

        if chat.max_message_length == 0 || chat.history_limit == 0 {
            return Err(ConfigError::InvalidChatConfig(
                "message length and history limit must be greater than 0".to_string(),
            ));
        }

        if chat.chatbot_delay_min_secs > chat.chatbot_delay_max_secs {
            return Err(ConfigError::InvalidChatConfig(
                "chatbot delay range is inverted".to_string(),
            ));
        }

        Ok(())
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Extraction(String),
    #[error("Invalid Redis URL: {0}")]
    InvalidRedisUrl(String),
    #[error("Invalid session secret: {0}")]
    InvalidSessionSecret(String),
    #[error("Invalid server configuration: {0}")]
    InvalidServerConfig(String),
    #[error("Invalid chat configuration: {0}")]
    InvalidChatConfig(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_yaml(yaml: &str) -> Result<AppConfig, ConfigError> {
        AppConfig::from_figment(
            Figment::from(Serialized::defaults(AppConfig::default())).merge(Yaml::string(yaml)),
        )
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chat.history_limit, 200);
        assert_eq!(config.chat.heartbeat_interval(), Duration::from_secs(50));
        assert_eq!(config.chat.rejection_delay(), Duration::from_millis(500));
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        let config = from_yaml(
            r#"
server:
  port: 9000
chat:
  timezone: "UTC"
  roll_delay_ms: 10
"#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.chat.timezone, "UTC");
        assert_eq!(config.chat.roll_delay(), Duration::from_millis(10));
        assert_eq!(config.chat.max_message_length, 1000);
    }

    #[test]
    fn test_short_secret_is_rejected() {
        let result = from_yaml("session:\n  secret: short\n");
        assert!(matches!(result, Err(ConfigError::InvalidSessionSecret(_))));
    }

    #[test]
    fn test_unknown_timezone_is_rejected() {
        let result = from_yaml("chat:\n  timezone: Mars/Olympus\n");
        assert!(matches!(result, Err(ConfigError::InvalidChatConfig(_))));
    }

    #[test]
    fn test_inverted_chatbot_delay_is_rejected() {
        let mut config = AppConfig::default();
        config.chat.chatbot_delay_min_secs = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_type_mismatch_fails_extraction() {
        let result = from_yaml("server:\n  port: not-a-port\n");
        assert!(matches!(result, Err(ConfigError::Extraction(_))));
    }
}
