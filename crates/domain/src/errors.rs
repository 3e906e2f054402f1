//! 领域模型错误定义
//!
//! 入站事件解析失败时使用，提供清晰的错误上下文。

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// 客户端帧不是合法的 JSON 事件
    #[error("事件帧格式错误: {message}")]
    MalformedFrame { message: String },

    /// 未知事件名称
    #[error("未知事件: {event}")]
    UnknownEvent { event: String },

    /// 事件载荷与事件类型不匹配
    #[error("事件载荷无效: {event}: {message}")]
    InvalidPayload { event: String, message: String },
}

impl DomainError {
    /// 创建帧格式错误
    pub fn malformed_frame(message: impl Into<String>) -> Self {
        Self::MalformedFrame {
            message: message.into(),
        }
    }

    /// 创建未知事件错误
    pub fn unknown_event(event: impl Into<String>) -> Self {
        Self::UnknownEvent {
            event: event.into(),
        }
    }

    /// 创建载荷错误
    pub fn invalid_payload(event: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            event: event.into(),
            message: message.into(),
        }
    }
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;
