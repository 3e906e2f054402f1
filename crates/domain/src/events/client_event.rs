//! 客户端入站事件
//!
//! 客户端发送 `{"event": "<名称>", "data": <载荷>}`，按事件名称分发解析载荷。

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{DomainError, DomainResult};

/// 原始入站帧
#[derive(Debug, Clone, Deserialize)]
pub struct ClientFrame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

/// 私聊载荷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivateMessageData {
    pub name: String,
    pub text: String,
}

/// 已解析的客户端事件
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// 心跳回应
    Pong,
    Message(String),
    Typing(bool),
    RemoveMessage(Value),
    Disconnect,
    Ban(String),
    Unban(String),
    BanList,
    Unlock(String),
    Afk,
    Unafk,
    PrivateMessage { name: String, text: String },
    Highlight(String),
    /// 掷骰，可选 `NdS` 模式
    Roll(Option<String>),
    RollUser(String),
}

impl ClientEvent {
    /// 解析一条文本帧
    pub fn parse(text: &str) -> DomainResult<Self> {
        let frame: ClientFrame =
            serde_json::from_str(text).map_err(|e| DomainError::malformed_frame(e.to_string()))?;
        Self::from_frame(frame)
    }

    pub fn from_frame(frame: ClientFrame) -> DomainResult<Self> {
        let ClientFrame { event, data } = frame;
        let parsed = match event.as_str() {
            "pong" => ClientEvent::Pong,
            "message" => ClientEvent::Message(payload(&event, data)?),
            "typing" => ClientEvent::Typing(payload(&event, data)?),
            "remove_message" => ClientEvent::RemoveMessage(data),
            "disconnect" => ClientEvent::Disconnect,
            "ban" => ClientEvent::Ban(payload(&event, data)?),
            "unban" => ClientEvent::Unban(payload(&event, data)?),
            "banlist" => ClientEvent::BanList,
            "unlock" => ClientEvent::Unlock(payload(&event, data)?),
            "afk" => ClientEvent::Afk,
            "unafk" => ClientEvent::Unafk,
            "private_message" => {
                let PrivateMessageData { name, text } = payload(&event, data)?;
                ClientEvent::PrivateMessage { name, text }
            }
            "highlight" => ClientEvent::Highlight(payload(&event, data)?),
            "roll" => ClientEvent::Roll(payload(&event, data)?),
            "rolluser" => ClientEvent::RollUser(payload(&event, data)?),
            _ => return Err(DomainError::unknown_event(event)),
        };
        Ok(parsed)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::Pong => "pong",
            ClientEvent::Message(_) => "message",
            ClientEvent::Typing(_) => "typing",
            ClientEvent::RemoveMessage(_) => "remove_message",
            ClientEvent::Disconnect => "disconnect",
            ClientEvent::Ban(_) => "ban",
            ClientEvent::Unban(_) => "unban",
            ClientEvent::BanList => "banlist",
            ClientEvent::Unlock(_) => "unlock",
            ClientEvent::Afk => "afk",
            ClientEvent::Unafk => "unafk",
            ClientEvent::PrivateMessage { .. } => "private_message",
            ClientEvent::Highlight(_) => "highlight",
            ClientEvent::Roll(_) => "roll",
            ClientEvent::RollUser(_) => "rolluser",
        }
    }
}

fn payload<T: DeserializeOwned>(event: &str, data: Value) -> DomainResult<T> {
    serde_json::from_value(data).map_err(|e| DomainError::invalid_payload(event, e.to_string()))
}
