//! 服务端推送事件
//!
//! 线上格式为 `{"event": "<名称>", "data": {...}}`，无载荷事件省略 `data`。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entities::{Identity, MessagePayload};

/// 推送给客户端的事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// 心跳
    Ping { beat: u8 },

    /// 新用户加入
    UserNew { time: String, name: String },

    /// 在线列表中的一个身份
    UserConnected(Identity),

    /// 用户断开
    UserDisconnected { time: String, user: Identity },

    UserAfk { time: String, name: String },

    UserUnafk { time: String, name: String },

    /// 聊天或机器人消息
    Message(MessagePayload),

    /// 仅展示层删除，存储不变
    RemoveMessage { id: Value },

    /// 正在输入提示
    #[serde(rename = "isTyping")]
    IsTyping {
        #[serde(rename = "isTyping")]
        is_typing: bool,
        user: String,
    },

    /// 同名身份已在线，本连接被拒绝
    AlreadyConnected,

    /// 身份已被封禁，本连接被拒绝
    UserBanned,

    /// 管理员封禁了当前连接
    Ban,

    PrivateNotification { name: String },

    UserHighlight { time: String, name: String },
}

impl ServerEvent {
    pub fn heartbeat() -> Self {
        ServerEvent::Ping { beat: 1 }
    }

    /// 事件名称，用于日志
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Ping { .. } => "ping",
            ServerEvent::UserNew { .. } => "user_new",
            ServerEvent::UserConnected(_) => "user_connected",
            ServerEvent::UserDisconnected { .. } => "user_disconnected",
            ServerEvent::UserAfk { .. } => "user_afk",
            ServerEvent::UserUnafk { .. } => "user_unafk",
            ServerEvent::Message(_) => "message",
            ServerEvent::RemoveMessage { .. } => "remove_message",
            ServerEvent::IsTyping { .. } => "isTyping",
            ServerEvent::AlreadyConnected => "already_connected",
            ServerEvent::UserBanned => "user_banned",
            ServerEvent::Ban => "ban",
            ServerEvent::PrivateNotification { .. } => "private_notification",
            ServerEvent::UserHighlight { .. } => "user_highlight",
        }
    }

    /// 写出该事件后是否应关闭连接
    pub fn closes_connection(&self) -> bool {
        matches!(self, ServerEvent::Ban)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_use_socket_style_names() {
        let json = serde_json::to_value(ServerEvent::heartbeat()).unwrap();
        assert_eq!(json["event"], "ping");
        assert_eq!(json["data"]["beat"], 1);

        let json = serde_json::to_value(ServerEvent::IsTyping {
            is_typing: true,
            user: "Alice".into(),
        })
        .unwrap();
        assert_eq!(json["event"], "isTyping");
        assert_eq!(json["data"]["isTyping"], true);
        assert_eq!(json["data"]["user"], "Alice");
    }

    #[test]
    fn unit_events_have_no_payload() {
        let json = serde_json::to_value(ServerEvent::AlreadyConnected).unwrap();
        assert_eq!(json["event"], "already_connected");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn name_matches_serialized_tag() {
        let events = [
            ServerEvent::UserNew {
                time: "t".into(),
                name: "n".into(),
            },
            ServerEvent::RemoveMessage { id: Value::from(4) },
            ServerEvent::PrivateNotification { name: "n".into() },
            ServerEvent::Ban,
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["event"], event.name());
        }
    }

    #[test]
    fn only_ban_closes_the_connection() {
        assert!(ServerEvent::Ban.closes_connection());
        assert!(!ServerEvent::UserBanned.closes_connection());
    }
}
