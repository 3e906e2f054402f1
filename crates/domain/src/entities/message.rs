use serde::{Deserialize, Serialize};

use crate::entities::identity::AuthorProfile;
use crate::value_objects::MessageId;

/// 消息类别，目前只区分机器人消息
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    #[serde(rename = "message-bot")]
    Bot,
}

/// 通过 `message` 事件推送给客户端的载荷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<MessageId>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<MessageKind>,
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<AuthorProfile>,
    pub message: String,
}

impl MessagePayload {
    /// 已持久化的用户消息
    pub fn chat(id: MessageId, time: String, user: AuthorProfile, message: String) -> Self {
        Self {
            id: Some(id),
            kind: None,
            time,
            user: Some(user),
            message,
        }
    }

    /// 机器人 / 系统消息
    pub fn bot(time: String, message: String) -> Self {
        Self {
            id: None,
            kind: Some(MessageKind::Bot),
            time,
            user: None,
            message,
        }
    }

    /// 私聊消息，不持久化，因此没有序列号
    pub fn private(time: String, user: AuthorProfile, message: String) -> Self {
        Self {
            id: None,
            kind: None,
            time,
            user: Some(user),
            message,
        }
    }

    pub fn is_bot(&self) -> bool {
        self.kind == Some(MessageKind::Bot)
    }
}

/// 历史记录中的消息（作者资料已回填）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: MessageId,
    pub time: String,
    /// `None` 表示系统消息
    pub user: Option<AuthorProfile>,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bot_payload_is_tagged() {
        let payload = MessagePayload::bot("01/01 à 10:00:00".into(), "hi".into());
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["type"], "message-bot");
        assert!(json.get("id").is_none());
        assert!(json.get("user").is_none());
    }

    #[test]
    fn chat_payload_carries_id_and_author() {
        let payload = MessagePayload::chat(
            12,
            "t".into(),
            AuthorProfile::named("Alice"),
            "<p>hello</p>".into(),
        );
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["id"], 12);
        assert_eq!(json["user"]["name"], "Alice");
        assert!(json.get("type").is_none());
        assert!(!payload.is_bot());
    }
}
