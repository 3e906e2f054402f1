//! 聊天参与者身份
//!
//! 身份记录由外部身份提供方认证后放入会话，本系统只读取并在线状态中保存。

use serde::{Deserialize, Serialize};

use crate::value_objects::{name_key, same_name, ConnectionId};

/// 在线状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    #[default]
    Online,
    Afk,
}

/// 已认证的身份 / 会话记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// 身份提供方分配的 ID
    pub id: String,
    /// 显示名称，不区分大小写唯一
    pub name: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub status: PresenceStatus,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub group_color: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    /// 当前连接句柄
    #[serde(default)]
    pub socket: Option<ConnectionId>,
}

impl Identity {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_admin: false,
            status: PresenceStatus::Online,
            group_name: None,
            group_color: None,
            avatar: None,
            socket: None,
        }
    }

    pub fn admin(mut self) -> Self {
        self.is_admin = true;
        self
    }

    pub fn with_group(mut self, name: impl Into<String>, color: impl Into<String>) -> Self {
        self.group_name = Some(name.into());
        self.group_color = Some(color.into());
        self
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    pub fn with_connection(mut self, connection: ConnectionId) -> Self {
        self.socket = Some(connection);
        self
    }

    /// 目录中使用的唯一键
    pub fn key(&self) -> String {
        name_key(&self.name)
    }

    pub fn is_named(&self, name: &str) -> bool {
        same_name(&self.name, name)
    }

    /// 对外展示的资料快照
    pub fn profile(&self) -> AuthorProfile {
        AuthorProfile {
            name: self.name.clone(),
            group_name: self.group_name.clone(),
            group_color: self.group_color.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

/// 消息作者资料，读取历史时按"最后已知"回填
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorProfile {
    pub name: String,
    #[serde(default)]
    pub group_name: Option<String>,
    #[serde(default)]
    pub group_color: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl AuthorProfile {
    /// 没有资料记录时只保留名称
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            group_name: None,
            group_color: None,
            avatar: None,
        }
    }
}
