use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 连接句柄。每个 WebSocket 连接在建立时分配一个。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ConnectionId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<ConnectionId> for Uuid {
    fn from(value: ConnectionId) -> Self {
        value.0
    }
}

/// 持久化消息的序列号，由存储端原子递增分配。
pub type MessageId = u64;

/// 身份名称的唯一键（不区分大小写）。
pub fn name_key(name: &str) -> String {
    name.to_lowercase()
}

/// 两个名称是否指向同一身份。
pub fn same_name(left: &str, right: &str) -> bool {
    name_key(left) == name_key(right)
}
