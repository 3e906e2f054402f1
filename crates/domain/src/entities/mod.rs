//! 领域实体定义
//!
//! 包含聊天参与者身份与消息。

pub mod identity;
pub mod message;

// 重新导出核心实体
pub use identity::{AuthorProfile, Identity, PresenceStatus};
pub use message::{MessageKind, MessagePayload, StoredMessage};
