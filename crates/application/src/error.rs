use thiserror::Error;

/// 键值存储访问错误
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store connection failed: {0}")]
    Connection(String),
    #[error("store command failed: {0}")]
    Command(String),
    #[error("stored value is corrupt: {0}")]
    Corrupt(String),
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// 身份当前不在线（私聊、提醒、封禁、定向掷骰的目标解析失败）
    #[error("identity not found: {0}")]
    NotFound(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApplicationError {
    pub fn not_found(name: impl Into<String>) -> Self {
        ApplicationError::NotFound(name.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApplicationError::NotFound(_))
    }
}
