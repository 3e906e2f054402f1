//! 在线目录
//!
//! 记录当前在线的身份、封禁名单以及作者资料，全部存放在共享键值存储中：
//! - `users:sessions`：小写名称 -> 身份 JSON
//! - `users:banned`：小写名称 -> 封禁时使用的名称
//! - `users:profiles:{小写名称}`：作者资料，离线后仍保留，用于回填历史消息

use std::collections::HashMap;
use std::sync::Arc;

use domain::{name_key, AuthorProfile, ConnectionId, Identity, PresenceStatus};

use crate::error::ApplicationError;
use crate::store::KeyValueStore;

const SESSIONS_KEY: &str = "users:sessions";
const BANNED_KEY: &str = "users:banned";

pub(crate) fn profile_key(name: &str) -> String {
    format!("users:profiles:{}", name_key(name))
}

fn profile_fields(profile: &AuthorProfile) -> Vec<(String, String)> {
    let mut fields = vec![("name".to_string(), profile.name.clone())];
    let optional = [
        ("groupName", &profile.group_name),
        ("groupColor", &profile.group_color),
        ("avatar", &profile.avatar),
    ];
    // 缺省字段写空串，覆盖上一次的值
    for (field, value) in optional {
        fields.push((field.to_string(), value.clone().unwrap_or_default()));
    }
    fields
}

pub(crate) fn profile_from_fields(mut fields: HashMap<String, String>) -> Option<AuthorProfile> {
    let name = fields.remove("name")?;
    let mut optional = |field: &str| fields.remove(field).filter(|value| !value.is_empty());
    Some(AuthorProfile {
        name,
        group_name: optional("groupName"),
        group_color: optional("groupColor"),
        avatar: optional("avatar"),
    })
}

pub struct PresenceDirectory {
    store: Arc<dyn KeyValueStore>,
}

impl PresenceDirectory {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// 同名（不区分大小写）身份是否在线
    pub async fn exists(&self, name: &str) -> Result<bool, ApplicationError> {
        Ok(self.store.hget(SESSIONS_KEY, &name_key(name)).await?.is_some())
    }

    pub async fn is_banned(&self, name: &str) -> Result<bool, ApplicationError> {
        Ok(self.store.hget(BANNED_KEY, &name_key(name)).await?.is_some())
    }

    /// 写入在线记录并刷新作者资料，同名记录直接覆盖
    pub async fn admit(&self, identity: &Identity) -> Result<(), ApplicationError> {
        let record = serde_json::to_string(identity)?;
        self.store.hset(SESSIONS_KEY, &identity.key(), &record).await?;
        self.store
            .hset_multiple(&profile_key(&identity.name), &profile_fields(&identity.profile()))
            .await?;
        tracing::info!(user = %identity.name, "身份已上线");
        Ok(())
    }

    /// 删除在线记录，不存在时无操作
    pub async fn remove(&self, name: &str) -> Result<(), ApplicationError> {
        self.store.hdel(SESSIONS_KEY, &name_key(name)).await?;
        tracing::info!(user = %name, "身份已下线");
        Ok(())
    }

    pub async fn get(&self, name: &str) -> Result<Option<Identity>, ApplicationError> {
        match self.store.hget(SESSIONS_KEY, &name_key(name)).await? {
            Some(record) => Ok(Some(serde_json::from_str(&record)?)),
            None => Ok(None),
        }
    }

    /// 所有在线身份，按名称排序；损坏的记录跳过
    pub async fn list(&self) -> Result<Vec<Identity>, ApplicationError> {
        let records = self.store.hgetall(SESSIONS_KEY).await?;
        let mut identities: Vec<Identity> = records
            .into_iter()
            .filter_map(|(key, record)| match serde_json::from_str(&record) {
                Ok(identity) => Some(identity),
                Err(err) => {
                    tracing::warn!(key = %key, error = %err, "跳过无法解析的在线记录");
                    None
                }
            })
            .collect();
        identities.sort_by_key(Identity::key);
        Ok(identities)
    }

    /// 更新在线状态，身份不在线时无操作
    pub async fn set_status(
        &self,
        name: &str,
        status: PresenceStatus,
    ) -> Result<(), ApplicationError> {
        if let Some(mut identity) = self.get(name).await? {
            identity.status = status;
            let record = serde_json::to_string(&identity)?;
            self.store.hset(SESSIONS_KEY, &identity.key(), &record).await?;
        }
        Ok(())
    }

    pub async fn ban(&self, name: &str) -> Result<(), ApplicationError> {
        self.store.hset(BANNED_KEY, &name_key(name), name).await?;
        tracing::info!(user = %name, "已封禁");
        Ok(())
    }

    pub async fn unban(&self, name: &str) -> Result<(), ApplicationError> {
        self.store.hdel(BANNED_KEY, &name_key(name)).await?;
        tracing::info!(user = %name, "已解除封禁");
        Ok(())
    }

    /// 被封禁的名称，按字母排序
    pub async fn ban_list(&self) -> Result<Vec<String>, ApplicationError> {
        let mut names: Vec<String> = self.store.hgetall(BANNED_KEY).await?.into_values().collect();
        names.sort_by_key(|name| name_key(name));
        Ok(names)
    }

    /// 解析在线身份的连接句柄，不在线时返回 `NotFound`
    pub async fn connection_for(&self, name: &str) -> Result<ConnectionId, ApplicationError> {
        self.get(name)
            .await?
            .and_then(|identity| identity.socket)
            .ok_or_else(|| ApplicationError::not_found(name))
    }
}
