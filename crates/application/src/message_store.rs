//! 持久化聊天记录
//!
//! - `messages:count`：全局自增序列
//! - `messages:list:{id}`：消息记录（time、message、可选的 user）
//! - `messages:listed`：记录键索引

use std::collections::HashMap;
use std::sync::Arc;

use domain::{AuthorProfile, MessageId, StoredMessage};
use futures::stream::{self, StreamExt};

use crate::error::ApplicationError;
use crate::presence::{profile_from_fields, profile_key};
use crate::store::KeyValueStore;

const COUNTER_KEY: &str = "messages:count";
const INDEX_KEY: &str = "messages:listed";
const RECORD_PREFIX: &str = "messages:list:";

/// 历史加载时的并发读取上限
const FETCH_CONCURRENCY: usize = 200;

fn record_key(id: MessageId) -> String {
    format!("{RECORD_PREFIX}{id}")
}

pub struct MessageStore {
    store: Arc<dyn KeyValueStore>,
    history_limit: usize,
}

impl MessageStore {
    pub fn new(store: Arc<dyn KeyValueStore>, history_limit: usize) -> Self {
        Self {
            store,
            history_limit,
        }
    }

    /// 分配序列号并写入记录，`author` 为空表示系统消息
    pub async fn append(
        &self,
        time: &str,
        author: Option<&str>,
        body: &str,
    ) -> Result<MessageId, ApplicationError> {
        let id = self.store.incr(COUNTER_KEY).await?;
        let key = record_key(id);

        let mut fields = vec![
            ("time".to_string(), time.to_string()),
            ("message".to_string(), body.to_string()),
        ];
        if let Some(author) = author {
            fields.push(("user".to_string(), author.to_string()));
        }

        self.store.hset_multiple(&key, &fields).await?;
        self.store.sadd(INDEX_KEY, &key).await?;
        tracing::debug!(message_id = id, "消息已保存");
        Ok(id)
    }

    /// 最近的 `history_limit` 条消息，按序列号升序
    ///
    /// 作者资料按当前资料回填；索引里有但记录已丢失的条目跳过。
    pub async fn list(&self) -> Result<Vec<StoredMessage>, ApplicationError> {
        let mut ids: Vec<MessageId> = self
            .store
            .smembers(INDEX_KEY)
            .await?
            .iter()
            .filter_map(|key| key.strip_prefix(RECORD_PREFIX)?.parse().ok())
            .collect();
        ids.sort_unstable();
        let skip = ids.len().saturating_sub(self.history_limit);

        let fetched: Vec<Result<Option<StoredMessage>, ApplicationError>> =
            stream::iter(ids.into_iter().skip(skip))
                .map(|id| self.fetch(id))
                .buffered(FETCH_CONCURRENCY)
                .collect()
                .await;

        let mut messages = Vec::with_capacity(fetched.len());
        for message in fetched {
            if let Some(message) = message? {
                messages.push(message);
            }
        }
        Ok(messages)
    }

    async fn fetch(&self, id: MessageId) -> Result<Option<StoredMessage>, ApplicationError> {
        let mut fields = self.store.hgetall(&record_key(id)).await?;
        if fields.is_empty() {
            tracing::warn!(message_id = id, "消息记录丢失，已跳过");
            return Ok(None);
        }

        let user = match fields.remove("user").filter(|name| !name.is_empty()) {
            Some(name) => Some(self.author_profile(name).await?),
            None => None,
        };

        Ok(Some(StoredMessage {
            id,
            time: fields.remove("time").unwrap_or_default(),
            user,
            message: fields.remove("message").unwrap_or_default(),
        }))
    }

    async fn author_profile(&self, name: String) -> Result<AuthorProfile, ApplicationError> {
        let fields: HashMap<String, String> = self.store.hgetall(&profile_key(&name)).await?;
        Ok(profile_from_fields(fields).unwrap_or_else(|| AuthorProfile::named(name)))
    }
}
