//! Redis 键值存储
//!
//! 通过 `ConnectionManager` 复用一条多路复用连接，断线时自动重连。

use std::collections::HashMap;

use application::{KeyValueStore, StoreError};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

pub fn map_redis_err(err: redis::RedisError) -> StoreError {
    match err.kind() {
        redis::ErrorKind::IoError => StoreError::Connection(err.to_string()),
        redis::ErrorKind::TypeError => StoreError::Corrupt(err.to_string()),
        _ => StoreError::Command(err.to_string()),
    }
}

#[derive(Clone)]
pub struct RedisKeyValueStore {
    connection: ConnectionManager,
}

impl RedisKeyValueStore {
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        tracing::info!("Redis 连接已建立");
        Ok(Self { connection })
    }

    fn connection(&self) -> ConnectionManager {
        self.connection.clone()
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        self.connection()
            .hset::<_, _, _, ()>(key, field, value)
            .await
            .map_err(map_redis_err)
    }

    async fn hset_multiple(
        &self,
        key: &str,
        fields: &[(String, String)],
    ) -> Result<(), StoreError> {
        if fields.is_empty() {
            return Ok(());
        }
        self.connection()
            .hset_multiple::<_, _, _, ()>(key, fields)
            .await
            .map_err(map_redis_err)
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        self.connection()
            .hget(key, field)
            .await
            .map_err(map_redis_err)
    }

    async fn hdel(&self, key: &str, field: &str) -> Result<(), StoreError> {
        self.connection()
            .hdel::<_, _, ()>(key, field)
            .await
            .map_err(map_redis_err)
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        self.connection()
            .hgetall(key)
            .await
            .map_err(map_redis_err)
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<(), StoreError> {
        self.connection()
            .sadd::<_, _, ()>(key, member)
            .await
            .map_err(map_redis_err)
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError> {
        self.connection()
            .smembers(key)
            .await
            .map_err(map_redis_err)
    }

    async fn incr(&self, key: &str) -> Result<u64, StoreError> {
        self.connection()
            .incr(key, 1u64)
            .await
            .map_err(map_redis_err)
    }
}
