use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::StoreError;

/// 共享键值存储接口
///
/// 在线目录与消息存储的全部状态都经由此接口读写。
/// 单个键的读写和自增是原子的，跨键序列不是。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError>;

    async fn hset_multiple(&self, key: &str, fields: &[(String, String)])
        -> Result<(), StoreError>;

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError>;

    async fn hdel(&self, key: &str, field: &str) -> Result<(), StoreError>;

    /// 键不存在时返回空表
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    async fn sadd(&self, key: &str, member: &str) -> Result<(), StoreError>;

    async fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError>;

    /// 原子自增并返回新值
    async fn incr(&self, key: &str) -> Result<u64, StoreError>;
}

/// 内存实现的键值存储（用于测试和单机开发）
pub mod memory {
    use super::*;
    use std::collections::HashSet;
    use tokio::sync::RwLock;

    #[derive(Default)]
    struct Inner {
        counters: HashMap<String, u64>,
        hashes: HashMap<String, HashMap<String, String>>,
        sets: HashMap<String, HashSet<String>>,
    }

    #[derive(Default)]
    pub struct MemoryKeyValueStore {
        inner: RwLock<Inner>,
    }

    impl MemoryKeyValueStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// 直接删除一个哈希键，模拟记录丢失
        pub async fn remove_hash(&self, key: &str) {
            self.inner.write().await.hashes.remove(key);
        }
    }

    #[async_trait]
    impl KeyValueStore for MemoryKeyValueStore {
        async fn hset(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
            let mut inner = self.inner.write().await;
            inner
                .hashes
                .entry(key.to_owned())
                .or_default()
                .insert(field.to_owned(), value.to_owned());
            Ok(())
        }

        async fn hset_multiple(
            &self,
            key: &str,
            fields: &[(String, String)],
        ) -> Result<(), StoreError> {
            let mut inner = self.inner.write().await;
            let hash = inner.hashes.entry(key.to_owned()).or_default();
            for (field, value) in fields {
                hash.insert(field.clone(), value.clone());
            }
            Ok(())
        }

        async fn hget(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
            let inner = self.inner.read().await;
            Ok(inner.hashes.get(key).and_then(|h| h.get(field)).cloned())
        }

        async fn hdel(&self, key: &str, field: &str) -> Result<(), StoreError> {
            let mut inner = self.inner.write().await;
            if let Some(hash) = inner.hashes.get_mut(key) {
                hash.remove(field);
                if hash.is_empty() {
                    inner.hashes.remove(key);
                }
            }
            Ok(())
        }

        async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
            let inner = self.inner.read().await;
            Ok(inner.hashes.get(key).cloned().unwrap_or_default())
        }

        async fn sadd(&self, key: &str, member: &str) -> Result<(), StoreError> {
            let mut inner = self.inner.write().await;
            inner
                .sets
                .entry(key.to_owned())
                .or_default()
                .insert(member.to_owned());
            Ok(())
        }

        async fn smembers(&self, key: &str) -> Result<Vec<String>, StoreError> {
            let inner = self.inner.read().await;
            Ok(inner
                .sets
                .get(key)
                .map(|set| set.iter().cloned().collect())
                .unwrap_or_default())
        }

        async fn incr(&self, key: &str) -> Result<u64, StoreError> {
            let mut inner = self.inner.write().await;
            let counter = inner.counters.entry(key.to_owned()).or_insert(0);
            *counter += 1;
            Ok(*counter)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn hash_fields_round_trip_and_empty_hashes_vanish() {
            let store = MemoryKeyValueStore::new();
            store.hset("h", "a", "1").await.unwrap();
            store
                .hset_multiple("h", &[("b".into(), "2".into())])
                .await
                .unwrap();

            assert_eq!(store.hget("h", "a").await.unwrap().as_deref(), Some("1"));
            assert_eq!(store.hgetall("h").await.unwrap().len(), 2);

            store.hdel("h", "a").await.unwrap();
            store.hdel("h", "b").await.unwrap();
            assert!(store.hgetall("h").await.unwrap().is_empty());
            assert_eq!(store.hget("missing", "a").await.unwrap(), None);
        }

        #[tokio::test]
        async fn incr_is_monotonic_per_key() {
            let store = MemoryKeyValueStore::new();
            assert_eq!(store.incr("c").await.unwrap(), 1);
            assert_eq!(store.incr("c").await.unwrap(), 2);
            assert_eq!(store.incr("other").await.unwrap(), 1);
        }

        #[tokio::test]
        async fn sets_ignore_duplicates() {
            let store = MemoryKeyValueStore::new();
            store.sadd("s", "x").await.unwrap();
            store.sadd("s", "x").await.unwrap();
            store.sadd("s", "y").await.unwrap();

            let mut members = store.smembers("s").await.unwrap();
            members.sort();
            assert_eq!(members, vec!["x".to_string(), "y".to_string()]);
        }
    }
}
