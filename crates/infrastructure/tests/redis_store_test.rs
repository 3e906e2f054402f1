//! Redis 键值存储集成测试
//!
//! 需要本地 Redis：`cargo test -p infrastructure -- --ignored`

use std::sync::Arc;

use application::{KeyValueStore, MessageStore, PresenceDirectory};
use domain::{ConnectionId, Identity};
use infrastructure::RedisKeyValueStore;
use uuid::Uuid;

fn redis_url() -> String {
    std::env::var("CHATROOM_REDIS__URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn hash_and_set_commands_round_trip() {
    let store = RedisKeyValueStore::connect(&redis_url()).await.unwrap();
    let key = format!("test:{}", Uuid::new_v4());

    store.hset(&key, "a", "1").await.unwrap();
    store
        .hset_multiple(&key, &[("b".to_string(), "2".to_string())])
        .await
        .unwrap();
    assert_eq!(store.hget(&key, "a").await.unwrap().as_deref(), Some("1"));
    assert_eq!(store.hgetall(&key).await.unwrap().len(), 2);

    store.hdel(&key, "a").await.unwrap();
    store.hdel(&key, "b").await.unwrap();
    assert!(store.hgetall(&key).await.unwrap().is_empty());

    let set_key = format!("{key}:set");
    store.sadd(&set_key, "x").await.unwrap();
    store.sadd(&set_key, "x").await.unwrap();
    assert_eq!(store.smembers(&set_key).await.unwrap(), vec!["x".to_string()]);

    let counter = format!("{key}:count");
    assert_eq!(store.incr(&counter).await.unwrap(), 1);
    assert_eq!(store.incr(&counter).await.unwrap(), 2);
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn presence_and_history_work_over_redis() {
    let store: Arc<dyn KeyValueStore> =
        Arc::new(RedisKeyValueStore::connect(&redis_url()).await.unwrap());
    let presence = PresenceDirectory::new(store.clone());
    let messages = MessageStore::new(store, 200);

    let name = format!("user-{}", Uuid::new_v4());
    let identity = Identity::new("42", name.clone()).with_connection(ConnectionId::new());
    presence.admit(&identity).await.unwrap();
    assert!(presence.exists(&name.to_uppercase()).await.unwrap());

    let id = messages.append("now", Some(&name), "over redis").await.unwrap();
    let history = messages.list().await.unwrap();
    assert!(history.iter().any(|m| m.id == id && m.message == "over redis"));

    presence.remove(&name).await.unwrap();
    assert!(!presence.exists(&name).await.unwrap());
}
