//! 基础设施层实现。
//!
//! 提供基于 Redis 的共享键值存储，实现应用层定义的 `KeyValueStore` 接口。

pub mod builder;
pub mod redis_store;

pub use builder::{Infrastructure, InfrastructureError};
pub use redis_store::{map_redis_err, RedisKeyValueStore};
