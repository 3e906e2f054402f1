use std::sync::Arc;

use application::KeyValueStore;
use config::RedisConfig;
use thiserror::Error;

use crate::redis_store::RedisKeyValueStore;

#[derive(Debug, Error)]
pub enum InfrastructureError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

#[derive(Clone)]
pub struct Infrastructure {
    pub store: Arc<RedisKeyValueStore>,
}

impl Infrastructure {
    pub async fn connect(config: &RedisConfig) -> Result<Self, InfrastructureError> {
        let store = Arc::new(RedisKeyValueStore::connect(&config.url).await?);
        Ok(Self { store })
    }

    pub fn store_trait(&self) -> Arc<dyn KeyValueStore> {
        self.store.clone()
    }
}
