use std::sync::Arc;

use super::{
    config::Config,
    database::RedisStore,
    store::{ContactRequestStore, MemoryStore, StoreError, StoreKind},
};

pub struct State {
    pub config: Config,
    pub store: Arc<dyn ContactRequestStore>,
}

impl State {
    pub async fn new() -> Result<Arc<Self>, StoreError> {
        let config = Config::load();

        let store: Arc<dyn ContactRequestStore> = match config.store_backend {
            StoreKind::Memory => Arc::new(MemoryStore::new()),
            StoreKind::Redis => Arc::new(RedisStore::connect(&config.redis_url).await?),
        };

        Ok(Self::with_store(config, store))
    }

    pub fn with_store(config: Config, store: Arc<dyn ContactRequestStore>) -> Arc<Self> {
        Arc::new(Self { config, store })
    }
}
