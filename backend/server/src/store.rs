//! # Contact Request Store
//!
//! Persistence contract shared by every backend.
//!
//! - `upsert`: insert or fully overwrite by key, last write wins
//! - `list`: non-withdrawn records matching the filter, newest first
//! - `withdraw`: idempotent, missing keys are a silent no-op
//!
//! Backends
//! - [`MemoryStore`]: process-local map, tests and local runs
//! - [`RedisStore`](crate::database::RedisStore): Redis hash, deployments
use std::{collections::HashMap, fmt};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::{ContactFilter, ContactRequest, ContactRequestKey, sort_newest_first};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Corrupt record {id}: {source}")]
    Corrupt {
        id: String,
        source: serde_json::Error,
    },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Memory,
    Redis,
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKind::Memory => write!(f, "memory"),
            StoreKind::Redis => write!(f, "redis"),
        }
    }
}

impl std::str::FromStr for StoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreKind::Memory),
            "redis" => Ok(StoreKind::Redis),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

#[async_trait]
pub trait ContactRequestStore: Send + Sync {
    fn kind(&self) -> StoreKind;

    async fn upsert(&self, record: ContactRequest) -> Result<(), StoreError>;

    async fn list(&self, filter: &ContactFilter) -> Result<Vec<ContactRequest>, StoreError>;

    async fn get(&self, key: &ContactRequestKey) -> Result<Option<ContactRequest>, StoreError>;

    /// Idempotent, a missing key is not an error.
    async fn withdraw(
        &self,
        key: &ContactRequestKey,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<ContactRequestKey, ContactRequest>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContactRequestStore for MemoryStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Memory
    }

    async fn upsert(&self, record: ContactRequest) -> Result<(), StoreError> {
        self.records.write().await.insert(record.key(), record);

        Ok(())
    }

    async fn list(&self, filter: &ContactFilter) -> Result<Vec<ContactRequest>, StoreError> {
        let mut matched: Vec<ContactRequest> = self
            .records
            .read()
            .await
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();

        sort_newest_first(&mut matched);

        Ok(matched)
    }

    async fn get(&self, key: &ContactRequestKey) -> Result<Option<ContactRequest>, StoreError> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn withdraw(
        &self,
        key: &ContactRequestKey,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        if let Some(record) = self.records.write().await.get_mut(key) {
            record.withdraw(at);
        }

        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
