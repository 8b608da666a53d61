//! # Redis
//!
//! Persistent backend for contact requests.
//!
//! ## Requirements
//!
//! - One record per (campaign, KOL) pair
//! - Overwrite on re-request, last write wins
//! - Listing scans everything, volumes are small (one row per outreach)
//!
//! ## Implementation
//!
//! - Redis hash: 1 big key, then field-value pairs
//! - Field: `campaignId:kolId`, value: JSON record
//! - Upsert is a single `HSET`, so concurrent intakes resolve last-write-wins
//! - Withdraw is one Lua script (HGET, flip status, HSET), so a racing intake lands wholly before or
//!   after it and its snapshot fields are never overwritten with stale ones
//! - Filtering and ordering happen after `HGETALL`
use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use redis::{
    AsyncCommands, Client, Script,
    aio::{ConnectionManager, ConnectionManagerConfig},
};
use tracing::{debug, info};

use crate::{
    models::{ContactFilter, ContactRequest, ContactRequestKey, sort_newest_first},
    store::{ContactRequestStore, StoreError, StoreKind},
};

pub const CONTACT_REQUESTS_HASH: &str = "contact_requests";

/// KEYS[1] hash, ARGV[1] field, ARGV[2] RFC 3339 timestamp. Returns 1 when the status changed.
const WITHDRAW_SCRIPT: &str = r#"
local raw = redis.call('HGET', KEYS[1], ARGV[1])
if not raw then
    return 0
end

local record = cjson.decode(raw)
if record['status'] == 'withdrawn' then
    return 0
end

record['status'] = 'withdrawn'
record['withdrawn_at'] = ARGV[2]
redis.call('HSET', KEYS[1], ARGV[1], cjson.encode(record))

return 1
"#;

pub async fn init_redis(redis_url: &str) -> Result<ConnectionManager, StoreError> {
    let config = ConnectionManagerConfig::new()
        .set_number_of_retries(1)
        .set_connection_timeout(Duration::from_millis(100));

    let client = Client::open(redis_url)?;
    let connection_manager = client.get_connection_manager_with_config(config).await?;

    info!("Connected to Redis");

    Ok(connection_manager)
}

pub struct RedisStore {
    connection: ConnectionManager,
    hash: String,
    withdraw_script: Script,
}

impl RedisStore {
    pub fn new(connection: ConnectionManager) -> Self {
        Self::with_hash(connection, CONTACT_REQUESTS_HASH)
    }

    pub fn with_hash(connection: ConnectionManager, hash: &str) -> Self {
        Self {
            connection,
            hash: hash.to_string(),
            withdraw_script: Script::new(WITHDRAW_SCRIPT),
        }
    }

    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        Ok(Self::new(init_redis(redis_url).await?))
    }
}

fn encode(record: &ContactRequest) -> Result<String, StoreError> {
    serde_json::to_string(record).map_err(|source| StoreError::Corrupt {
        id: record.id.clone(),
        source,
    })
}

fn decode(id: &str, raw: &str) -> Result<ContactRequest, StoreError> {
    serde_json::from_str(raw).map_err(|source| StoreError::Corrupt {
        id: id.to_string(),
        source,
    })
}

#[async_trait]
impl ContactRequestStore for RedisStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Redis
    }

    async fn upsert(&self, record: ContactRequest) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();
        let payload = encode(&record)?;

        let _: () = connection
            .hset(&self.hash, record.key().to_string(), payload)
            .await?;

        Ok(())
    }

    async fn list(&self, filter: &ContactFilter) -> Result<Vec<ContactRequest>, StoreError> {
        let mut connection = self.connection.clone();
        let raw: HashMap<String, String> = connection.hgetall(&self.hash).await?;

        let mut matched = Vec::with_capacity(raw.len());
        for (id, value) in raw {
            let record = decode(&id, &value)?;

            if filter.matches(&record) {
                matched.push(record);
            }
        }

        sort_newest_first(&mut matched);

        Ok(matched)
    }

    async fn get(&self, key: &ContactRequestKey) -> Result<Option<ContactRequest>, StoreError> {
        let mut connection = self.connection.clone();
        let id = key.to_string();
        let raw: Option<String> = connection.hget(&self.hash, &id).await?;

        raw.map(|value| decode(&id, &value)).transpose()
    }

    async fn withdraw(
        &self,
        key: &ContactRequestKey,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();

        let changed: i32 = self
            .withdraw_script
            .key(&self.hash)
            .arg(key.to_string())
            .arg(at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            .invoke_async(&mut connection)
            .await?;

        if changed == 0 {
            debug!(id = %key, "Withdraw left record unchanged");
        }

        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut connection = self.connection.clone();

        let _: String = redis::cmd("PING").query_async(&mut connection).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::models::ContactStatus;

    async fn scratch_store(hash: &str) -> RedisStore {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".into());
        let connection = init_redis(&url).await.unwrap();
        let mut cleanup = connection.clone();
        let _: () = cleanup.del(hash).await.unwrap();

        RedisStore::with_hash(connection, hash)
    }

    fn request(kol_id: &str, secs: i64) -> ContactRequest {
        let key = ContactRequestKey::new("camp", kol_id);

        ContactRequest {
            id: key.to_string(),
            campaign_id: key.campaign_id,
            campaign_title: Some("Spring launch".to_string()),
            user_id: "biz".to_string(),
            kol_id: key.kol_id,
            kol_handle: None,
            kol_name: Some("Kol".to_string()),
            status: ContactStatus::InProgress,
            requested_at: Utc.timestamp_opt(secs, 0).unwrap(),
            withdrawn_at: None,
        }
    }

    #[tokio::test]
    #[ignore = "needs a running Redis at REDIS_URL"]
    async fn lifecycle_against_redis() {
        let store = scratch_store("contact_requests_test_lifecycle").await;
        let key = ContactRequestKey::new("camp", "a");

        store.ping().await.unwrap();
        store.upsert(request("a", 1)).await.unwrap();
        store.upsert(request("b", 2)).await.unwrap();

        let listed = store.list(&ContactFilter::default()).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["camp:b", "camp:a"]);

        let first = Utc.timestamp_opt(10, 0).unwrap();
        store.withdraw(&key, first).await.unwrap();
        store.withdraw(&key, Utc.timestamp_opt(20, 0).unwrap()).await.unwrap();
        store
            .withdraw(&ContactRequestKey::new("camp", "missing"), first)
            .await
            .unwrap();

        let withdrawn = store.get(&key).await.unwrap().unwrap();
        assert_eq!(withdrawn.withdrawn_at, Some(first));
        assert_eq!(store.list(&ContactFilter::default()).await.unwrap().len(), 1);

        store.upsert(request("a", 30)).await.unwrap();
        let relisted = store.list(&ContactFilter::default()).await.unwrap();
        assert_eq!(relisted[0].id, "camp:a");
        assert_eq!(relisted[0].status, ContactStatus::InProgress);
    }

    #[tokio::test]
    #[ignore = "needs a running Redis at REDIS_URL"]
    async fn withdraw_only_touches_status_fields() {
        let store = scratch_store("contact_requests_test_withdraw_fields").await;
        let key = ContactRequestKey::new("camp", "a");

        store.upsert(request("a", 1)).await.unwrap();

        let mut refreshed = request("a", 5);
        refreshed.user_id = "biz-2".to_string();
        refreshed.campaign_title = Some("Renamed".to_string());
        refreshed.kol_handle = Some("@renamed".to_string());
        store.upsert(refreshed.clone()).await.unwrap();

        let at = Utc.timestamp_opt(10, 0).unwrap();
        store.withdraw(&key, at).await.unwrap();

        let stored = store.get(&key).await.unwrap().unwrap();
        refreshed.status = ContactStatus::Withdrawn;
        refreshed.withdrawn_at = Some(at);
        assert_eq!(stored, refreshed);
    }

    #[tokio::test]
    #[ignore = "needs a running Redis at REDIS_URL"]
    async fn racing_intakes_keep_their_snapshots() {
        let store = std::sync::Arc::new(scratch_store("contact_requests_test_race").await);
        let key = ContactRequestKey::new("camp", "a");

        let mut tasks = Vec::new();
        for round in 0..50 {
            let store = store.clone();
            let key = key.clone();

            tasks.push(tokio::spawn(async move {
                let mut intake = request("a", round);
                intake.user_id = format!("biz-{round}");
                intake.campaign_title = Some(format!("title-{round}"));
                store.upsert(intake).await.unwrap();
                store
                    .withdraw(&key, Utc.timestamp_opt(1_000 + round, 0).unwrap())
                    .await
                    .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let stored = store.get(&key).await.unwrap().unwrap();
        let round = stored.user_id.trim_start_matches("biz-");
        assert_eq!(stored.campaign_title, Some(format!("title-{round}")));
        assert_eq!(stored.requested_at.timestamp().to_string(), round);
    }
}
