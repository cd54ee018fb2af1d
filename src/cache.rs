//! Room-scoped side-state cache
//!
//! `CacheStore` mirrors the external key-value collaborator: get,
//! set-with-expiry, delete. `RoomCache` layers the room policy on top of it:
//! MOTD key naming and the fixed 12-hour lifetime.

use crate::error::Result;
use async_trait::async_trait;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// MOTD lifetime: 12 hours, restarted on every write
pub const MOTD_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// Ephemeral key-value store
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a value; `None` when the key is absent or expired
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value that expires after `ttl`, replacing any prior value
    /// and its remaining lifetime
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Delete a key; deleting an absent key is not an error
    async fn del(&self, key: &str) -> Result<()>;
}

/// Redis-backed store
pub struct RedisStore {
    connection: redis::aio::ConnectionManager,
}

impl RedisStore {
    /// Connect to Redis behind a connection manager (reconnects on failure)
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let connection = client.get_connection_manager().await?;
        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut connection = self.connection.clone();
        Ok(connection.get(key).await?)
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut connection = self.connection.clone();
        let _: () = connection.set_ex(key, value, ttl.as_secs()).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut connection = self.connection.clone();
        let _: () = connection.del(key).await?;
        Ok(())
    }
}

/// In-process store with per-key deadlines, for development and tests
///
/// Expired entries are filtered on read; they linger in the map until
/// overwritten or deleted, which is fine at the scale this backend serves.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, (String, Instant)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some((value, deadline)) if *deadline > Instant::now() => Ok(Some(value.clone())),
            _ => Ok(None),
        }
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Room-scoped MOTD state on top of a [`CacheStore`]
#[derive(Clone)]
pub struct RoomCache {
    store: Arc<dyn CacheStore>,
}

impl RoomCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    fn motd_key(room: &str) -> String {
        format!("motd{}", room)
    }

    /// Current MOTD for a room, if one is set and unexpired
    pub async fn get_motd(&self, room: &str) -> Result<Option<String>> {
        self.store.get(&Self::motd_key(room)).await
    }

    /// Store the MOTD, restarting its lifetime
    pub async fn set_motd(&self, room: &str, text: &str) -> Result<()> {
        self.store.set_ex(&Self::motd_key(room), text, MOTD_TTL).await
    }

    /// Drop the MOTD; used on session teardown
    pub async fn clear_motd(&self, room: &str) -> Result<()> {
        self.store.del(&Self::motd_key(room)).await
    }
}
