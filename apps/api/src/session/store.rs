//! Persisted session identifiers (tokens, guest id, chat id, cached credits).
//!
//! The store is a capability injected into the bootstrap flow and the remote
//! client. Writes are last-writer-wins; nothing here is locked across calls.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    JwtToken,
    RefreshToken,
    TemporaryUserId,
    ChatId,
    CreditsRemaining,
    IsGuestSession,
}

impl StoreKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::JwtToken => "jwtToken",
            StoreKey::RefreshToken => "refreshToken",
            StoreKey::TemporaryUserId => "temporaryUserId",
            StoreKey::ChatId => "chatId",
            StoreKey::CreditsRemaining => "creditsRemaining",
            StoreKey::IsGuestSession => "isGuestSession",
        }
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: StoreKey) -> Result<Option<String>>;
    async fn set(&self, key: StoreKey, value: &str) -> Result<()>;
    async fn remove(&self, key: StoreKey) -> Result<()>;
}

/// Reads a key, treating store failures as absence.
pub async fn read(store: &dyn SessionStore, key: StoreKey) -> Option<String> {
    match store.get(key).await {
        Ok(value) => value.filter(|v| !v.is_empty()),
        Err(e) => {
            warn!("Session store read of '{}' failed: {e}", key.as_str());
            None
        }
    }
}

/// Writes a key, logging instead of failing. Persistence is best-effort.
pub async fn write(store: &dyn SessionStore, key: StoreKey, value: &str) {
    if let Err(e) = store.set(key, value).await {
        warn!("Session store write of '{}' failed: {e}", key.as_str());
    }
}

pub async fn forget(store: &dyn SessionStore, key: StoreKey) {
    if let Err(e) = store.remove(key).await {
        warn!("Session store removal of '{}' failed: {e}", key.as_str());
    }
}

/// Process-local store. Default when no Redis URL is configured.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<StoreKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, key: StoreKey) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("session store lock poisoned"))?;
        Ok(entries.get(&key).cloned())
    }

    async fn set(&self, key: StoreKey, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("session store lock poisoned"))?;
        entries.insert(key, value.to_string());
        Ok(())
    }

    async fn remove(&self, key: StoreKey) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("session store lock poisoned"))?;
        entries.remove(&key);
        Ok(())
    }
}

/// Redis-backed store so identifiers survive a restart of the host.
pub struct RedisStore {
    client: redis::Client,
    prefix: String,
}

impl RedisStore {
    pub fn new(client: redis::Client, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
        }
    }

    fn key(&self, key: StoreKey) -> String {
        format!("{}:{}", self.prefix, key.as_str())
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn get(&self, key: StoreKey) -> Result<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = conn.get(self.key(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: StoreKey, value: &str) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set::<_, _, ()>(self.key(key), value).await?;
        Ok(())
    }

    async fn remove(&self, key: StoreKey) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del::<_, ()>(self.key(key)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get(StoreKey::ChatId).await.unwrap(), None);

        store.set(StoreKey::ChatId, "c-1").await.unwrap();
        assert_eq!(
            store.get(StoreKey::ChatId).await.unwrap().as_deref(),
            Some("c-1")
        );

        store.set(StoreKey::ChatId, "c-2").await.unwrap();
        assert_eq!(read(&store, StoreKey::ChatId).await.as_deref(), Some("c-2"));

        store.remove(StoreKey::ChatId).await.unwrap();
        assert_eq!(read(&store, StoreKey::ChatId).await, None);
    }

    #[tokio::test]
    async fn test_read_treats_empty_value_as_absent() {
        let store = MemoryStore::new();
        write(&store, StoreKey::JwtToken, "").await;
        assert_eq!(read(&store, StoreKey::JwtToken).await, None);
    }

    #[test]
    fn test_redis_keys_are_prefixed() {
        let client = redis::Client::open("redis://127.0.0.1/").unwrap();
        let store = RedisStore::new(client, "resume-chat");
        assert_eq!(store.key(StoreKey::TemporaryUserId), "resume-chat:temporaryUserId");
    }
}
