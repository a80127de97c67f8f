// Storage Interface - key/value persistence for whole JSON collections
// Every mutation rewrites the full collection under its key

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{AppError, AppResult};

pub const USERS_KEY: &str = "artshare_users";
pub const ARTWORKS_KEY: &str = "artshare_artworks";
pub const COMMENTS_KEY: &str = "artshare_comments";
pub const USER_LIKES_KEY: &str = "artshare_user_likes";
pub const CURRENT_USER_KEY: &str = "artshare_current_user";

/// Key/value store holding serialized collections
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> AppResult<()>;
    async fn remove(&self, key: &str) -> AppResult<()>;
    async fn keys(&self) -> AppResult<Vec<String>>;
}

/// Load a JSON collection, falling back to its default when the key is absent
pub async fn load_collection<T>(store: &dyn KeyValueStore, key: &str) -> AppResult<T>
where
    T: DeserializeOwned + Default,
{
    match store.get(key).await? {
        Some(raw) => serde_json::from_str(&raw).map_err(|e| {
            AppError::DeserializationError(format!("Failed to decode '{}': {}", key, e))
        }),
        None => {
            debug!("No value stored under '{}', starting empty", key);
            Ok(T::default())
        }
    }
}

/// Serialize and store a full collection
pub async fn save_collection<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> AppResult<()>
where
    T: Serialize + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|e| {
        AppError::SerializationError(format!("Failed to encode '{}': {}", key, e))
    })?;
    store.set(key, &raw).await
}

/// Process-local store, nothing survives a restart
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> AppResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn keys(&self) -> AppResult<Vec<String>> {
        let mut keys: Vec<String> = self.entries.read().await.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
