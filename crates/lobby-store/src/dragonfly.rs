//! `Dragonfly` (Redis-compatible) document store backend.
//!
//! Documents are stored as JSON strings under the keys rendered by
//! [`DocumentKey`](crate::DocumentKey).

use async_trait::async_trait;
use fred::prelude::*;
use serde_json::Value;

use crate::error::StoreError;
use crate::key::DocumentKey;
use crate::DocumentStore;

/// Connection handle to a `Dragonfly` (Redis-compatible) instance.
#[derive(Clone)]
pub struct DragonflyStore {
    client: Client,
}

impl DragonflyStore {
    /// Connect to `Dragonfly` at the given URL.
    ///
    /// The URL should follow the Redis URL scheme:
    /// `redis://host:port` or `redis://host:port/db`
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Config`] if the URL cannot be parsed.
    /// Returns [`StoreError::Dragonfly`] if the connection fails.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let config = Config::from_url(url)
            .map_err(|e| StoreError::Config(format!("Invalid Dragonfly URL: {e}")))?;

        let client = Builder::from_config(config).build()?;
        client.init().await?;

        tracing::info!("Connected to Dragonfly");
        Ok(Self { client })
    }
}

#[async_trait]
impl DocumentStore for DragonflyStore {
    async fn get(&self, key: &DocumentKey) -> Result<Option<Value>, StoreError> {
        let value: Option<String> = self.client.get(key.to_string()).await?;
        value
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn put(&self, key: &DocumentKey, document: Value) -> Result<(), StoreError> {
        let json = serde_json::to_string(&document)?;
        let _: () = self
            .client
            .set(key.to_string(), json.as_str(), None, None, false)
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &DocumentKey) -> Result<(), StoreError> {
        let _: u32 = self.client.del(key.to_string()).await?;
        Ok(())
    }
}
