//! Typed access to the document store.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::DocumentStore;
use crate::error::StoreError;
use crate::key::DocumentKey;

/// Shared handle that (de)serializes records on top of a [`DocumentStore`].
#[derive(Clone)]
pub struct Documents {
    store: Arc<dyn DocumentStore>,
}

impl Documents {
    /// Wrap a store backend.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// The underlying backend.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Read and deserialize the document at `key`, if present.
    pub async fn load<T: DeserializeOwned>(
        &self,
        key: &DocumentKey,
    ) -> Result<Option<T>, StoreError> {
        self.store
            .get(key)
            .await?
            .map(serde_json::from_value)
            .transpose()
            .map_err(StoreError::from)
    }

    /// Read the document at `key`, failing with [`StoreError::KeyNotFound`]
    /// when it is absent.
    pub async fn require<T: DeserializeOwned>(&self, key: &DocumentKey) -> Result<T, StoreError> {
        self.load(key)
            .await?
            .ok_or_else(|| StoreError::KeyNotFound(key.to_string()))
    }

    /// Serialize and write `document` at `key` outside any saga.
    pub async fn save<T: Serialize + Sync>(
        &self,
        key: &DocumentKey,
        document: &T,
    ) -> Result<(), StoreError> {
        let value = serde_json::to_value(document)?;
        self.store.put(key, value).await
    }
}

impl core::fmt::Debug for Documents {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Documents").finish_non_exhaustive()
    }
}
