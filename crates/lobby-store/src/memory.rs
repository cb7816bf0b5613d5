//! In-memory document store backend.
//!
//! [`MemoryStore`] is the default backend for single-process deployments and
//! tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::key::DocumentKey;
use crate::DocumentStore;

/// A process-local document store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, key: &DocumentKey) -> Result<Option<Value>, StoreError> {
        Ok(self.documents.read().await.get(&key.to_string()).cloned())
    }

    async fn put(&self, key: &DocumentKey, document: Value) -> Result<(), StoreError> {
        self.documents.write().await.insert(key.to_string(), document);
        Ok(())
    }

    async fn delete(&self, key: &DocumentKey) -> Result<(), StoreError> {
        self.documents.write().await.remove(&key.to_string());
        Ok(())
    }
}
