//! Failure-injecting store wrapper for compensation tests.
//!
//! Only compiled for this crate's tests or with the `testing` feature, which
//! dependents enable from `[dev-dependencies]`.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::key::DocumentKey;
use crate::memory::MemoryStore;
use crate::DocumentStore;

/// A [`MemoryStore`] that rejects writes to keys with a configured prefix.
///
/// Test double for failure injection; reads always succeed.
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: MemoryStore,
    failing_prefix: Mutex<Option<String>>,
}

impl FaultyStore {
    /// Create a store that currently fails nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every subsequent `put` whose rendered key starts with `prefix`.
    pub fn fail_puts_with_prefix(&self, prefix: impl Into<String>) {
        *self
            .failing_prefix
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(prefix.into());
    }

    /// Stop injecting failures.
    pub fn heal(&self) {
        *self
            .failing_prefix
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn should_fail(&self, key: &DocumentKey) -> bool {
        self.failing_prefix
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_deref()
            .is_some_and(|prefix| key.to_string().starts_with(prefix))
    }
}

#[async_trait]
impl DocumentStore for FaultyStore {
    async fn get(&self, key: &DocumentKey) -> Result<Option<Value>, StoreError> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &DocumentKey, document: Value) -> Result<(), StoreError> {
        if self.should_fail(key) {
            return Err(StoreError::Backend {
                key: key.to_string(),
                message: "injected write failure".to_owned(),
            });
        }
        self.inner.put(key, document).await
    }

    async fn delete(&self, key: &DocumentKey) -> Result<(), StoreError> {
        self.inner.delete(key).await
    }
}
