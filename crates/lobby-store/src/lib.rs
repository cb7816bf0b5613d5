//! Document store collaborator for the lobby services.
//!
//! Profiles, loadouts, accounts, and currency ledgers are durable JSON documents addressed by
//! [`DocumentKey`]. Services only need `get`/`put` by key, expressed by the
//! [`DocumentStore`] trait, so the backend can be swapped between the
//! in-process [`MemoryStore`] and the `Dragonfly` backed [`DragonflyStore`].
//!
//! ```text
//! Profile engine
//!     |
//!     +-- SagaJournal (undo log) --> Documents (typed) --> dyn DocumentStore
//!                                                         |-- MemoryStore
//!                                                         +-- DragonflyStore
//! ```
//!
//! # Modules
//!
//! - [`key`] -- Document addressing
//! - [`memory`] -- In-process backend
//! - `faulty` -- Failure-injecting wrapper (`testing` feature)
//! - [`dragonfly`] -- `Dragonfly` (Redis-compatible) backend
//! - [`documents`] -- Typed load/save helpers
//! - [`saga`] -- Compensating multi-document write journal
//! - [`error`] -- Shared error types

pub mod documents;
pub mod dragonfly;
pub mod error;
#[cfg(any(test, feature = "testing"))]
pub mod faulty;
pub mod key;
pub mod memory;
pub mod saga;

use async_trait::async_trait;
use serde_json::Value;

pub use documents::Documents;
pub use dragonfly::DragonflyStore;
pub use error::StoreError;
pub use key::DocumentKey;
#[cfg(any(test, feature = "testing"))]
pub use faulty::FaultyStore;
pub use memory::MemoryStore;
pub use saga::SagaJournal;

/// Durable key/value storage of JSON documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read the document at `key`; `None` when absent.
    async fn get(&self, key: &DocumentKey) -> Result<Option<Value>, StoreError>;

    /// Replace the document at `key`.
    async fn put(&self, key: &DocumentKey, document: Value) -> Result<(), StoreError>;

    /// Remove the document at `key`. Removing an absent key succeeds.
    async fn delete(&self, key: &DocumentKey) -> Result<(), StoreError>;
}
