//! Per-document serialization points.
//!
//! Each `(account, profile)` document has an async mutex. A command takes
//! the mutexes of its whole lock scope in key order, so two commands whose
//! scopes overlap can never wait on each other in a cycle.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;

use lobby_store::DocumentKey;

/// Guards held for the duration of one command.
#[derive(Debug)]
pub struct ScopeGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

/// Table of per-document mutexes.
#[derive(Debug, Default)]
pub struct LockTable {
    locks: Mutex<HashMap<DocumentKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl LockTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock every key in `scope`, in order.
    pub async fn acquire(&self, scope: BTreeSet<DocumentKey>) -> ScopeGuard {
        let mutexes = self.mutexes(scope);
        let mut guards = Vec::with_capacity(mutexes.len());
        for mutex in mutexes {
            guards.push(mutex.lock_owned().await);
        }
        ScopeGuard { _guards: guards }
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no key is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn mutexes(&self, scope: BTreeSet<DocumentKey>) -> Vec<Arc<tokio::sync::Mutex<()>>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Idle entries are referenced only by the table.
        locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
        scope
            .into_iter()
            .map(|key| Arc::clone(locks.entry(key).or_default()))
            .collect()
    }
}
