//! Compensating transaction boundary for multi-document writes.
//!
//! A [`SagaJournal`] records the prior contents of every key the first time it
//! is written. If a later step fails, [`SagaJournal::compensate`] restores the
//! recorded documents in reverse write order so that a command touching
//! several documents either lands completely or leaves the store as it was.
//!
//! Compensation is best-effort: a restore that fails is logged and skipped,
//! and the remaining restores still run.

use serde::Serialize;
use serde_json::Value;

use crate::documents::Documents;
use crate::error::StoreError;
use crate::key::DocumentKey;

/// Journal of writes performed by one command.
#[derive(Debug)]
pub struct SagaJournal<'a> {
    documents: &'a Documents,
    label: &'static str,
    prior: Vec<(DocumentKey, Option<Value>)>,
}

impl<'a> SagaJournal<'a> {
    /// Open a journal for the command named `label`.
    pub fn begin(documents: &'a Documents, label: &'static str) -> Self {
        Self {
            documents,
            label,
            prior: Vec::new(),
        }
    }

    /// Write `document` at `key`, remembering the previous contents of `key`
    /// the first time it is touched.
    pub async fn save<T: Serialize + Sync>(
        &mut self,
        key: &DocumentKey,
        document: &T,
    ) -> Result<(), StoreError> {
        let value = serde_json::to_value(document)?;
        if !self.prior.iter().any(|(k, _)| k == key) {
            let previous = self.documents.store().get(key).await?;
            self.prior.push((key.clone(), previous));
        }
        self.documents.store().put(key, value).await
    }

    /// Number of distinct keys written so far.
    pub fn touched(&self) -> usize {
        self.prior.len()
    }

    /// Finish successfully, discarding the undo records.
    pub fn commit(self) -> usize {
        let touched = self.prior.len();
        tracing::debug!(saga = self.label, touched, "Saga committed");
        touched
    }

    /// Undo every recorded write in reverse order.
    ///
    /// Returns the number of keys successfully restored.
    pub async fn compensate(self) -> usize {
        let store = self.documents.store();
        let mut restored: usize = 0;
        for (key, previous) in self.prior.into_iter().rev() {
            let outcome = match previous {
                Some(value) => store.put(&key, value).await,
                None => store.delete(&key).await,
            };
            match outcome {
                Ok(()) => restored = restored.saturating_add(1),
                Err(e) => {
                    tracing::error!(
                        saga = self.label,
                        key = %key,
                        error = %e,
                        "Compensating restore failed"
                    );
                }
            }
        }
        tracing::warn!(saga = self.label, restored, "Saga compensated");
        restored
    }
}
