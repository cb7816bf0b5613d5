//! Error types for the profile engine.

use lobby_economy::EconomyError;
use lobby_store::StoreError;
use lobby_types::{AccountId, ErrorKind};

/// Errors that abort a profile command.
///
/// Any error returned by the engine means no document was left changed: the
/// command either failed before writing or its writes were compensated.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// A profile, loadout, or account document is missing.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request body or target profile is invalid for the command.
    #[error("invalid request: {0}")]
    Validation(String),

    /// Provisioning was requested for an existing account.
    #[error("account already provisioned: {0}")]
    AlreadyProvisioned(AccountId),

    /// A purchase or gift rule rejected the request.
    #[error(transparent)]
    Economy(#[from] EconomyError),

    /// The document store failed.
    #[error("store error: {0}")]
    Store(StoreError),

    /// A document could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for ProfileError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::KeyNotFound(key) => Self::NotFound(key),
            StoreError::Serialization(e) => Self::Serialization(e),
            other => Self::Store(other),
        }
    }
}

impl ProfileError {
    /// Client-facing error kind.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::AlreadyProvisioned(_) => ErrorKind::AlreadyOwned,
            Self::Economy(e) => e.kind(),
            Self::Store(_) | Self::Serialization(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}
