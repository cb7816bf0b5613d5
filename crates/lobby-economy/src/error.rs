//! Error types for the economy crate.

use lobby_types::ErrorKind;

/// Errors produced while validating or applying an economy transaction.
#[derive(Debug, thiserror::Error)]
pub enum EconomyError {
    /// No catalog offer has the requested id.
    #[error("offer not found: {0}")]
    OfferNotFound(String),

    /// The target profile already holds a granted template.
    #[error("already owns {template_id}")]
    AlreadyOwned {
        /// The first granted template found in the profile.
        template_id: String,
    },

    /// The client-declared price differs from the catalog price.
    #[error("price mismatch: client expected {expected}, server price is {actual}")]
    PriceMismatch {
        /// Price declared by the client.
        expected: u64,
        /// Price in the catalog.
        actual: u64,
    },

    /// The balance cannot cover the price.
    #[error("insufficient funds: balance {balance}, price {price}")]
    InsufficientFunds {
        /// Current balance.
        balance: u64,
        /// Price to pay.
        price: u64,
    },

    /// A gift request is malformed (no recipients, self-gift, duplicates).
    #[error("invalid gift: {0}")]
    InvalidGift(String),

    /// A credit would overflow the balance.
    #[error("balance overflow crediting {amount}")]
    BalanceOverflow {
        /// Amount being credited.
        amount: u64,
    },

    /// A ledger entry was built without a required field.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// Reading the catalog file failed.
    #[error("catalog I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The catalog file is not valid JSON.
    #[error("catalog parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl EconomyError {
    /// Client-facing error kind.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::OfferNotFound(_) => ErrorKind::NotFound,
            Self::AlreadyOwned { .. } => ErrorKind::AlreadyOwned,
            Self::PriceMismatch { .. } => ErrorKind::PriceMismatch,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::InvalidGift(_) => ErrorKind::Validation,
            Self::BalanceOverflow { .. }
            | Self::MissingField(_)
            | Self::Io(_)
            | Self::Parse(_) => ErrorKind::Internal,
        }
    }
}
