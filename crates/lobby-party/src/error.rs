//! Error types for the party coordinator.

use lobby_types::{AccountId, ErrorKind, PartyId};

/// Errors from party operations.
#[derive(Debug, thiserror::Error)]
pub enum PartyError {
    /// No live party has this id.
    #[error("party not found: {0}")]
    PartyNotFound(PartyId),

    /// The party exists but the account is not a member.
    #[error("account {account_id} is not a member of party {party_id}")]
    MemberNotFound {
        /// Party searched.
        party_id: PartyId,
        /// Account searched for.
        account_id: AccountId,
    },

    /// The account is not in any party.
    #[error("account {0} is not in a party")]
    NoParty(AccountId),

    /// The account must leave its current party before joining another.
    #[error("account {account_id} is already in party {party_id}")]
    AlreadyInParty {
        /// Joining account.
        account_id: AccountId,
        /// Party it is still indexed to.
        party_id: PartyId,
    },

    /// A derived meta blob could not be encoded.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PartyError {
    /// Client-facing kind of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::PartyNotFound(_) | Self::MemberNotFound { .. } | Self::NoParty(_) => {
                ErrorKind::NotFound
            }
            Self::AlreadyInParty { .. } => ErrorKind::Validation,
            Self::Serialization(_) => ErrorKind::Internal,
        }
    }
}
