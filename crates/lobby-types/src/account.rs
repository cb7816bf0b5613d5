//! Player account record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::AccountId;

/// A player account as seen by the profile and party services.
///
/// Accounts are issued by the authentication collaborator; this crate only
/// reads and updates the fields the economy needs. The currency balance is
/// authoritative here and mirrored into the `common_core` profile's
/// [`CURRENCY_ITEM_ID`](crate::profile::CURRENCY_ITEM_ID) item on every change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account identifier.
    pub account_id: AccountId,
    /// Display name shown to other players.
    pub display_name: String,
    /// Premium currency balance.
    pub balance: u64,
    /// Time of the last daily-grant-eligible login, if any.
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

impl Account {
    /// Create a new account with the given starting balance.
    pub fn new(account_id: AccountId, display_name: impl Into<String>, balance: u64) -> Self {
        Self {
            account_id,
            display_name: display_name.into(),
            balance,
            last_login: None,
        }
    }
}
