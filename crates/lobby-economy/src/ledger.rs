//! Currency ledger entries.
//!
//! Every balance movement goes through a [`CurrencyTransaction`], which
//! validates the amount, applies checked arithmetic to the [`Account`], and
//! produces a [`CurrencyEntry`] describing the movement, which callers
//! persist to the account's ledger. The direction of a
//! movement is fixed by its [`EntryType`]:
//!
//! | Type | Direction |
//! |------|-----------|
//! | Purchase | Debit |
//! | Gift | Debit |
//! | DailyGrant | Credit |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lobby_types::{Account, AccountId};

use crate::error::EconomyError;

// ---------------------------------------------------------------------------
// Entry types
// ---------------------------------------------------------------------------

/// Why a balance moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Storefront purchase for the buyer.
    Purchase,
    /// Storefront purchase sent to other accounts.
    Gift,
    /// Once-per-day login reward.
    DailyGrant,
}

/// Side of the account a movement lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Balance decreases.
    Debit,
    /// Balance increases.
    Credit,
}

impl EntryType {
    /// The direction every entry of this type moves in.
    pub const fn direction(self) -> Direction {
        match self {
            Self::Purchase | Self::Gift => Direction::Debit,
            Self::DailyGrant => Direction::Credit,
        }
    }
}

/// An applied balance movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyEntry {
    /// Entry id.
    pub id: Uuid,
    /// Account whose balance moved.
    pub account_id: AccountId,
    /// Why it moved.
    pub entry_type: EntryType,
    /// Amount moved.
    pub amount: u64,
    /// Balance before the movement.
    pub balance_before: u64,
    /// Balance after the movement.
    pub balance_after: u64,
    /// Offer id or other reference.
    pub reference: Option<String>,
    /// When the movement was applied.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Transaction builder
// ---------------------------------------------------------------------------

/// Builder for a validated balance movement.
#[derive(Debug)]
pub struct CurrencyTransaction {
    entry_type: EntryType,
    amount: Option<u64>,
    reference: Option<String>,
}

impl CurrencyTransaction {
    /// Start a movement of the given type.
    pub const fn new(entry_type: EntryType) -> Self {
        Self {
            entry_type,
            amount: None,
            reference: None,
        }
    }

    /// Set the amount.
    #[must_use]
    pub const fn amount(mut self, amount: u64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Attach a reference (offer id, gift id).
    #[must_use]
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    /// Apply the movement to `account`.
    ///
    /// A zero amount is a valid no-op movement (free offers). The account is
    /// left untouched on error.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::MissingField`] if no amount was set.
    /// Returns [`EconomyError::InsufficientFunds`] if a debit exceeds the
    /// balance, and [`EconomyError::BalanceOverflow`] if a credit overflows.
    pub fn apply(
        self,
        account: &mut Account,
        now: DateTime<Utc>,
    ) -> Result<CurrencyEntry, EconomyError> {
        let amount = self.amount.ok_or(EconomyError::MissingField("amount"))?;
        let before = account.balance;
        let after = match self.entry_type.direction() {
            Direction::Debit => before
                .checked_sub(amount)
                .ok_or(EconomyError::InsufficientFunds {
                    balance: before,
                    price: amount,
                })?,
            Direction::Credit => before
                .checked_add(amount)
                .ok_or(EconomyError::BalanceOverflow { amount })?,
        };
        account.balance = after;

        Ok(CurrencyEntry {
            id: Uuid::now_v7(),
            account_id: account.account_id.clone(),
            entry_type: self.entry_type,
            amount,
            balance_before: before,
            balance_after: after,
            reference: self.reference,
            created_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(balance: u64) -> Account {
        Account::new(AccountId::from("a"), "A", balance)
    }

    #[test]
    fn purchase_debits_and_records_both_balances() {
        let mut acc = account(1000);
        let entry = CurrencyTransaction::new(EntryType::Purchase)
            .amount(800)
            .reference("skin_001")
            .apply(&mut acc, Utc::now());
        assert!(entry.is_ok());
        if let Ok(entry) = entry {
            assert_eq!(entry.balance_before, 1000);
            assert_eq!(entry.balance_after, 200);
            assert_eq!(entry.reference.as_deref(), Some("skin_001"));
        }
        assert_eq!(acc.balance, 200);
    }

    #[test]
    fn overdraft_leaves_balance_untouched() {
        let mut acc = account(10);
        let result = CurrencyTransaction::new(EntryType::Gift)
            .amount(11)
            .apply(&mut acc, Utc::now());
        assert!(matches!(result, Err(EconomyError::InsufficientFunds { .. })));
        assert_eq!(acc.balance, 10);
    }

    #[test]
    fn daily_grant_credits_and_detects_overflow() {
        let mut acc = account(5);
        assert!(
            CurrencyTransaction::new(EntryType::DailyGrant)
                .amount(50)
                .apply(&mut acc, Utc::now())
                .is_ok()
        );
        assert_eq!(acc.balance, 55);

        let mut full = account(u64::MAX);
        let result = CurrencyTransaction::new(EntryType::DailyGrant)
            .amount(1)
            .apply(&mut full, Utc::now());
        assert!(matches!(result, Err(EconomyError::BalanceOverflow { amount: 1 })));
    }

    #[test]
    fn missing_amount_is_rejected() {
        let mut acc = account(5);
        let result = CurrencyTransaction::new(EntryType::Purchase).apply(&mut acc, Utc::now());
        assert!(matches!(result, Err(EconomyError::MissingField("amount"))));
    }
}
