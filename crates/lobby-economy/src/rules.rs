//! Validation rules for purchases and gifts.
//!
//! Every check here runs before any document is touched, so a rejected
//! request has no side effects.

use std::collections::BTreeSet;

use lobby_types::{AccountId, LootItem, LootResult, ProfileDocument};

use crate::catalog::CatalogOffer;
use crate::error::EconomyError;

/// Validate a purchase of `offer` into `target`.
///
/// Checks run in a fixed order: ownership, then declared price, then funds.
pub fn check_purchase(
    offer: &CatalogOffer,
    target: &ProfileDocument,
    expected_total_price: u64,
    balance: u64,
) -> Result<(), EconomyError> {
    if let Some(template_id) = first_owned_grant(offer, target) {
        return Err(EconomyError::AlreadyOwned {
            template_id: template_id.to_owned(),
        });
    }
    if expected_total_price != offer.price {
        return Err(EconomyError::PriceMismatch {
            expected: expected_total_price,
            actual: offer.price,
        });
    }
    check_funds(balance, offer.price)
}

/// Fail with [`EconomyError::InsufficientFunds`] when `balance < price`.
pub const fn check_funds(balance: u64, price: u64) -> Result<(), EconomyError> {
    if balance < price {
        return Err(EconomyError::InsufficientFunds { balance, price });
    }
    Ok(())
}

/// Validate the recipient list and the sender's funds for a gift.
pub fn check_gift(
    offer: &CatalogOffer,
    sender: &AccountId,
    recipients: &[AccountId],
    balance: u64,
) -> Result<(), EconomyError> {
    if recipients.is_empty() {
        return Err(EconomyError::InvalidGift("no recipients".to_owned()));
    }
    if recipients.contains(sender) {
        return Err(EconomyError::InvalidGift(
            "sender cannot gift to themselves".to_owned(),
        ));
    }
    let unique: BTreeSet<&AccountId> = recipients.iter().collect();
    if unique.len() != recipients.len() {
        return Err(EconomyError::InvalidGift("duplicate recipient".to_owned()));
    }
    check_funds(balance, offer.price)
}

/// The first granted template already present in `profile`, if any.
pub fn first_owned_grant<'a>(offer: &'a CatalogOffer, profile: &ProfileDocument) -> Option<&'a str> {
    offer
        .item_grants
        .iter()
        .map(String::as_str)
        .find(|grant| profile.owns_any(&[*grant]))
}

/// Loot result listing every grant of `offer` as an athena item.
pub fn loot_result(offer: &CatalogOffer) -> LootResult {
    LootResult {
        items: offer
            .item_grants
            .iter()
            .map(|grant| LootItem::athena(grant))
            .collect(),
    }
}
