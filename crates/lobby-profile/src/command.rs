//! The closed set of profile commands.
//!
//! Clients name a command by its action string and send a JSON body. Parsing
//! happens before any lock is taken or document loaded, so a malformed body
//! is rejected with no side effects. Action names the engine does not know
//! parse to [`ProfileCommand::Unknown`], which runs the revision protocol as
//! a no-op.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use lobby_store::DocumentKey;
use lobby_types::{AccountId, ProfileId};

use crate::error::ProfileError;

/// One style change requested alongside an equip.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantUpdate {
    /// Channel to change.
    pub channel: String,
    /// New active tag.
    pub active: String,
}

/// Body of `PurchaseCatalogEntry`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    /// Offer to buy.
    pub offer_id: String,
    /// Price the client believes it is paying.
    pub expected_total_price: u64,
}

/// Body of `EquipBattleRoyaleCustomization`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipRequest {
    /// Slot name (`Character`, `Dance`, ...).
    pub slot_name: String,
    /// Template id to equip; empty unequips.
    #[serde(default)]
    pub item_to_slot: String,
    /// Sub-slot index for `Dance` and `ItemWrap`; `-1` fills every wrap.
    #[serde(default)]
    pub index_within_slot: i64,
    /// Style changes applied to the equipped item.
    #[serde(default)]
    pub variant_updates: Vec<VariantUpdate>,
}

/// Body of `SetBattleRoyaleBanner`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BannerRequest {
    /// Banner icon id.
    pub homebase_banner_icon_id: String,
    /// Banner color id.
    pub homebase_banner_color_id: String,
}

/// Body of `SetCosmeticLockerSlot`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockerSlotRequest {
    /// Slot category (`Character` or `AthenaCharacter` style).
    pub category: String,
    /// Locker item the client is editing; defaults to the active loadout.
    #[serde(default)]
    pub locker_item: String,
    /// Template id to equip; empty unequips.
    #[serde(default)]
    pub item_to_slot: String,
    /// Sub-slot index for `Dance` and `ItemWrap`; `-1` fills every wrap.
    #[serde(default)]
    pub slot_index: i64,
    /// Style changes applied to the equipped item.
    #[serde(default)]
    pub variant_updates: Vec<VariantUpdate>,
}

/// Body of `SetCosmeticLockerBanner`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockerBannerRequest {
    /// Banner icon template.
    pub banner_icon_template_name: String,
    /// Banner color template.
    pub banner_color_template_name: String,
    /// Loadout to edit.
    pub locker_name: String,
}

/// Body of `GiftCatalogEntry`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftRequest {
    /// Offer to gift.
    pub offer_id: String,
    /// Accounts receiving the offer.
    pub receiver_account_ids: Vec<AccountId>,
    /// Wrap template of the gift box.
    #[serde(default)]
    pub gift_wrap_template_id: String,
    /// Message shown when the box is opened.
    #[serde(default)]
    pub personal_message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoveGiftBoxRequest {
    #[serde(default)]
    gift_box_item_id: Option<String>,
    #[serde(default)]
    gift_box_item_ids: Vec<String>,
}

/// A parsed profile command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileCommand {
    /// Return the document, running the daily grant on `common_core`.
    QueryProfile,
    /// Buy an offer for the caller.
    PurchaseCatalogEntry(PurchaseRequest),
    /// Equip a cosmetic into the active loadout.
    EquipBattleRoyaleCustomization(EquipRequest),
    /// Change the profile banner.
    SetBattleRoyaleBanner(BannerRequest),
    /// Equip a cosmetic into the active and sandbox loadouts.
    SetCosmeticLockerSlot(LockerSlotRequest),
    /// Change a loadout's banner.
    SetCosmeticLockerBanner(LockerBannerRequest),
    /// Buy an offer for other accounts.
    GiftCatalogEntry(GiftRequest),
    /// Remove opened gift boxes by item key.
    RemoveGiftBox(Vec<String>),
    /// An action the engine does not implement.
    Unknown(String),
}

impl ProfileCommand {
    /// Parse an action name and its JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Validation`] if the body does not match the
    /// action's schema.
    pub fn parse(action: &str, body: Value) -> Result<Self, ProfileError> {
        Ok(match action {
            "QueryProfile" => Self::QueryProfile,
            "PurchaseCatalogEntry" => Self::PurchaseCatalogEntry(decode(action, body)?),
            "EquipBattleRoyaleCustomization" => {
                Self::EquipBattleRoyaleCustomization(decode(action, body)?)
            }
            "SetBattleRoyaleBanner" => Self::SetBattleRoyaleBanner(decode(action, body)?),
            "SetCosmeticLockerSlot" => Self::SetCosmeticLockerSlot(decode(action, body)?),
            "SetCosmeticLockerBanner" => Self::SetCosmeticLockerBanner(decode(action, body)?),
            "GiftCatalogEntry" => Self::GiftCatalogEntry(decode(action, body)?),
            "RemoveGiftBox" => {
                let request: RemoveGiftBoxRequest = decode(action, body)?;
                let mut ids = request.gift_box_item_ids;
                ids.extend(request.gift_box_item_id);
                if ids.is_empty() {
                    return Err(ProfileError::validation(
                        "RemoveGiftBox requires giftBoxItemId or giftBoxItemIds",
                    ));
                }
                Self::RemoveGiftBox(ids)
            }
            other => Self::Unknown(other.to_owned()),
        })
    }

    /// Short name used in logs and saga labels.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::QueryProfile => "QueryProfile",
            Self::PurchaseCatalogEntry(_) => "PurchaseCatalogEntry",
            Self::EquipBattleRoyaleCustomization(_) => "EquipBattleRoyaleCustomization",
            Self::SetBattleRoyaleBanner(_) => "SetBattleRoyaleBanner",
            Self::SetCosmeticLockerSlot(_) => "SetCosmeticLockerSlot",
            Self::SetCosmeticLockerBanner(_) => "SetCosmeticLockerBanner",
            Self::GiftCatalogEntry(_) => "GiftCatalogEntry",
            Self::RemoveGiftBox(_) => "RemoveGiftBox",
            Self::Unknown(_) => "Unknown",
        }
    }

    /// Every profile document the command may write.
    ///
    /// The engine locks the whole set, in key order, before loading anything.
    /// Account records are written only by commands holding the owner's
    /// `common_core` lock, so they need no key of their own.
    pub fn lock_scope(&self, account_id: &AccountId, profile_id: &ProfileId) -> BTreeSet<DocumentKey> {
        let mut scope = BTreeSet::new();
        scope.insert(DocumentKey::profile(account_id, profile_id));
        match self {
            Self::PurchaseCatalogEntry(_) => {
                scope.insert(DocumentKey::profile(account_id, &ProfileId::Athena));
            }
            Self::GiftCatalogEntry(request) => {
                for recipient in &request.receiver_account_ids {
                    scope.insert(DocumentKey::profile(recipient, &ProfileId::CommonCore));
                    scope.insert(DocumentKey::profile(recipient, &ProfileId::Athena));
                }
            }
            _ => {}
        }
        scope
    }
}

fn decode<T: DeserializeOwned>(action: &str, body: Value) -> Result<T, ProfileError> {
    serde_json::from_value(body)
        .map_err(|e| ProfileError::validation(format!("invalid {action} body: {e}")))
}
