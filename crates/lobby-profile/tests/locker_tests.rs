//! Locker, banner, and style tests for the profile engine.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use lobby_types::loadout::{SANDBOX_LOADOUT, ZOMBIE_LOADOUT};
use lobby_types::{AccountId, ErrorKind, ProfileId, ProfileResponse};
use serde_json::{Value, json};

use common::{Harness, harness, noon};

async fn athena(
    h: &Harness,
    account: &AccountId,
    action: &str,
    body: Value,
) -> Result<ProfileResponse, lobby_profile::ProfileError> {
    h.engine
        .handle_at(account, &ProfileId::Athena, action, body, None, noon(2))
        .await
}

#[tokio::test]
async fn equip_dance_writes_one_slot_and_reports_the_whole_stat() {
    let h = harness(0);
    let account = h.account("a").await;

    let response = athena(
        &h,
        &account,
        "EquipBattleRoyaleCustomization",
        json!({"slotName": "Dance", "itemToSlot": "AthenaDance:eid_floss", "indexWithinSlot": 2}),
    )
    .await
    .unwrap();
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["profileChanges"][0]["changeType"], "statModified");
    assert_eq!(json["profileChanges"][0]["name"], "favorite_dance");
    assert_eq!(json["profileChanges"][0]["value"][2], "AthenaDance:eid_floss");
    assert_eq!(json["profileChanges"][0]["value"][0], "");

    let loadout = h.loadout(&account, ZOMBIE_LOADOUT).await;
    let dance = &loadout.attributes.locker_slots_data.slots["Dance"];
    assert_eq!(dance.items[2], "AthenaDance:eid_floss");
    assert_eq!(dance.items.len(), 6);

    let doc = h.profile(&account, ProfileId::Athena).await;
    let stats = doc.athena_stats().unwrap();
    assert_eq!(stats.favorite_dance[2], "AthenaDance:eid_floss");
    assert_eq!(stats.last_applied_loadout, ZOMBIE_LOADOUT);
}

#[tokio::test]
async fn wrap_index_minus_one_fills_every_wrap_slot() {
    let h = harness(0);
    let account = h.account("a").await;

    athena(
        &h,
        &account,
        "EquipBattleRoyaleCustomization",
        json!({"slotName": "ItemWrap", "itemToSlot": "AthenaItemWrap:wrap_001", "indexWithinSlot": -1}),
    )
    .await
    .unwrap();

    let doc = h.profile(&account, ProfileId::Athena).await;
    let wraps = &doc.athena_stats().unwrap().favorite_itemwraps;
    assert_eq!(wraps.len(), 7);
    assert!(wraps.iter().all(|w| w == "AthenaItemWrap:wrap_001"));
}

#[tokio::test]
async fn bad_slot_or_index_is_a_validation_error_without_side_effects() {
    let h = harness(0);
    let account = h.account("a").await;
    let before = h.profile(&account, ProfileId::Athena).await;

    let unknown = athena(
        &h,
        &account,
        "EquipBattleRoyaleCustomization",
        json!({"slotName": "Hat", "itemToSlot": "x"}),
    )
    .await;
    assert!(matches!(unknown, Err(ref e) if e.kind() == ErrorKind::Validation));

    let out_of_range = athena(
        &h,
        &account,
        "EquipBattleRoyaleCustomization",
        json!({"slotName": "Dance", "itemToSlot": "x", "indexWithinSlot": 6}),
    )
    .await;
    assert!(matches!(out_of_range, Err(ref e) if e.kind() == ErrorKind::Validation));

    assert_eq!(h.profile(&account, ProfileId::Athena).await, before);
}

#[tokio::test]
async fn locker_slot_updates_active_and_sandbox_loadouts() {
    let h = harness(0);
    let account = h.account("a").await;

    let response = athena(
        &h,
        &account,
        "SetCosmeticLockerSlot",
        json!({
            "category": "Character",
            "lockerItem": "zombie_loadout",
            "itemToSlot": "AthenaCharacter:cid_001",
            "slotIndex": 0
        }),
    )
    .await
    .unwrap();

    for name in [ZOMBIE_LOADOUT, SANDBOX_LOADOUT] {
        let loadout = h.loadout(&account, name).await;
        assert_eq!(
            loadout.attributes.locker_slots_data.slots["Character"].items[0],
            "AthenaCharacter:cid_001"
        );
    }

    let json = serde_json::to_value(&response).unwrap();
    let last = json["profileChanges"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["changeType"], "itemAttrChanged");
    assert_eq!(last["itemId"], ZOMBIE_LOADOUT);
    assert_eq!(last["attributeName"], "locker_slots_data");
    assert_eq!(
        last["attributeValue"]["slots"]["Character"]["items"][0],
        "AthenaCharacter:cid_001"
    );

    let doc = h.profile(&account, ProfileId::Athena).await;
    assert_eq!(
        doc.athena_stats().unwrap().favorite_character,
        "AthenaCharacter:cid_001"
    );
    assert!(doc.items.contains_key(ZOMBIE_LOADOUT));
    assert!(doc.items.contains_key(SANDBOX_LOADOUT));
}

#[tokio::test]
async fn variant_updates_merge_by_channel_on_owned_items() {
    let h = harness(1000);
    let account = h.account("a").await;
    h.engine
        .handle_at(
            &account,
            &ProfileId::CommonCore,
            "PurchaseCatalogEntry",
            json!({"offerId": "skin_001", "expectedTotalPrice": 800}),
            None,
            noon(2),
        )
        .await
        .unwrap();

    let equip = |active: &'static str| {
        json!({
            "slotName": "Character",
            "itemToSlot": "skin_001",
            "variantUpdates": [{"channel": "Material", "active": active}]
        })
    };
    athena(&h, &account, "EquipBattleRoyaleCustomization", equip("Mat1"))
        .await
        .unwrap();
    let response = athena(&h, &account, "EquipBattleRoyaleCustomization", equip("Mat2"))
        .await
        .unwrap();

    let doc = h.profile(&account, ProfileId::Athena).await;
    let variants = &doc.items["skin_001"].attributes.variants;
    assert_eq!(variants.len(), 1);
    assert_eq!(variants[0].channel, "Material");
    assert_eq!(variants[0].active, "Mat2");
    assert_eq!(variants[0].owned, vec!["Mat2".to_owned()]);

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["profileChanges"][1]["changeType"], "itemAttrChanged");
    assert_eq!(json["profileChanges"][1]["attributeName"], "variants");

    let loadout = h.loadout(&account, ZOMBIE_LOADOUT).await;
    let selected = loadout.attributes.locker_slots_data.slots["Character"].active_variants[0]
        .clone()
        .unwrap();
    assert_eq!(selected.variants[0].active, "Mat2");
}

#[tokio::test]
async fn styles_on_unowned_items_are_rejected() {
    let h = harness(0);
    let account = h.account("a").await;
    let result = athena(
        &h,
        &account,
        "EquipBattleRoyaleCustomization",
        json!({
            "slotName": "Character",
            "itemToSlot": "AthenaCharacter:not_owned",
            "variantUpdates": [{"channel": "Material", "active": "Mat1"}]
        }),
    )
    .await;
    assert!(matches!(result, Err(ref e) if e.kind() == ErrorKind::Validation));
}

#[tokio::test]
async fn banners_update_stats_and_loadouts() {
    let h = harness(0);
    let account = h.account("a").await;

    let response = athena(
        &h,
        &account,
        "SetBattleRoyaleBanner",
        json!({"homebaseBannerIconId": "standardbanner1", "homebaseBannerColorId": "defaultcolor2"}),
    )
    .await
    .unwrap();
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["profileChanges"][0]["name"], "banner_icon");
    assert_eq!(json["profileChanges"][1]["value"], "defaultcolor2");
    let zombie = h.loadout(&account, ZOMBIE_LOADOUT).await;
    assert_eq!(zombie.attributes.banner_icon_template, "standardbanner1");

    let response = athena(
        &h,
        &account,
        "SetCosmeticLockerBanner",
        json!({
            "bannerIconTemplateName": "standardbanner7",
            "bannerColorTemplateName": "defaultcolor9",
            "lockerName": SANDBOX_LOADOUT
        }),
    )
    .await
    .unwrap();
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["profileChanges"][0]["itemId"], SANDBOX_LOADOUT);
    assert_eq!(json["profileChanges"][0]["attributeName"], "banner_icon_template");
    assert_eq!(json["profileChanges"][1]["attributeValue"], "defaultcolor9");

    let sandbox = h.loadout(&account, SANDBOX_LOADOUT).await;
    assert_eq!(sandbox.attributes.banner_icon_template, "standardbanner7");
    let doc = h.profile(&account, ProfileId::Athena).await;
    assert_eq!(doc.athena_stats().unwrap().banner_color, "defaultcolor9");
}

#[tokio::test]
async fn locker_banner_for_unknown_locker_is_not_found() {
    let h = harness(0);
    let account = h.account("a").await;
    let result = athena(
        &h,
        &account,
        "SetCosmeticLockerBanner",
        json!({
            "bannerIconTemplateName": "x",
            "bannerColorTemplateName": "y",
            "lockerName": "missing_loadout"
        }),
    )
    .await;
    assert!(matches!(result, Err(ref e) if e.kind() == ErrorKind::NotFound));
}
