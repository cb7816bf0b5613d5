//! Revision protocol tests for the profile engine.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

mod common;

use lobby_profile::{ProfileError, REVISION_UNCHECKED};
use lobby_types::{ErrorKind, ProfileId};
use serde_json::{Value, json};

use common::{harness, noon};

#[tokio::test]
async fn every_successful_command_advances_revision_by_one() {
    let h = harness(0);
    let account = h.account("a").await;
    let start = h.profile(&account, ProfileId::Athena).await.rvn;

    let actions = [
        ("QueryProfile", Value::Null),
        ("SetBattleRoyaleBanner", json!({"homebaseBannerIconId": "i", "homebaseBannerColorId": "c"})),
        ("ClientQuestLogin", json!({})),
        ("EquipBattleRoyaleCustomization", json!({"slotName": "Character", "itemToSlot": ""})),
    ];
    for (step, (action, body)) in actions.into_iter().enumerate() {
        let response = h
            .engine
            .handle_at(&account, &ProfileId::Athena, action, body, None, noon(2))
            .await
            .unwrap();
        let expected = start + i64::try_from(step).unwrap() + 1;
        assert_eq!(response.profile_revision, expected, "after {action}");
        assert_eq!(response.profile_command_revision, expected);
        assert_eq!(response.profile_changes_base_revision, expected - 1);
        assert_eq!(response.response_version, 1);

        let stored = h.profile(&account, ProfileId::Athena).await;
        assert_eq!(stored.rvn, expected);
        assert_eq!(stored.command_revision, stored.rvn);
    }
}

#[tokio::test]
async fn unknown_action_is_a_no_op_that_still_bumps() {
    let h = harness(0);
    let account = h.account("a").await;
    let before = h.profile(&account, ProfileId::CommonCore).await;

    let response = h
        .engine
        .handle_at(&account, &ProfileId::CommonCore, "MarkItemSeen", json!({}), None, noon(2))
        .await
        .unwrap();

    assert!(response.profile_changes.is_empty());
    assert!(response.multi_update.is_empty());
    assert!(response.notifications.is_empty());
    let after = h.profile(&account, ProfileId::CommonCore).await;
    assert_eq!(after.rvn, before.rvn + 1);
    assert_eq!(after.items, before.items);
}

#[tokio::test]
async fn stale_query_revision_appends_full_profile() {
    let h = harness(0);
    let account = h.account("a").await;
    let current = h.profile(&account, ProfileId::CommonCore).await.rvn;

    let fresh = h
        .engine
        .handle_at(&account, &ProfileId::CommonCore, "Noop", json!({}), Some(current), noon(2))
        .await
        .unwrap();
    assert!(fresh.profile_changes.is_empty());

    let unchecked = h
        .engine
        .handle_at(&account, &ProfileId::CommonCore, "Noop", json!({}), Some(REVISION_UNCHECKED), noon(2))
        .await
        .unwrap();
    assert!(unchecked.profile_changes.is_empty());

    let stale = h
        .engine
        .handle_at(&account, &ProfileId::CommonCore, "Noop", json!({}), Some(0), noon(2))
        .await
        .unwrap();
    let json = serde_json::to_value(&stale.profile_changes).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["changeType"], "fullProfileUpdate");
}

#[tokio::test]
async fn missing_profile_is_not_found() {
    let h = harness(0);
    let result = h
        .engine
        .handle_at(&"ghost".into(), &ProfileId::Athena, "QueryProfile", Value::Null, None, noon(2))
        .await;
    assert!(matches!(result, Err(ref e) if e.kind() == ErrorKind::NotFound));
}

#[tokio::test]
async fn malformed_body_fails_before_any_change() {
    let h = harness(0);
    let account = h.account("a").await;
    let before = h.profile(&account, ProfileId::Athena).await;

    let result = h
        .engine
        .handle_at(&account, &ProfileId::Athena, "SetBattleRoyaleBanner", json!({"nope": 1}), None, noon(2))
        .await;
    assert!(matches!(result, Err(ProfileError::Validation(_))));
    assert_eq!(h.profile(&account, ProfileId::Athena).await, before);
}

#[tokio::test]
async fn query_common_core_grants_daily_reward_once_per_day() {
    let h = harness(100);
    let account = h.account("a").await;

    let first = h
        .engine
        .handle_at(&account, &ProfileId::CommonCore, "QueryProfile", Value::Null, None, noon(2))
        .await
        .unwrap();
    assert_eq!(h.balance(&account).await, 150);
    assert_eq!(first.profile_changes.len(), 1);
    let ledger = h.ledger(&account).await;
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger[0].entry_type, lobby_economy::EntryType::DailyGrant);
    assert_eq!(ledger[0].balance_after, 150);

    let common_core = h.profile(&account, ProfileId::CommonCore).await;
    assert_eq!(
        common_core.items.get(lobby_types::profile::CURRENCY_ITEM_ID).map(|i| i.quantity),
        Some(150)
    );
    let boxes: Vec<_> = common_core
        .items
        .values()
        .filter(|i| i.template_id == "GiftBox:gb_default")
        .collect();
    assert_eq!(boxes.len(), 1);
    let json = serde_json::to_value(&common_core).unwrap();
    assert_eq!(json["stats"]["attributes"]["gift_history"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["stats"]["attributes"]["allowed_to_send_gifts"], true);

    h.engine
        .handle_at(&account, &ProfileId::CommonCore, "QueryProfile", Value::Null, None, noon(2))
        .await
        .unwrap();
    assert_eq!(h.balance(&account).await, 150);

    h.engine
        .handle_at(&account, &ProfileId::CommonCore, "QueryProfile", Value::Null, None, noon(3))
        .await
        .unwrap();
    assert_eq!(h.balance(&account).await, 200);
}

#[tokio::test]
async fn query_athena_projects_loadouts_and_reports_active_locker() {
    let h = harness(0);
    let account = h.account("a").await;

    let response = h
        .engine
        .handle_at(&account, &ProfileId::Athena, "QueryProfile", Value::Null, None, noon(2))
        .await
        .unwrap();
    let changes = serde_json::to_value(&response.profile_changes).unwrap();
    assert_eq!(changes[0]["changeType"], "itemAttrChanged");
    assert_eq!(changes[0]["itemId"], "Default:CosmeticLocker");
    assert_eq!(changes[0]["attributeName"], "locker_slots_data");
    assert_eq!(changes[1]["changeType"], "fullProfileUpdate");
    assert_eq!(changes[1]["profile"]["stats"]["attributes"]["season_num"], 9);

    let athena = h.profile(&account, ProfileId::Athena).await;
    assert!(athena.items.contains_key("sandbox_loadout"));
    assert!(athena.items.contains_key("zombie_loadout"));
}

#[tokio::test]
async fn read_profile_does_not_persist() {
    let h = harness(0);
    let account = h.account("a").await;
    let before = h.profile(&account, ProfileId::Athena).await;

    let response = h
        .engine
        .read_profile(&account, &ProfileId::Athena)
        .await
        .unwrap();
    assert_eq!(response.profile_revision, before.rvn);
    assert_eq!(response.profile_changes.len(), 1);
    assert_eq!(h.profile(&account, ProfileId::Athena).await, before);
}

#[tokio::test]
async fn provisioning_twice_is_rejected() {
    let h = harness(0);
    let account = h.account("a").await;
    let again = h.engine.provision_at(&account, "a", noon(2)).await;
    assert!(matches!(again, Err(ProfileError::AlreadyProvisioned(_))));
}

#[tokio::test]
async fn remove_gift_box_accepts_batches() {
    let h = harness(0);
    let account = h.account("a").await;
    let mut common_core = h.profile(&account, ProfileId::CommonCore).await;
    for key in ["g1", "g2", "g3"] {
        common_core
            .items
            .insert(key.to_owned(), lobby_types::Item::granted("GiftBox:gb_default"));
    }
    h.documents
        .save(&lobby_store::DocumentKey::profile(&account, &ProfileId::CommonCore), &common_core)
        .await
        .unwrap();

    let response = h
        .engine
        .handle_at(
            &account,
            &ProfileId::CommonCore,
            "RemoveGiftBox",
            json!({"giftBoxItemIds": ["g1", "g2"], "giftBoxItemId": "missing"}),
            None,
            noon(2),
        )
        .await
        .unwrap();
    let changes = serde_json::to_value(&response.profile_changes).unwrap();
    assert_eq!(changes[0]["changeType"], "fullProfileUpdate");

    let after = h.profile(&account, ProfileId::CommonCore).await;
    assert!(!after.items.contains_key("g1"));
    assert!(!after.items.contains_key("g2"));
    assert!(after.items.contains_key("g3"));
}
