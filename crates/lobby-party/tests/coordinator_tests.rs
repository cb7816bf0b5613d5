//! Party coordinator behaviour tests.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::{Arc, Mutex};

use lobby_party::{
    CreatePartyRequest, JoinRequest, MetaPatch, PartyCoordinator, PatchPartyRequest,
};
use lobby_types::party::{META_JOIN_REQUEST_USERS, META_SQUAD_ASSIGNMENTS};
use lobby_types::{AccountId, Delivery, ErrorKind, Joinability, Notifier, Role};
use serde_json::{Value, json};

/// Records messages for connected accounts; everyone else is absent.
#[derive(Default)]
struct Recorder {
    connected: Mutex<Vec<AccountId>>,
    sent: Mutex<Vec<(AccountId, Value)>>,
}

impl Recorder {
    fn connect(&self, id: &str) {
        self.connected.lock().unwrap().push(AccountId::from(id));
    }

    fn types_for(&self, id: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| a.as_str() == id)
            .map(|(_, m)| m["type"].as_str().unwrap().rsplit('.').next().unwrap().to_owned())
            .collect()
    }

    fn last_for(&self, id: &str) -> Value {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(a, _)| a.as_str() == id)
            .map(|(_, m)| m.clone())
            .unwrap()
    }
}

impl Notifier for Recorder {
    fn notify(&self, account_id: &AccountId, message: Value) -> Delivery {
        if !self.connected.lock().unwrap().contains(account_id) {
            return Delivery::Absent;
        }
        self.sent.lock().unwrap().push((account_id.clone(), message));
        Delivery::Delivered
    }
}

fn setup() -> (PartyCoordinator, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    for id in ["cap", "m1", "m2"] {
        recorder.connect(id);
    }
    (PartyCoordinator::new(recorder.clone()), recorder)
}

fn id(s: &str) -> AccountId {
    AccountId::from(s)
}

fn join_body(dn: &str) -> JoinRequest {
    serde_json::from_value(json!({
        "connection": {"id": format!("{dn}@prod"), "meta": {"urn:epic:conn:platform_s": "WIN"}},
        "meta": {"urn:epic:member:dn_s": dn}
    }))
    .unwrap()
}

#[tokio::test]
async fn get_or_create_makes_one_solo_party() {
    let (parties, _) = setup();
    let first = parties.get_or_create(&id("cap"), "Cap").await.unwrap();
    assert_eq!(first.members.len(), 1);
    assert_eq!(first.members[0].role, Role::Captain);
    assert_eq!(first.members[0].display_name(), Some("Cap"));

    let again = parties.get_or_create(&id("cap"), "Cap").await.unwrap();
    assert_eq!(again.id, first.id);
    assert_eq!(parties.party_count().await, 1);
}

#[tokio::test]
async fn create_party_forces_join_policy_and_announces_creator() {
    let (parties, recorder) = setup();
    let request: CreatePartyRequest = serde_json::from_value(json!({
        "config": {"joinability": "INVITE_AND_FORMER", "max_size": 16, "join_confirmation": false},
        "join_info": {
            "connection": {"id": "cap@prod", "meta": {"urn:epic:conn:platform_s": "WIN"}},
            "meta": {"urn:epic:member:dn_s": "ignored"}
        },
        "meta": {"urn:epic:cfg:party-type-id_s": "default"}
    }))
    .unwrap();
    let party = parties.create_party(&id("cap"), "Cap", request).await.unwrap();

    assert_eq!(party.config.joinability, Joinability::Open);
    assert_eq!(party.config.max_size, 4);
    assert!(party.config.join_confirmation);
    assert_eq!(party.members[0].display_name(), Some("Cap"));
    assert_eq!(party.members[0].connections[0].id, "cap@prod");
    assert!(party.members[0].meta.contains_key(META_JOIN_REQUEST_USERS));

    let event = recorder.last_for("cap");
    assert_eq!(recorder.types_for("cap"), vec!["MEMBER_JOINED"]);
    assert_eq!(event["party_id"], party.id.as_str());
    assert_eq!(event["revision"], 0);
}

#[tokio::test]
async fn create_party_does_not_leave_the_previous_party() {
    let (parties, _) = setup();
    let old = parties.get_or_create(&id("cap"), "Cap").await.unwrap();
    let new = parties
        .create_party(&id("cap"), "Cap", CreatePartyRequest::default())
        .await
        .unwrap();

    assert_ne!(old.id, new.id);
    assert_eq!(parties.party_count().await, 2);
    assert!(parties.get_party(&old.id).await.unwrap().contains(&id("cap")));
    assert_eq!(parties.party_of(&id("cap")).await.unwrap().id, new.id);
}

#[tokio::test]
async fn join_orders_captain_last_and_fans_out_to_everyone() {
    let (parties, recorder) = setup();
    let party = parties.get_or_create(&id("cap"), "Cap").await.unwrap();

    let joined = parties
        .join_member(&party.id, &id("m1"), join_body("M1"))
        .await
        .unwrap();
    let order: Vec<&str> = joined.members.iter().map(|m| m.account_id.as_str()).collect();
    assert_eq!(order, vec!["m1", "cap"]);

    let squad: Value = serde_json::from_str(&joined.meta[META_SQUAD_ASSIGNMENTS]).unwrap();
    assert_eq!(squad["RawSquadAssignments"][0]["memberId"], "cap");
    assert_eq!(squad["RawSquadAssignments"][1]["memberId"], "m1");

    assert_eq!(recorder.types_for("cap"), vec!["MEMBER_JOINED"]);
    assert_eq!(recorder.types_for("m1"), vec!["MEMBER_JOINED"]);
    assert_eq!(recorder.last_for("cap")["account_id"], "m1");
    assert_eq!(recorder.last_for("cap")["account_dn"], "M1");
}

#[tokio::test]
async fn join_requires_leaving_first() {
    let (parties, _) = setup();
    let a = parties.get_or_create(&id("cap"), "Cap").await.unwrap();
    parties.get_or_create(&id("m1"), "M1").await.unwrap();

    let result = parties.join_member(&a.id, &id("m1"), join_body("M1")).await;
    assert!(matches!(result, Err(ref e) if e.kind() == ErrorKind::Validation));

    let left = parties.leave_current(&id("m1")).await.unwrap();
    assert!(left.is_some());
    assert!(parties.join_member(&a.id, &id("m1"), join_body("M1")).await.is_ok());
    assert_eq!(parties.party_count().await, 1);
}

#[tokio::test]
async fn join_then_remove_restores_members_and_captain() {
    let (parties, recorder) = setup();
    let party = parties.get_or_create(&id("cap"), "Cap").await.unwrap();
    parties
        .join_member(&party.id, &id("m1"), join_body("M1"))
        .await
        .unwrap();

    let after = parties.remove_member(&party.id, &id("m1")).await.unwrap();
    let ids: Vec<&str> = after.members.iter().map(|m| m.account_id.as_str()).collect();
    assert_eq!(ids, vec!["cap"]);
    assert_eq!(after.captain().unwrap().account_id, id("cap"));
    assert_eq!(recorder.types_for("cap"), vec!["MEMBER_JOINED", "MEMBER_LEFT"]);
    assert!(parties.party_of(&id("m1")).await.is_err());
}

#[tokio::test]
async fn removing_captain_promotes_first_remaining_member() {
    let (parties, recorder) = setup();
    let party = parties.get_or_create(&id("cap"), "Cap").await.unwrap();
    parties.join_member(&party.id, &id("m1"), join_body("M1")).await.unwrap();
    parties.join_member(&party.id, &id("m2"), join_body("M2")).await.unwrap();

    // Order is now m1, m2, cap.
    let after = parties.remove_member(&party.id, &id("cap")).await.unwrap();
    assert_eq!(after.captain().unwrap().account_id, id("m1"));
    assert_eq!(
        after.members.iter().filter(|m| m.role == Role::Captain).count(),
        1
    );
    let types = recorder.types_for("m2");
    assert_eq!(&types[types.len() - 2..], ["MEMBER_LEFT", "MEMBER_NEW_CAPTAIN"]);
    assert_eq!(recorder.last_for("m2")["account_id"], "m1");
}

#[tokio::test]
async fn removing_last_member_disbands_party() {
    let (parties, _) = setup();
    let party = parties.get_or_create(&id("cap"), "Cap").await.unwrap();

    let after = parties.remove_member(&party.id, &id("cap")).await.unwrap();
    assert!(after.members.is_empty());
    assert_eq!(parties.party_count().await, 0);

    let lookup = parties.get_party(&party.id).await;
    assert!(matches!(lookup, Err(ref e) if e.kind() == ErrorKind::NotFound));
    let fresh = parties.get_or_create(&id("cap"), "Cap").await.unwrap();
    assert_ne!(fresh.id, party.id);
}

#[tokio::test]
async fn removing_a_stranger_is_not_found() {
    let (parties, _) = setup();
    let party = parties.get_or_create(&id("cap"), "Cap").await.unwrap();
    let result = parties.remove_member(&party.id, &id("nobody")).await;
    assert!(matches!(result, Err(ref e) if e.kind() == ErrorKind::NotFound));
    assert_eq!(parties.party_count().await, 1);
}

#[tokio::test]
async fn patch_party_mirrors_default_keys_and_reports_pre_increment_revision() {
    let (parties, recorder) = setup();
    let party = parties.get_or_create(&id("cap"), "Cap").await.unwrap();
    parties.join_member(&party.id, &id("m1"), join_body("M1")).await.unwrap();

    let patch: PatchPartyRequest = serde_json::from_value(json!({
        "config": {"max_size": 16},
        "meta": {"update": {"Default:PartyState_s": "BattleRoyaleView"}, "delete": []}
    }))
    .unwrap();
    let patched = parties.patch_party(&party.id, patch).await.unwrap();

    assert_eq!(patched.revision, 1);
    assert_eq!(patched.config.max_size, 4);
    assert_eq!(patched.meta["Default:PartyState_s"], "BattleRoyaleView");
    assert_eq!(patched.meta["PartyState_s"], "BattleRoyaleView");

    for member in ["cap", "m1"] {
        let event = recorder.last_for(member);
        assert_eq!(
            event["type"],
            "com.epicgames.social.party.notification.v0.PARTY_UPDATED"
        );
        assert_eq!(event["revision"], 0);
        assert_eq!(event["party_state_updated"]["PartyState_s"], "BattleRoyaleView");
        assert_eq!(event["captain_id"], "cap");
    }

    let delete: PatchPartyRequest =
        serde_json::from_value(json!({"meta": {"delete": ["PartyState_s"]}})).unwrap();
    let patched = parties.patch_party(&party.id, delete).await.unwrap();
    assert!(!patched.meta.contains_key("PartyState_s"));
    assert!(!patched.meta.contains_key("Default:PartyState_s"));
    assert_eq!(recorder.last_for("cap")["revision"], 1);
}

#[tokio::test]
async fn patch_member_meta_bumps_member_revision_and_broadcasts() {
    let (parties, recorder) = setup();
    let party = parties.get_or_create(&id("cap"), "Cap").await.unwrap();
    parties.join_member(&party.id, &id("m1"), join_body("M1")).await.unwrap();

    let patched = parties
        .patch_member_meta(
            &party.id,
            &id("m1"),
            &MetaPatch::set("Default:Location_s", "PreLobby"),
        )
        .await
        .unwrap();
    let member = patched.member(&id("m1")).unwrap();
    assert_eq!(member.revision, 1);
    assert_eq!(member.meta["Location_s"], "PreLobby");
    assert_eq!(patched.revision, 0);

    let event = recorder.last_for("cap");
    assert_eq!(
        event["type"],
        "com.epicgames.social.party.notification.v0.MEMBER_STATE_UPDATED"
    );
    assert_eq!(event["account_id"], "m1");
    assert_eq!(event["member_state_updated"]["Default:Location_s"], "PreLobby");

    let missing = parties
        .patch_member_meta(&party.id, &id("m2"), &MetaPatch::set("x", "y"))
        .await;
    assert!(matches!(missing, Err(ref e) if e.kind() == ErrorKind::NotFound));
}

#[tokio::test]
async fn disconnected_members_are_skipped() {
    let (parties, recorder) = setup();
    let party = parties.get_or_create(&id("offline"), "Offline").await.unwrap();
    parties.join_member(&party.id, &id("m1"), join_body("M1")).await.unwrap();

    assert!(recorder.types_for("offline").is_empty());
    assert_eq!(recorder.types_for("m1"), vec!["MEMBER_JOINED"]);
}

#[tokio::test]
async fn friend_lookup_requires_a_party() {
    let (parties, _) = setup();
    let missing = parties.party_of(&id("m2")).await;
    assert!(matches!(missing, Err(ref e) if e.kind() == ErrorKind::NotFound));

    let party = parties.get_or_create(&id("m2"), "M2").await.unwrap();
    assert_eq!(parties.party_of(&id("m2")).await.unwrap().id, party.id);
}

#[tokio::test]
async fn concurrent_joins_keep_one_captain_and_consistent_index() {
    let (parties, _) = setup();
    let parties = Arc::new(parties);
    let party = parties.get_or_create(&id("cap"), "Cap").await.unwrap();

    let mut tasks = Vec::new();
    for n in 0..3 {
        let parties = Arc::clone(&parties);
        let party_id = party.id.clone();
        tasks.push(tokio::spawn(async move {
            let account = AccountId::from(format!("j{n}"));
            parties
                .join_member(&party_id, &account, join_body(account.as_str()))
                .await
                .is_ok()
        }));
    }
    for task in tasks {
        assert!(task.await.unwrap());
    }

    let party = parties.get_party(&party.id).await.unwrap();
    assert_eq!(party.members.len(), 4);
    assert_eq!(
        party.members.iter().filter(|m| m.role == Role::Captain).count(),
        1
    );
    assert_eq!(party.members.last().unwrap().role, Role::Captain);
    for n in 0..3 {
        let account = AccountId::from(format!("j{n}"));
        assert_eq!(parties.party_of(&account).await.unwrap().id, party.id);
    }
}
