//! Shared fixtures for profile engine tests.

#![allow(clippy::unwrap_used, dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use lobby_economy::{CatalogOffer, CurrencyEntry, StaticCatalog};
use lobby_profile::{EngineSettings, ProfileEngine};
use lobby_store::{DocumentKey, Documents, FaultyStore};
use lobby_types::{Account, AccountId, Delivery, Loadout, Notifier, ProfileDocument, ProfileId};
use serde_json::Value;

/// Notifier that records every message and reports a fixed delivery.
#[derive(Default)]
pub struct Recorder {
    pub sent: Mutex<Vec<(AccountId, Value)>>,
}

impl Recorder {
    pub fn messages_for(&self, account: &AccountId) -> Vec<Value> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|(a, _)| a == account)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Notifier for Recorder {
    fn notify(&self, account_id: &AccountId, message: Value) -> Delivery {
        self.sent.lock().unwrap().push((account_id.clone(), message));
        Delivery::Delivered
    }
}

pub struct Harness {
    pub engine: ProfileEngine,
    pub store: Arc<FaultyStore>,
    pub documents: Documents,
    pub notifier: Arc<Recorder>,
}

pub fn catalog() -> StaticCatalog {
    StaticCatalog::from_offers([
        CatalogOffer {
            offer_id: "skin_001".to_owned(),
            price: 800,
            item_grants: vec!["skin_001".to_owned()],
        },
        CatalogOffer {
            offer_id: "bundle_002".to_owned(),
            price: 300,
            item_grants: vec![
                "AthenaBackpack:bid_002".to_owned(),
                "AthenaPickaxe:pickaxe_002".to_owned(),
            ],
        },
    ])
}

/// A fixed mid-month instant, so day-of-month arithmetic is predictable.
pub fn noon(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).single().unwrap()
}

pub fn harness(starting_balance: u64) -> Harness {
    let store = Arc::new(FaultyStore::new());
    let documents = Documents::new(store.clone());
    let notifier = Arc::new(Recorder::default());
    let engine = ProfileEngine::new(
        documents.clone(),
        Arc::new(catalog()),
        notifier.clone(),
        EngineSettings {
            daily_grant: 50,
            starting_balance,
            season: 9,
        },
    );
    Harness {
        engine,
        store,
        documents,
        notifier,
    }
}

impl Harness {
    /// Provision an account whose daily grant was already taken on `noon(1)`.
    pub async fn account(&self, id: &str) -> AccountId {
        let account_id = AccountId::from(id);
        self.engine
            .provision_at(&account_id, id, noon(1))
            .await
            .unwrap();
        let mut account = self.account_record(&account_id).await;
        account.last_login = Some(noon(1));
        self.documents
            .save(&DocumentKey::account(&account_id), &account)
            .await
            .unwrap();
        account_id
    }

    pub async fn account_record(&self, account_id: &AccountId) -> Account {
        self.documents
            .require(&DocumentKey::account(account_id))
            .await
            .unwrap()
    }

    pub async fn balance(&self, account_id: &AccountId) -> u64 {
        self.account_record(account_id).await.balance
    }

    pub async fn profile(&self, account_id: &AccountId, profile_id: ProfileId) -> ProfileDocument {
        self.documents
            .require(&DocumentKey::profile(account_id, &profile_id))
            .await
            .unwrap()
    }

    pub async fn loadout(&self, account_id: &AccountId, name: &str) -> Loadout {
        self.documents
            .require(&DocumentKey::loadout(account_id, name))
            .await
            .unwrap()
    }

    pub async fn ledger(&self, account_id: &AccountId) -> Vec<CurrencyEntry> {
        self.documents
            .load(&DocumentKey::ledger(account_id))
            .await
            .unwrap()
            .unwrap_or_default()
    }
}
