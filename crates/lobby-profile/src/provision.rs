//! Account provisioning.
//!
//! A new account gets its account record, a `common_core` and an `athena`
//! document from the built-in templates, and two loadout records. The athena
//! loadout list is `[sandbox_loadout, zombie_loadout]` with the last one
//! active.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use lobby_store::DocumentKey;
use lobby_types::loadout::{SANDBOX_LOADOUT, ZOMBIE_LOADOUT};
use lobby_types::{Account, AccountId, Loadout, ProfileDocument, ProfileId};

use crate::context::CommandContext;
use crate::engine::{ProfileEngine, require_athena};
use crate::error::ProfileError;

impl ProfileEngine {
    /// Create every document of a new account.
    pub async fn provision(
        &self,
        account_id: &AccountId,
        display_name: &str,
    ) -> Result<Account, ProfileError> {
        self.provision_at(account_id, display_name, Utc::now()).await
    }

    /// [`provision`](Self::provision) with an explicit clock reading.
    pub async fn provision_at(
        &self,
        account_id: &AccountId,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Account, ProfileError> {
        let common_core_key = DocumentKey::profile(account_id, &ProfileId::CommonCore);
        let athena_key = DocumentKey::profile(account_id, &ProfileId::Athena);
        let _scope = self
            .locks
            .acquire(BTreeSet::from([common_core_key.clone(), athena_key.clone()]))
            .await;

        let account_key = DocumentKey::account(account_id);
        if self.documents.store().get(&account_key).await?.is_some() {
            return Err(ProfileError::AlreadyProvisioned(account_id.clone()));
        }

        let account = Account::new(account_id.clone(), display_name, self.settings.starting_balance);

        let mut common_core = ProfileDocument::template(account_id.clone(), ProfileId::CommonCore, now);
        common_core.set_currency(account.balance);

        let loadouts = [Loadout::template(SANDBOX_LOADOUT), Loadout::template(ZOMBIE_LOADOUT)];
        let mut athena = ProfileDocument::template(account_id.clone(), ProfileId::Athena, now);
        let stats = require_athena(&mut athena)?;
        stats.loadouts = loadouts.iter().map(|l| l.name().to_owned()).collect();
        stats.active_loadout_index = loadouts.len().saturating_sub(1);
        ZOMBIE_LOADOUT.clone_into(&mut stats.last_applied_loadout);
        stats.season_num = self.settings.season;

        let mut cx = CommandContext::new(&self.documents, account_id, "Provision", now);
        let written = async {
            for loadout in &loadouts {
                Self::store_loadout(&mut athena, loadout, &mut cx).await?;
            }
            cx.saga.save(&athena_key, &athena).await?;
            cx.saga.save(&common_core_key, &common_core).await?;
            cx.saga.save(&account_key, &account).await?;
            Ok::<(), ProfileError>(())
        }
        .await;

        match written {
            Ok(()) => {
                cx.saga.commit();
                tracing::info!(
                    account_id = %account_id,
                    balance = account.balance,
                    "Account provisioned"
                );
                Ok(account)
            }
            Err(e) => {
                tracing::warn!(account_id = %account_id, error = %e, "Provisioning failed");
                cx.saga.compensate().await;
                Err(e)
            }
        }
    }
}
