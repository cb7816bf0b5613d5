//! The profile revision engine.
//!
//! Every command runs the same cycle under the locks of its scope:
//!
//! ```text
//! parse -> lock scope -> LOAD -> DISPATCH -> RECONCILE -> PERSIST -> RESPOND
//!                                   |                        |
//!                                   +---- saga writes -------+--> commit | compensate
//! ```
//!
//! Handlers never write the primary document themselves; the engine bumps
//! its revision and persists it last. Secondary documents (the other
//! profile of a purchase, gift recipients, loadouts, the account) are
//! written through the command's saga. If any step fails, every saga write
//! is undone and no notification leaves the process.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;

use lobby_economy::CatalogSource;
use lobby_store::{DocumentKey, Documents};
use lobby_types::{
    AccountId, AthenaStats, Delivery, Loadout, Notifier, ProfileChange, ProfileDocument, ProfileId,
    ProfileResponse,
};

use crate::command::ProfileCommand;
use crate::context::{CommandContext, envelope};
use crate::error::ProfileError;
use crate::locker;
use crate::locks::LockTable;

/// Query revision meaning "do not compare".
pub const REVISION_UNCHECKED: i64 = -1;

/// Tunables of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Currency credited by the daily login grant.
    pub daily_grant: u64,
    /// Balance of a freshly provisioned account.
    pub starting_balance: u64,
    /// Season number stamped into athena stats.
    pub season: u32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            daily_grant: 50,
            starting_balance: 0,
            season: 0,
        }
    }
}

/// Loads, mutates, versions, and persists profile documents.
pub struct ProfileEngine {
    pub(crate) documents: Documents,
    pub(crate) catalog: Arc<dyn CatalogSource>,
    notifier: Arc<dyn Notifier>,
    pub(crate) locks: LockTable,
    pub(crate) settings: EngineSettings,
}

impl ProfileEngine {
    /// Create an engine over the given collaborators.
    pub fn new(
        documents: Documents,
        catalog: Arc<dyn CatalogSource>,
        notifier: Arc<dyn Notifier>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            documents,
            catalog,
            notifier,
            locks: LockTable::new(),
            settings,
        }
    }

    /// Engine settings.
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Run one profile command.
    ///
    /// `query_revision` is the revision the client last saw; when it is set,
    /// not [`REVISION_UNCHECKED`], and stale, the response also carries a
    /// full document so the client can resync.
    pub async fn handle(
        &self,
        account_id: &AccountId,
        profile_id: &ProfileId,
        action: &str,
        body: Value,
        query_revision: Option<i64>,
    ) -> Result<ProfileResponse, ProfileError> {
        self.handle_at(account_id, profile_id, action, body, query_revision, Utc::now())
            .await
    }

    /// [`handle`](Self::handle) with an explicit clock reading.
    pub async fn handle_at(
        &self,
        account_id: &AccountId,
        profile_id: &ProfileId,
        action: &str,
        body: Value,
        query_revision: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<ProfileResponse, ProfileError> {
        let command = ProfileCommand::parse(action, body)?;
        let _scope = self
            .locks
            .acquire(command.lock_scope(account_id, profile_id))
            .await;

        let key = DocumentKey::profile(account_id, profile_id);
        let mut profile: ProfileDocument = self.documents.require(&key).await?;
        let mut cx = CommandContext::new(&self.documents, account_id, command.label(), now);

        match self
            .run(&command, &key, &mut profile, &mut cx, query_revision)
            .await
        {
            Ok(response) => {
                let CommandContext { saga, outbound, .. } = cx;
                saga.commit();
                tracing::debug!(
                    account_id = %account_id,
                    profile_id = %profile_id,
                    command = command.label(),
                    rvn = response.profile_revision,
                    "Profile command committed"
                );
                self.deliver(outbound);
                Ok(response)
            }
            Err(e) => {
                tracing::warn!(
                    account_id = %account_id,
                    profile_id = %profile_id,
                    command = command.label(),
                    error = %e,
                    "Profile command failed"
                );
                cx.saga.compensate().await;
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        command: &ProfileCommand,
        key: &DocumentKey,
        profile: &mut ProfileDocument,
        cx: &mut CommandContext<'_>,
        query_revision: Option<i64>,
    ) -> Result<ProfileResponse, ProfileError> {
        if let Some(stats) = profile.athena_stats_mut() {
            stats.season_num = self.settings.season;
        }

        self.dispatch(command, profile, cx).await?;

        let current = profile.rvn;
        if let Some(seen) = query_revision.filter(|r| *r != REVISION_UNCHECKED && *r != current) {
            tracing::info!(
                account_id = %cx.account_id,
                profile_id = %profile.profile_id,
                seen,
                current,
                "Revision mismatch, sending full profile"
            );
            cx.changes.push(ProfileChange::full(profile));
        }

        profile.bump_revision(cx.now);
        cx.saga.save(key, profile).await?;
        Ok(cx.respond(profile))
    }

    async fn dispatch(
        &self,
        command: &ProfileCommand,
        profile: &mut ProfileDocument,
        cx: &mut CommandContext<'_>,
    ) -> Result<(), ProfileError> {
        match command {
            ProfileCommand::QueryProfile => self.query_profile(profile, cx).await,
            ProfileCommand::PurchaseCatalogEntry(request) => {
                self.purchase(request, profile, cx).await
            }
            ProfileCommand::EquipBattleRoyaleCustomization(request) => {
                self.equip(request, profile, cx).await
            }
            ProfileCommand::SetBattleRoyaleBanner(request) => {
                self.set_banner(request, profile, cx).await
            }
            ProfileCommand::SetCosmeticLockerSlot(request) => {
                self.set_locker_slot(request, profile, cx).await
            }
            ProfileCommand::SetCosmeticLockerBanner(request) => {
                self.set_locker_banner(request, profile, cx).await
            }
            ProfileCommand::GiftCatalogEntry(request) => self.gift(request, profile, cx).await,
            ProfileCommand::RemoveGiftBox(ids) => {
                remove_gift_boxes(ids, profile, cx);
                Ok(())
            }
            ProfileCommand::Unknown(action) => {
                tracing::debug!(
                    account_id = %cx.account_id,
                    action = %action,
                    "Unknown profile action, treating as no-op"
                );
                Ok(())
            }
        }
    }

    /// Read a profile with its loadouts projected, without persisting.
    ///
    /// Used by dedicated servers to inspect any account's cosmetics.
    pub async fn read_profile(
        &self,
        account_id: &AccountId,
        profile_id: &ProfileId,
    ) -> Result<ProfileResponse, ProfileError> {
        let key = DocumentKey::profile(account_id, profile_id);
        let mut profile: ProfileDocument = self.documents.require(&key).await?;
        if profile.athena_stats().is_some() {
            self.project_loadouts(account_id, &mut profile).await?;
            if let Some(stats) = profile.athena_stats_mut() {
                stats.season_num = self.settings.season;
            }
        }
        let changes = vec![ProfileChange::full(&profile)];
        Ok(envelope(&profile, changes, Vec::new(), Vec::new(), Utc::now()))
    }

    // -----------------------------------------------------------------------
    // Loadout access
    // -----------------------------------------------------------------------

    pub(crate) async fn load_loadout(
        &self,
        account_id: &AccountId,
        name: &str,
    ) -> Result<Loadout, ProfileError> {
        Ok(self
            .documents
            .require(&DocumentKey::loadout(account_id, name))
            .await?)
    }

    pub(crate) async fn active_loadout(
        &self,
        account_id: &AccountId,
        stats: &AthenaStats,
    ) -> Result<Loadout, ProfileError> {
        let name = stats
            .active_loadout()
            .ok_or_else(|| ProfileError::NotFound(format!("active loadout of {account_id}")))?;
        self.load_loadout(account_id, name).await
    }

    /// Write a loadout through the saga and refresh its projection.
    pub(crate) async fn store_loadout(
        profile: &mut ProfileDocument,
        loadout: &Loadout,
        cx: &mut CommandContext<'_>,
    ) -> Result<(), ProfileError> {
        cx.saga
            .save(&DocumentKey::loadout(cx.account_id, loadout.name()), loadout)
            .await?;
        locker::project(profile, loadout)
    }

    /// Project every listed loadout into the athena document's items.
    pub(crate) async fn project_loadouts(
        &self,
        account_id: &AccountId,
        profile: &mut ProfileDocument,
    ) -> Result<(), ProfileError> {
        let names = profile
            .athena_stats()
            .map(|stats| stats.loadouts.clone())
            .unwrap_or_default();
        for name in names {
            let key = DocumentKey::loadout(account_id, &name);
            match self.documents.load::<Loadout>(&key).await? {
                Some(loadout) => locker::project(profile, &loadout)?,
                None => {
                    tracing::warn!(account_id = %account_id, loadout = %name, "Listed loadout missing");
                }
            }
        }
        Ok(())
    }

    fn deliver(&self, outbound: Vec<(AccountId, Value)>) {
        for (account_id, message) in outbound {
            if self.notifier.notify(&account_id, message) == Delivery::Absent {
                tracing::debug!(account_id = %account_id, "Recipient offline, notification dropped");
            }
        }
    }
}

impl core::fmt::Debug for ProfileEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ProfileEngine")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Remove gift boxes by key. Unknown keys are ignored.
fn remove_gift_boxes(ids: &[String], profile: &mut ProfileDocument, cx: &mut CommandContext<'_>) {
    let mut removed: usize = 0;
    for id in ids {
        if profile.items.remove(id).is_some() {
            removed = removed.saturating_add(1);
        }
    }
    tracing::debug!(account_id = %cx.account_id, removed, "Gift boxes removed");
    cx.changes.push(ProfileChange::full(profile));
}

/// Typed athena stats, or a validation error for any other profile.
pub(crate) fn require_athena(profile: &mut ProfileDocument) -> Result<&mut AthenaStats, ProfileError> {
    profile
        .athena_stats_mut()
        .ok_or_else(|| ProfileError::validation("command requires the athena profile"))
}

/// Fail unless `profile` is a `common_core` document.
pub(crate) fn require_common_core(profile: &ProfileDocument) -> Result<(), ProfileError> {
    if profile.profile_id == ProfileId::CommonCore {
        Ok(())
    } else {
        Err(ProfileError::validation("command requires the common_core profile"))
    }
}
