//! `QueryProfile` and the daily login grant.

use lobby_economy::{CurrencyTransaction, EntryType, GiftBox, daily_grant_due};
use lobby_store::DocumentKey;
use lobby_types::{Account, ItemId, ProfileChange, ProfileDocument, ProfileId};

use crate::context::CommandContext;
use crate::engine::{ProfileEngine, require_athena};
use crate::error::ProfileError;

/// Item id clients resolve the locker under in `QueryProfile`.
pub const COSMETIC_LOCKER_ITEM: &str = "Default:CosmeticLocker";

impl ProfileEngine {
    pub(crate) async fn query_profile(
        &self,
        profile: &mut ProfileDocument,
        cx: &mut CommandContext<'_>,
    ) -> Result<(), ProfileError> {
        match profile.profile_id {
            ProfileId::Athena => {
                self.project_loadouts(cx.account_id, profile).await?;
                let active = self
                    .active_loadout(cx.account_id, require_athena(profile)?)
                    .await?;
                cx.changes.push(ProfileChange::attr(
                    COSMETIC_LOCKER_ITEM,
                    "locker_slots_data",
                    serde_json::to_value(&active.attributes.locker_slots_data)?,
                ));
            }
            ProfileId::CommonCore => {
                if let Some(stats) = profile.common_core_stats_mut() {
                    stats.allowed_to_receive_gifts = true;
                    stats.allowed_to_send_gifts = true;
                    stats.mfa_enabled = true;
                }
                self.grant_daily(profile, cx).await?;
            }
            ProfileId::Other(_) => {}
        }
        cx.changes.push(ProfileChange::full(profile));
        Ok(())
    }

    /// Credit the daily grant if the account has not received it today.
    async fn grant_daily(
        &self,
        profile: &mut ProfileDocument,
        cx: &mut CommandContext<'_>,
    ) -> Result<(), ProfileError> {
        let key = DocumentKey::account(cx.account_id);
        let mut account: Account = self.documents.require(&key).await?;
        if !daily_grant_due(account.last_login, cx.now) {
            return Ok(());
        }

        let amount = self.settings.daily_grant;
        let entry = CurrencyTransaction::new(EntryType::DailyGrant)
            .amount(amount)
            .reference("daily_login")
            .apply(&mut account, cx.now)?;
        self.record_entry(entry, cx).await?;
        account.last_login = Some(cx.now);
        cx.saga.save(&key, &account).await?;

        profile.set_currency(account.balance);
        let gift = GiftBox::daily(amount, cx.now).to_item();
        if let Some(stats) = profile.common_core_stats_mut() {
            stats.gift_history.push(serde_json::to_value(&gift)?);
        }
        profile.items.insert(ItemId::generate().to_string(), gift);

        tracing::info!(
            account_id = %cx.account_id,
            amount,
            balance = account.balance,
            "Daily login grant credited"
        );
        Ok(())
    }
}
