//! Purchase and gift commands.
//!
//! Both span several documents. The buyer's `common_core` document is the
//! primary document; the athena profile, the account record, and every gift
//! recipient's profiles are written through the saga so that a failed
//! debit undoes the grants that preceded it.
//!
//! Every balance movement appends a [`CurrencyEntry`] to the account's
//! ledger document in the same saga. Ledger writes for an account always run
//! under that account's `common_core` lock.

use lobby_economy::rules::{check_gift, check_purchase, first_owned_grant, loot_result};
use lobby_economy::{CatalogOffer, CurrencyEntry, CurrencyTransaction, EntryType, GiftBox};
use lobby_economy::gift::DEFAULT_WRAP_TEMPLATE;
use lobby_store::DocumentKey;
use lobby_types::profile::CURRENCY_ITEM_ID;
use lobby_types::{
    Account, AccountId, GiftReceived, ItemId, MultiUpdate, ProfileChange, ProfileDocument,
    ProfileId, ResponseNotification,
};

use crate::command::{GiftRequest, PurchaseRequest};
use crate::context::CommandContext;
use crate::engine::{ProfileEngine, require_common_core};
use crate::error::ProfileError;

/// Notification type of a completed purchase.
pub const CATALOG_PURCHASE: &str = "CatalogPurchase";

impl ProfileEngine {
    /// Append `entry` to its account's ledger through the saga.
    pub(crate) async fn record_entry(
        &self,
        entry: CurrencyEntry,
        cx: &mut CommandContext<'_>,
    ) -> Result<(), ProfileError> {
        let key = DocumentKey::ledger(&entry.account_id);
        let mut entries: Vec<CurrencyEntry> = self.documents.load(&key).await?.unwrap_or_default();

        tracing::info!(
            entry_id = %entry.id,
            account_id = %entry.account_id,
            entry_type = ?entry.entry_type,
            amount = entry.amount,
            before = entry.balance_before,
            after = entry.balance_after,
            reference = entry.reference.as_deref().unwrap_or(""),
            "Ledger entry recorded"
        );

        entries.push(entry);
        cx.saga.save(&key, &entries).await?;
        Ok(())
    }

    pub(crate) async fn purchase(
        &self,
        request: &PurchaseRequest,
        profile: &mut ProfileDocument,
        cx: &mut CommandContext<'_>,
    ) -> Result<(), ProfileError> {
        require_common_core(profile)?;
        let offer = self.catalog.resolve(&request.offer_id)?;

        let athena_key = DocumentKey::profile(cx.account_id, &ProfileId::Athena);
        let mut athena: ProfileDocument = self.documents.require(&athena_key).await?;
        let account_key = DocumentKey::account(cx.account_id);
        let mut account: Account = self.documents.require(&account_key).await?;

        if let Err(e) = check_purchase(&offer, &athena, request.expected_total_price, account.balance)
        {
            tracing::info!(
                account_id = %cx.account_id,
                offer_id = %offer.offer_id,
                reason = %e,
                "Purchase rejected"
            );
            return Err(e.into());
        }

        let added: Vec<ProfileChange> = offer
            .item_grants
            .iter()
            .map(|template_id| ProfileChange::ItemAdded {
                item_id: template_id.clone(),
                item: athena.grant(template_id),
            })
            .collect();
        if let Some(stats) = athena.athena_stats_mut() {
            stats.season_num = self.settings.season;
        }
        athena.bump_revision(cx.now);
        cx.saga.save(&athena_key, &athena).await?;

        let entry = CurrencyTransaction::new(EntryType::Purchase)
            .amount(offer.price)
            .reference(offer.offer_id.as_str())
            .apply(&mut account, cx.now)?;
        self.record_entry(entry, cx).await?;
        cx.saga.save(&account_key, &account).await?;
        profile.set_currency(account.balance);

        cx.changes.push(ProfileChange::ItemQuantityChanged {
            item_id: CURRENCY_ITEM_ID.to_owned(),
            quantity: account.balance,
        });
        cx.multi_update.push(MultiUpdate::for_document(&athena, added));
        cx.notifications.push(ResponseNotification {
            kind: CATALOG_PURCHASE.to_owned(),
            primary: true,
            loot_result: loot_result(&offer),
        });

        tracing::info!(
            account_id = %cx.account_id,
            offer_id = %offer.offer_id,
            price = offer.price,
            balance = account.balance,
            "Purchase applied"
        );
        Ok(())
    }

    pub(crate) async fn gift(
        &self,
        request: &GiftRequest,
        profile: &mut ProfileDocument,
        cx: &mut CommandContext<'_>,
    ) -> Result<(), ProfileError> {
        require_common_core(profile)?;
        let offer = self.catalog.resolve(&request.offer_id)?;

        let account_key = DocumentKey::account(cx.account_id);
        let mut sender: Account = self.documents.require(&account_key).await?;
        check_gift(&offer, cx.account_id, &request.receiver_account_ids, sender.balance)?;

        let wrap = if request.gift_wrap_template_id.is_empty() {
            DEFAULT_WRAP_TEMPLATE
        } else {
            request.gift_wrap_template_id.as_str()
        };

        let mut delivered: usize = 0;
        for recipient in &request.receiver_account_ids {
            if self
                .deliver_gift(&offer, recipient, wrap, &request.personal_message, cx)
                .await?
            {
                delivered = delivered.saturating_add(1);
            }
        }

        // One debit per gift command, however many recipients were served.
        let entry = CurrencyTransaction::new(EntryType::Gift)
            .amount(offer.price)
            .reference(offer.offer_id.as_str())
            .apply(&mut sender, cx.now)?;
        self.record_entry(entry, cx).await?;
        cx.saga.save(&account_key, &sender).await?;
        profile.set_currency(sender.balance);

        cx.changes.push(ProfileChange::ItemQuantityChanged {
            item_id: CURRENCY_ITEM_ID.to_owned(),
            quantity: sender.balance,
        });

        tracing::info!(
            account_id = %cx.account_id,
            offer_id = %offer.offer_id,
            recipients = request.receiver_account_ids.len(),
            delivered,
            balance = sender.balance,
            "Gift applied"
        );
        Ok(())
    }

    /// Give `offer` to one recipient. Returns `false` when the recipient was
    /// skipped.
    async fn deliver_gift(
        &self,
        offer: &CatalogOffer,
        recipient: &AccountId,
        wrap: &str,
        message: &str,
        cx: &mut CommandContext<'_>,
    ) -> Result<bool, ProfileError> {
        let athena_key = DocumentKey::profile(recipient, &ProfileId::Athena);
        let Some(mut athena) = self.documents.load::<ProfileDocument>(&athena_key).await? else {
            tracing::info!(recipient = %recipient, "Gift recipient has no athena profile, skipped");
            return Ok(false);
        };
        if let Some(owned) = first_owned_grant(offer, &athena) {
            tracing::info!(recipient = %recipient, template_id = owned, "Gift recipient already owns item, skipped");
            return Ok(false);
        }
        let common_core_key = DocumentKey::profile(recipient, &ProfileId::CommonCore);
        let Some(mut common_core) = self
            .documents
            .load::<ProfileDocument>(&common_core_key)
            .await?
        else {
            tracing::info!(recipient = %recipient, "Gift recipient has no common_core profile, skipped");
            return Ok(false);
        };

        let gift = GiftBox {
            wrap_template_id: wrap.to_owned(),
            from_account_id: cx.account_id.to_string(),
            loot: loot_result(offer).items,
            message: message.to_owned(),
            gifted_on: cx.now,
        }
        .to_item();
        if let Some(stats) = common_core.common_core_stats_mut() {
            stats.gift_history.push(serde_json::to_value(&gift)?);
        }
        common_core.items.insert(ItemId::generate().to_string(), gift);
        common_core.bump_revision(cx.now);
        cx.saga.save(&common_core_key, &common_core).await?;

        for template_id in &offer.item_grants {
            athena.grant(template_id);
        }
        athena.bump_revision(cx.now);
        cx.saga.save(&athena_key, &athena).await?;

        cx.outbound.push((
            recipient.clone(),
            serde_json::to_value(GiftReceived::new(cx.now))?,
        ));
        Ok(true)
    }
}
