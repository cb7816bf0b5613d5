//! Locker and banner commands on the athena profile.

use lobby_types::loadout::SANDBOX_LOADOUT;
use lobby_types::{ProfileChange, ProfileDocument, Variant};

use crate::command::{BannerRequest, EquipRequest, LockerBannerRequest, LockerSlotRequest, VariantUpdate};
use crate::context::CommandContext;
use crate::engine::{ProfileEngine, require_athena};
use crate::error::ProfileError;
use crate::locker::{self, LockerCategory};

impl ProfileEngine {
    pub(crate) async fn equip(
        &self,
        request: &EquipRequest,
        profile: &mut ProfileDocument,
        cx: &mut CommandContext<'_>,
    ) -> Result<(), ProfileError> {
        let category = LockerCategory::require(&request.slot_name)?;
        let index = category.index(request.index_within_slot)?;
        let mut active = self
            .active_loadout(cx.account_id, require_athena(profile)?)
            .await?;

        let (variant_changes, variants) =
            apply_variant_updates(profile, &request.item_to_slot, &request.variant_updates)?;

        let stats = require_athena(profile)?;
        let value = locker::equip_stat(stats, category, index, &request.item_to_slot);
        active.name().clone_into(&mut stats.last_applied_loadout);

        locker::equip_slot(&mut active, category, index, &request.item_to_slot);
        if let Some(variants) = &variants {
            locker::set_active_variants(&mut active, category, index, variants);
        }
        Self::store_loadout(profile, &active, cx).await?;

        cx.changes.push(ProfileChange::stat(category.stat_name(), value));
        cx.changes.extend(variant_changes);
        Ok(())
    }

    pub(crate) async fn set_banner(
        &self,
        request: &BannerRequest,
        profile: &mut ProfileDocument,
        cx: &mut CommandContext<'_>,
    ) -> Result<(), ProfileError> {
        let mut active = self
            .active_loadout(cx.account_id, require_athena(profile)?)
            .await?;

        let stats = require_athena(profile)?;
        request.homebase_banner_icon_id.clone_into(&mut stats.banner_icon);
        request.homebase_banner_color_id.clone_into(&mut stats.banner_color);
        request
            .homebase_banner_icon_id
            .clone_into(&mut active.attributes.banner_icon_template);
        request
            .homebase_banner_color_id
            .clone_into(&mut active.attributes.banner_color_template);
        Self::store_loadout(profile, &active, cx).await?;

        cx.changes.push(ProfileChange::stat(
            "banner_icon",
            request.homebase_banner_icon_id.clone().into(),
        ));
        cx.changes.push(ProfileChange::stat(
            "banner_color",
            request.homebase_banner_color_id.clone().into(),
        ));
        Ok(())
    }

    /// Equip into the active loadout and keep the sandbox loadout in step.
    pub(crate) async fn set_locker_slot(
        &self,
        request: &LockerSlotRequest,
        profile: &mut ProfileDocument,
        cx: &mut CommandContext<'_>,
    ) -> Result<(), ProfileError> {
        let category = LockerCategory::require(&request.category)?;
        let index = category.index(request.slot_index)?;
        let mut active = self
            .active_loadout(cx.account_id, require_athena(profile)?)
            .await?;
        let mut sandbox = if active.name() == SANDBOX_LOADOUT {
            None
        } else {
            Some(self.load_loadout(cx.account_id, SANDBOX_LOADOUT).await?)
        };

        let (variant_changes, variants) =
            apply_variant_updates(profile, &request.item_to_slot, &request.variant_updates)?;

        let stats = require_athena(profile)?;
        locker::equip_stat(stats, category, index, &request.item_to_slot);
        active.name().clone_into(&mut stats.last_applied_loadout);

        for loadout in std::iter::once(&mut active).chain(sandbox.as_mut()) {
            locker::equip_slot(loadout, category, index, &request.item_to_slot);
            if let Some(variants) = &variants {
                locker::set_active_variants(loadout, category, index, variants);
            }
        }
        Self::store_loadout(profile, &active, cx).await?;
        if let Some(sandbox) = &sandbox {
            Self::store_loadout(profile, sandbox, cx).await?;
        }

        let locker_item = if request.locker_item.is_empty() {
            active.name().to_owned()
        } else {
            request.locker_item.clone()
        };
        cx.changes.extend(variant_changes);
        cx.changes.push(ProfileChange::attr(
            locker_item,
            "locker_slots_data",
            serde_json::to_value(&active.attributes.locker_slots_data)?,
        ));
        Ok(())
    }

    pub(crate) async fn set_locker_banner(
        &self,
        request: &LockerBannerRequest,
        profile: &mut ProfileDocument,
        cx: &mut CommandContext<'_>,
    ) -> Result<(), ProfileError> {
        require_athena(profile)?;
        let mut loadout = self.load_loadout(cx.account_id, &request.locker_name).await?;

        let stats = require_athena(profile)?;
        request.banner_icon_template_name.clone_into(&mut stats.banner_icon);
        request.banner_color_template_name.clone_into(&mut stats.banner_color);
        request
            .banner_icon_template_name
            .clone_into(&mut loadout.attributes.banner_icon_template);
        request
            .banner_color_template_name
            .clone_into(&mut loadout.attributes.banner_color_template);
        Self::store_loadout(profile, &loadout, cx).await?;

        cx.changes.push(ProfileChange::attr(
            request.locker_name.as_str(),
            "banner_icon_template",
            request.banner_icon_template_name.clone().into(),
        ));
        cx.changes.push(ProfileChange::attr(
            request.locker_name.as_str(),
            "banner_color_template",
            request.banner_color_template_name.clone().into(),
        ));
        Ok(())
    }
}

/// Merge style updates into the item being equipped.
///
/// Returns one `variants` change per update and the item's resulting
/// variants, or `None` when no update was requested.
fn apply_variant_updates(
    profile: &mut ProfileDocument,
    item_id: &str,
    updates: &[VariantUpdate],
) -> Result<(Vec<ProfileChange>, Option<Vec<Variant>>), ProfileError> {
    if updates.is_empty() {
        return Ok((Vec::new(), None));
    }
    let item = profile.items.get_mut(item_id).ok_or_else(|| {
        ProfileError::validation(format!("cannot apply styles to unowned item {item_id:?}"))
    })?;
    let mut changes = Vec::with_capacity(updates.len());
    for update in updates {
        item.attributes.merge_variant(&update.channel, &update.active);
        changes.push(ProfileChange::attr(
            item_id,
            "variants",
            serde_json::to_value(&item.attributes.variants)?,
        ));
    }
    Ok((changes, Some(item.attributes.variants.clone())))
}
