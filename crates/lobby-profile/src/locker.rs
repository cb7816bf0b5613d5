//! Locker slot rules and the athena projection.
//!
//! The athena document's favorite-slot stats and loadout items are a
//! projection of the loadout records. Equipping writes the same change to
//! the stats and to each affected loadout, then re-projects the loadouts
//! into the document's items.

use serde_json::Value;

use lobby_types::loadout::ActiveVariants;
use lobby_types::profile::{DANCE_SLOTS, ITEM_WRAP_SLOTS};
use lobby_types::{AthenaStats, Loadout, ProfileDocument, Variant};

use crate::error::ProfileError;

/// A locker slot category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockerCategory {
    /// Outfit.
    Character,
    /// Back bling.
    Backpack,
    /// Harvesting tool.
    Pickaxe,
    /// Glider.
    Glider,
    /// Contrail.
    SkyDiveContrail,
    /// Loading screen.
    LoadingScreen,
    /// Lobby music.
    MusicPack,
    /// Emote wheel.
    Dance,
    /// Wraps.
    ItemWrap,
}

/// Which sub-slots of a category an equip targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotIndex {
    /// One sub-slot.
    One(usize),
    /// Every sub-slot (wraps only).
    All,
}

impl LockerCategory {
    /// Parse a slot or category name, case-insensitively, with or without an
    /// `Athena` prefix.
    pub fn parse(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        let bare = lower.strip_prefix("athena").unwrap_or(&lower);
        Some(match bare {
            "character" => Self::Character,
            "backpack" => Self::Backpack,
            "pickaxe" => Self::Pickaxe,
            "glider" => Self::Glider,
            "skydivecontrail" => Self::SkyDiveContrail,
            "loadingscreen" => Self::LoadingScreen,
            "musicpack" => Self::MusicPack,
            "dance" => Self::Dance,
            "itemwrap" => Self::ItemWrap,
            _ => return None,
        })
    }

    /// Like [`parse`](Self::parse), failing with a validation error.
    pub fn require(name: &str) -> Result<Self, ProfileError> {
        Self::parse(name)
            .ok_or_else(|| ProfileError::validation(format!("unknown locker slot: {name}")))
    }

    /// Slot name inside `locker_slots_data`.
    pub const fn slot_name(self) -> &'static str {
        match self {
            Self::Character => "Character",
            Self::Backpack => "Backpack",
            Self::Pickaxe => "Pickaxe",
            Self::Glider => "Glider",
            Self::SkyDiveContrail => "SkyDiveContrail",
            Self::LoadingScreen => "LoadingScreen",
            Self::MusicPack => "MusicPack",
            Self::Dance => "Dance",
            Self::ItemWrap => "ItemWrap",
        }
    }

    /// Name of the athena stat mirroring the slot.
    pub const fn stat_name(self) -> &'static str {
        match self {
            Self::Character => "favorite_character",
            Self::Backpack => "favorite_backpack",
            Self::Pickaxe => "favorite_pickaxe",
            Self::Glider => "favorite_glider",
            Self::SkyDiveContrail => "favorite_skydivecontrail",
            Self::LoadingScreen => "favorite_loadingscreen",
            Self::MusicPack => "favorite_musicpack",
            Self::Dance => "favorite_dance",
            Self::ItemWrap => "favorite_itemwraps",
        }
    }

    /// Number of sub-slots.
    pub const fn slot_count(self) -> usize {
        match self {
            Self::Dance => DANCE_SLOTS,
            Self::ItemWrap => ITEM_WRAP_SLOTS,
            _ => 1,
        }
    }

    /// Validate a client sub-slot index for this category.
    ///
    /// Single-slot categories ignore the index. Wraps accept `-1` for all.
    pub fn index(self, raw: i64) -> Result<SlotIndex, ProfileError> {
        if self.slot_count() == 1 {
            return Ok(SlotIndex::One(0));
        }
        if raw == -1 && self == Self::ItemWrap {
            return Ok(SlotIndex::All);
        }
        usize::try_from(raw)
            .ok()
            .filter(|i| *i < self.slot_count())
            .map(SlotIndex::One)
            .ok_or_else(|| {
                ProfileError::validation(format!(
                    "slot index {raw} out of range for {}",
                    self.slot_name()
                ))
            })
    }
}

fn assign(slots: &mut Vec<String>, count: usize, index: SlotIndex, item: &str) {
    if slots.len() < count {
        slots.resize(count, String::new());
    }
    match index {
        SlotIndex::One(i) => {
            if let Some(slot) = slots.get_mut(i) {
                item.clone_into(slot);
            }
        }
        SlotIndex::All => slots.iter_mut().for_each(|slot| item.clone_into(slot)),
    }
}

/// Write `item` into the favorite stat of `category` and return the stat's
/// new value.
pub fn equip_stat(stats: &mut AthenaStats, category: LockerCategory, index: SlotIndex, item: &str) -> Value {
    let single = match category {
        LockerCategory::Character => &mut stats.favorite_character,
        LockerCategory::Backpack => &mut stats.favorite_backpack,
        LockerCategory::Pickaxe => &mut stats.favorite_pickaxe,
        LockerCategory::Glider => &mut stats.favorite_glider,
        LockerCategory::SkyDiveContrail => &mut stats.favorite_skydivecontrail,
        LockerCategory::LoadingScreen => &mut stats.favorite_loadingscreen,
        LockerCategory::MusicPack => &mut stats.favorite_musicpack,
        LockerCategory::Dance => {
            assign(&mut stats.favorite_dance, DANCE_SLOTS, index, item);
            return Value::from(stats.favorite_dance.clone());
        }
        LockerCategory::ItemWrap => {
            assign(&mut stats.favorite_itemwraps, ITEM_WRAP_SLOTS, index, item);
            return Value::from(stats.favorite_itemwraps.clone());
        }
    };
    item.clone_into(single);
    Value::from(single.clone())
}

/// Write `item` into the loadout slot of `category`.
pub fn equip_slot(loadout: &mut Loadout, category: LockerCategory, index: SlotIndex, item: &str) {
    let slot = loadout.slot_mut(category.slot_name());
    assign(&mut slot.items, category.slot_count(), index, item);
}

/// Record the active styles of the item equipped at `index`.
pub fn set_active_variants(loadout: &mut Loadout, category: LockerCategory, index: SlotIndex, variants: &[Variant]) {
    let count = category.slot_count();
    let slot = loadout.slot_mut(category.slot_name());
    if slot.active_variants.len() < count {
        slot.active_variants.resize(count, None);
    }
    let selected = Some(ActiveVariants {
        variants: variants.to_vec(),
    });
    match index {
        SlotIndex::One(i) => {
            if let Some(entry) = slot.active_variants.get_mut(i) {
                *entry = selected;
            }
        }
        SlotIndex::All => slot
            .active_variants
            .iter_mut()
            .for_each(|entry| entry.clone_from(&selected)),
    }
}

/// Project a loadout record into the athena document's items.
pub fn project(profile: &mut ProfileDocument, loadout: &Loadout) -> Result<(), ProfileError> {
    let item = loadout.to_item()?;
    profile.items.insert(loadout.name().to_owned(), item);
    Ok(())
}
