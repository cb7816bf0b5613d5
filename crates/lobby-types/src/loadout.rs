//! Loadout (cosmetic locker) records.
//!
//! A loadout is a named set of equipped slot assignments stored separately
//! from the athena profile, keyed by `(account_id, locker_name)`. The athena
//! document only holds the ordered list of loadout names and an index
//! pointing at the active one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::profile::{AttributeMap, DANCE_SLOTS, ITEM_WRAP_SLOTS, Item, ItemAttributes, Variant};

/// Template id of every locker item.
pub const LOADOUT_TEMPLATE_ID: &str = "CosmeticLocker:cosmeticlocker_athena";

/// Secondary loadout kept in lockstep by locker-slot commands.
pub const SANDBOX_LOADOUT: &str = "sandbox_loadout";

/// Loadout created for the default game mode at provisioning.
pub const ZOMBIE_LOADOUT: &str = "zombie_loadout";

/// Locker slot names and their slot counts.
pub const SLOT_LAYOUT: [(&str, usize); 9] = [
    ("Character", 1),
    ("Backpack", 1),
    ("Pickaxe", 1),
    ("Glider", 1),
    ("SkyDiveContrail", 1),
    ("LoadingScreen", 1),
    ("MusicPack", 1),
    ("Dance", DANCE_SLOTS),
    ("ItemWrap", ITEM_WRAP_SLOTS),
];

/// Active style selection for one equipped item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActiveVariants {
    /// Selected variants.
    #[serde(default)]
    pub variants: Vec<Variant>,
}

/// One named slot of a locker.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockerSlot {
    /// Equipped template ids, one per sub-slot.
    #[serde(default)]
    pub items: Vec<String>,
    /// Style selection per sub-slot.
    #[serde(default)]
    pub active_variants: Vec<Option<ActiveVariants>>,
}

impl LockerSlot {
    fn empty(count: usize) -> Self {
        Self {
            items: vec![String::new(); count],
            active_variants: vec![None; count],
        }
    }
}

/// All slots of a locker, keyed by slot name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LockerSlotsData {
    /// Slots keyed by name (see [`SLOT_LAYOUT`]).
    #[serde(default)]
    pub slots: BTreeMap<String, LockerSlot>,
}

/// Attributes of a loadout record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadoutAttributes {
    /// Record name, also the item key in the athena projection.
    pub locker_name: String,
    /// Banner icon template.
    #[serde(default)]
    pub banner_icon_template: String,
    /// Banner color template.
    #[serde(default)]
    pub banner_color_template: String,
    /// Slot assignments.
    #[serde(default)]
    pub locker_slots_data: LockerSlotsData,
    /// Whether the client has seen the locker.
    #[serde(default)]
    pub item_seen: bool,
    /// Unmodelled attributes.
    #[serde(flatten)]
    pub extra: AttributeMap,
}

/// A loadout record owned by the loadout store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loadout {
    /// Always [`LOADOUT_TEMPLATE_ID`].
    pub template_id: String,
    /// Loadout attributes.
    pub attributes: LoadoutAttributes,
    /// Always 1.
    #[serde(default)]
    pub quantity: u64,
}

impl Loadout {
    /// A fresh loadout with every slot present and empty.
    pub fn template(locker_name: impl Into<String>) -> Self {
        let slots = SLOT_LAYOUT
            .iter()
            .map(|(name, count)| ((*name).to_owned(), LockerSlot::empty(*count)))
            .collect();
        Self {
            template_id: LOADOUT_TEMPLATE_ID.to_owned(),
            attributes: LoadoutAttributes {
                locker_name: locker_name.into(),
                banner_icon_template: String::new(),
                banner_color_template: String::new(),
                locker_slots_data: LockerSlotsData { slots },
                item_seen: false,
                extra: AttributeMap::new(),
            },
            quantity: 1,
        }
    }

    /// Record name.
    pub fn name(&self) -> &str {
        &self.attributes.locker_name
    }

    /// Mutable access to a slot, created empty at its layout size if missing.
    pub fn slot_mut(&mut self, slot_name: &str) -> &mut LockerSlot {
        let count = SLOT_LAYOUT
            .iter()
            .find(|(name, _)| *name == slot_name)
            .map_or(1, |(_, count)| *count);
        self.attributes
            .locker_slots_data
            .slots
            .entry(slot_name.to_owned())
            .or_insert_with(|| LockerSlot::empty(count))
    }

    /// Project the record into an athena item.
    pub fn to_item(&self) -> Result<Item, serde_json::Error> {
        let attributes: ItemAttributes =
            serde_json::from_value(serde_json::to_value(&self.attributes)?)?;
        Ok(Item {
            template_id: self.template_id.clone(),
            attributes,
            quantity: 1,
        })
    }
}
