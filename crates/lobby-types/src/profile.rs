//! Profile documents, items, and the typed stats union.
//!
//! A profile document is an account's persisted state for one subsystem,
//! identified by a [`ProfileId`]. The `stats.attributes` bag is loosely typed
//! on the wire; here it is decoded into one [`ProfileStats`] variant per known
//! profile id, with an open `extra` map for keys the server does not model.
//!
//! # Wire shape
//!
//! ```text
//! {
//!   "_id": "...", "accountId": "...", "profileId": "athena",
//!   "created": "...", "updated": "...",
//!   "rvn": 7, "commandRevision": 7, "wipeNumber": 1, "version": "...",
//!   "items": { "<itemId>": { "templateId": "...", "attributes": {...}, "quantity": 1 } },
//!   "stats": { "attributes": { ... } }
//! }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::AccountId;

/// Item key and template id of the premium currency item in `common_core`.
pub const CURRENCY_ITEM_ID: &str = "Currency:MtxPurchased";

/// Number of emote slots in a locker.
pub const DANCE_SLOTS: usize = 6;

/// Number of wrap slots in a locker.
pub const ITEM_WRAP_SLOTS: usize = 7;

/// Extension map for attributes the server does not model.
pub type AttributeMap = BTreeMap<String, Value>;

// ---------------------------------------------------------------------------
// Profile id
// ---------------------------------------------------------------------------

/// Identifies which subsystem a profile document belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProfileId {
    /// Account-wide economy profile (currency, gift boxes).
    CommonCore,
    /// Battle royale cosmetics profile (items, locker, loadouts).
    Athena,
    /// Any other profile the client asks for; stored but not interpreted.
    Other(String),
}

impl ProfileId {
    /// Wire name of the profile.
    pub fn as_str(&self) -> &str {
        match self {
            Self::CommonCore => "common_core",
            Self::Athena => "athena",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for ProfileId {
    fn from(name: String) -> Self {
        match name.as_str() {
            "common_core" => Self::CommonCore,
            "athena" => Self::Athena,
            _ => Self::Other(name),
        }
    }
}

impl From<&str> for ProfileId {
    fn from(name: &str) -> Self {
        Self::from(name.to_owned())
    }
}

impl From<ProfileId> for String {
    fn from(id: ProfileId) -> Self {
        match id {
            ProfileId::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

impl core::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

/// One selectable style channel on a cosmetic item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Channel name (e.g. `Material`, `Parts`).
    pub channel: String,
    /// Currently active style tag.
    pub active: String,
    /// Style tags the player owns on this channel.
    #[serde(default)]
    pub owned: Vec<String>,
}

/// Attributes of a profile item.
///
/// Cosmetic fields are modelled; gift boxes, loadouts, and currency items keep
/// their own attributes in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemAttributes {
    /// Item level.
    #[serde(default = "default_level")]
    pub level: u32,
    /// Whether the player marked the item as a favorite.
    #[serde(default)]
    pub favorite: bool,
    /// Whether the player has seen the item in the locker.
    #[serde(default)]
    pub item_seen: bool,
    /// Style channels.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<Variant>,
    /// Unmodelled attributes.
    #[serde(flatten)]
    pub extra: AttributeMap,
}

const fn default_level() -> u32 {
    1
}

const fn default_quantity() -> u64 {
    1
}

impl Default for ItemAttributes {
    fn default() -> Self {
        Self {
            level: 1,
            favorite: false,
            item_seen: false,
            variants: Vec::new(),
            extra: AttributeMap::new(),
        }
    }
}

impl ItemAttributes {
    /// Merge a variant update by channel key.
    ///
    /// An existing channel is replaced in place; an unknown channel is
    /// appended. The owned list becomes the single active tag.
    pub fn merge_variant(&mut self, channel: &str, active: &str) {
        let merged = Variant {
            channel: channel.to_owned(),
            active: active.to_owned(),
            owned: vec![active.to_owned()],
        };
        match self.variants.iter_mut().find(|v| v.channel == channel) {
            Some(existing) => *existing = merged,
            None => self.variants.push(merged),
        }
    }
}

/// An item record owned by a profile document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Catalog template id (e.g. `AthenaCharacter:cid_001`).
    pub template_id: String,
    /// Item attributes.
    #[serde(default)]
    pub attributes: ItemAttributes,
    /// Stack size.
    #[serde(default = "default_quantity")]
    pub quantity: u64,
}

impl Item {
    /// A freshly granted cosmetic at level 1, quantity 1.
    pub fn granted(template_id: impl Into<String>) -> Self {
        Self {
            template_id: template_id.into(),
            attributes: ItemAttributes {
                item_seen: true,
                ..ItemAttributes::default()
            },
            quantity: 1,
        }
    }

    /// The premium currency item carrying `balance`.
    pub fn currency(balance: u64) -> Self {
        let mut extra = AttributeMap::new();
        extra.insert("platform".to_owned(), Value::from("EpicPC"));
        Self {
            template_id: CURRENCY_ITEM_ID.to_owned(),
            attributes: ItemAttributes {
                extra,
                ..ItemAttributes::default()
            },
            quantity: balance,
        }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Stats of the `athena` profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AthenaStats {
    /// Equipped outfit.
    #[serde(default)]
    pub favorite_character: String,
    /// Equipped back bling.
    #[serde(default)]
    pub favorite_backpack: String,
    /// Equipped harvesting tool.
    #[serde(default)]
    pub favorite_pickaxe: String,
    /// Equipped glider.
    #[serde(default)]
    pub favorite_glider: String,
    /// Equipped contrail.
    #[serde(default)]
    pub favorite_skydivecontrail: String,
    /// Equipped loading screen.
    #[serde(default)]
    pub favorite_loadingscreen: String,
    /// Equipped music pack.
    #[serde(default)]
    pub favorite_musicpack: String,
    /// Equipped emotes, one per slot.
    #[serde(default = "empty_dances")]
    pub favorite_dance: Vec<String>,
    /// Equipped wraps, one per slot.
    #[serde(default = "empty_item_wraps")]
    pub favorite_itemwraps: Vec<String>,
    /// Banner icon template.
    #[serde(default)]
    pub banner_icon: String,
    /// Banner color template.
    #[serde(default)]
    pub banner_color: String,
    /// Ordered loadout record names.
    #[serde(default)]
    pub loadouts: Vec<String>,
    /// Index into [`loadouts`](Self::loadouts) of the active loadout.
    #[serde(default)]
    pub active_loadout_index: usize,
    /// Name of the loadout most recently written by a locker command.
    #[serde(default)]
    pub last_applied_loadout: String,
    /// Season number stamped by the server.
    #[serde(default)]
    pub season_num: u32,
    /// Unmodelled attributes.
    #[serde(flatten)]
    pub extra: AttributeMap,
}

fn empty_dances() -> Vec<String> {
    vec![String::new(); DANCE_SLOTS]
}

fn empty_item_wraps() -> Vec<String> {
    vec![String::new(); ITEM_WRAP_SLOTS]
}

impl Default for AthenaStats {
    fn default() -> Self {
        Self {
            favorite_character: String::new(),
            favorite_backpack: String::new(),
            favorite_pickaxe: String::new(),
            favorite_glider: String::new(),
            favorite_skydivecontrail: String::new(),
            favorite_loadingscreen: String::new(),
            favorite_musicpack: String::new(),
            favorite_dance: empty_dances(),
            favorite_itemwraps: empty_item_wraps(),
            banner_icon: String::new(),
            banner_color: String::new(),
            loadouts: Vec::new(),
            active_loadout_index: 0,
            last_applied_loadout: String::new(),
            season_num: 0,
            extra: AttributeMap::new(),
        }
    }
}

impl AthenaStats {
    /// Name of the active loadout, if the pointer is valid.
    pub fn active_loadout(&self) -> Option<&str> {
        self.loadouts.get(self.active_loadout_index).map(String::as_str)
    }
}

/// Stats of the `common_core` profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonCoreStats {
    /// Whether the account may receive gifts.
    #[serde(default)]
    pub allowed_to_receive_gifts: bool,
    /// Whether the account may send gifts.
    #[serde(default)]
    pub allowed_to_send_gifts: bool,
    /// Whether two-factor auth is considered enabled.
    #[serde(default)]
    pub mfa_enabled: bool,
    /// Gift boxes ever received, oldest first.
    #[serde(default)]
    pub gift_history: Vec<Value>,
    /// Unmodelled attributes.
    #[serde(flatten)]
    pub extra: AttributeMap,
}

impl Default for CommonCoreStats {
    fn default() -> Self {
        Self {
            allowed_to_receive_gifts: true,
            allowed_to_send_gifts: true,
            mfa_enabled: true,
            gift_history: Vec::new(),
            extra: AttributeMap::new(),
        }
    }
}

/// The `stats.attributes` bag, decoded by profile id.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileStats {
    /// Stats of an `athena` profile.
    Athena(Box<AthenaStats>),
    /// Stats of a `common_core` profile.
    CommonCore(CommonCoreStats),
    /// Stats of any other profile, kept verbatim.
    Generic(AttributeMap),
}

impl ProfileStats {
    /// Decode an attribute bag for the given profile id.
    pub fn from_attributes(profile_id: &ProfileId, attributes: Value) -> Result<Self, serde_json::Error> {
        let attributes = match attributes {
            Value::Null => Value::Object(serde_json::Map::new()),
            other => other,
        };
        Ok(match profile_id {
            ProfileId::Athena => Self::Athena(Box::new(serde_json::from_value(attributes)?)),
            ProfileId::CommonCore => Self::CommonCore(serde_json::from_value(attributes)?),
            ProfileId::Other(_) => Self::Generic(serde_json::from_value(attributes)?),
        })
    }

    /// Default stats for a freshly provisioned profile.
    pub fn template(profile_id: &ProfileId) -> Self {
        match profile_id {
            ProfileId::Athena => Self::Athena(Box::default()),
            ProfileId::CommonCore => Self::CommonCore(CommonCoreStats::default()),
            ProfileId::Other(_) => Self::Generic(AttributeMap::new()),
        }
    }
}

impl Serialize for ProfileStats {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Envelope<'a, T: Serialize> {
            attributes: &'a T,
        }

        match self {
            Self::Athena(stats) => Envelope { attributes: stats.as_ref() }.serialize(serializer),
            Self::CommonCore(stats) => Envelope { attributes: stats }.serialize(serializer),
            Self::Generic(stats) => Envelope { attributes: stats }.serialize(serializer),
        }
    }
}

// ---------------------------------------------------------------------------
// Profile document
// ---------------------------------------------------------------------------

/// A persisted profile document, keyed by `(account_id, profile_id)`.
///
/// Invariant: after every successful mutation `rvn` has grown by exactly one
/// and `command_revision == rvn`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawProfileDocument")]
pub struct ProfileDocument {
    /// Document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Owning account.
    pub account_id: AccountId,
    /// Which subsystem this document belongs to.
    pub profile_id: ProfileId,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Last successful mutation time.
    pub updated: DateTime<Utc>,
    /// Revision counter.
    pub rvn: i64,
    /// Command revision; equals `rvn` after every mutation.
    pub command_revision: i64,
    /// Wipe generation.
    pub wipe_number: u32,
    /// Template version the document was created from.
    pub version: String,
    /// Items keyed by item id.
    pub items: BTreeMap<String, Item>,
    /// Typed stats.
    pub stats: ProfileStats,
}

/// Wire form used to decode [`ProfileDocument`] before the stats are typed.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawProfileDocument {
    #[serde(rename = "_id", default)]
    id: String,
    account_id: AccountId,
    profile_id: ProfileId,
    created: DateTime<Utc>,
    updated: DateTime<Utc>,
    #[serde(default)]
    rvn: i64,
    #[serde(default)]
    command_revision: i64,
    #[serde(default)]
    wipe_number: u32,
    #[serde(default)]
    version: String,
    #[serde(default)]
    items: BTreeMap<String, Item>,
    #[serde(default)]
    stats: RawStats,
}

#[derive(Deserialize, Default)]
struct RawStats {
    #[serde(default)]
    attributes: Value,
}

impl TryFrom<RawProfileDocument> for ProfileDocument {
    type Error = serde_json::Error;

    fn try_from(raw: RawProfileDocument) -> Result<Self, Self::Error> {
        let stats = ProfileStats::from_attributes(&raw.profile_id, raw.stats.attributes)?;
        Ok(Self {
            id: raw.id,
            account_id: raw.account_id,
            profile_id: raw.profile_id,
            created: raw.created,
            updated: raw.updated,
            rvn: raw.rvn,
            command_revision: raw.command_revision,
            wipe_number: raw.wipe_number,
            version: raw.version,
            items: raw.items,
            stats,
        })
    }
}

impl ProfileDocument {
    /// Build a fresh document from the built-in template.
    pub fn template(account_id: AccountId, profile_id: ProfileId, now: DateTime<Utc>) -> Self {
        let stats = ProfileStats::template(&profile_id);
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            account_id,
            profile_id,
            created: now,
            updated: now,
            rvn: 1,
            command_revision: 1,
            wipe_number: 1,
            version: "lobby_template_v1".to_owned(),
            items: BTreeMap::new(),
            stats,
        }
    }

    /// Whether any item in the document has one of the given template ids.
    pub fn owns_any<S: AsRef<str>>(&self, template_ids: &[S]) -> bool {
        self.items.values().any(|item| {
            template_ids
                .iter()
                .any(|t| t.as_ref() == item.template_id)
        })
    }

    /// Insert a granted item keyed by its template id and return a copy of it.
    pub fn grant(&mut self, template_id: &str) -> Item {
        let item = Item::granted(template_id);
        self.items.insert(template_id.to_owned(), item.clone());
        item
    }

    /// Mirror a currency balance into the currency item.
    pub fn set_currency(&mut self, balance: u64) {
        self.items
            .insert(CURRENCY_ITEM_ID.to_owned(), Item::currency(balance));
    }

    /// Typed `athena` stats, if this is an athena document.
    pub fn athena_stats(&self) -> Option<&AthenaStats> {
        match &self.stats {
            ProfileStats::Athena(stats) => Some(stats.as_ref()),
            _ => None,
        }
    }

    /// Mutable typed `athena` stats, if this is an athena document.
    pub fn athena_stats_mut(&mut self) -> Option<&mut AthenaStats> {
        match &mut self.stats {
            ProfileStats::Athena(stats) => Some(stats.as_mut()),
            _ => None,
        }
    }

    /// Mutable typed `common_core` stats, if this is a common_core document.
    pub fn common_core_stats_mut(&mut self) -> Option<&mut CommonCoreStats> {
        match &mut self.stats {
            ProfileStats::CommonCore(stats) => Some(stats),
            _ => None,
        }
    }

    /// Advance the revision by one and stamp the update time.
    ///
    /// Keeps `command_revision` equal to `rvn`.
    pub fn bump_revision(&mut self, now: DateTime<Utc>) {
        self.rvn = self.rvn.saturating_add(1);
        self.command_revision = self.rvn;
        self.updated = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn athena() -> ProfileDocument {
        ProfileDocument::template(AccountId::from("acc"), ProfileId::Athena, Utc::now())
    }

    #[test]
    fn profile_id_roundtrips_known_and_unknown_names() {
        assert_eq!(ProfileId::from("athena"), ProfileId::Athena);
        assert_eq!(ProfileId::from("common_core"), ProfileId::CommonCore);
        assert_eq!(
            ProfileId::from("creative"),
            ProfileId::Other("creative".to_owned())
        );
        assert_eq!(String::from(ProfileId::CommonCore), "common_core");
    }

    #[test]
    fn bump_revision_keeps_command_revision_in_step() {
        let mut doc = athena();
        let before = doc.rvn;
        doc.bump_revision(Utc::now());
        doc.bump_revision(Utc::now());
        assert_eq!(doc.rvn, before + 2);
        assert_eq!(doc.command_revision, doc.rvn);
    }

    #[test]
    fn stats_are_typed_by_profile_id_and_keep_unknown_keys() {
        let json = serde_json::json!({
            "_id": "x",
            "accountId": "acc",
            "profileId": "athena",
            "created": "2024-01-01T00:00:00Z",
            "updated": "2024-01-01T00:00:00Z",
            "rvn": 3,
            "commandRevision": 3,
            "items": {},
            "stats": { "attributes": {
                "favorite_character": "AthenaCharacter:cid_001",
                "book_level": 42
            }}
        });
        let doc: Result<ProfileDocument, _> = serde_json::from_value(json);
        assert!(doc.is_ok());
        if let Ok(doc) = doc {
            let stats = doc.athena_stats();
            assert!(stats.is_some());
            if let Some(stats) = stats {
                assert_eq!(stats.favorite_character, "AthenaCharacter:cid_001");
                assert_eq!(stats.extra.get("book_level"), Some(&Value::from(42)));
                assert_eq!(stats.favorite_dance.len(), DANCE_SLOTS);
            }
            let back = serde_json::to_value(&doc).unwrap_or(Value::Null);
            assert_eq!(back["stats"]["attributes"]["book_level"], 42);
        }
    }

    #[test]
    fn owns_any_matches_template_ids() {
        let mut doc = athena();
        doc.grant("AthenaCharacter:cid_001");
        assert!(doc.owns_any(&["AthenaCharacter:cid_001", "other"]));
        assert!(!doc.owns_any(&["AthenaPickaxe:pickaxe_001"]));
    }

    #[test]
    fn merge_variant_replaces_existing_channel_and_appends_new() {
        let mut attrs = ItemAttributes::default();
        attrs.merge_variant("Material", "Mat1");
        attrs.merge_variant("Parts", "Stage2");
        attrs.merge_variant("Material", "Mat3");

        assert_eq!(attrs.variants.len(), 2);
        assert_eq!(attrs.variants[0].channel, "Material");
        assert_eq!(attrs.variants[0].active, "Mat3");
        assert_eq!(attrs.variants[0].owned, vec!["Mat3".to_owned()]);
        assert_eq!(attrs.variants[1].channel, "Parts");
    }

    #[test]
    fn active_loadout_follows_pointer() {
        let mut stats = AthenaStats::default();
        assert_eq!(stats.active_loadout(), None);
        stats.loadouts = vec!["sandbox_loadout".to_owned(), "zombie_loadout".to_owned()];
        stats.active_loadout_index = 1;
        assert_eq!(stats.active_loadout(), Some("zombie_loadout"));
    }
}
