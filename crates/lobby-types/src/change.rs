//! Change entries and the profile response envelope.
//!
//! Every profile command answers with the document's new revision counters
//! and an ordered list of [`ProfileChange`] entries describing what moved.
//! Commands that also touched a second document report it in a
//! [`MultiUpdate`] block carrying that document's own revisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::profile::{Item, ProfileDocument, ProfileId};

/// One tagged description of a document mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "changeType", rename_all = "camelCase")]
pub enum ProfileChange {
    /// The whole document, for clients that must resync.
    FullProfileUpdate {
        /// Document snapshot.
        profile: Box<ProfileDocument>,
    },
    /// An item was added.
    #[serde(rename_all = "camelCase")]
    ItemAdded {
        /// Item key.
        item_id: String,
        /// The added item.
        item: Item,
    },
    /// One attribute of an item changed.
    #[serde(rename_all = "camelCase")]
    ItemAttrChanged {
        /// Item key.
        item_id: String,
        /// Attribute name.
        attribute_name: String,
        /// New attribute value.
        attribute_value: Value,
    },
    /// An item's quantity changed.
    #[serde(rename_all = "camelCase")]
    ItemQuantityChanged {
        /// Item key.
        item_id: String,
        /// New quantity.
        quantity: u64,
    },
    /// A stat attribute changed.
    StatModified {
        /// Stat name.
        name: String,
        /// New value.
        value: Value,
    },
}

impl ProfileChange {
    /// A full-document resync entry.
    pub fn full(profile: &ProfileDocument) -> Self {
        Self::FullProfileUpdate {
            profile: Box::new(profile.clone()),
        }
    }

    /// An `itemAttrChanged` entry.
    pub fn attr(item_id: impl Into<String>, name: impl Into<String>, value: Value) -> Self {
        Self::ItemAttrChanged {
            item_id: item_id.into(),
            attribute_name: name.into(),
            attribute_value: value,
        }
    }

    /// A `statModified` entry.
    pub fn stat(name: impl Into<String>, value: Value) -> Self {
        Self::StatModified {
            name: name.into(),
            value,
        }
    }
}

/// Incremental changes to a second document touched by the same command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiUpdate {
    /// The other document's new revision.
    pub profile_revision: i64,
    /// The other document's profile id.
    pub profile_id: ProfileId,
    /// Revision the changes apply on top of.
    pub profile_changes_base_revision: i64,
    /// The other document's changes.
    pub profile_changes: Vec<ProfileChange>,
    /// The other document's command revision.
    pub profile_command_revision: i64,
}

impl MultiUpdate {
    /// Build a block from a document that has already been bumped.
    pub fn for_document(doc: &ProfileDocument, changes: Vec<ProfileChange>) -> Self {
        Self {
            profile_revision: doc.rvn,
            profile_id: doc.profile_id.clone(),
            profile_changes_base_revision: doc.rvn.saturating_sub(1),
            profile_changes: changes,
            profile_command_revision: doc.command_revision,
        }
    }
}

/// One granted item in a loot result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LootItem {
    /// Granted template id.
    pub item_type: String,
    /// Item key in the target profile.
    pub item_guid: String,
    /// Profile the item was granted into.
    pub item_profile: String,
    /// Quantity granted.
    pub quantity: u64,
}

impl LootItem {
    /// A single athena cosmetic.
    pub fn athena(template_id: &str) -> Self {
        Self {
            item_type: template_id.to_owned(),
            item_guid: template_id.to_owned(),
            item_profile: ProfileId::Athena.as_str().to_owned(),
            quantity: 1,
        }
    }
}

/// Loot result attached to a response notification.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LootResult {
    /// Granted items.
    pub items: Vec<LootItem>,
}

/// In-band notification returned alongside a profile response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseNotification {
    /// Notification type (e.g. `CatalogPurchase`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether the client should surface it.
    pub primary: bool,
    /// Items granted by the command.
    pub loot_result: LootResult,
}

/// The response envelope of a profile command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    /// New revision of the requested document.
    pub profile_revision: i64,
    /// Requested profile id.
    pub profile_id: ProfileId,
    /// `profile_revision - 1`.
    pub profile_changes_base_revision: i64,
    /// Ordered change entries.
    pub profile_changes: Vec<ProfileChange>,
    /// New command revision (equals `profile_revision`).
    pub profile_command_revision: i64,
    /// Server time at response.
    pub server_time: DateTime<Utc>,
    /// Changes to other documents.
    pub multi_update: Vec<MultiUpdate>,
    /// In-band notifications.
    pub notifications: Vec<ResponseNotification>,
    /// Envelope version.
    pub response_version: u32,
}
