//! Gift boxes and the daily login grant.
//!
//! A gift box is a `common_core` item summarizing what arrived, who sent it,
//! and the attached message. Purchased gifts and the daily currency grant
//! both produce one.

use chrono::{DateTime, Datelike, Utc};
use lobby_types::profile::AttributeMap;
use lobby_types::{Item, ItemAttributes, LootItem};
use serde_json::{Value, json};

/// Wrap template used by the daily grant and by gifts that name none.
pub const DEFAULT_WRAP_TEMPLATE: &str = "GiftBox:gb_default";

/// Loot type credited by the daily grant.
pub const DAILY_GRANT_LOOT_TYPE: &str = "Currency:MtxGiveaway";

/// Sender recorded on daily grant boxes.
pub const DAILY_GRANT_SENDER: &str = "Server";

/// Message recorded on daily grant boxes.
pub const DAILY_GRANT_MESSAGE: &str = "Daily Login Reward";

/// Contents of a gift box before it becomes an [`Item`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftBox {
    /// Wrap template id.
    pub wrap_template_id: String,
    /// Sender account id (or `Server`).
    pub from_account_id: String,
    /// Items inside the box.
    pub loot: Vec<LootItem>,
    /// Personal message.
    pub message: String,
    /// When the box was sent.
    pub gifted_on: DateTime<Utc>,
}

impl GiftBox {
    /// The box recorded by a daily grant of `amount`.
    pub fn daily(amount: u64, now: DateTime<Utc>) -> Self {
        Self {
            wrap_template_id: DEFAULT_WRAP_TEMPLATE.to_owned(),
            from_account_id: DAILY_GRANT_SENDER.to_owned(),
            loot: vec![LootItem {
                item_type: DAILY_GRANT_LOOT_TYPE.to_owned(),
                item_guid: DAILY_GRANT_LOOT_TYPE.to_owned(),
                item_profile: "athena".to_owned(),
                quantity: amount,
            }],
            message: DAILY_GRANT_MESSAGE.to_owned(),
            gifted_on: now,
        }
    }

    /// Render the box as a profile item.
    pub fn to_item(&self) -> Item {
        let mut extra = AttributeMap::new();
        extra.insert(
            "fromAccountId".to_owned(),
            Value::from(self.from_account_id.clone()),
        );
        extra.insert(
            "lootList".to_owned(),
            serde_json::to_value(&self.loot).unwrap_or_else(|_| Value::Array(Vec::new())),
        );
        extra.insert("params".to_owned(), json!({ "userMessage": self.message }));
        extra.insert(
            "giftedOn".to_owned(),
            Value::from(self.gifted_on.to_rfc3339()),
        );
        Item {
            template_id: self.wrap_template_id.clone(),
            attributes: ItemAttributes {
                extra,
                ..ItemAttributes::default()
            },
            quantity: 1,
        }
    }
}

/// Whether the daily grant is due.
///
/// Eligibility compares the calendar day-of-month of the last login with
/// today's, not the elapsed time. An account that never logged in is due.
pub fn daily_grant_due(last_login: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    last_login.is_none_or(|last| last.day() != now.day())
}
