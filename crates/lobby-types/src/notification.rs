//! Messages pushed to connected clients over the notification channel.
//!
//! Party events share a fixed envelope (`type`, `ns`, `party_id`,
//! `revision`, `sent`) with an event-specific body flattened into it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ids::{AccountId, PartyId};
use crate::party::{Connection, MetaMap, Party, PartyMember};

/// Namespace stamped on every party event.
pub const PARTY_NAMESPACE: &str = "Fortnite";

/// Type of the gift-received message.
pub const GIFT_RECEIVED_TYPE: &str = "com.epicgames.gift.received";

/// Discriminator of a party event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartyEventKind {
    /// A member joined (or created) the party.
    MemberJoined,
    /// Party meta or config changed.
    PartyUpdated,
    /// One member's meta changed.
    MemberStateUpdated,
    /// A member left or was removed.
    MemberLeft,
    /// A member was promoted to captain.
    MemberNewCaptain,
}

impl PartyEventKind {
    /// Dot-namespaced wire type.
    pub const fn wire_type(self) -> &'static str {
        match self {
            Self::MemberJoined => "com.epicgames.social.party.notification.v0.MEMBER_JOINED",
            Self::PartyUpdated => "com.epicgames.social.party.notification.v0.PARTY_UPDATED",
            Self::MemberStateUpdated => {
                "com.epicgames.social.party.notification.v0.MEMBER_STATE_UPDATED"
            }
            Self::MemberLeft => "com.epicgames.social.party.notification.v0.MEMBER_LEFT",
            Self::MemberNewCaptain => {
                "com.epicgames.social.party.notification.v0.MEMBER_NEW_CAPTAIN"
            }
        }
    }
}

/// Event-specific body of a party notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PartyEventBody {
    /// Body of `MEMBER_JOINED`.
    MemberJoined {
        /// Joining account.
        account_id: AccountId,
        /// Joining display name.
        account_dn: Option<String>,
        /// Joining member's first connection.
        connection: Option<Connection>,
        /// Joining member's meta.
        member_state_updated: MetaMap,
        /// Member update time.
        updated_at: DateTime<Utc>,
        /// Member join time.
        joined_at: DateTime<Utc>,
    },
    /// Body of `PARTY_UPDATED`.
    PartyUpdated {
        /// Current captain.
        captain_id: Option<AccountId>,
        /// Party creation time.
        created_at: DateTime<Utc>,
        /// Invite time-to-live.
        invite_ttl_seconds: u32,
        /// Maximum members.
        max_number_of_members: u32,
        /// Privacy type.
        party_privacy_type: String,
        /// Overridden keys (always empty).
        party_state_overriden: MetaMap,
        /// Removed meta keys.
        party_state_removed: Vec<String>,
        /// Full party meta after the update.
        party_state_updated: MetaMap,
        /// Party sub type.
        party_sub_type: String,
        /// Party type.
        party_type: String,
        /// Party update time.
        updated_at: DateTime<Utc>,
    },
    /// Body of `MEMBER_STATE_UPDATED`.
    MemberStateUpdated {
        /// Updated account.
        account_id: AccountId,
        /// Updated display name.
        account_dn: Option<String>,
        /// Full member meta after the update.
        member_state_updated: MetaMap,
        /// Removed meta keys.
        member_state_removed: Vec<String>,
        /// Overridden keys (always empty).
        member_state_overridden: MetaMap,
        /// Member update time.
        updated_at: DateTime<Utc>,
    },
    /// Body of `MEMBER_LEFT`.
    MemberLeft {
        /// Departing account.
        account_id: AccountId,
    },
    /// Body of `MEMBER_NEW_CAPTAIN`.
    MemberNewCaptain {
        /// Promoted account.
        account_id: AccountId,
        /// Promoted display name.
        account_dn: Option<String>,
        /// Promoted member's meta.
        member_state_updated: MetaMap,
        /// Member join time.
        joined_at: DateTime<Utc>,
        /// Member update time.
        updated_at: DateTime<Utc>,
    },
}

/// A party event addressed to every current member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartyNotification {
    /// Dot-namespaced event type.
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Always [`PARTY_NAMESPACE`].
    pub ns: &'static str,
    /// Party the event belongs to.
    pub party_id: PartyId,
    /// Party revision at send time (before any increment).
    pub revision: u64,
    /// Send timestamp.
    pub sent: DateTime<Utc>,
    /// Event-specific fields.
    #[serde(flatten)]
    pub body: PartyEventBody,
}

impl PartyNotification {
    /// `MEMBER_JOINED` for `member`.
    pub fn member_joined(party: &Party, member: &PartyMember, now: DateTime<Utc>) -> Self {
        Self::envelope(
            PartyEventKind::MemberJoined,
            party,
            now,
            PartyEventBody::MemberJoined {
                account_id: member.account_id.clone(),
                account_dn: member.display_name().map(str::to_owned),
                connection: member.connections.first().cloned(),
                member_state_updated: member.meta.clone(),
                updated_at: member.updated_at,
                joined_at: member.joined_at,
            },
        )
    }

    /// `PARTY_UPDATED` carrying the party's full meta.
    pub fn party_updated(
        party: &Party,
        revision: u64,
        removed: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let mut notification = Self::envelope(
            PartyEventKind::PartyUpdated,
            party,
            now,
            PartyEventBody::PartyUpdated {
                captain_id: party.captain().map(|c| c.account_id.clone()),
                created_at: party.created_at,
                invite_ttl_seconds: party.config.invite_ttl,
                max_number_of_members: party.config.max_size,
                party_privacy_type: "OPEN".to_owned(),
                party_state_overriden: MetaMap::new(),
                party_state_removed: removed,
                party_state_updated: party.meta.clone(),
                party_sub_type: party.config.sub_type.clone(),
                party_type: party.config.party_type.clone(),
                updated_at: party.updated_at,
            },
        );
        notification.revision = revision;
        notification
    }

    /// `MEMBER_STATE_UPDATED` for `member`.
    pub fn member_state_updated(
        party: &Party,
        member: &PartyMember,
        removed: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self::envelope(
            PartyEventKind::MemberStateUpdated,
            party,
            now,
            PartyEventBody::MemberStateUpdated {
                account_id: member.account_id.clone(),
                account_dn: member.display_name().map(str::to_owned),
                member_state_updated: member.meta.clone(),
                member_state_removed: removed,
                member_state_overridden: MetaMap::new(),
                updated_at: member.updated_at,
            },
        )
    }

    /// `MEMBER_LEFT` for `account_id`.
    pub fn member_left(party: &Party, account_id: AccountId, now: DateTime<Utc>) -> Self {
        Self::envelope(
            PartyEventKind::MemberLeft,
            party,
            now,
            PartyEventBody::MemberLeft { account_id },
        )
    }

    /// `MEMBER_NEW_CAPTAIN` for `member`.
    pub fn member_new_captain(party: &Party, member: &PartyMember, now: DateTime<Utc>) -> Self {
        Self::envelope(
            PartyEventKind::MemberNewCaptain,
            party,
            now,
            PartyEventBody::MemberNewCaptain {
                account_id: member.account_id.clone(),
                account_dn: member.display_name().map(str::to_owned),
                member_state_updated: member.meta.clone(),
                joined_at: member.joined_at,
                updated_at: member.updated_at,
            },
        )
    }

    fn envelope(
        kind: PartyEventKind,
        party: &Party,
        now: DateTime<Utc>,
        body: PartyEventBody,
    ) -> Self {
        Self {
            kind: kind.wire_type(),
            ns: PARTY_NAMESPACE,
            party_id: party.id.clone(),
            revision: party.revision,
            sent: now,
            body,
        }
    }
}

/// Message telling a recipient a gift arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GiftReceived {
    /// Always [`GIFT_RECEIVED_TYPE`].
    #[serde(rename = "type")]
    pub kind: &'static str,
    /// Empty payload object.
    pub payload: serde_json::Map<String, serde_json::Value>,
    /// Send timestamp.
    pub timestamp: DateTime<Utc>,
}

impl GiftReceived {
    /// A gift-received message stamped `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            kind: GIFT_RECEIVED_TYPE,
            payload: serde_json::Map::new(),
            timestamp: now,
        }
    }
}

// ---------------------------------------------------------------------------
// Notification channel
// ---------------------------------------------------------------------------

/// Outcome of pushing one message to one account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The message was queued on a live connection.
    Delivered,
    /// The account has no live connection; the message was dropped.
    Absent,
}

/// Best-effort push channel to connected accounts.
///
/// Implementations must not block: a call enqueues or drops and returns.
/// [`Delivery::Absent`] is not an error.
pub trait Notifier: Send + Sync {
    /// Push `message` to `account_id`.
    fn notify(&self, account_id: &AccountId, message: serde_json::Value) -> Delivery;
}
