//! Party, member, and connection records.
//!
//! Parties are ephemeral: they live in the coordinator's in-memory registry
//! for the lifetime of the process. Field names follow the party service's
//! snake_case wire format.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AccountId, PartyId};

/// Free-form key/value state synchronized to clients.
pub type MetaMap = BTreeMap<String, String>;

/// Member meta key holding the display name.
pub const META_DISPLAY_NAME: &str = "urn:epic:member:dn_s";

/// Member meta key holding the captain's join-request users blob.
pub const META_JOIN_REQUEST_USERS: &str = "urn:epic:member:joinrequestusers_j";

/// Party meta key holding the positional squad assignment blob.
pub const META_SQUAD_ASSIGNMENTS: &str = "RawSquadAssignments_j";

/// Role of a member inside a party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// The single leader of a non-empty party.
    Captain,
    /// Any other member.
    Member,
}

/// Who may join a party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Joinability {
    /// Anyone may join.
    Open,
    /// Only invited accounts may join.
    InviteAndFormer,
    /// Nobody may join.
    Closed,
}

/// Party configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyConfig {
    /// Party type.
    #[serde(rename = "type", default = "default_party_type")]
    pub party_type: String,
    /// Join policy.
    #[serde(default = "default_joinability")]
    pub joinability: Joinability,
    /// Discovery policy.
    #[serde(default = "default_discoverability")]
    pub discoverability: String,
    /// Party sub type.
    #[serde(default = "default_sub_type")]
    pub sub_type: String,
    /// Maximum number of members.
    #[serde(default = "default_max_size")]
    pub max_size: u32,
    /// Invite time-to-live in seconds.
    #[serde(default = "default_invite_ttl")]
    pub invite_ttl: u32,
    /// Whether joins require captain confirmation.
    #[serde(default)]
    pub join_confirmation: bool,
}

fn default_party_type() -> String {
    "DEFAULT".to_owned()
}

const fn default_joinability() -> Joinability {
    Joinability::Open
}

fn default_discoverability() -> String {
    "ALL".to_owned()
}

fn default_sub_type() -> String {
    "default".to_owned()
}

const fn default_max_size() -> u32 {
    4
}

const fn default_invite_ttl() -> u32 {
    14400
}

impl Default for PartyConfig {
    fn default() -> Self {
        Self {
            party_type: default_party_type(),
            joinability: default_joinability(),
            discoverability: default_discoverability(),
            sub_type: default_sub_type(),
            max_size: default_max_size(),
            invite_ttl: default_invite_ttl(),
            join_confirmation: false,
        }
    }
}

/// Transport/platform descriptor attached to a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Connection id (usually a JID).
    pub id: String,
    /// When the connection was established.
    pub connected_at: DateTime<Utc>,
    /// Last change to the connection.
    pub updated_at: DateTime<Utc>,
    /// Whether the member offered to hand over leadership.
    #[serde(default)]
    pub yield_leadership: bool,
    /// Connection meta (platform, type).
    #[serde(default)]
    pub meta: MetaMap,
}

impl Connection {
    /// A connection established at `now`.
    pub fn new(id: impl Into<String>, meta: MetaMap, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            connected_at: now,
            updated_at: now,
            yield_leadership: false,
            meta,
        }
    }
}

/// One member of a party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyMember {
    /// Member account.
    pub account_id: AccountId,
    /// Member meta overlay.
    #[serde(default)]
    pub meta: MetaMap,
    /// Member connections.
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// Per-member revision.
    pub revision: u64,
    /// Last change to the member.
    pub updated_at: DateTime<Utc>,
    /// When the member joined.
    pub joined_at: DateTime<Utc>,
    /// Member role.
    pub role: Role,
}

impl PartyMember {
    /// A member joining at `now`.
    pub fn new(
        account_id: AccountId,
        role: Role,
        meta: MetaMap,
        connection: Connection,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id,
            meta,
            connections: vec![connection],
            revision: 0,
            updated_at: now,
            joined_at: now,
            role,
        }
    }

    /// Display name from meta, if set.
    pub fn display_name(&self) -> Option<&str> {
        self.meta.get(META_DISPLAY_NAME).map(String::as_str)
    }
}

/// An active party.
///
/// Invariant: a party with zero members is removed from the registry; a
/// non-empty party has exactly one [`Role::Captain`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    /// Party id.
    pub id: PartyId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last change time.
    pub updated_at: DateTime<Utc>,
    /// Configuration.
    pub config: PartyConfig,
    /// Ordered member list.
    pub members: Vec<PartyMember>,
    /// Pending applicants (always empty; kept for the wire shape).
    #[serde(default)]
    pub applicants: Vec<serde_json::Value>,
    /// Party meta overlay.
    #[serde(default)]
    pub meta: MetaMap,
    /// Outstanding invites (always empty; kept for the wire shape).
    #[serde(default)]
    pub invites: Vec<serde_json::Value>,
    /// Party revision.
    pub revision: u64,
    /// Join intentions (always empty; kept for the wire shape).
    #[serde(default)]
    pub intentions: Vec<serde_json::Value>,
}

impl Party {
    /// An empty party created at `now`.
    pub fn new(id: PartyId, config: PartyConfig, now: DateTime<Utc>) -> Self {
        Self {
            id,
            created_at: now,
            updated_at: now,
            config,
            members: Vec::new(),
            applicants: Vec::new(),
            meta: MetaMap::new(),
            invites: Vec::new(),
            revision: 0,
            intentions: Vec::new(),
        }
    }

    /// The captain, if the party is non-empty.
    pub fn captain(&self) -> Option<&PartyMember> {
        self.members.iter().find(|m| m.role == Role::Captain)
    }

    /// Look up a member by account.
    pub fn member(&self, account_id: &AccountId) -> Option<&PartyMember> {
        self.members.iter().find(|m| &m.account_id == account_id)
    }

    /// Mutable lookup of a member by account.
    pub fn member_mut(&mut self, account_id: &AccountId) -> Option<&mut PartyMember> {
        self.members.iter_mut().find(|m| &m.account_id == account_id)
    }

    /// Whether the account is a member.
    pub fn contains(&self, account_id: &AccountId) -> bool {
        self.member(account_id).is_some()
    }
}
