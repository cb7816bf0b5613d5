//! Shared type definitions for the lobby services.
//!
//! This crate is the single source of truth for the records exchanged between
//! the profile revision engine, the party coordinator, the document store, and
//! the HTTP boundary.
//!
//! # Modules
//!
//! - [`ids`] -- String-backed identifier newtypes
//! - [`account`] -- Player account record
//! - [`profile`] -- Profile documents, items, and the typed stats union
//! - [`loadout`] -- Cosmetic locker records
//! - [`change`] -- Change entries and response envelopes
//! - [`party`] -- Party, member, and connection records
//! - [`notification`] -- Messages pushed to connected clients

pub mod account;
pub mod change;
pub mod ids;
pub mod loadout;
pub mod notification;
pub mod party;
pub mod profile;

// Re-export primary types at crate root.
pub use account::Account;
pub use change::{
    LootItem, LootResult, MultiUpdate, ProfileChange, ProfileResponse, ResponseNotification,
};
pub use ids::{AccountId, ItemId, PartyId};
pub use loadout::{Loadout, LockerSlot, LockerSlotsData};
pub use notification::{Delivery, GiftReceived, Notifier, PartyEventKind, PartyNotification};
pub use party::{Connection, Joinability, MetaMap, Party, PartyConfig, PartyMember, Role};
pub use profile::{
    AthenaStats, CommonCoreStats, Item, ItemAttributes, ProfileDocument, ProfileId, ProfileStats,
    Variant,
};

/// Client-facing error taxonomy shared by every service.
///
/// Each service error maps onto exactly one kind; the HTTP boundary turns the
/// kind into a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A document, party, member, or offer does not exist.
    NotFound,
    /// The account already owns something the request would grant.
    AlreadyOwned,
    /// The client-declared price differs from the server price.
    PriceMismatch,
    /// The balance cannot cover the price.
    InsufficientFunds,
    /// The request is malformed or violates a precondition.
    Validation,
    /// Store or serialization failure.
    Internal,
}
