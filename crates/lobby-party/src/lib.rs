//! Party coordinator for the lobby services.
//!
//! Parties are ephemeral multi-member sessions held in process memory. The
//! coordinator executes membership and meta transitions and pushes one event
//! per transition to every current member.
//!
//! # Modules
//!
//! - [`coordinator`] -- Registry, account index, and party operations
//! - [`membership`] -- Join and leave transitions with the client's compatibility rules
//! - [`meta`] -- The `Default:` meta overlay rule
//! - [`request`] -- Request bodies
//! - [`error`] -- Error types

pub mod coordinator;
pub mod error;
mod fanout;
pub mod membership;
pub mod meta;
pub mod request;

pub use coordinator::{MAX_PARTY_SIZE, PartyCoordinator};
pub use error::PartyError;
pub use meta::MetaPatch;
pub use request::{ConnectionInfo, CreatePartyRequest, JoinInfo, JoinRequest, PatchPartyRequest};
