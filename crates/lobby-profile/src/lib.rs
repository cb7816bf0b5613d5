//! Profile revision engine for the lobby services.
//!
//! A profile document is an account's persisted state for one subsystem
//! (`common_core` for currency and gift boxes, `athena` for cosmetics and
//! loadouts). Clients mutate it through a closed set of commands; each
//! successful command advances the document revision by exactly one and
//! returns the changes it made.
//!
//! # Modules
//!
//! - [`engine`] -- The load, dispatch, reconcile, persist cycle
//! - [`command`] -- Command parsing and lock scopes
//! - [`locker`] -- Slot rules and the athena loadout projection
//! - [`locks`] -- Per-document async mutexes
//! - [`economy`] -- Purchase and gift commands
//! - [`error`] -- Profile errors and their client-facing kinds
//!
//! Query, cosmetic, and provisioning commands are implemented as further
//! `impl` blocks on [`ProfileEngine`].

pub mod command;
mod context;
mod cosmetics;
pub mod economy;
pub mod engine;
pub mod error;
pub mod locker;
pub mod locks;
mod provision;
mod query;

pub use command::ProfileCommand;
pub use context::RESPONSE_VERSION;
pub use engine::{EngineSettings, ProfileEngine, REVISION_UNCHECKED};
pub use query::COSMETIC_LOCKER_ITEM;
pub use error::ProfileError;
