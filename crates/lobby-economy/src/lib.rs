//! Economy rules for the lobby services.
//!
//! This crate holds the pure, document-free part of the economy: which
//! offers exist, whether a purchase or gift is allowed, how a balance moves,
//! and what a gift box looks like. The profile engine combines these with
//! document loads and saves.
//!
//! # Modules
//!
//! - [`catalog`] -- Offer lookup seam and the static JSON catalog
//! - [`rules`] -- Purchase and gift validation
//! - [`ledger`] -- Validated balance movements
//! - [`gift`] -- Gift boxes and daily grant eligibility
//! - [`error`] -- Economy errors

pub mod catalog;
pub mod error;
pub mod gift;
pub mod ledger;
pub mod rules;

pub use catalog::{CatalogOffer, CatalogSource, StaticCatalog};
pub use error::EconomyError;
pub use gift::{GiftBox, daily_grant_due};
pub use ledger::{CurrencyEntry, CurrencyTransaction, Direction, EntryType};
