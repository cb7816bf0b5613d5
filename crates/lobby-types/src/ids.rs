//! Type-safe identifier wrappers.
//!
//! Accounts, parties, and documents are addressed by opaque strings on the
//! wire (32 hex characters for generated ids). Wrapping them prevents an
//! account id from being passed where a party id is expected. Generated ids
//! use the dash-less UUID v4 form the game client expects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`String`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new random identifier (dash-less UUID v4).
            pub fn generate() -> Self {
                Self(Uuid::new_v4().simple().to_string())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a player account.
    AccountId
}

define_id! {
    /// Unique identifier for an active party.
    PartyId
}

define_id! {
    /// Key of an item inside a profile document's item map.
    ItemId
}
