//! Document keys.
//!
//! # Key Patterns
//!
//! | Pattern | Document |
//! |---------|----------|
//! | `account:{accountId}` | [`Account`](lobby_types::Account) |
//! | `profile:{accountId}:{profileId}` | [`ProfileDocument`](lobby_types::ProfileDocument) |
//! | `loadout:{accountId}:{lockerName}` | [`Loadout`](lobby_types::Loadout) |
//! | `ledger:{accountId}` | list of currency entries |

use lobby_types::{AccountId, ProfileId};

/// Address of one document in the store.
///
/// The derived `Ord` compares the variant first (accounts, then profiles,
/// then loadouts, then ledgers) and then the fields in declaration order. It
/// is not the order of the rendered strings, but it is total and stable, which
/// is all the profile engine needs to take multi-document locks without
/// cycles.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DocumentKey {
    /// An account record.
    Account(AccountId),
    /// A profile document.
    Profile {
        /// Owning account.
        account: AccountId,
        /// Profile id.
        profile: ProfileId,
    },
    /// A loadout record.
    Loadout {
        /// Owning account.
        account: AccountId,
        /// Locker name.
        name: String,
    },
    /// Currency ledger of one account.
    Ledger(AccountId),
}

impl DocumentKey {
    /// Key of an account record.
    pub fn account(account: &AccountId) -> Self {
        Self::Account(account.clone())
    }

    /// Key of a profile document.
    pub fn profile(account: &AccountId, profile: &ProfileId) -> Self {
        Self::Profile {
            account: account.clone(),
            profile: profile.clone(),
        }
    }

    /// Key of a loadout record.
    pub fn loadout(account: &AccountId, name: &str) -> Self {
        Self::Loadout {
            account: account.clone(),
            name: name.to_owned(),
        }
    }

    /// Key of an account's currency ledger.
    pub fn ledger(account: &AccountId) -> Self {
        Self::Ledger(account.clone())
    }
}

impl core::fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Account(account) => write!(f, "account:{account}"),
            Self::Profile { account, profile } => write!(f, "profile:{account}:{profile}"),
            Self::Loadout { account, name } => write!(f, "loadout:{account}:{name}"),
            Self::Ledger(account) => write!(f, "ledger:{account}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_render_with_prefixes() {
        let account = AccountId::from("a1");
        assert_eq!(DocumentKey::account(&account).to_string(), "account:a1");
        assert_eq!(
            DocumentKey::profile(&account, &ProfileId::Athena).to_string(),
            "profile:a1:athena"
        );
        assert_eq!(
            DocumentKey::loadout(&account, "sandbox_loadout").to_string(),
            "loadout:a1:sandbox_loadout"
        );
        assert_eq!(DocumentKey::ledger(&account).to_string(), "ledger:a1");
    }

    #[test]
    fn ordering_follows_variant_before_fields() {
        let a = AccountId::from("a");
        let z = AccountId::from("z");
        let loadout = DocumentKey::loadout(&z, "x");
        let profile = DocumentKey::profile(&a, &ProfileId::Athena);

        // Rendered, "loadout:z:x" sorts first; the variant order wins.
        assert!(loadout.to_string() < profile.to_string());
        assert!(profile < loadout);

        assert!(DocumentKey::account(&z) < profile);
        assert!(profile < DocumentKey::profile(&z, &ProfileId::Athena));
        assert!(loadout < DocumentKey::ledger(&a));
    }
}
