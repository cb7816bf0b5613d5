//! The party coordinator service.
//!
//! Owns every live party and the account to party index. Nothing outside
//! this module touches either map.
//!
//! # Locking
//!
//! The registry (`parties` + `index`) sits behind one [`RwLock`]; each party
//! has its own [`Mutex`]. Lock order is always party, then registry. The
//! registry lock is never held while waiting on a party lock; the only party
//! lock taken under the registry lock is the non-blocking `try_lock` of the
//! empty-party sweep.
//!
//! Events are broadcast while the party lock is held. The notifier only
//! enqueues, so members of one party receive events in the order the
//! operations were applied.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use lobby_types::party::{META_DISPLAY_NAME, META_JOIN_REQUEST_USERS};
use lobby_types::{
    AccountId, Connection, Joinability, MetaMap, Notifier, Party, PartyConfig, PartyId,
    PartyMember, PartyNotification, Role,
};

use crate::error::PartyError;
use crate::fanout::broadcast;
use crate::membership::{self, join_request_users};
use crate::meta::{MetaPatch, meta_from_json};
use crate::request::{CreatePartyRequest, JoinRequest, PatchPartyRequest};

/// Member limit forced onto every party.
pub const MAX_PARTY_SIZE: u32 = 4;

#[derive(Default)]
struct Registry {
    parties: HashMap<PartyId, Arc<Mutex<Party>>>,
    index: HashMap<AccountId, PartyId>,
}

impl Registry {
    /// The party `account_id` is indexed to, if it is still registered.
    fn entry_for(&self, account_id: &AccountId) -> Option<Arc<Mutex<Party>>> {
        self.index
            .get(account_id)
            .and_then(|id| self.parties.get(id))
            .cloned()
    }

    /// Register `party` and index its captain. Returns the captain's
    /// previous party, if any.
    fn insert(&mut self, party: Party) -> Option<PartyId> {
        let id = party.id.clone();
        let captain = party.captain().map(|c| c.account_id.clone());
        self.parties.insert(id.clone(), Arc::new(Mutex::new(party)));
        captain.and_then(|account| self.index.insert(account, id))
    }

    /// Drop the index entry only if it still points at `party_id`.
    fn unindex(&mut self, account_id: &AccountId, party_id: &PartyId) {
        if self.index.get(account_id) == Some(party_id) {
            self.index.remove(account_id);
        }
    }
}

/// Coordinates party membership and meta, and fans events out to members.
pub struct PartyCoordinator {
    registry: RwLock<Registry>,
    notifier: Arc<dyn Notifier>,
}

impl PartyCoordinator {
    /// Create a coordinator with an empty registry.
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            registry: RwLock::new(Registry::default()),
            notifier,
        }
    }

    /// Number of live parties.
    pub async fn party_count(&self) -> usize {
        self.registry.read().await.parties.len()
    }

    /// The account's party, or a fresh party with the account as its only
    /// member and captain.
    pub async fn get_or_create(
        &self,
        account_id: &AccountId,
        display_name: &str,
    ) -> Result<Party, PartyError> {
        loop {
            let entry = {
                let mut registry = self.registry.write().await;
                if let Some(entry) = registry.entry_for(account_id) {
                    entry
                } else {
                    let now = Utc::now();
                    let mut meta = MetaMap::new();
                    meta.insert(META_DISPLAY_NAME.to_owned(), display_name.to_owned());
                    let party =
                        found_party(account_id, meta, Vec::new(), PartyConfig::default(), now)?;
                    let snapshot = party.clone();
                    registry.insert(party);
                    tracing::info!(
                        party_id = %snapshot.id,
                        account_id = %account_id,
                        "Party created for account without one"
                    );
                    return Ok(snapshot);
                }
            };
            let party = entry.lock().await;
            if party.contains(account_id) {
                return Ok(party.clone());
            }
            // The account left while we waited; look again.
        }
    }

    /// Create a new party captained by `owner`.
    ///
    /// An existing party of `owner` is not left: the index moves to the new
    /// party and the old one keeps `owner` as a member until it is removed.
    pub async fn create_party(
        &self,
        owner: &AccountId,
        display_name: &str,
        request: CreatePartyRequest,
    ) -> Result<Party, PartyError> {
        let now = Utc::now();
        let CreatePartyRequest {
            config,
            join_info,
            meta,
        } = request;

        let mut member_meta = meta_from_json(join_info.meta);
        member_meta.insert(META_DISPLAY_NAME.to_owned(), display_name.to_owned());
        let connection = Connection::new(
            join_info.connection.id,
            meta_from_json(join_info.connection.meta),
            now,
        );
        let mut party = found_party(owner, member_meta, vec![connection], config, now)?;
        party.meta = meta_from_json(meta);

        // Nobody else can see the party yet, so the creator's event is first.
        if let Some(captain) = party.members.first() {
            broadcast(
                self.notifier.as_ref(),
                &party,
                &PartyNotification::member_joined(&party, captain, now),
            );
        }

        let snapshot = party.clone();
        let previous = self.registry.write().await.insert(party);
        tracing::info!(
            party_id = %snapshot.id,
            account_id = %owner,
            previous_party = ?previous,
            "Party created"
        );

        self.sweep_empty().await;
        Ok(snapshot)
    }

    /// Apply a meta patch to a party and broadcast `PARTY_UPDATED`.
    ///
    /// The event carries the revision the patch was applied on; the party
    /// revision is incremented afterwards.
    pub async fn patch_party(
        &self,
        party_id: &PartyId,
        request: PatchPartyRequest,
    ) -> Result<Party, PartyError> {
        let mut party = self.lock_party(party_id).await?;
        let now = Utc::now();

        let removed = request.meta.apply(&mut party.meta);
        force_join_policy(&mut party.config);
        party.updated_at = now;

        let notification = PartyNotification::party_updated(&party, party.revision, removed, now);
        party.revision = party.revision.saturating_add(1);
        broadcast(self.notifier.as_ref(), &party, &notification);

        tracing::debug!(party_id = %party_id, revision = party.revision, "Party meta patched");
        Ok(party.clone())
    }

    /// Apply a meta patch to one member and broadcast `MEMBER_STATE_UPDATED`.
    pub async fn patch_member_meta(
        &self,
        party_id: &PartyId,
        member_id: &AccountId,
        patch: &MetaPatch,
    ) -> Result<Party, PartyError> {
        let mut party = self.lock_party(party_id).await?;
        let now = Utc::now();

        let Some(member) = party.member_mut(member_id) else {
            return Err(PartyError::MemberNotFound {
                party_id: party_id.clone(),
                account_id: member_id.clone(),
            });
        };
        let removed = patch.apply(&mut member.meta);
        member.revision = member.revision.saturating_add(1);
        member.updated_at = now;
        let member = member.clone();

        broadcast(
            self.notifier.as_ref(),
            &party,
            &PartyNotification::member_state_updated(&party, &member, removed, now),
        );
        Ok(party.clone())
    }

    /// Add `account_id` to a party as a member and broadcast `MEMBER_JOINED`.
    ///
    /// The account must not be indexed to any party; callers leave the
    /// current party first.
    pub async fn join_member(
        &self,
        party_id: &PartyId,
        account_id: &AccountId,
        request: JoinRequest,
    ) -> Result<Party, PartyError> {
        let mut party = self.lock_party(party_id).await?;
        let now = Utc::now();

        {
            let mut registry = self.registry.write().await;
            let current = registry.index.get(account_id).cloned().or_else(|| {
                party.contains(account_id).then(|| party.id.clone())
            });
            if let Some(current) = current {
                return Err(PartyError::AlreadyInParty {
                    account_id: account_id.clone(),
                    party_id: current,
                });
            }

            let connection = Connection::new(
                request.connection.id,
                meta_from_json(request.connection.meta),
                now,
            );
            let joiner = PartyMember::new(
                account_id.clone(),
                Role::Member,
                meta_from_json(request.meta),
                connection,
                now,
            );
            membership::admit(&mut party, joiner)?;
            party.updated_at = now;
            registry.index.insert(account_id.clone(), party_id.clone());
        }

        if let Some(joiner) = party.member(account_id) {
            broadcast(
                self.notifier.as_ref(),
                &party,
                &PartyNotification::member_joined(&party, joiner, now),
            );
        }
        tracing::info!(
            party_id = %party_id,
            account_id = %account_id,
            members = party.members.len(),
            "Member joined party"
        );
        Ok(party.clone())
    }

    /// Remove a member, promoting a new captain or disbanding the party as
    /// needed, and broadcast `MEMBER_LEFT` to the remaining members.
    ///
    /// Returns the party as it stands after the removal; a disbanded party
    /// has no members.
    pub async fn remove_member(
        &self,
        party_id: &PartyId,
        member_id: &AccountId,
    ) -> Result<Party, PartyError> {
        let mut party = self.lock_party(party_id).await?;
        let now = Utc::now();

        let Some(departure) = membership::depart(&mut party, member_id) else {
            return Err(PartyError::MemberNotFound {
                party_id: party_id.clone(),
                account_id: member_id.clone(),
            });
        };
        party.updated_at = now;

        {
            let mut registry = self.registry.write().await;
            registry.unindex(member_id, party_id);
            if party.members.is_empty() {
                registry.parties.remove(party_id);
            }
        }

        if party.members.is_empty() {
            tracing::info!(party_id = %party_id, account_id = %member_id, "Last member left, party disbanded");
        } else {
            broadcast(
                self.notifier.as_ref(),
                &party,
                &PartyNotification::member_left(&party, member_id.clone(), now),
            );
            if let Some(captain) = departure.promoted.as_ref().and_then(|id| party.member(id)) {
                broadcast(
                    self.notifier.as_ref(),
                    &party,
                    &PartyNotification::member_new_captain(&party, captain, now),
                );
                tracing::info!(party_id = %party_id, captain_id = %captain.account_id, "Captain promoted");
            }
            tracing::info!(
                party_id = %party_id,
                account_id = %member_id,
                role = ?departure.member.role,
                "Member left party"
            );
        }

        let snapshot = party.clone();
        drop(party);
        self.sweep_empty().await;
        Ok(snapshot)
    }

    /// Remove `account_id` from whatever party it is indexed to.
    ///
    /// Returns the party left, or `None` if the account was in none.
    pub async fn leave_current(&self, account_id: &AccountId) -> Result<Option<PartyId>, PartyError> {
        let current = self.registry.read().await.index.get(account_id).cloned();
        let Some(party_id) = current else {
            return Ok(None);
        };
        match self.remove_member(&party_id, account_id).await {
            Ok(_) => Ok(Some(party_id)),
            Err(PartyError::PartyNotFound(_) | PartyError::MemberNotFound { .. }) => {
                self.registry.write().await.unindex(account_id, &party_id);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Snapshot of a live party.
    pub async fn get_party(&self, party_id: &PartyId) -> Result<Party, PartyError> {
        Ok(self.lock_party(party_id).await?.clone())
    }

    /// Snapshot of the party another account is in.
    pub async fn party_of(&self, account_id: &AccountId) -> Result<Party, PartyError> {
        let current = self.registry.read().await.index.get(account_id).cloned();
        let Some(party_id) = current else {
            return Err(PartyError::NoParty(account_id.clone()));
        };
        match self.lock_party(&party_id).await {
            Ok(party) if party.contains(account_id) => Ok(party.clone()),
            Ok(_) | Err(PartyError::PartyNotFound(_)) => Err(PartyError::NoParty(account_id.clone())),
            Err(e) => Err(e),
        }
    }

    /// Delete every registered party that has no members.
    ///
    /// Parties whose lock is currently held are skipped. Returns the number
    /// of parties deleted.
    pub async fn sweep_empty(&self) -> usize {
        let mut registry = self.registry.write().await;
        let before = registry.parties.len();
        registry.parties.retain(|_, party| match party.try_lock() {
            Ok(party) => !party.members.is_empty(),
            Err(_) => true,
        });
        let Registry { parties, index } = &mut *registry;
        index.retain(|_, id| parties.contains_key(id));

        let swept = before.saturating_sub(registry.parties.len());
        if swept > 0 {
            tracing::info!(swept, "Swept empty parties");
        }
        swept
    }

    /// Lock a live party. A party disbanded while we waited is not found.
    async fn lock_party(&self, party_id: &PartyId) -> Result<OwnedMutexGuard<Party>, PartyError> {
        let entry = self.registry.read().await.parties.get(party_id).cloned();
        let Some(entry) = entry else {
            return Err(PartyError::PartyNotFound(party_id.clone()));
        };
        let party = entry.lock_owned().await;
        if party.members.is_empty() {
            return Err(PartyError::PartyNotFound(party_id.clone()));
        }
        Ok(party)
    }
}

impl core::fmt::Debug for PartyCoordinator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PartyCoordinator").finish_non_exhaustive()
    }
}

/// Every party is open, confirms joins, and holds at most four members.
fn force_join_policy(config: &mut PartyConfig) {
    config.join_confirmation = true;
    config.joinability = Joinability::Open;
    config.max_size = MAX_PARTY_SIZE;
}

/// A new party whose only member is `captain` as captain.
fn found_party(
    captain: &AccountId,
    meta: MetaMap,
    connections: Vec<Connection>,
    mut config: PartyConfig,
    now: DateTime<Utc>,
) -> Result<Party, PartyError> {
    force_join_policy(&mut config);
    let mut party = Party::new(PartyId::generate(), config, now);
    let mut member = PartyMember {
        account_id: captain.clone(),
        meta,
        connections,
        revision: 0,
        updated_at: now,
        joined_at: now,
        role: Role::Captain,
    };
    let users = join_request_users(std::slice::from_ref(&member))?;
    member.meta.insert(META_JOIN_REQUEST_USERS.to_owned(), users);
    party.members.push(member);
    Ok(party)
}
