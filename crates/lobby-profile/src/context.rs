//! Per-command working state.

use chrono::{DateTime, Utc};
use serde_json::Value;

use lobby_store::{Documents, SagaJournal};
use lobby_types::{
    AccountId, MultiUpdate, ProfileChange, ProfileDocument, ProfileResponse, ResponseNotification,
};

/// Response version stamped on every envelope.
pub const RESPONSE_VERSION: u32 = 1;

/// Everything a handler accumulates while a command runs.
///
/// Writes go through the saga so the engine can undo them; client-visible
/// output is buffered here and only released once the saga commits.
pub(crate) struct CommandContext<'a> {
    pub account_id: &'a AccountId,
    pub now: DateTime<Utc>,
    pub saga: SagaJournal<'a>,
    pub changes: Vec<ProfileChange>,
    pub multi_update: Vec<MultiUpdate>,
    pub notifications: Vec<ResponseNotification>,
    pub outbound: Vec<(AccountId, Value)>,
}

impl<'a> CommandContext<'a> {
    pub fn new(
        documents: &'a Documents,
        account_id: &'a AccountId,
        label: &'static str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            account_id,
            now,
            saga: SagaJournal::begin(documents, label),
            changes: Vec::new(),
            multi_update: Vec::new(),
            notifications: Vec::new(),
            outbound: Vec::new(),
        }
    }

    /// Build the envelope for a document that has already been bumped.
    pub fn respond(&mut self, profile: &ProfileDocument) -> ProfileResponse {
        envelope(
            profile,
            std::mem::take(&mut self.changes),
            std::mem::take(&mut self.multi_update),
            std::mem::take(&mut self.notifications),
            self.now,
        )
    }
}

/// Response envelope reporting `profile`'s current revisions.
pub(crate) fn envelope(
    profile: &ProfileDocument,
    changes: Vec<ProfileChange>,
    multi_update: Vec<MultiUpdate>,
    notifications: Vec<ResponseNotification>,
    now: DateTime<Utc>,
) -> ProfileResponse {
    ProfileResponse {
        profile_revision: profile.rvn,
        profile_id: profile.profile_id.clone(),
        profile_changes_base_revision: profile.rvn.saturating_sub(1),
        profile_changes: changes,
        profile_command_revision: profile.command_revision,
        server_time: now,
        multi_update,
        notifications,
        response_version: RESPONSE_VERSION,
    }
}
