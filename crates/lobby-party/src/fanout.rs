//! Best-effort delivery of party events to members.

use lobby_types::{Delivery, Notifier, Party, PartyNotification};

/// Push `notification` to every current member of `party`.
///
/// Members without a live connection are skipped. Returns the number of
/// members the message was queued for.
pub(crate) fn broadcast(
    notifier: &dyn Notifier,
    party: &Party,
    notification: &PartyNotification,
) -> usize {
    let message = match serde_json::to_value(notification) {
        Ok(message) => message,
        Err(e) => {
            tracing::warn!(party_id = %party.id, error = %e, "Failed to encode party notification");
            return 0;
        }
    };

    let mut delivered: usize = 0;
    for member in &party.members {
        match notifier.notify(&member.account_id, message.clone()) {
            Delivery::Delivered => delivered = delivered.saturating_add(1),
            Delivery::Absent => tracing::debug!(
                party_id = %party.id,
                account_id = %member.account_id,
                kind = notification.kind,
                "Member not connected, party notification dropped"
            ),
        }
    }
    delivered
}
