//! The notification channel: one outbound queue per connected account.
//!
//! A socket registers its account on connect and receives every message
//! queued for it. Queues are bounded and [`Notifier::notify`] never waits:
//! a socket whose queue is full has fallen behind, so the hub drops it and
//! the client reconnects and resyncs. An account with no socket is
//! [`Delivery::Absent`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use serde_json::Value;
use tokio::sync::mpsc;

use lobby_types::{AccountId, Delivery, Notifier};

/// Messages a socket may have queued before it is dropped.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

struct Client {
    connection: u64,
    tx: mpsc::Sender<Value>,
}

/// Registry of connected accounts.
pub struct ConnectionHub {
    clients: RwLock<HashMap<AccountId, Client>>,
    next_connection: AtomicU64,
    capacity: usize,
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }
}

impl ConnectionHub {
    /// Create an empty hub with [`DEFAULT_QUEUE_CAPACITY`] per socket.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty hub with `capacity` queued messages per socket.
    /// A zero capacity is raised to one.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            next_connection: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    /// Register a socket for `account_id`, replacing any earlier one.
    ///
    /// Returns the connection number to pass to
    /// [`unregister`](Self::unregister) and the receiving end of the queue.
    pub fn register(&self, account_id: AccountId) -> (u64, mpsc::Receiver<Value>) {
        let connection = self.next_connection.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.capacity);
        let replaced = self
            .clients
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(account_id.clone(), Client { connection, tx })
            .is_some();
        tracing::debug!(account_id = %account_id, connection, replaced, "Client connected");
        (connection, rx)
    }

    /// Remove `account_id`'s socket if it is still `connection`.
    pub fn unregister(&self, account_id: &AccountId, connection: u64) {
        let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);
        if clients.get(account_id).is_some_and(|c| c.connection == connection) {
            clients.remove(account_id);
            tracing::debug!(account_id = %account_id, connection, "Client disconnected");
        }
    }

    /// Number of connected accounts.
    pub fn connected(&self) -> usize {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Notifier for ConnectionHub {
    fn notify(&self, account_id: &AccountId, message: Value) -> Delivery {
        let overflowed = {
            let clients = self.clients.read().unwrap_or_else(PoisonError::into_inner);
            let Some(client) = clients.get(account_id) else {
                return Delivery::Absent;
            };
            match client.tx.try_send(message) {
                Ok(()) => return Delivery::Delivered,
                Err(mpsc::error::TrySendError::Closed(_)) => return Delivery::Absent,
                Err(mpsc::error::TrySendError::Full(_)) => client.connection,
            }
        };

        // Dropping the sender ends the socket once its backlog drains.
        tracing::warn!(
            account_id = %account_id,
            connection = overflowed,
            capacity = self.capacity,
            "Notification queue full, dropping client"
        );
        self.unregister(account_id, overflowed);
        Delivery::Absent
    }
}

impl core::fmt::Debug for ConnectionHub {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ConnectionHub")
            .field("connected", &self.connected())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_accounts_are_not_an_error() {
        let hub = ConnectionHub::new();
        let delivery = hub.notify(&AccountId::from("nobody"), Value::Null);
        assert_eq!(delivery, Delivery::Absent);
    }

    #[test]
    fn registered_account_receives_messages_in_order() {
        let hub = ConnectionHub::new();
        let account = AccountId::from("a1");
        let (_, mut rx) = hub.register(account.clone());

        assert_eq!(hub.notify(&account, Value::from(1)), Delivery::Delivered);
        assert_eq!(hub.notify(&account, Value::from(2)), Delivery::Delivered);
        assert_eq!(rx.try_recv().ok(), Some(Value::from(1)));
        assert_eq!(rx.try_recv().ok(), Some(Value::from(2)));
    }

    #[test]
    fn stale_unregister_keeps_newer_socket() {
        let hub = ConnectionHub::new();
        let account = AccountId::from("a1");
        let (old, _old_rx) = hub.register(account.clone());
        let (_new, _new_rx) = hub.register(account.clone());

        hub.unregister(&account, old);
        assert_eq!(hub.connected(), 1);
    }

    #[test]
    fn full_queue_drops_the_client() {
        let hub = ConnectionHub::with_capacity(2);
        let account = AccountId::from("a1");
        let (_, mut rx) = hub.register(account.clone());

        assert_eq!(hub.notify(&account, Value::from(1)), Delivery::Delivered);
        assert_eq!(hub.notify(&account, Value::from(2)), Delivery::Delivered);
        assert_eq!(hub.notify(&account, Value::from(3)), Delivery::Absent);
        assert_eq!(hub.connected(), 0);

        // The backlog still drains, then the queue reports closed.
        assert_eq!(rx.try_recv().ok(), Some(Value::from(1)));
        assert_eq!(rx.try_recv().ok(), Some(Value::from(2)));
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
        assert_eq!(hub.notify(&account, Value::from(4)), Delivery::Absent);
    }

    #[test]
    fn dropped_receiver_reports_absent() {
        let hub = ConnectionHub::new();
        let account = AccountId::from("a1");
        let (_, rx) = hub.register(account.clone());
        drop(rx);
        assert_eq!(hub.notify(&account, Value::Null), Delivery::Absent);
    }
}
