//! Shared application state for the lobby server.

use std::sync::Arc;

use lobby_economy::{CatalogSource, StaticCatalog};
use lobby_party::PartyCoordinator;
use lobby_profile::{EngineSettings, ProfileEngine};
use lobby_store::{DocumentKey, DocumentStore, Documents, DragonflyStore, MemoryStore};
use lobby_types::{Account, AccountId};

use crate::config::{LobbyConfig, StoreBackend};
use crate::hub::ConnectionHub;

/// Errors raised while assembling the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The document store could not be reached.
    #[error("document store: {0}")]
    Store(#[from] lobby_store::StoreError),

    /// The catalog file could not be loaded.
    #[error("catalog: {0}")]
    Catalog(#[from] lobby_economy::EconomyError),
}

/// Services shared by every handler.
///
/// Both the profile engine and the party coordinator push through the same
/// [`ConnectionHub`].
pub struct AppState {
    /// Profile revision engine.
    pub profiles: ProfileEngine,
    /// Party coordinator.
    pub parties: PartyCoordinator,
    /// Connected notification sockets.
    pub hub: Arc<ConnectionHub>,
    /// Typed document access.
    pub documents: Documents,
}

impl AppState {
    /// Wire the services over an existing store and catalog.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        catalog: Arc<dyn CatalogSource>,
        settings: EngineSettings,
    ) -> Self {
        let hub = Arc::new(ConnectionHub::new());
        let documents = Documents::new(store);
        Self {
            profiles: ProfileEngine::new(documents.clone(), catalog, hub.clone(), settings),
            parties: PartyCoordinator::new(hub.clone()),
            hub,
            documents,
        }
    }

    /// Build the state described by `config`: connect the store and load the
    /// catalog.
    pub async fn from_config(config: &LobbyConfig) -> Result<Self, StateError> {
        let store: Arc<dyn DocumentStore> = match config.store.backend {
            StoreBackend::Memory => {
                tracing::info!("Using in-memory document store");
                Arc::new(MemoryStore::new())
            }
            StoreBackend::Dragonfly => Arc::new(DragonflyStore::connect(&config.store.url).await?),
        };
        let catalog = match &config.economy.catalog_path {
            Some(path) => StaticCatalog::load(path)?,
            None => {
                tracing::warn!("No catalog configured, every purchase will fail NotFound");
                StaticCatalog::default()
            }
        };
        let settings = EngineSettings {
            daily_grant: config.economy.daily_grant,
            starting_balance: config.economy.starting_balance,
            season: config.economy.season,
        };
        Ok(Self::new(store, Arc::new(catalog), settings))
    }

    /// Display name of an account, or its id when the account is unknown.
    pub async fn display_name(&self, account_id: &AccountId) -> String {
        match self
            .documents
            .load::<Account>(&DocumentKey::account(account_id))
            .await
        {
            Ok(Some(account)) => account.display_name,
            Ok(None) => account_id.to_string(),
            Err(e) => {
                tracing::warn!(account_id = %account_id, error = %e, "Failed to load account");
                account_id.to_string()
            }
        }
    }
}

impl core::fmt::Debug for AppState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppState")
            .field("hub", &self.hub)
            .finish_non_exhaustive()
    }
}
