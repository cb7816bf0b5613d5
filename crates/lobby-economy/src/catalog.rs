//! Storefront offers.
//!
//! Catalog content is loaded once at startup from a JSON file and served
//! read-only through the [`CatalogSource`] seam. The file is a JSON array:
//!
//! ```json
//! [{ "offerId": "skin_001", "price": 800, "itemGrants": ["AthenaCharacter:cid_001"] }]
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EconomyError;

/// A purchasable storefront entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogOffer {
    /// Offer id quoted by clients.
    pub offer_id: String,
    /// Final price in premium currency.
    #[serde(alias = "finalPrice")]
    pub price: u64,
    /// Template ids granted by the offer.
    #[serde(default)]
    pub item_grants: Vec<String>,
}

/// Read-only lookup of catalog offers.
pub trait CatalogSource: Send + Sync {
    /// Look up an offer by id.
    fn offer(&self, offer_id: &str) -> Option<CatalogOffer>;

    /// Look up an offer, failing with [`EconomyError::OfferNotFound`].
    fn resolve(&self, offer_id: &str) -> Result<CatalogOffer, EconomyError> {
        self.offer(offer_id)
            .ok_or_else(|| EconomyError::OfferNotFound(offer_id.to_owned()))
    }
}

/// A fixed in-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    offers: BTreeMap<String, CatalogOffer>,
}

impl StaticCatalog {
    /// Build a catalog from a list of offers. Later duplicates win.
    pub fn from_offers(offers: impl IntoIterator<Item = CatalogOffer>) -> Self {
        Self {
            offers: offers
                .into_iter()
                .map(|offer| (offer.offer_id.clone(), offer))
                .collect(),
        }
    }

    /// Parse a JSON array of offers.
    pub fn from_json(json: &str) -> Result<Self, EconomyError> {
        let offers: Vec<CatalogOffer> = serde_json::from_str(json)?;
        Ok(Self::from_offers(offers))
    }

    /// Load a JSON catalog file.
    pub fn load(path: &Path) -> Result<Self, EconomyError> {
        let contents = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&contents)?;
        tracing::info!(
            path = %path.display(),
            offers = catalog.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    /// Number of offers.
    pub fn len(&self) -> usize {
        self.offers.len()
    }

    /// Whether the catalog has no offers.
    pub fn is_empty(&self) -> bool {
        self.offers.is_empty()
    }
}

impl CatalogSource for StaticCatalog {
    fn offer(&self, offer_id: &str) -> Option<CatalogOffer> {
        self.offers.get(offer_id).cloned()
    }
}
