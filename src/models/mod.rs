use serde::{Deserialize, Serialize};

/// Currency is currently fixed rather than read off the page.
// TODO: derive the currency from the product page instead of assuming EUR
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Product price as scraped: the amount is kept as display text and is not
/// validated beyond being non-empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Price {
    pub amount: String,
    pub currency: String,
}

impl Price {
    pub fn eur(amount: impl Into<String>) -> Self {
        Self {
            amount: amount.into(),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.currency, self.amount)
    }
}

/// Minimal identity for a product found on a search results page.
///
/// References are ephemeral: they live for one task execution, long enough to
/// drive the detail fetch, and are never persisted on their own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductReference {
    /// Site-assigned id, non-empty.
    pub id: String,
    /// Absolute URL on the shop's own origin.
    pub url: String,
}

/// Fully extracted product, the unit of persistence. Stored records are keyed
/// by `name`, so re-scraping the same product replaces the previous record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductRecord {
    pub reference: ProductReference,
    pub name: String,
    pub price: Price,
    pub needle_size: Option<String>,
    pub composition: Option<String>,
    pub availability: Option<String>,
}

impl std::fmt::Display for ProductRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (id: {}, price: {})",
            self.name, self.reference.id, self.price
        )
    }
}
