use async_trait::async_trait;

use crate::models::{ProductRecord, ProductReference};
use crate::page::PageDriver;
use crate::Result;

pub mod wollplatz;

pub use wollplatz::WollplatzSite;

/// Contract one shop integration has to satisfy. Implementations hold no
/// shared state beyond configuration values (base URL, timing constants)
/// passed at construction.
#[async_trait]
pub trait SiteAdapter: Send + Sync {
    /// Run a search and return the references found on the results view, in
    /// page order. Malformed result items are skipped, never fatal; a results
    /// view that never renders its container is an error.
    async fn find_products(
        &self,
        page: &dyn PageDriver,
        search_term: &str,
    ) -> Result<Vec<ProductReference>>;

    /// Navigate to one reference and extract its full record.
    async fn fetch_details(
        &self,
        page: &dyn PageDriver,
        reference: &ProductReference,
    ) -> Result<ProductRecord>;
}
