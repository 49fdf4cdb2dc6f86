use crate::error::StoreError;
use crate::store::types::{StorePage, StoreQuery};
use async_trait::async_trait;

/// Queryable collection of listings.
/// The search engine only depends on this contract, never on a backend.
#[async_trait]
pub trait PropertyStore: Send + Sync {
    /// Fetch the `[offset, offset + limit)` window and the exact match count
    async fn query(&self, query: &StoreQuery) -> Result<StorePage, StoreError>;

    /// Get the name of the backend, for logs
    fn backend_name(&self) -> &'static str;
}
