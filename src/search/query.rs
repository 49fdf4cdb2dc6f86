use crate::error::Result;
use crate::models::ListingStatus;
use crate::search::types::{ListingsFilters, PagedResult};
use crate::store::{CountField, EqualityField, PriceRange, PropertyStore, StoreQuery};
use std::sync::Arc;
use tracing::{info, warn};

/// Runs canonical filters against a property store, one page at a time
#[derive(Clone)]
pub struct QueryExecutor {
    store: Arc<dyn PropertyStore>,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn PropertyStore>) -> Self {
        Self { store }
    }

    /// Fetch the requested page. Store failures come back as
    /// `SearchError::StoreUnavailable` and are not retried.
    pub async fn execute(&self, filters: &ListingsFilters) -> Result<PagedResult> {
        let query = build_query(filters);

        let page = self.store.query(&query).await.map_err(|e| {
            warn!(backend = self.store.backend_name(), error = %e, "Listing query failed");
            e
        })?;

        let mut items = page.items;
        items.truncate(query.limit as usize);

        info!(
            backend = self.store.backend_name(),
            total = page.total,
            page = filters.page,
            returned = items.len(),
            "Listing query completed"
        );

        Ok(PagedResult::new(items, page.total, filters.page, filters.page_size))
    }
}

/// Translate canonical filters into the store contract.
///
/// Only published listings are searchable.
pub fn build_query(filters: &ListingsFilters) -> StoreQuery {
    let mut equals = vec![(EqualityField::Status, ListingStatus::Published.as_str().to_string())];
    if let Some(purpose) = filters.purpose {
        equals.push((EqualityField::Purpose, purpose.as_str().to_string()));
    }
    if let Some(kind) = filters.property_type {
        equals.push((EqualityField::Type, kind.as_str().to_string()));
    }
    if let Some(city) = &filters.city {
        equals.push((EqualityField::City, city.clone()));
    }

    let at_least = [
        (CountField::Bedrooms, filters.bedrooms),
        (CountField::Bathrooms, filters.bathrooms),
        (CountField::Suites, filters.suites),
        (CountField::ParkingSpots, filters.parking_spots),
    ]
    .into_iter()
    .filter_map(|(field, minimum)| minimum.map(|minimum| (field, minimum)))
    .collect();

    StoreQuery {
        equals,
        neighborhood: filters.neighborhood.clone(),
        at_least,
        price: PriceRange::new(filters.min_price, filters.max_price),
        order: filters.sort,
        offset: filters.offset(),
        limit: filters.page_size.max(1),
    }
}
