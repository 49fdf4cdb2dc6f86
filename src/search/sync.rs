//! Keeps the URL, the canonical filters and the displayed results consistent.
//!
//! The URL (path + query string) is the only serialized state. Every control
//! edit rewrites it, filters are re-derived from it, and a fetch is issued as a
//! [`FetchTicket`]. Tickets carry an increasing request number and only the
//! newest one may change what is displayed, so a slow response can never
//! overwrite a fresher one.

use crate::error::SearchError;
use crate::models::{PropertyType, Purpose};
use crate::search::canonical::{self, format_number, QueryParams, RouteParams};
use crate::search::query::QueryExecutor;
use crate::search::types::{FilterParam, ListingsFilters, PagedResult, SortOrder, DEFAULT_PAGE_SIZE};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Idle,
    /// A request is in flight
    Pending { request: u64 },
    /// The latest request failed; previous results stay on screen
    Error { message: String },
}

/// A fetch the host should run and hand back through [`SearchSync::apply`]
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub request: u64,
    pub filters: ListingsFilters,
}

#[derive(Debug, Clone)]
struct Memo {
    route: RouteParams,
    query: QueryParams,
    filters: ListingsFilters,
}

/// URL-backed search state for one listings page
#[derive(Debug, Clone)]
pub struct SearchSync {
    route: RouteParams,
    query: QueryParams,
    explicit_purpose: Option<Purpose>,
    page_size: u32,
    memo: Memo,
    requested: Option<ListingsFilters>,
    latest_request: u64,
    status: SyncStatus,
    results: Option<PagedResult>,
}

impl SearchSync {
    /// Start from a location such as `/aluguel/barreiras?bedrooms=2`
    pub fn new(location: &str, explicit_purpose: Option<Purpose>) -> Self {
        Self::with_page_size(location, explicit_purpose, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(
        location: &str,
        explicit_purpose: Option<Purpose>,
        page_size: u32,
    ) -> Self {
        let (route, query) = split_location(location);
        let filters =
            canonical::canonicalize_with_page_size(&route, &query, explicit_purpose, page_size);

        Self {
            memo: Memo {
                route: route.clone(),
                query: query.clone(),
                filters,
            },
            route,
            query,
            explicit_purpose,
            page_size: page_size.max(1),
            requested: None,
            latest_request: 0,
            status: SyncStatus::Idle,
            results: None,
        }
    }

    /// Current canonical filters
    pub fn filters(&self) -> &ListingsFilters {
        &self.memo.filters
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    /// Last successfully applied page, kept through errors
    pub fn results(&self) -> Option<&PagedResult> {
        self.results.as_ref()
    }

    /// Banner text while in the error state
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            SyncStatus::Error { message } => Some(message),
            _ => None,
        }
    }

    pub fn route(&self) -> &RouteParams {
        &self.route
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    /// Current URL as path plus query string
    pub fn href(&self) -> String {
        let path = self.route.to_path();
        if self.query.is_empty() {
            path
        } else {
            format!("{}?{}", path, self.query.to_query_string())
        }
    }

    /// Request for the current filters, e.g. on first render or a manual retry.
    pub fn begin(&mut self) -> FetchTicket {
        self.latest_request += 1;
        self.requested = Some(self.memo.filters.clone());
        self.status = SyncStatus::Pending {
            request: self.latest_request,
        };
        debug!(request = self.latest_request, href = %self.href(), "Issuing listing fetch");

        FetchTicket {
            request: self.latest_request,
            filters: self.memo.filters.clone(),
        }
    }

    /// Apply the outcome of a fetch. Returns false when the ticket was
    /// superseded and the outcome was discarded.
    pub fn apply(
        &mut self,
        ticket: &FetchTicket,
        outcome: Result<PagedResult, SearchError>,
    ) -> bool {
        if ticket.request != self.latest_request {
            debug!(
                request = ticket.request,
                latest = self.latest_request,
                "Discarding superseded listing response"
            );
            return false;
        }

        match outcome {
            Ok(page) => {
                self.results = Some(page);
                self.status = SyncStatus::Idle;
            }
            Err(e) => {
                warn!(request = ticket.request, error = %e, "Listing fetch failed");
                self.status = SyncStatus::Error {
                    message: e.to_string(),
                };
            }
        }
        true
    }

    /// Run the current filters through `executor` and apply the outcome.
    pub async fn refresh(&mut self, executor: &QueryExecutor) -> bool {
        let ticket = self.begin();
        let outcome = executor.execute(&ticket.filters).await;
        self.apply(&ticket, outcome)
    }

    /// External navigation (link, back button). The new URL is taken as-is,
    /// including its page.
    pub fn navigate(&mut self, location: &str) -> Option<FetchTicket> {
        let (route, query) = split_location(location);
        self.route = route;
        self.query = query;
        self.recompute();
        self.fetch_if_changed()
    }

    /// Write or delete one managed parameter.
    ///
    /// An edit that changes the selection drops the page parameter. A path
    /// segment pinning the same field is dropped too, otherwise it would keep
    /// winning over the new value.
    pub fn set(&mut self, param: FilterParam, value: Option<String>) -> Option<FetchTicket> {
        let previous = self.memo.filters.clone();

        match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => self.query.set(param.key(), value),
            None => {
                self.query.remove(param.key());
            }
        }

        if param != FilterParam::Page && self.route.pins(param) {
            debug!(param = param.key(), "Dropping path segment overridden by control");
            self.route.clear(param);
        }

        self.recompute();

        let reconciled = canonical::reconcile(Some(&previous), self.memo.filters.clone());
        if reconciled.page != self.memo.filters.page {
            self.query.remove(FilterParam::Page.key());
            self.recompute();
        }

        self.fetch_if_changed()
    }

    /// Remove every managed query parameter in a single URL update.
    pub fn clear_all(&mut self) -> Option<FetchTicket> {
        for param in FilterParam::ALL {
            self.query.remove(param.key());
        }
        info!(href = %self.href(), "Cleared listing filters");
        self.recompute();
        self.fetch_if_changed()
    }

    /// Clear a single filter, e.g. from its chip
    pub fn remove(&mut self, param: FilterParam) -> Option<FetchTicket> {
        self.set(param, None)
    }

    pub fn set_purpose(&mut self, purpose: Option<Purpose>) -> Option<FetchTicket> {
        self.set(FilterParam::Purpose, purpose.map(|p| p.as_str().to_string()))
    }

    pub fn set_property_type(&mut self, kind: Option<PropertyType>) -> Option<FetchTicket> {
        self.set(FilterParam::Type, kind.map(|k| k.as_str().to_string()))
    }

    pub fn set_city(&mut self, city: Option<&str>) -> Option<FetchTicket> {
        self.set(FilterParam::City, city.map(str::to_string))
    }

    pub fn set_neighborhood(&mut self, neighborhood: Option<&str>) -> Option<FetchTicket> {
        self.set(FilterParam::Neighborhood, neighborhood.map(str::to_string))
    }

    pub fn set_min_price(&mut self, price: Option<f64>) -> Option<FetchTicket> {
        self.set(FilterParam::MinPrice, price.map(format_number))
    }

    pub fn set_max_price(&mut self, price: Option<f64>) -> Option<FetchTicket> {
        self.set(FilterParam::MaxPrice, price.map(format_number))
    }

    pub fn set_bedrooms(&mut self, count: Option<u32>) -> Option<FetchTicket> {
        self.set(FilterParam::Bedrooms, count.map(|c| c.to_string()))
    }

    pub fn set_bathrooms(&mut self, count: Option<u32>) -> Option<FetchTicket> {
        self.set(FilterParam::Bathrooms, count.map(|c| c.to_string()))
    }

    pub fn set_suites(&mut self, count: Option<u32>) -> Option<FetchTicket> {
        self.set(FilterParam::Suites, count.map(|c| c.to_string()))
    }

    pub fn set_parking_spots(&mut self, count: Option<u32>) -> Option<FetchTicket> {
        self.set(FilterParam::ParkingSpots, count.map(|c| c.to_string()))
    }

    /// Changing the order also returns to page 1.
    pub fn set_sort(&mut self, sort: SortOrder) -> Option<FetchTicket> {
        let value = (sort != SortOrder::Recent).then(|| sort.as_str().to_string());
        self.set(FilterParam::Sort, value)
    }

    pub fn set_page(&mut self, page: u32) -> Option<FetchTicket> {
        let value = (page > 1).then(|| page.to_string());
        self.set(FilterParam::Page, value)
    }

    /// Active filters with display labels, in sidebar order
    pub fn active_filters(&self) -> Vec<(FilterParam, String)> {
        let filters = &self.memo.filters;
        let mut chips = Vec::new();

        if let Some(purpose) = filters.purpose {
            chips.push((FilterParam::Purpose, purpose.label().to_string()));
        }
        if let Some(kind) = filters.property_type {
            chips.push((FilterParam::Type, kind.label().to_string()));
        }
        if let Some(city) = &filters.city {
            chips.push((FilterParam::City, city.clone()));
        }
        if let Some(neighborhood) = &filters.neighborhood {
            chips.push((FilterParam::Neighborhood, format!("Bairro: {}", neighborhood)));
        }
        if let Some(min) = filters.min_price {
            chips.push((FilterParam::MinPrice, format!("A partir de {}", format_brl(min))));
        }
        if let Some(max) = filters.max_price {
            chips.push((FilterParam::MaxPrice, format!("Até {}", format_brl(max))));
        }

        let counts = [
            (FilterParam::Bedrooms, filters.bedrooms, "quartos"),
            (FilterParam::Suites, filters.suites, "suítes"),
            (FilterParam::Bathrooms, filters.bathrooms, "banheiros"),
            (FilterParam::ParkingSpots, filters.parking_spots, "vagas"),
        ];
        for (param, count, noun) in counts {
            if let Some(count) = count {
                chips.push((param, format!("{}+ {}", count, noun)));
            }
        }

        chips
    }

    fn recompute(&mut self) {
        if self.memo.route == self.route && self.memo.query == self.query {
            return;
        }
        let filters = canonical::canonicalize_with_page_size(
            &self.route,
            &self.query,
            self.explicit_purpose,
            self.page_size,
        );
        self.memo = Memo {
            route: self.route.clone(),
            query: self.query.clone(),
            filters,
        };
    }

    /// A new request is due when the filters differ from the last one issued,
    /// or when that one failed and the user acted again.
    fn fetch_if_changed(&mut self) -> Option<FetchTicket> {
        let failed = matches!(self.status, SyncStatus::Error { .. });
        if !failed && self.requested.as_ref() == Some(&self.memo.filters) {
            debug!("Filters unchanged, skipping fetch");
            return None;
        }
        Some(self.begin())
    }
}

fn split_location(location: &str) -> (RouteParams, QueryParams) {
    let location = location.split('#').next().unwrap_or_default();
    match location.split_once('?') {
        Some((path, query)) => (RouteParams::from_path(path), QueryParams::parse(query)),
        None => (RouteParams::from_path(location), QueryParams::new()),
    }
}

/// `R$ 1.500` / `R$ 2.500,50`
fn format_brl(value: f64) -> String {
    let cents = (value * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(digit);
    }

    if fraction == 0 {
        format!("R$ {}", grouped)
    } else {
        format!("R$ {},{:02}", grouped, fraction)
    }
}
