use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use listing_search::error::{SearchError, StoreError};
use listing_search::models::{ListingStatus, Location, Property, PropertyType, Purpose};
use listing_search::search::canonical::{canonicalize, to_query};
use listing_search::search::{
    FetchTicket, PagedResult, QueryExecutor, QueryParams, RouteParams, SearchSync, SortOrder,
    SyncStatus,
};
use listing_search::store::{MemoryPropertyStore, PropertyStore, StorePage, StoreQuery};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn property(
    id: &str,
    purpose: Purpose,
    city: &str,
    bedrooms: u32,
    price: Option<f64>,
    rent: Option<f64>,
) -> Property {
    let created_at = Utc::now() - ChronoDuration::hours(id.len() as i64);
    Property {
        id: id.to_string(),
        slug: id.to_string(),
        title: format!("Imóvel {}", id),
        purpose,
        property_type: PropertyType::Casa,
        status: ListingStatus::Published,
        location: Location {
            state: "BA".to_string(),
            city: city.to_string(),
            neighborhood: Some("Centro".to_string()),
        },
        bedrooms,
        bathrooms: 1,
        suites: 0,
        parking_spots: 1,
        area: Some(100.0),
        price,
        rent,
        created_at,
        updated_at: created_at,
        photos: vec![],
    }
}

/// Delays answers for queries that constrain bedrooms less than three
struct SlowForSmallHomes {
    inner: MemoryPropertyStore,
}

#[async_trait]
impl PropertyStore for SlowForSmallHomes {
    async fn query(&self, query: &StoreQuery) -> Result<StorePage, StoreError> {
        let wants_large = query.at_least.iter().any(|(_, minimum)| *minimum >= 3);
        if !wants_large {
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        self.inner.query(query).await
    }

    fn backend_name(&self) -> &'static str {
        "slow"
    }
}

/// Fails while `down` is set
struct FlakyStore {
    inner: MemoryPropertyStore,
    down: AtomicBool,
}

#[async_trait]
impl PropertyStore for FlakyStore {
    async fn query(&self, query: &StoreQuery) -> Result<StorePage, StoreError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        self.inner.query(query).await
    }

    fn backend_name(&self) -> &'static str {
        "flaky"
    }
}

fn catalogue() -> Vec<Property> {
    vec![
        property("a", Purpose::Rental, "Barreiras", 3, None, Some(2_000.0)),
        property("bb", Purpose::Rental, "Barreiras", 2, None, Some(1_200.0)),
        property("ccc", Purpose::Sale, "Barreiras", 4, Some(500_000.0), None),
        property("dddd", Purpose::Sale, "Barreiras", 2, Some(100_000.0), None),
        property("eeeee", Purpose::Sale, "Barreiras", 3, None, None),
        property("ffffff", Purpose::Rental, "Angical", 3, None, Some(900.0)),
    ]
}

#[tokio::test]
async fn path_url_resolves_and_executes() {
    let executor = QueryExecutor::new(Arc::new(MemoryPropertyStore::new(catalogue())));
    let mut sync = SearchSync::new(
        "/aluguel/barreiras/casas/3quartos?purpose=venda&city=Angical&bedrooms=1",
        None,
    );

    let filters = sync.filters().clone();
    assert_eq!(filters.purpose, Some(Purpose::Rental));
    assert_eq!(filters.city.as_deref(), Some("Barreiras"));
    assert_eq!(filters.property_type, Some(PropertyType::Casa));
    assert_eq!(filters.bedrooms, Some(3));

    assert!(sync.refresh(&executor).await);
    let results = sync.results().unwrap();
    let ids: Vec<&str> = results.items.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["a"]);
    assert_eq!(results.total_pages, 1);
}

#[tokio::test]
async fn price_bounds_apply_to_rent_for_rentals() {
    let executor = QueryExecutor::new(Arc::new(MemoryPropertyStore::new(vec![property(
        "r",
        Purpose::Rental,
        "Barreiras",
        2,
        None,
        Some(2_000.0),
    )])));

    let included = canonicalize(
        &RouteParams::default(),
        &QueryParams::parse("minPrice=1500&maxPrice=2500"),
        None,
    );
    assert_eq!(executor.execute(&included).await.unwrap().total, 1);

    let excluded =
        canonicalize(&RouteParams::default(), &QueryParams::parse("minPrice=3000"), None);
    assert_eq!(executor.execute(&excluded).await.unwrap().total, 0);
}

#[tokio::test]
async fn price_desc_keeps_unpriced_last() {
    let executor = QueryExecutor::new(Arc::new(MemoryPropertyStore::new(vec![
        property("p100", Purpose::Sale, "Barreiras", 1, Some(100_000.0), None),
        property("none", Purpose::Sale, "Barreiras", 1, None, None),
        property("p500", Purpose::Sale, "Barreiras", 1, Some(500_000.0), None),
    ])));

    let mut sync = SearchSync::new("/", None);
    sync.set_sort(SortOrder::PriceDesc);
    sync.refresh(&executor).await;

    let ids: Vec<&str> = sync.results().unwrap().items.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["p500", "p100", "none"]);
}

#[tokio::test]
async fn pagination_and_page_reset() {
    let executor = QueryExecutor::new(Arc::new(MemoryPropertyStore::new(catalogue())));
    let mut sync = SearchSync::with_page_size("/", None, 2);

    sync.refresh(&executor).await;
    assert_eq!(sync.results().unwrap().total_pages, 3);

    let ticket = sync.set_page(3).unwrap();
    let outcome = executor.execute(&ticket.filters).await;
    sync.apply(&ticket, outcome);
    assert_eq!(sync.results().unwrap().items.len(), 2);
    assert_eq!(sync.results().unwrap().page, 3);

    let ticket = sync.set_city(Some("Angical")).unwrap();
    assert_eq!(ticket.filters.page, 1);
    let outcome = executor.execute(&ticket.filters).await;
    sync.apply(&ticket, outcome);
    assert_eq!(sync.results().unwrap().total, 1);

    let ticket = sync.navigate("/?page=9").unwrap();
    let outcome = executor.execute(&ticket.filters).await;
    sync.apply(&ticket, outcome);
    let results = sync.results().unwrap();
    assert!(results.items.is_empty());
    assert_eq!(results.page, 9);
    assert_eq!(results.total_pages, 3);
}

#[tokio::test]
async fn later_change_wins_over_slower_earlier_response() {
    let store = SlowForSmallHomes {
        inner: MemoryPropertyStore::new(catalogue()),
    };
    let executor = QueryExecutor::new(Arc::new(store));
    let mut sync = SearchSync::new("/", None);

    let (tx, mut rx) = mpsc::unbounded_channel::<(FetchTicket, Result<PagedResult, SearchError>)>();
    let spawn = |ticket: FetchTicket| {
        let executor = executor.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let outcome = executor.execute(&ticket.filters).await;
            let _ = tx.send((ticket, outcome));
        });
    };

    spawn(sync.set_bedrooms(Some(2)).unwrap());
    spawn(sync.set_bedrooms(Some(3)).unwrap());

    let mut applied = Vec::new();
    for _ in 0..2 {
        let (ticket, outcome) = rx.recv().await.unwrap();
        applied.push((ticket.request, sync.apply(&ticket, outcome)));
    }

    // The fast, newer response lands first; the slow, older one is discarded.
    assert_eq!(applied, vec![(2, true), (1, false)]);
    assert_eq!(sync.filters().bedrooms, Some(3));
    assert_eq!(sync.status(), &SyncStatus::Idle);
    let results = sync.results().unwrap();
    assert_eq!(results.total, 4);
    assert!(results.items.iter().all(|p| p.bedrooms >= 3));
}

#[tokio::test]
async fn outage_keeps_previous_results_until_user_retries() {
    let store = Arc::new(FlakyStore {
        inner: MemoryPropertyStore::new(catalogue()),
        down: AtomicBool::new(false),
    });
    let executor = QueryExecutor::new(store.clone());
    let mut sync = SearchSync::new("/", None);

    sync.refresh(&executor).await;
    assert_eq!(sync.results().unwrap().total, 6);

    store.down.store(true, Ordering::SeqCst);
    let ticket = sync.set_city(Some("Angical")).unwrap();
    let outcome = executor.execute(&ticket.filters).await;
    assert!(matches!(outcome, Err(SearchError::StoreUnavailable(_))));
    sync.apply(&ticket, outcome);

    assert!(sync.error().unwrap().contains("unavailable"));
    assert_eq!(sync.results().unwrap().total, 6);

    store.down.store(false, Ordering::SeqCst);
    let ticket = sync.set_city(Some("Angical")).unwrap();
    let outcome = executor.execute(&ticket.filters).await;
    sync.apply(&ticket, outcome);
    assert_eq!(sync.error(), None);
    assert_eq!(sync.results().unwrap().total, 1);
}

#[test]
fn canonical_query_string_is_stable() {
    let route = RouteParams::from_path("/lancamentos/luis-eduardo-magalhaes/apartamentos/2quartos");
    let query = QueryParams::parse("maxPrice=600000&sort=price_asc&parkingSpots=0&page=abc");
    let filters = canonicalize(&route, &query, None);

    let encoded = to_query(&filters).to_query_string();
    let reparsed = canonicalize(&RouteParams::default(), &QueryParams::parse(&encoded), None);
    assert_eq!(filters, reparsed);
    assert_eq!(reparsed.parking_spots, None);
    assert_eq!(reparsed.page, 1);
    assert_eq!(reparsed.purpose, Some(Purpose::NewDevelopment));
}
