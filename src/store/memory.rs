use crate::error::StoreError;
use crate::models::{ListingStatus, Location, Photo, Property, PropertyType, Purpose};
use crate::search::slug;
use crate::search::types::SortOrder;
use crate::store::traits::PropertyStore;
use crate::store::types::{StorePage, StoreQuery};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::cmp::Ordering;
use tokio::sync::RwLock;
use tracing::debug;

/// In-process store evaluating queries over a vector of listings
#[derive(Debug, Default)]
pub struct MemoryPropertyStore {
    listings: RwLock<Vec<Property>>,
}

impl MemoryPropertyStore {
    pub fn new(listings: Vec<Property>) -> Self {
        Self {
            listings: RwLock::new(listings),
        }
    }

    /// Store pre-filled with a handful of western Bahia listings
    pub fn with_demo_listings() -> Self {
        Self::new(demo_listings())
    }

    pub async fn insert(&self, property: Property) {
        self.listings.write().await.push(property);
    }

    pub async fn len(&self) -> usize {
        self.listings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.listings.read().await.is_empty()
    }
}

/// Whether `property` satisfies every predicate of `query`
pub fn matches(query: &StoreQuery, property: &Property) -> bool {
    let equals = query
        .equals
        .iter()
        .all(|(field, value)| field.value_of(property) == value);

    let neighborhood = query.neighborhood.as_ref().map_or(true, |needle| {
        property
            .location
            .neighborhood
            .as_ref()
            .is_some_and(|hood| hood.to_lowercase().contains(&needle.to_lowercase()))
    });

    let counts = query
        .at_least
        .iter()
        .all(|(field, minimum)| field.value_of(property) >= *minimum);

    let price = query.price.map_or(true, |range| range.matches(property));

    equals && neighborhood && counts && price
}

/// Ordering for a sort mode. Listings without a price go last in both price orders.
pub fn compare(order: SortOrder, left: &Property, right: &Property) -> Ordering {
    let newest_first = || {
        right
            .created_at
            .cmp(&left.created_at)
            .then_with(|| left.id.cmp(&right.id))
    };

    match order {
        SortOrder::Recent => newest_first(),
        SortOrder::PriceAsc | SortOrder::PriceDesc => {
            match (left.applicable_price(), right.applicable_price()) {
                (Some(a), Some(b)) => {
                    let by_price = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
                    let by_price = if order == SortOrder::PriceDesc {
                        by_price.reverse()
                    } else {
                        by_price
                    };
                    by_price.then_with(newest_first)
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => newest_first(),
            }
        }
    }
}

#[async_trait]
impl PropertyStore for MemoryPropertyStore {
    async fn query(&self, query: &StoreQuery) -> Result<StorePage, StoreError> {
        let listings = self.listings.read().await;

        let mut matching: Vec<&Property> = listings.iter().filter(|p| matches(query, p)).collect();
        matching.sort_by(|a, b| compare(query.order, a, b));

        let total = matching.len() as u64;
        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let items: Vec<Property> = matching
            .into_iter()
            .skip(offset)
            .take(query.limit as usize)
            .cloned()
            .collect();

        debug!(total, returned = items.len(), "Evaluated in-memory query");

        Ok(StorePage { items, total })
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

fn listing(
    id: &str,
    title: &str,
    purpose: Purpose,
    property_type: PropertyType,
    city: &str,
    neighborhood: &str,
    rooms: (u32, u32, u32, u32),
    area: f64,
    amount: f64,
    age_days: i64,
) -> Property {
    let created_at = Utc::now() - Duration::days(age_days);
    let (price, rent) = match purpose {
        Purpose::Rental => (None, Some(amount)),
        Purpose::Sale | Purpose::NewDevelopment => (Some(amount), None),
    };

    Property {
        id: id.to_string(),
        slug: format!("{}-{}", slug::slugify(title), id),
        title: title.to_string(),
        purpose,
        property_type,
        status: ListingStatus::Published,
        location: Location {
            state: "BA".to_string(),
            city: city.to_string(),
            neighborhood: Some(neighborhood.to_string()),
        },
        bedrooms: rooms.0,
        bathrooms: rooms.1,
        suites: rooms.2,
        parking_spots: rooms.3,
        area: Some(area),
        price,
        rent,
        created_at,
        updated_at: created_at,
        photos: vec![Photo {
            path: format!("{}/capa.jpg", id),
            position: 0,
        }],
    }
}

fn demo_listings() -> Vec<Property> {
    let mut listings = vec![
        listing(
            "imv-001",
            "Casa ampla no Centro",
            Purpose::Rental,
            PropertyType::Casa,
            "Barreiras",
            "Centro",
            (3, 2, 1, 2),
            180.0,
            2_000.0,
            2,
        ),
        listing(
            "imv-002",
            "Apartamento com varanda",
            Purpose::Rental,
            PropertyType::Apartamento,
            "Barreiras",
            "Morada Nobre",
            (2, 1, 1, 1),
            75.0,
            1_400.0,
            5,
        ),
        listing(
            "imv-003",
            "Casa com piscina",
            Purpose::Sale,
            PropertyType::Casa,
            "Barreiras",
            "Jardim Ouro Branco",
            (4, 3, 2, 3),
            320.0,
            850_000.0,
            1,
        ),
        listing(
            "imv-004",
            "Terreno plano",
            Purpose::Sale,
            PropertyType::Terreno,
            "Luís Eduardo Magalhães",
            "Jardim Paraíso",
            (0, 0, 0, 0),
            450.0,
            120_000.0,
            10,
        ),
        listing(
            "imv-005",
            "Residencial Parque das Águas",
            Purpose::NewDevelopment,
            PropertyType::Apartamento,
            "Luís Eduardo Magalhães",
            "Centro",
            (3, 2, 1, 2),
            92.0,
            480_000.0,
            3,
        ),
        listing(
            "imv-006",
            "Kitnet mobiliada",
            Purpose::Rental,
            PropertyType::Kitnet,
            "Barreiras",
            "Vila Brasil",
            (1, 1, 0, 0),
            30.0,
            800.0,
            7,
        ),
        listing(
            "imv-007",
            "Sala comercial",
            Purpose::Rental,
            PropertyType::Comercial,
            "São Desidério",
            "Centro",
            (0, 1, 0, 1),
            60.0,
            1_800.0,
            4,
        ),
        listing(
            "imv-008",
            "Chácara às margens do rio",
            Purpose::Sale,
            PropertyType::Rural,
            "Barreiras",
            "Zona Rural",
            (3, 2, 1, 4),
            20_000.0,
            650_000.0,
            12,
        ),
    ];

    let mut price_on_request = listing(
        "imv-009",
        "Cobertura duplex",
        Purpose::Sale,
        PropertyType::Cobertura,
        "Barreiras",
        "Centro",
        (4, 4, 3, 3),
        240.0,
        0.0,
        6,
    );
    price_on_request.price = None;
    listings.push(price_on_request);

    let mut draft = listing(
        "imv-010",
        "Casa em reforma",
        Purpose::Sale,
        PropertyType::Casa,
        "Barreiras",
        "Centro",
        (2, 1, 0, 1),
        110.0,
        300_000.0,
        0,
    );
    draft.status = ListingStatus::Draft;
    listings.push(draft);

    listings
}
