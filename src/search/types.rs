use crate::models::{Property, PropertyType, Purpose};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Result ordering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Newest first
    #[default]
    Recent,
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    pub const ALL: [SortOrder; 3] = [SortOrder::Recent, SortOrder::PriceAsc, SortOrder::PriceDesc];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Recent => "recent",
            SortOrder::PriceAsc => "price_asc",
            SortOrder::PriceDesc => "price_desc",
        }
    }

    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sort| sort.as_str() == value)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::Recent => "Mais recentes",
            SortOrder::PriceAsc => "Menor preço",
            SortOrder::PriceDesc => "Maior preço",
        }
    }
}

/// Canonical listing search request.
///
/// Every optional field is either `None` (no constraint) or holds a value that
/// passed validation: prices are finite and positive, counts are at least one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingsFilters {
    pub purpose: Option<Purpose>,
    #[serde(rename = "type")]
    pub property_type: Option<PropertyType>,
    pub city: Option<String>,
    pub neighborhood: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub suites: Option<u32>,
    pub parking_spots: Option<u32>,
    pub sort: SortOrder,
    pub page: u32,
    pub page_size: u32,
}

impl Default for ListingsFilters {
    fn default() -> Self {
        Self {
            purpose: None,
            property_type: None,
            city: None,
            neighborhood: None,
            min_price: None,
            max_price: None,
            bedrooms: None,
            bathrooms: None,
            suites: None,
            parking_spots: None,
            sort: SortOrder::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListingsFilters {
    /// Zero-based index of the first item on the requested page
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.page_size.max(1))
    }

    /// True when both requests select the same result set, ignoring the page.
    pub fn same_selection(&self, other: &ListingsFilters) -> bool {
        let mut left = self.clone();
        left.page = 1;
        let mut right = other.clone();
        right.page = 1;
        left == right
    }

    /// True when no field other than sort/page/page size constrains the results
    pub fn is_unconstrained(&self) -> bool {
        self.purpose.is_none()
            && self.property_type.is_none()
            && self.city.is_none()
            && self.neighborhood.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.bedrooms.is_none()
            && self.bathrooms.is_none()
            && self.suites.is_none()
            && self.parking_spots.is_none()
    }
}

/// One page of query results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T = Property> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, page_size: u32) -> Self {
        Self {
            items,
            total,
            page: page.max(1),
            page_size,
            total_pages: total_pages(total, page_size),
        }
    }
}

/// `max(1, ceil(total / page_size))`
pub fn total_pages(total: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    let pages = total.div_ceil(page_size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// Query-string keys owned by the search engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterParam {
    Purpose,
    Type,
    City,
    Neighborhood,
    MinPrice,
    MaxPrice,
    Bedrooms,
    Suites,
    Bathrooms,
    ParkingSpots,
    Sort,
    Page,
}

impl FilterParam {
    pub const ALL: [FilterParam; 12] = [
        FilterParam::Purpose,
        FilterParam::Type,
        FilterParam::City,
        FilterParam::Neighborhood,
        FilterParam::MinPrice,
        FilterParam::MaxPrice,
        FilterParam::Bedrooms,
        FilterParam::Suites,
        FilterParam::Bathrooms,
        FilterParam::ParkingSpots,
        FilterParam::Sort,
        FilterParam::Page,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            FilterParam::Purpose => "purpose",
            FilterParam::Type => "type",
            FilterParam::City => "city",
            FilterParam::Neighborhood => "neighborhood",
            FilterParam::MinPrice => "minPrice",
            FilterParam::MaxPrice => "maxPrice",
            FilterParam::Bedrooms => "bedrooms",
            FilterParam::Suites => "suites",
            FilterParam::Bathrooms => "bathrooms",
            FilterParam::ParkingSpots => "parkingSpots",
            FilterParam::Sort => "sort",
            FilterParam::Page => "page",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|param| param.key() == key)
    }
}
