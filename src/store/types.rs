use crate::models::Property;
use crate::search::types::SortOrder;
use serde::{Deserialize, Serialize};

/// Columns compared for equality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EqualityField {
    Purpose,
    Type,
    City,
    Status,
}

impl EqualityField {
    pub fn column(&self) -> &'static str {
        match self {
            EqualityField::Purpose => "purpose",
            EqualityField::Type => "type",
            EqualityField::City => "city",
            EqualityField::Status => "status",
        }
    }

    pub fn value_of<'a>(&self, property: &'a Property) -> &'a str {
        match self {
            EqualityField::Purpose => property.purpose.as_str(),
            EqualityField::Type => property.property_type.as_str(),
            EqualityField::City => property.location.city.as_str(),
            EqualityField::Status => property.status.as_str(),
        }
    }
}

/// Integer columns filtered with a `>=` lower bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountField {
    Bedrooms,
    Bathrooms,
    Suites,
    ParkingSpots,
}

impl CountField {
    pub fn column(&self) -> &'static str {
        match self {
            CountField::Bedrooms => "bedrooms",
            CountField::Bathrooms => "bathrooms",
            CountField::Suites => "suites",
            CountField::ParkingSpots => "parking_spots",
        }
    }

    pub fn value_of(&self, property: &Property) -> u32 {
        match self {
            CountField::Bedrooms => property.bedrooms,
            CountField::Bathrooms => property.bathrooms,
            CountField::Suites => property.suites,
            CountField::ParkingSpots => property.parking_spots,
        }
    }
}

/// Inclusive price bounds checked against `price` OR `rent`.
///
/// A listing carries exactly one of the two fields, so a listing matches when
/// either field lies within both bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Option<Self> {
        (min.is_some() || max.is_some()).then_some(Self { min, max })
    }

    pub fn contains(&self, value: Option<f64>) -> bool {
        value.is_some_and(|value| {
            self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
        })
    }

    pub fn matches(&self, property: &Property) -> bool {
        self.contains(property.price) || self.contains(property.rent)
    }
}

/// Everything the store needs to answer one page of a listing search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreQuery {
    pub equals: Vec<(EqualityField, String)>,
    /// Case-insensitive substring match on the neighborhood
    pub neighborhood: Option<String>,
    pub at_least: Vec<(CountField, u32)>,
    pub price: Option<PriceRange>,
    pub order: SortOrder,
    pub offset: u64,
    pub limit: u32,
}

/// Window of matching rows plus the exact number of matches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorePage {
    pub items: Vec<Property>,
    pub total: u64,
}
