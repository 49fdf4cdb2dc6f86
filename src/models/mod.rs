use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transaction type of a listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Purpose {
    #[serde(rename = "venda")]
    Sale,
    #[serde(rename = "aluguel")]
    Rental,
    #[serde(rename = "lancamento")]
    NewDevelopment,
}

impl Purpose {
    pub const ALL: [Purpose; 3] = [Purpose::Sale, Purpose::Rental, Purpose::NewDevelopment];

    /// Parse a stored value, `None` for anything unknown
    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|purpose| purpose.as_str() == value)
    }

    /// Value stored in the `purpose` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::Sale => "venda",
            Purpose::Rental => "aluguel",
            Purpose::NewDevelopment => "lancamento",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Purpose::Sale => "Venda",
            Purpose::Rental => "Aluguel",
            Purpose::NewDevelopment => "Lançamento",
        }
    }
}

/// Property category
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Casa,
    Apartamento,
    Cobertura,
    Kitnet,
    Terreno,
    Comercial,
    Rural,
}

impl PropertyType {
    pub const ALL: [PropertyType; 7] = [
        PropertyType::Casa,
        PropertyType::Apartamento,
        PropertyType::Cobertura,
        PropertyType::Kitnet,
        PropertyType::Terreno,
        PropertyType::Comercial,
        PropertyType::Rural,
    ];

    /// Parse a stored value, `None` for anything unknown
    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }

    /// Value stored in the `type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Casa => "casa",
            PropertyType::Apartamento => "apartamento",
            PropertyType::Cobertura => "cobertura",
            PropertyType::Kitnet => "kitnet",
            PropertyType::Terreno => "terreno",
            PropertyType::Comercial => "comercial",
            PropertyType::Rural => "rural",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PropertyType::Casa => "Casa",
            PropertyType::Apartamento => "Apartamento",
            PropertyType::Cobertura => "Cobertura",
            PropertyType::Kitnet => "Kitnet",
            PropertyType::Terreno => "Terreno",
            PropertyType::Comercial => "Comercial",
            PropertyType::Rural => "Rural",
        }
    }
}

/// Publication state of a listing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ListingStatus {
    #[serde(rename = "rascunho")]
    Draft,
    #[serde(rename = "publicado")]
    Published,
    #[serde(rename = "arquivado")]
    Archived,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Draft => "rascunho",
            ListingStatus::Published => "publicado",
            ListingStatus::Archived => "arquivado",
        }
    }
}

/// Location information for a property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub state: String,
    pub city: String,
    pub neighborhood: Option<String>,
}

/// Photo reference, resolved to a public URL through object storage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Photo {
    pub path: String,
    #[serde(default)]
    pub position: u32,
}

/// Listing read model as returned by the property store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Property {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub purpose: Purpose,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub status: ListingStatus,
    #[serde(flatten)]
    pub location: Location,
    #[serde(default)]
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: u32,
    #[serde(default)]
    pub suites: u32,
    #[serde(default)]
    pub parking_spots: u32,
    pub area: Option<f64>,
    /// Asking price, populated for sale and new-development listings
    pub price: Option<f64>,
    /// Monthly rent, populated for rental listings
    pub rent: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub photos: Vec<Photo>,
}

impl Property {
    /// The price field that applies to this listing's purpose.
    pub fn applicable_price(&self) -> Option<f64> {
        match self.purpose {
            Purpose::Rental => self.rent.or(self.price),
            Purpose::Sale | Purpose::NewDevelopment => self.price.or(self.rent),
        }
    }

    /// First photo by position
    pub fn cover_photo(&self) -> Option<&Photo> {
        self.photos.iter().min_by_key(|photo| photo.position)
    }
}
