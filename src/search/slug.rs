//! Mapping between URL tokens and domain values.
//!
//! Encoding is total: every domain value has a slug. Decoding is partial and
//! never fails; an unknown token is simply `None`.

use crate::models::{PropertyType, Purpose};
use once_cell::sync::Lazy;
use regex::Regex;

static BEDROOMS_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+)quartos?$").expect("Invalid bedrooms regex"));

/// Cities served by the marketplace, in display form
pub const KNOWN_CITIES: &[&str] = &[
    "Barreiras",
    "Luís Eduardo Magalhães",
    "São Desidério",
    "Formosa do Rio Preto",
    "Riachão das Neves",
    "Angical",
    "Baianópolis",
    "Catolândia",
    "Cristópolis",
    "Cotegipe",
    "Wanderley",
    "Correntina",
    "Santa Rita de Cássia",
    "Bom Jesus da Lapa",
];

const PURPOSE_SLUGS: &[(&str, Purpose)] = &[
    ("venda", Purpose::Sale),
    ("aluguel", Purpose::Rental),
    ("lancamentos", Purpose::NewDevelopment),
];

const TYPE_SLUGS: &[(&str, PropertyType)] = &[
    ("casas", PropertyType::Casa),
    ("apartamentos", PropertyType::Apartamento),
    ("coberturas", PropertyType::Cobertura),
    ("kitnets", PropertyType::Kitnet),
    ("terrenos", PropertyType::Terreno),
    ("comerciais", PropertyType::Comercial),
    ("rurais", PropertyType::Rural),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugKind {
    Purpose,
    Type,
    City,
    Bedrooms,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlugValue {
    Purpose(Purpose),
    Type(PropertyType),
    /// Canonical display name from [`KNOWN_CITIES`]
    City(&'static str),
    Bedrooms(u32),
}

/// Decode a token of the given kind.
pub fn decode(kind: SlugKind, slug: &str) -> Option<SlugValue> {
    match kind {
        SlugKind::Purpose => decode_purpose(slug).map(SlugValue::Purpose),
        SlugKind::Type => decode_type(slug).map(SlugValue::Type),
        SlugKind::City => decode_city(slug).map(SlugValue::City),
        SlugKind::Bedrooms => decode_bedrooms(slug).map(SlugValue::Bedrooms),
    }
}

/// Encode a domain value as its URL token.
pub fn encode(value: &SlugValue) -> String {
    match value {
        SlugValue::Purpose(purpose) => encode_purpose(*purpose).to_string(),
        SlugValue::Type(kind) => encode_type(*kind).to_string(),
        SlugValue::City(city) => encode_city(city),
        SlugValue::Bedrooms(count) => encode_bedrooms(*count),
    }
}

pub fn decode_purpose(slug: &str) -> Option<Purpose> {
    let slug = slug.trim().to_lowercase();
    PURPOSE_SLUGS
        .iter()
        .find(|(candidate, _)| *candidate == slug)
        .map(|(_, purpose)| *purpose)
}

pub fn encode_purpose(purpose: Purpose) -> &'static str {
    PURPOSE_SLUGS
        .iter()
        .find(|(_, candidate)| *candidate == purpose)
        .map(|(slug, _)| *slug)
        .unwrap_or_else(|| purpose.as_str())
}

pub fn decode_type(slug: &str) -> Option<PropertyType> {
    let slug = slug.trim().to_lowercase();
    TYPE_SLUGS
        .iter()
        .find(|(candidate, _)| *candidate == slug)
        .map(|(_, kind)| *kind)
}

pub fn encode_type(kind: PropertyType) -> &'static str {
    TYPE_SLUGS
        .iter()
        .find(|(_, candidate)| *candidate == kind)
        .map(|(slug, _)| *slug)
        .unwrap_or_else(|| kind.as_str())
}

/// Match a slug or free-form city name against [`KNOWN_CITIES`].
pub fn decode_city(slug: &str) -> Option<&'static str> {
    let wanted = normalize(slug);
    if wanted.is_empty() {
        return None;
    }
    KNOWN_CITIES
        .iter()
        .find(|city| normalize(city) == wanted)
        .copied()
}

pub fn encode_city(city: &str) -> String {
    slugify(city)
}

pub fn decode_bedrooms(slug: &str) -> Option<u32> {
    BEDROOMS_REGEX
        .captures(slug.trim())
        .and_then(|caps| caps.get(1)?.as_str().parse::<u32>().ok())
}

pub fn encode_bedrooms(count: u32) -> String {
    if count == 1 {
        "1quarto".to_string()
    } else {
        format!("{}quartos", count)
    }
}

/// URL-safe form of free text: `"Casa com Piscina"` becomes `"casa-com-piscina"`
pub fn slugify(text: &str) -> String {
    normalize(text)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Lowercase, strip diacritics, treat hyphens as spaces and collapse whitespace.
pub fn normalize(input: &str) -> String {
    let folded: String = input
        .chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            '-' | '_' => ' ',
            other => other,
        })
        .collect();

    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
