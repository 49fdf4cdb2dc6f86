//! Resolution of path segments, query-string parameters and an optional
//! page-level purpose into one [`ListingsFilters`].
//!
//! Precedence per field, highest first: explicit purpose (purpose only), path
//! segment, query string, default. Malformed input is dropped, never reported:
//! URLs are user-editable, so every field has a fallback and canonicalization
//! cannot fail.

use crate::models::{PropertyType, Purpose};
use crate::search::slug;
use crate::search::types::{FilterParam, ListingsFilters, SortOrder, DEFAULT_PAGE_SIZE};
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::form_urlencoded;

/// Raw values of the optional path segments `/:purpose?/:city?/:type?/:bedrooms?`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteParams {
    pub purpose: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "type")]
    pub property_type: Option<String>,
    pub bedrooms: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment {
    Purpose,
    City,
    Type,
    Bedrooms,
}

const SEGMENT_ORDER: [Segment; 4] = [
    Segment::Purpose,
    Segment::City,
    Segment::Type,
    Segment::Bedrooms,
];

impl Segment {
    fn accepts(&self, token: &str) -> bool {
        match self {
            Segment::Purpose => slug::decode_purpose(token).is_some(),
            Segment::City => slug::decode_city(token).is_some(),
            Segment::Type => slug::decode_type(token).is_some(),
            Segment::Bedrooms => slug::decode_bedrooms(token).is_some(),
        }
    }
}

impl RouteParams {
    /// Split a listings path into its optional segments.
    ///
    /// Segments keep their relative order but any of them may be missing, so
    /// each token is assigned to the first remaining slot that can decode it.
    /// Tokens that fit no remaining slot are dropped.
    pub fn from_path(path: &str) -> Self {
        let path = path.split(|c: char| c == '?' || c == '#').next().unwrap_or_default();
        let mut params = RouteParams::default();
        let mut next_slot = 0;

        for token in path.split('/').filter(|token| !token.is_empty()) {
            let token = percent_decode(token);
            let matched = SEGMENT_ORDER[next_slot.min(SEGMENT_ORDER.len())..]
                .iter()
                .position(|segment| segment.accepts(&token));

            match matched {
                Some(offset) => {
                    let slot = next_slot + offset;
                    params.set(SEGMENT_ORDER[slot], token);
                    next_slot = slot + 1;
                }
                None => debug!(segment = %token, "Ignoring unrecognised path segment"),
            }
        }

        params
    }

    fn set(&mut self, segment: Segment, token: String) {
        match segment {
            Segment::Purpose => self.purpose = Some(token),
            Segment::City => self.city = Some(token),
            Segment::Type => self.property_type = Some(token),
            Segment::Bedrooms => self.bedrooms = Some(token),
        }
    }

    /// Path form, e.g. `/aluguel/barreiras/casas/3quartos`
    pub fn to_path(&self) -> String {
        let segments: Vec<&str> = [&self.purpose, &self.city, &self.property_type, &self.bedrooms]
            .into_iter()
            .filter_map(|segment| segment.as_deref())
            .collect();

        format!("/{}", segments.join("/"))
    }

    /// Drop the segment that feeds `param`, if any. Returns whether one was removed.
    pub fn clear(&mut self, param: FilterParam) -> bool {
        let slot = match param {
            FilterParam::Purpose => &mut self.purpose,
            FilterParam::City => &mut self.city,
            FilterParam::Type => &mut self.property_type,
            FilterParam::Bedrooms => &mut self.bedrooms,
            _ => return false,
        };
        slot.take().is_some()
    }

    /// Whether a decodable segment currently supplies `param`
    pub fn pins(&self, param: FilterParam) -> bool {
        match param {
            FilterParam::Purpose => self
                .purpose
                .as_deref()
                .and_then(slug::decode_purpose)
                .is_some(),
            FilterParam::City => self.city.as_deref().and_then(slug::decode_city).is_some(),
            FilterParam::Type => self
                .property_type
                .as_deref()
                .and_then(slug::decode_type)
                .is_some(),
            FilterParam::Bedrooms => self
                .bedrooms
                .as_deref()
                .and_then(slug::decode_bedrooms)
                .is_some_and(|count| count > 0),
            _ => false,
        }
    }
}

/// Path segments are percent-decoded only; `+` stays literal outside query strings.
fn percent_decode(token: &str) -> String {
    percent_decode_str(token).decode_utf8_lossy().into_owned()
}

/// Ordered query-string parameters, including keys the engine does not manage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `a=1&b=2`, with or without a leading `?`
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = form_urlencoded::parse(query.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        Self { pairs }
    }

    /// First value for `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }

    /// Replace every value of `key` with `value`, keeping its position.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.pairs.iter().position(|(candidate, _)| candidate == key) {
            Some(index) => {
                self.pairs[index].1 = value;
                let mut seen = 0;
                self.pairs.retain(|(candidate, _)| {
                    if candidate != key {
                        return true;
                    }
                    seen += 1;
                    seen == 1
                });
            }
            None => self.pairs.push((key.to_string(), value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.pairs.len();
        self.pairs.retain(|(candidate, _)| candidate != key);
        self.pairs.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Encoded form without the leading `?`
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}

/// Canonicalize with the default page size.
pub fn canonicalize(
    route: &RouteParams,
    query: &QueryParams,
    explicit_purpose: Option<Purpose>,
) -> ListingsFilters {
    canonicalize_with_page_size(route, query, explicit_purpose, DEFAULT_PAGE_SIZE)
}

pub fn canonicalize_with_page_size(
    route: &RouteParams,
    query: &QueryParams,
    explicit_purpose: Option<Purpose>,
    page_size: u32,
) -> ListingsFilters {
    let purpose = explicit_purpose
        .or_else(|| route.purpose.as_deref().and_then(slug::decode_purpose))
        .or_else(|| query_value(query, FilterParam::Purpose, parse_purpose));

    let property_type = route
        .property_type
        .as_deref()
        .and_then(slug::decode_type)
        .or_else(|| query_value(query, FilterParam::Type, parse_type));

    let city = route
        .city
        .as_deref()
        .and_then(slug::decode_city)
        .or_else(|| query_value(query, FilterParam::City, slug::decode_city))
        .map(str::to_string);

    let bedrooms = route
        .bedrooms
        .as_deref()
        .and_then(slug::decode_bedrooms)
        .filter(|count| *count > 0)
        .or_else(|| query_value(query, FilterParam::Bedrooms, positive_count));

    ListingsFilters {
        purpose,
        property_type,
        city,
        neighborhood: query_value(query, FilterParam::Neighborhood, non_blank),
        min_price: query_value(query, FilterParam::MinPrice, positive_number),
        max_price: query_value(query, FilterParam::MaxPrice, positive_number),
        bedrooms,
        bathrooms: query_value(query, FilterParam::Bathrooms, positive_count),
        suites: query_value(query, FilterParam::Suites, positive_count),
        parking_spots: query_value(query, FilterParam::ParkingSpots, positive_count),
        sort: query_value(query, FilterParam::Sort, SortOrder::from_value).unwrap_or_default(),
        page: query_value(query, FilterParam::Page, positive_count).unwrap_or(1),
        page_size: page_size.max(1),
    }
}

/// Apply the page-reset rule: when anything other than the page changed since
/// `previous`, the new request starts on page 1.
pub fn reconcile(previous: Option<&ListingsFilters>, mut next: ListingsFilters) -> ListingsFilters {
    if let Some(previous) = previous {
        if !previous.same_selection(&next) {
            next.page = 1;
        }
    }
    next
}

/// Serialize canonical filters back into query parameters.
///
/// Keys come out in a fixed order and defaults (recent sort, page 1) are
/// omitted, so canonicalizing the output yields the same filters.
pub fn to_query(filters: &ListingsFilters) -> QueryParams {
    let mut query = QueryParams::new();
    if let Some(purpose) = filters.purpose {
        query.set(FilterParam::Purpose.key(), purpose.as_str());
    }
    if let Some(kind) = filters.property_type {
        query.set(FilterParam::Type.key(), kind.as_str());
    }
    if let Some(city) = &filters.city {
        query.set(FilterParam::City.key(), city.as_str());
    }
    if let Some(neighborhood) = &filters.neighborhood {
        query.set(FilterParam::Neighborhood.key(), neighborhood.as_str());
    }
    if let Some(min_price) = filters.min_price {
        query.set(FilterParam::MinPrice.key(), format_number(min_price));
    }
    if let Some(max_price) = filters.max_price {
        query.set(FilterParam::MaxPrice.key(), format_number(max_price));
    }

    let counts = [
        (FilterParam::Bedrooms, filters.bedrooms),
        (FilterParam::Suites, filters.suites),
        (FilterParam::Bathrooms, filters.bathrooms),
        (FilterParam::ParkingSpots, filters.parking_spots),
    ];
    for (param, count) in counts {
        if let Some(count) = count {
            query.set(param.key(), count.to_string());
        }
    }

    if filters.sort != SortOrder::Recent {
        query.set(FilterParam::Sort.key(), filters.sort.as_str());
    }
    if filters.page > 1 {
        query.set(FilterParam::Page.key(), filters.page.to_string());
    }
    query
}

/// Integral values print without a fractional part
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn query_value<T>(
    query: &QueryParams,
    param: FilterParam,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    let raw = query.get(param.key())?;
    let parsed = parse(raw);
    if parsed.is_none() && !raw.trim().is_empty() && raw.trim() != "0" {
        debug!(param = param.key(), value = raw, "Ignoring invalid filter value");
    }
    parsed
}

fn parse_purpose(raw: &str) -> Option<Purpose> {
    let raw = raw.trim().to_lowercase();
    Purpose::from_value(&raw).or_else(|| slug::decode_purpose(&raw))
}

fn parse_type(raw: &str) -> Option<PropertyType> {
    let raw = raw.trim().to_lowercase();
    PropertyType::from_value(&raw).or_else(|| slug::decode_type(&raw))
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// A finite number strictly greater than zero. `"0"`, `""` and garbage are
/// all "no filter"; `"0"` is also what a cleared select submits.
pub fn positive_number(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value > 0.0)
}

/// A positive number rounded up to a whole lower bound
pub fn positive_count(raw: &str) -> Option<u32> {
    positive_number(raw).map(|value| value.ceil().min(f64::from(u32::MAX)) as u32)
}
