use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::Property;
use crate::search::canonical::format_number;
use crate::search::types::SortOrder;
use crate::store::traits::PropertyStore;
use crate::store::types::{PriceRange, StorePage, StoreQuery};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Property store behind a PostgREST-style HTTP endpoint
pub struct RestPropertyStore {
    client: Client,
    endpoint: Url,
}

impl RestPropertyStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("count=exact"));
        if let Some(key) = &config.api_key {
            let apikey = HeaderValue::from_str(key)
                .map_err(|e| StoreError::Credentials(e.to_string()))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| StoreError::Credentials(e.to_string()))?;
            headers.insert("apikey", apikey);
            headers.insert(AUTHORIZATION, bearer);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()?;

        let base = config.base_url.trim_end_matches('/');
        let endpoint = Url::parse(&format!("{}/{}", base, config.table))?;

        Ok(Self { client, endpoint })
    }

    /// Request URL for `query`
    pub fn request_url(&self, query: &StoreQuery) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().extend_pairs(request_params(query));
        url
    }
}

/// Translate a store query into PostgREST query parameters
pub fn request_params(query: &StoreQuery) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];

    for (field, value) in &query.equals {
        params.push((field.column().to_string(), format!("eq.{}", value)));
    }

    if let Some(needle) = &query.neighborhood {
        let needle: String = needle
            .chars()
            .filter(|c| !matches!(c, '*' | '%' | ',' | '(' | ')'))
            .collect();
        params.push(("neighborhood".to_string(), format!("ilike.*{}*", needle)));
    }

    for (field, minimum) in &query.at_least {
        params.push((field.column().to_string(), format!("gte.{}", minimum)));
    }

    if let Some(range) = &query.price {
        params.push(("or".to_string(), price_clause(range)));
    }

    params.push(("order".to_string(), order_clause(query.order)));
    params.push(("offset".to_string(), query.offset.to_string()));
    params.push(("limit".to_string(), query.limit.to_string()));
    params
}

/// `(price in range) OR (rent in range)`
fn price_clause(range: &PriceRange) -> String {
    let bounds = |column: &str| {
        let mut parts = Vec::new();
        if let Some(min) = range.min {
            parts.push(format!("{}.gte.{}", column, format_number(min)));
        }
        if let Some(max) = range.max {
            parts.push(format!("{}.lte.{}", column, format_number(max)));
        }
        if parts.len() == 1 {
            parts.remove(0)
        } else {
            format!("and({})", parts.join(","))
        }
    };

    format!("({},{})", bounds("price"), bounds("rent"))
}

/// Column the table (or view) exposes as `coalesce(price, rent)`.
///
/// Sale and rental rows must interleave by amount, which two separate
/// `price`/`rent` order keys cannot express.
pub const APPLICABLE_PRICE_COLUMN: &str = "applicable_price";

fn order_clause(order: SortOrder) -> String {
    let direction = match order {
        SortOrder::Recent => return "created_at.desc,id.asc".to_string(),
        SortOrder::PriceAsc => "asc",
        SortOrder::PriceDesc => "desc",
    };
    format!("{}.{}.nullslast,created_at.desc,id.asc", APPLICABLE_PRICE_COLUMN, direction)
}

/// Total from a `Content-Range` value such as `0-11/57` or `*/57`
pub fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

#[async_trait]
impl PropertyStore for RestPropertyStore {
    async fn query(&self, query: &StoreQuery) -> Result<StorePage, StoreError> {
        let url = self.request_url(query);
        debug!(%url, "Querying property store");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let total = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range);

        // A window past the last row is an empty page, not a failure.
        if status == StatusCode::RANGE_NOT_SATISFIABLE {
            return Ok(StorePage {
                items: Vec::new(),
                total: total.unwrap_or(0),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Property store rejected query");
            return Err(StoreError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let items: Vec<Property> = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;

        let total = match total {
            Some(total) => total,
            None => {
                warn!("Store response has no Content-Range count, estimating total");
                query.offset + items.len() as u64
            }
        };

        Ok(StorePage { items, total })
    }

    fn backend_name(&self) -> &'static str {
        "rest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;
    use crate::search::types::ListingsFilters;
    use crate::search::QueryExecutor;
    use crate::store::types::{CountField, EqualityField};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn store() -> RestPropertyStore {
        RestPropertyStore::new(&StoreConfig {
            base_url: "https://db.example.com/rest/v1/".to_string(),
            api_key: Some("anon-key".to_string()),
            table: "properties".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    fn sample_query() -> StoreQuery {
        StoreQuery {
            equals: vec![
                (EqualityField::Status, "publicado".to_string()),
                (EqualityField::Purpose, "aluguel".to_string()),
                (EqualityField::City, "Luís Eduardo Magalhães".to_string()),
            ],
            neighborhood: Some("Centro*".to_string()),
            at_least: vec![(CountField::Bedrooms, 3)],
            price: PriceRange::new(Some(1500.0), Some(2500.0)),
            order: SortOrder::PriceDesc,
            offset: 24,
            limit: 12,
        }
    }

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn builds_postgrest_filters() {
        let params = request_params(&sample_query());

        assert_eq!(param(&params, "status"), Some("eq.publicado"));
        assert_eq!(param(&params, "purpose"), Some("eq.aluguel"));
        assert_eq!(param(&params, "city"), Some("eq.Luís Eduardo Magalhães"));
        assert_eq!(param(&params, "neighborhood"), Some("ilike.*Centro*"));
        assert_eq!(param(&params, "bedrooms"), Some("gte.3"));
        assert_eq!(
            param(&params, "or"),
            Some("(and(price.gte.1500,price.lte.2500),and(rent.gte.1500,rent.lte.2500))")
        );
        assert_eq!(
            param(&params, "order"),
            Some("applicable_price.desc.nullslast,created_at.desc,id.asc")
        );
        assert_eq!(param(&params, "offset"), Some("24"));
        assert_eq!(param(&params, "limit"), Some("12"));
    }

    #[test]
    fn single_price_bound_has_no_and_group() {
        let clause = price_clause(&PriceRange {
            min: Some(3000.0),
            max: None,
        });
        assert_eq!(clause, "(price.gte.3000,rent.gte.3000)");
    }

    #[test]
    fn request_url_targets_table() {
        let url = store().request_url(&sample_query());
        assert_eq!(url.path(), "/rest/v1/properties");
        assert!(url.query().unwrap_or_default().contains("limit=12"));
    }

    #[test]
    fn price_sort_uses_one_applicable_price_key() {
        let query = StoreQuery {
            order: SortOrder::PriceAsc,
            ..sample_query()
        };
        let params = request_params(&query);
        let order = param(&params, "order").unwrap();

        assert_eq!(order, "applicable_price.asc.nullslast,created_at.desc,id.asc");
        // A leading `price` key would rank every sale above every rental.
        assert!(!order.starts_with("price."));
        assert!(!order.contains("rent."));
    }

    #[test]
    fn content_range_totals() {
        assert_eq!(parse_content_range("0-11/57"), Some(57));
        assert_eq!(parse_content_range("*/0"), Some(0));
        assert_eq!(parse_content_range("0-11/*"), None);
        assert_eq!(parse_content_range("garbage"), None);
    }

    /// Serve one canned HTTP response on a local port and return the store base URL.
    async fn serve_once(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        format!("http://{}/rest/v1", addr)
    }

    fn canned(status_line: &str, content_range: Option<&str>, body: &str) -> String {
        let mut response = format!("HTTP/1.1 {}\r\n", status_line);
        response.push_str("Content-Type: application/json\r\nConnection: close\r\n");
        response.push_str(&format!("Content-Length: {}\r\n", body.len()));
        if let Some(range) = content_range {
            response.push_str(&format!("Content-Range: {}\r\n", range));
        }
        response.push_str("\r\n");
        response.push_str(body);
        response
    }

    fn local_store(base_url: String) -> RestPropertyStore {
        RestPropertyStore::new(&StoreConfig {
            base_url,
            api_key: Some("anon-key".to_string()),
            table: "properties".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    const TWO_ROWS: &str = r#"[
        {"id": "imv-1", "slug": "casa-centro-imv-1", "title": "Casa no Centro",
         "purpose": "venda", "type": "casa", "status": "publicado",
         "state": "BA", "city": "Barreiras", "neighborhood": "Centro",
         "bedrooms": 3, "bathrooms": 2, "suites": 1, "parking_spots": 2,
         "area": 180.5, "price": 500000, "rent": null, "applicable_price": 500000,
         "created_at": "2024-05-01T12:00:00Z", "updated_at": "2024-05-02T12:00:00Z",
         "photos": [{"path": "imv-1/fachada.jpg", "position": 0}]},
        {"id": "imv-2", "slug": "kitnet-imv-2", "title": "Kitnet",
         "purpose": "aluguel", "type": "kitnet", "status": "publicado",
         "state": "BA", "city": "Angical", "neighborhood": null,
         "area": null, "price": null, "rent": 800, "applicable_price": 800,
         "created_at": "2024-04-01T12:00:00Z", "updated_at": "2024-04-01T12:00:00Z"}
    ]"#;

    #[tokio::test]
    async fn reads_rows_and_exact_total() {
        let base = serve_once(canned("200 OK", Some("0-1/57"), TWO_ROWS)).await;
        let page = local_store(base).query(&sample_query()).await.unwrap();

        assert_eq!(page.total, 57);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id, "imv-1");
        assert_eq!(page.items[0].location.city, "Barreiras");
        assert_eq!(page.items[0].price, Some(500_000.0));
        assert_eq!(page.items[0].photos.len(), 1);
        assert_eq!(page.items[1].purpose, crate::models::Purpose::Rental);
        assert_eq!(page.items[1].rent, Some(800.0));
        assert_eq!(page.items[1].bedrooms, 0);
    }

    #[tokio::test]
    async fn missing_content_range_estimates_total() {
        let base = serve_once(canned("200 OK", None, TWO_ROWS)).await;
        let page = local_store(base).query(&sample_query()).await.unwrap();

        // offset 24 plus the two rows returned
        assert_eq!(page.total, 26);
    }

    #[tokio::test]
    async fn window_past_the_end_is_an_empty_page() {
        let body = r#"{"code":"PGRST103","message":"Requested range not satisfiable"}"#;
        let base = serve_once(canned("416 Range Not Satisfiable", Some("*/57"), body)).await;
        let page = local_store(base).query(&sample_query()).await.unwrap();

        assert!(page.items.is_empty());
        assert_eq!(page.total, 57);
    }

    #[tokio::test]
    async fn error_status_is_reported() {
        let response = canned("503 Service Unavailable", None, "down for maintenance");
        let base = serve_once(response).await;
        let err = local_store(base).query(&sample_query()).await.unwrap_err();

        match err {
            StoreError::Status { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "down for maintenance");
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn error_status_surfaces_as_store_unavailable() {
        let base = serve_once(canned("500 Internal Server Error", None, "boom")).await;
        let executor = QueryExecutor::new(Arc::new(local_store(base)));

        let err = executor.execute(&ListingsFilters::default()).await.unwrap_err();
        assert!(matches!(
            err,
            SearchError::StoreUnavailable(StoreError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let base = serve_once(canned("200 OK", Some("0-0/1"), r#"[{"id": 7}]"#)).await;
        let err = local_store(base).query(&sample_query()).await.unwrap_err();

        assert!(matches!(err, StoreError::Decode(_)));
    }
}
