// Open Food Facts endpoints - knows the URLs, returns raw payloads
use tracing::debug;

use crate::client::{HttpClient, Result};
use crate::types::{RemoteProductResponse, RemoteSearchResponse};

pub const OPEN_FOOD_FACTS_BASE: &str = "https://world.openfoodfacts.org";

/// Page size used when the caller has no preference
pub const DEFAULT_PAGE_SIZE: u32 = 24;

pub struct OpenFoodFactsClient {
    http: HttpClient,
    base_url: String,
}

impl OpenFoodFactsClient {
    pub fn new() -> Self {
        Self::with_base_url(OPEN_FOOD_FACTS_BASE)
    }

    /// Point the client at a mirror or a local test server
    pub fn with_base_url(base_url: &str) -> Self {
        Self::with_http(HttpClient::new(), base_url)
    }

    pub fn with_http(http: HttpClient, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full-text search restricted to the supplements category
    pub fn search_url(&self, query: &str, page: u32, page_size: u32) -> String {
        let page = page.to_string();
        let page_size = page_size.to_string();
        let params = [
            ("search_terms", query),
            ("page", page.as_str()),
            ("page_size", page_size.as_str()),
            ("json", "1"),
            ("tagtype_0", "categories"),
            ("tag_contains_0", "contains"),
            ("tag_0", "supplements"),
        ];

        let query_string = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        format!("{}/cgi/search.pl?{}", self.base_url, query_string)
    }

    pub fn product_url(&self, barcode: &str) -> String {
        format!(
            "{}/api/v2/product/{}.json",
            self.base_url,
            urlencoding::encode(barcode)
        )
    }

    pub async fn search_supplements(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> Result<RemoteSearchResponse> {
        debug!("Searching supplements: {:?} (page {}, size {})", query, page, page_size);
        self.http
            .get(&self.search_url(query, page, page_size), None)
            .await
    }

    /// Look up one product by barcode
    pub async fn get_supplement_by_id(&self, barcode: &str) -> Result<RemoteProductResponse> {
        debug!("Fetching product {}", barcode);
        self.http.get(&self.product_url(barcode), None).await
    }
}

impl Default for OpenFoodFactsClient {
    fn default() -> Self {
        Self::new()
    }
}
