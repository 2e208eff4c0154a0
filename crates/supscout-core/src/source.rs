use async_trait::async_trait;
use supscout_api::client::Result as ApiResult;
use supscout_api::{HttpClient, OpenFoodFactsClient, RemoteProductResponse, RemoteSearchResponse};

use crate::config::ApiConfig;

/// Where supplement data comes from
///
/// Coordinators only talk to this trait, so tests can swap in a mock and
/// the CLI can point at a mirror without touching coordinator code.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SupplementSource: Send + Sync {
    async fn search(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> ApiResult<RemoteSearchResponse>;
    async fn product(&self, barcode: &str) -> ApiResult<RemoteProductResponse>;
}

#[async_trait]
impl SupplementSource for OpenFoodFactsClient {
    async fn search(
        &self,
        query: &str,
        page: u32,
        page_size: u32,
    ) -> ApiResult<RemoteSearchResponse> {
        self.search_supplements(query, page, page_size).await
    }

    async fn product(&self, barcode: &str) -> ApiResult<RemoteProductResponse> {
        self.get_supplement_by_id(barcode).await
    }
}

/// Build the Open Food Facts source described by `config`
pub fn open_food_facts(config: &ApiConfig) -> OpenFoodFactsClient {
    OpenFoodFactsClient::with_http(
        HttpClient::with_user_agent(&config.user_agent),
        &config.base_url,
    )
}
