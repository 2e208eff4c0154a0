// Search coordinator: (query, page) in, SearchResultPage lifecycle out
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::lifecycle::{
    transition, FetchEvent, FetchState, FetchView, RequestToken, Settled, StalePolicy,
    TokenCounter,
};
use crate::mapper::map_search_response;
use crate::models::SearchResultPage;
use crate::source::SupplementSource;
use crate::Error;

pub const DEFAULT_SEARCH_PAGE_SIZE: u32 = 20;

const SEARCH_FAILED: &str = "Failed to search supplements";

/// The key a search result belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchKey {
    pub query: String,
    pub page: u32,
}

/// One dispatched search, not yet executed
///
/// Holds no reference to the coordinator, so several can be in flight at
/// once and settled in any order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub token: RequestToken,
    pub query: String,
    pub page: u32,
    pub page_size: u32,
}

impl SearchRequest {
    /// Perform exactly one source call and turn the result into an outcome
    pub async fn execute(&self, source: &dyn SupplementSource) -> Settled<SearchResultPage> {
        let outcome = source
            .search(&self.query, self.page, self.page_size)
            .await
            .map(|response| map_search_response(&response))
            .map_err(|e| Error::from(e).user_message(SEARCH_FAILED));

        Settled {
            token: self.token,
            outcome,
        }
    }
}

pub struct SearchCoordinator {
    source: Arc<dyn SupplementSource>,
    page_size: u32,
    key: Option<SearchKey>,
    state: FetchState<SearchResultPage>,
    tokens: TokenCounter,
}

impl SearchCoordinator {
    pub fn new(source: Arc<dyn SupplementSource>) -> Self {
        Self {
            source,
            page_size: DEFAULT_SEARCH_PAGE_SIZE,
            key: None,
            state: FetchState::Idle,
            tokens: TokenCounter::new(StalePolicy::default()),
        }
    }

    pub fn from_config(
        source: Arc<dyn SupplementSource>,
        page_size: u32,
        config: &SearchConfig,
    ) -> Self {
        Self::new(source)
            .with_page_size(page_size)
            .with_stale_policy(config.stale_policy())
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_stale_policy(mut self, policy: StalePolicy) -> Self {
        self.tokens = TokenCounter::new(policy);
        self
    }

    /// React to a new (query, page) pair
    ///
    /// A blank query clears everything and returns `None`. An unchanged key
    /// also returns `None` and leaves the current state alone; use `retry`
    /// to re-issue it. Otherwise the state goes to `Loading` and the request
    /// to run is returned.
    pub fn update(&mut self, query: &str, page: u32) -> Option<SearchRequest> {
        if query.trim().is_empty() {
            self.key = None;
            // Anything still in flight answers a query that no longer exists
            self.tokens.bump();
            self.apply(FetchEvent::Cleared);
            return None;
        }

        let key = SearchKey {
            query: query.to_string(),
            page,
        };
        if self.key.as_ref() == Some(&key) {
            debug!("Search key {:?} unchanged", key);
            return None;
        }

        self.key = Some(key);
        self.dispatch()
    }

    /// Re-issue the last search, even if one is already in flight
    pub fn retry(&mut self) -> Option<SearchRequest> {
        debug!("Retrying search {:?}", self.key);
        self.dispatch()
    }

    fn dispatch(&mut self) -> Option<SearchRequest> {
        let key = self.key.clone()?;
        let token = self.tokens.next();
        self.apply(FetchEvent::Started);
        info!("Searching {:?} page {} ({})", key.query, key.page, token);

        Some(SearchRequest {
            token,
            query: key.query,
            page: key.page,
            page_size: self.page_size,
        })
    }

    /// Apply a finished request; returns false when it was dropped as stale
    pub fn settle(&mut self, settled: Settled<SearchResultPage>) -> bool {
        if !self.tokens.accepts(settled.token) {
            debug!(
                "Discarding stale search response {} (latest {})",
                settled.token,
                self.tokens.latest()
            );
            return false;
        }

        self.apply(settled.into_event());
        true
    }

    /// Execute `request` against this coordinator's source and settle it
    pub async fn run(&mut self, request: SearchRequest) -> bool {
        let settled = request.execute(self.source.as_ref()).await;
        self.settle(settled)
    }

    /// `update` + `run` in one go
    pub async fn search(&mut self, query: &str, page: u32) -> &FetchState<SearchResultPage> {
        if let Some(request) = self.update(query, page) {
            self.run(request).await;
        }
        &self.state
    }

    /// `retry` + `run` in one go
    pub async fn retry_now(&mut self) -> &FetchState<SearchResultPage> {
        if let Some(request) = self.retry() {
            self.run(request).await;
        }
        &self.state
    }

    fn apply(&mut self, event: FetchEvent<SearchResultPage>) {
        let previous = std::mem::take(&mut self.state);
        let from = previous.label();
        self.state = transition(previous, event);
        debug!("Search state {} -> {}", from, self.state.label());
    }

    /// Shared handle to the source, for running requests concurrently
    pub fn source(&self) -> Arc<dyn SupplementSource> {
        Arc::clone(&self.source)
    }

    pub fn state(&self) -> &FetchState<SearchResultPage> {
        &self.state
    }

    pub fn view(&self) -> FetchView<'_, SearchResultPage> {
        self.state.view()
    }

    pub fn data(&self) -> Option<&SearchResultPage> {
        self.state.data()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }

    pub fn query(&self) -> Option<&str> {
        self.key.as_ref().map(|k| k.query.as_str())
    }

    pub fn page(&self) -> Option<u32> {
        self.key.as_ref().map(|k| k.page)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }
}
