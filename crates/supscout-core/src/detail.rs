// Detail coordinator: one barcode in, one Supplement lifecycle out
use std::sync::Arc;
use tracing::{debug, info};

use crate::lifecycle::{
    transition, FetchEvent, FetchState, FetchView, RequestToken, Settled, StalePolicy,
    TokenCounter,
};
use crate::mapper::map_product;
use crate::models::Supplement;
use crate::source::SupplementSource;
use crate::Error;

const DETAIL_FAILED: &str = "Failed to load supplement details";
pub const NOT_FOUND_MESSAGE: &str = "Supplement not found";

/// One dispatched lookup, not yet executed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRequest {
    pub token: RequestToken,
    pub id: String,
}

impl DetailRequest {
    pub async fn execute(&self, source: &dyn SupplementSource) -> Settled<Supplement> {
        let outcome = match source.product(&self.id).await {
            Ok(response) => match response.product {
                Some(product) => Ok(map_product(&product)),
                None => Err(Error::NotFound(NOT_FOUND_MESSAGE.to_string())),
            },
            Err(e) => Err(Error::from(e)),
        };

        Settled {
            token: self.token,
            outcome: outcome.map_err(|e| e.user_message(DETAIL_FAILED)),
        }
    }
}

pub struct DetailCoordinator {
    source: Arc<dyn SupplementSource>,
    id: Option<String>,
    state: FetchState<Supplement>,
    tokens: TokenCounter,
}

impl DetailCoordinator {
    pub fn new(source: Arc<dyn SupplementSource>) -> Self {
        Self {
            source,
            id: None,
            state: FetchState::Idle,
            tokens: TokenCounter::new(StalePolicy::default()),
        }
    }

    pub fn with_stale_policy(mut self, policy: StalePolicy) -> Self {
        self.tokens = TokenCounter::new(policy);
        self
    }

    /// React to a new identifier
    ///
    /// `None` (or a blank id) clears the state without touching the network.
    /// The current id again returns `None`; `retry` re-issues it.
    pub fn update(&mut self, id: Option<&str>) -> Option<DetailRequest> {
        match id.filter(|id| !id.trim().is_empty()) {
            Some(id) if self.id.as_deref() == Some(id) => {
                debug!("Supplement id {} unchanged", id);
                None
            }
            Some(id) => {
                self.id = Some(id.to_string());
                self.dispatch()
            }
            None => {
                self.id = None;
                self.tokens.bump();
                self.apply(FetchEvent::Cleared);
                None
            }
        }
    }

    pub fn retry(&mut self) -> Option<DetailRequest> {
        debug!("Retrying lookup of {:?}", self.id);
        self.dispatch()
    }

    fn dispatch(&mut self) -> Option<DetailRequest> {
        let id = self.id.clone()?;
        let token = self.tokens.next();
        self.apply(FetchEvent::Started);
        info!("Loading supplement {} ({})", id, token);

        Some(DetailRequest { token, id })
    }

    pub fn settle(&mut self, settled: Settled<Supplement>) -> bool {
        if !self.tokens.accepts(settled.token) {
            debug!(
                "Discarding stale detail response {} (latest {})",
                settled.token,
                self.tokens.latest()
            );
            return false;
        }

        self.apply(settled.into_event());
        true
    }

    pub async fn run(&mut self, request: DetailRequest) -> bool {
        let settled = request.execute(self.source.as_ref()).await;
        self.settle(settled)
    }

    /// `update(Some(id))` + `run` in one go
    pub async fn load(&mut self, id: &str) -> &FetchState<Supplement> {
        if let Some(request) = self.update(Some(id)) {
            self.run(request).await;
        }
        &self.state
    }

    pub async fn retry_now(&mut self) -> &FetchState<Supplement> {
        if let Some(request) = self.retry() {
            self.run(request).await;
        }
        &self.state
    }

    fn apply(&mut self, event: FetchEvent<Supplement>) {
        let previous = std::mem::take(&mut self.state);
        let from = previous.label();
        self.state = transition(previous, event);
        debug!("Detail state {} -> {}", from, self.state.label());
    }

    pub fn source(&self) -> Arc<dyn SupplementSource> {
        Arc::clone(&self.source)
    }

    pub fn state(&self) -> &FetchState<Supplement> {
        &self.state
    }

    pub fn view(&self) -> FetchView<'_, Supplement> {
        self.state.view()
    }

    pub fn item(&self) -> Option<&Supplement> {
        self.state.data()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockSupplementSource;
    use mockall::predicate::eq;
    use supscout_api::{ApiError, RemoteProduct, RemoteProductResponse};

    fn found(code: &str, name: &str) -> RemoteProductResponse {
        RemoteProductResponse {
            status: 1,
            status_verbose: Some("product found".to_string()),
            product: Some(RemoteProduct {
                code: code.to_string(),
                product_name: Some(name.to_string()),
                categories: Some("Dietary supplements, Vegan".to_string()),
                ..Default::default()
            }),
        }
    }

    #[tokio::test]
    async fn test_load_success() {
        let mut source = MockSupplementSource::new();
        source
            .expect_product()
            .with(eq("737628064502"))
            .times(1)
            .returning(|code| Ok(found(code, "Magnesium")));

        let mut coordinator = DetailCoordinator::new(Arc::new(source));
        coordinator.load("737628064502").await;

        let item = coordinator.item().unwrap();
        assert_eq!(item.id, "737628064502");
        assert_eq!(item.name, "Magnesium");
        assert!(item.dietary_tags.vegan);
        assert!(coordinator.error().is_none());
    }

    #[tokio::test]
    async fn test_none_goes_idle_without_request() {
        let mut source = MockSupplementSource::new();
        source.expect_product().times(0);

        let mut coordinator = DetailCoordinator::new(Arc::new(source));
        assert!(coordinator.update(None).is_none());
        assert!(coordinator.update(Some("  ")).is_none());
        assert!(coordinator.state().is_idle());
        assert!(coordinator.id().is_none());
    }

    #[tokio::test]
    async fn test_none_clears_loaded_item() {
        let mut source = MockSupplementSource::new();
        source
            .expect_product()
            .returning(|code| Ok(found(code, "Zinc")));

        let mut coordinator = DetailCoordinator::new(Arc::new(source));
        coordinator.load("1").await;
        assert!(coordinator.item().is_some());

        coordinator.update(None);
        assert!(coordinator.item().is_none());
        assert!(coordinator.state().is_idle());
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found_error() {
        let mut source = MockSupplementSource::new();
        source.expect_product().returning(|_| {
            Ok(RemoteProductResponse {
                status: 0,
                status_verbose: Some("product not found".to_string()),
                product: None,
            })
        });

        let mut coordinator = DetailCoordinator::new(Arc::new(source));
        coordinator.load("000").await;

        assert_eq!(coordinator.error(), Some(NOT_FOUND_MESSAGE));
        assert!(coordinator.item().is_none());
    }

    #[tokio::test]
    async fn test_http_error_is_prefixed() {
        let mut source = MockSupplementSource::new();
        source.expect_product().returning(|_| {
            Err(ApiError::Http {
                status: 500,
                status_text: "Internal Server Error".to_string(),
            })
        });

        let mut coordinator = DetailCoordinator::new(Arc::new(source));
        coordinator.load("1").await;

        assert_eq!(
            coordinator.error(),
            Some("Failed to load supplement details: HTTP error! 500: Internal Server Error")
        );
    }

    #[tokio::test]
    async fn test_retry_after_failure() {
        let mut source = MockSupplementSource::new();
        let mut calls = 0;
        source
            .expect_product()
            .with(eq("42"))
            .times(2)
            .returning(move |code| {
                calls += 1;
                if calls == 1 {
                    Err(ApiError::transport("offline"))
                } else {
                    Ok(found(code, "Fish Oil"))
                }
            });

        let mut coordinator = DetailCoordinator::new(Arc::new(source));
        coordinator.load("42").await;
        assert!(coordinator.error().is_some());

        coordinator.retry_now().await;
        assert_eq!(coordinator.item().unwrap().name, "Fish Oil");
    }

    #[tokio::test]
    async fn test_same_id_does_not_refetch() {
        let mut source = MockSupplementSource::new();
        source
            .expect_product()
            .times(1)
            .returning(|code| Ok(found(code, "Iron")));

        let mut coordinator = DetailCoordinator::new(Arc::new(source));
        coordinator.load("7").await;
        assert!(coordinator.update(Some("7")).is_none());

        coordinator.load("7").await;
        assert_eq!(coordinator.item().unwrap().name, "Iron");
    }

    #[tokio::test]
    async fn test_retry_without_id_does_nothing() {
        let mut source = MockSupplementSource::new();
        source.expect_product().times(0);

        let mut coordinator = DetailCoordinator::new(Arc::new(source));
        assert!(coordinator.retry().is_none());
    }

    #[tokio::test]
    async fn test_stale_detail_is_discarded() {
        let mut source = MockSupplementSource::new();
        source
            .expect_product()
            .returning(|code| Ok(found(code, code)));

        let mut coordinator = DetailCoordinator::new(Arc::new(source));
        let source = coordinator.source();

        let first = coordinator.update(Some("a")).unwrap();
        let second = coordinator.update(Some("b")).unwrap();

        let second = second.execute(source.as_ref()).await;
        let first = first.execute(source.as_ref()).await;

        assert!(coordinator.settle(second));
        assert!(!coordinator.settle(first));
        assert_eq!(coordinator.item().unwrap().id, "b");
    }

    #[tokio::test]
    async fn test_last_write_wins_for_details() {
        let mut source = MockSupplementSource::new();
        source
            .expect_product()
            .returning(|code| Ok(found(code, code)));

        let mut coordinator =
            DetailCoordinator::new(Arc::new(source)).with_stale_policy(StalePolicy::LastWriteWins);
        let source = coordinator.source();

        let first = coordinator.update(Some("a")).unwrap();
        let second = coordinator.update(Some("b")).unwrap();

        let second = second.execute(source.as_ref()).await;
        let first = first.execute(source.as_ref()).await;

        coordinator.settle(second);
        coordinator.settle(first);
        assert_eq!(coordinator.item().unwrap().id, "a");
    }
}
