// HTTP plumbing and the Open Food Facts endpoints
pub mod client;
pub mod openfoodfacts;
pub mod types;

// Re-export common types
pub use client::{ApiError, HttpClient, RequestOptions};
pub use openfoodfacts::{OpenFoodFactsClient, DEFAULT_PAGE_SIZE, OPEN_FOOD_FACTS_BASE};
pub use types::{
    Nutriments, RemoteIngredient, RemoteProduct, RemoteProductResponse, RemoteSearchResponse,
};
