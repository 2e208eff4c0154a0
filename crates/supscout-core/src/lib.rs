// Core of SupScout: mapping, fetch coordination, persisted lists
pub mod collection;
pub mod config;
pub mod detail;
pub mod error;
pub mod lifecycle;
pub mod mapper;
pub mod models;
pub mod search;
pub mod source;
pub mod storage;

pub use collection::{Favorites, MergePolicy, PersistentCollection, RecentSearches};
pub use config::Config;
pub use detail::{DetailCoordinator, DetailRequest};
pub use error::Error;
pub use lifecycle::{FetchState, FetchView, RequestToken, Settled, StalePolicy};
pub use models::{DietaryTags, NutritionalInfo, SearchResultPage, Supplement};
pub use search::{SearchCoordinator, SearchRequest};
pub use source::SupplementSource;
pub use storage::{MemoryStorage, Storage};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
