// SQLite-backed key/value storage
// Keeps favorites and recent searches around between runs

pub mod store;

pub use rusqlite;
pub use store::KeyValueStore;
