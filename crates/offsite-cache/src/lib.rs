// SQLite-backed response stores
// One named store per site version; the whole point is working offline

pub mod store;

pub use store::{CacheStorage, CacheStore, StoreError, StoredResponse};
