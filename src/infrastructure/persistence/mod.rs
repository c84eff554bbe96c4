//! Persistence implementations

mod local_path_cache_store;

pub use local_path_cache_store::LocalPathCacheStore;
