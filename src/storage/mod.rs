pub mod file_cache;
pub mod key;
pub mod traits;

pub use file_cache::FileCacheStore;
pub use traits::{CacheEntry, CacheStore, ContentKind};
