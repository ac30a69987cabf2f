//! Response caching.

mod response_cache;

pub use response_cache::{CacheStats, DEFAULT_CAPACITY, DEFAULT_MAX_AGE, ResponseCache};
