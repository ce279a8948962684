//! Cache implementations for plotfile reading.

mod handle_cache;

pub use handle_cache::{FileHandleCache, HandleCacheStats};
