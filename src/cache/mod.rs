//! Local persistence for offline browsing.
//!
//! - Per-page snapshots of the unfiltered listing, replaced wholesale on refetch
//! - Per-id detail records, stored on first fetch and served cache-first afterwards
//! - No expiry: entries live until overwritten or cleared

mod detail;
mod storage;

pub use detail::DetailCache;
pub use storage::{CacheStats, CatalogStore, SqliteStorage};
