//! A weighted, thread safe LRU cache.
//!
//! [`LruCache`] bounds the summed weight of its entries rather than their
//! number. How entries are weighed, created on a miss and released is decided
//! by the [`CacheHooks`] a cache is built with.

mod linked_table;
mod lru_cache;

#[cfg(test)]
mod test_utils;

pub mod error;
pub mod hooks;
pub mod options;
pub mod stats;

pub use error::{Error, Result};
pub use hooks::{CacheHooks, FnHooks, UnitHooks};
pub use lru_cache::LruCache;
pub use options::LruCacheOptions;
pub use stats::CacheStats;
