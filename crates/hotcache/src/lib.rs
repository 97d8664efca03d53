//! # hotcache
//!
//! Bounded in-memory key-value cache with LRU eviction.
//!
//! ## Architecture
//! - **HashMap**: AHash for fast lookups (O(1))
//! - **Recency list**: arena-backed doubly-linked list for O(1) touch and eviction
//! - **Statistics**: hit/miss/eviction/insert counters with derived hit ratio
//!
//! Lookup misses are ordinary `None` results, never errors. The only
//! fallible cache-owned operation is construction with a zero capacity.
//!
//! The cache is single-threaded by design: no operation blocks or yields
//! mid-mutation, and nothing is locked internally. Share one instance
//! across threads only behind an external lock.
//!
//! Keys compare with their own `Eq`/`Hash` implementations. Two
//! structurally equal keys are the same key; callers that need identity
//! semantics for composite keys must key by a stable identity (e.g. an ID
//! field) themselves.

#![warn(missing_docs)]

mod cache;
mod error;
mod iter;
mod lru;
mod stats;

pub use cache::{HotCache, DEFAULT_CAPACITY};
pub use error::{Error, Result};
pub use iter::{Iter, Keys, Values};
pub use stats::CacheStats;
