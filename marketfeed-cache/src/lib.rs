//! TTL cache for marketfeed.
//!
//! Keyed in-memory cache that falls back to a producer when an entry is missing
//! or older than the caller's TTL. Concurrent misses on one key can be coalesced
//! into a single producer call.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod cache;

pub use cache::{CacheConfig, CacheStats, TtlCache};
