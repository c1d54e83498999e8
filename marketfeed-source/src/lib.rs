//! # Marketfeed Source
//!
//! Producers for the trending items and market statistics feeds.
//!
//! The marketplace has no public API the dashboard can reach, so the bundled
//! source simulates one:
//!
//! - **Mock**: Fixed marketplace data stamped with the time of each call, with
//!   optional simulated latency and per-feed failure injection
//!
//! ## Example
//!
//! ```rust,ignore
//! use marketfeed_source::{MarketDataSource, MockMarketSource};
//!
//! let source = MockMarketSource::new();
//!
//! let items = source.trending_items().await?;
//! let stats = source.market_stats().await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod mock;

pub use mock::{mock_market_stats, mock_trending_items, MockMarketSource};

// Re-export the trait from core
pub use marketfeed_core::traits::MarketDataSource;
