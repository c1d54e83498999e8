//! # Marketfeed Updater
//!
//! The refresh pipeline: cached producers, an isolated update cycle, subscriber
//! fan-out, and the periodic scheduler that drives it.
//!
//! ## Features
//!
//! - **Cache-through feeds**: Each feed is served from a [`TtlCache`] and only
//!   recomputed once its entry is older than the configured TTL
//! - **Failure isolation**: A failing feed is logged and replaced by its default
//!   so the other feed is still published
//! - **Single-flight cycles**: An update requested while another is in flight is
//!   skipped rather than run concurrently
//! - **Cancellable scheduling**: The periodic timer and any in-flight cycle stop
//!   together on [`MarketUpdater::stop`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use marketfeed_source::MockMarketSource;
//! use marketfeed_updater::{FeedConfig, MarketFeed, MarketUpdater};
//!
//! let feed = Arc::new(MarketFeed::new(Arc::new(MockMarketSource::new()), FeedConfig::default()));
//!
//! let subscription = feed.subscribe(|update| {
//!     println!("{} items, volume {}", update.items.len(), update.stats.total_volume);
//! });
//!
//! let updater = MarketUpdater::new(feed.clone())?;
//! updater.start().await?;  // publishes now, then every five minutes
//! // ...
//! updater.stop().await;
//! subscription.unsubscribe();
//! ```
//!
//! [`TtlCache`]: marketfeed_cache::TtlCache

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod config;
mod feed;
mod subscribers;
mod updater;

pub use config::FeedConfig;
pub use feed::MarketFeed;
pub use subscribers::{SubscriberId, Subscribers, Subscription};
pub use updater::{MarketUpdater, UpdaterState};
