//! Domain types for marketfeed.
//!
//! This module provides the data structures that flow through the pipeline:
//!
//! - [`Item`]: A trending collectible with its [`Demand`] and [`Rarity`]
//! - [`MarketStats`]: Aggregate figures with a daily [`PricePoint`] history
//! - [`MarketUpdate`]: The combined payload published to subscribers
//! - [`FeedKind`]: Names one of the two cached feeds

mod item;
mod stats;
mod update;

pub use item::*;
pub use stats::*;
pub use update::*;
