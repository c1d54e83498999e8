//! The combined payload published by every update cycle.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{MARKET_STATS_CACHE_KEY, TRENDING_CACHE_KEY};
use crate::types::{Item, MarketStats};

/// One logical data feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeedKind {
    /// Trending items
    Trending,
    /// Aggregate market statistics
    MarketStats,
}

impl FeedKind {
    /// Key under which this feed is cached.
    pub fn cache_key(self) -> &'static str {
        match self {
            FeedKind::Trending => TRENDING_CACHE_KEY,
            FeedKind::MarketStats => MARKET_STATS_CACHE_KEY,
        }
    }
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cache_key())
    }
}

/// Items and stats from one update cycle.
///
/// Subscribers receive this by reference and must clone what they keep.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketUpdate {
    /// Trending items (empty if the trending feed failed)
    pub items: Vec<Item>,
    /// Market statistics (zeroed if the stats feed failed)
    pub stats: MarketStats,
    /// Feeds whose producers failed and were replaced by defaults
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_feeds: Vec<FeedKind>,
    /// When the payload was assembled
    pub published_at: DateTime<Utc>,
}

impl MarketUpdate {
    /// Creates an update from two healthy feeds.
    pub fn new(items: Vec<Item>, stats: MarketStats) -> Self {
        Self {
            items,
            stats,
            failed_feeds: Vec::new(),
            published_at: Utc::now(),
        }
    }

    /// Returns true if any feed was masked with its default.
    pub fn is_degraded(&self) -> bool {
        !self.failed_feeds.is_empty()
    }

    /// Returns true if the given feed failed in this cycle.
    pub fn feed_failed(&self, feed: FeedKind) -> bool {
        self.failed_feeds.contains(&feed)
    }
}
