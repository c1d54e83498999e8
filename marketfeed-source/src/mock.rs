//! Simulated marketplace source.
//!
//! Serves a fixed snapshot of the marketplace, shaped like the responses of a
//! remote catalogue API. Thread-safe; failure injection can be toggled while the
//! source is shared with a running scheduler.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::RwLock;
use tracing::{debug, instrument};

use marketfeed_core::error::{MarketError, Result};
use marketfeed_core::traits::MarketDataSource;
use marketfeed_core::types::{Demand, FeedKind, Item, MarketStats, PricePoint, Rarity};

/// Daily volume history served by the stats feed: (year, month, day, volume).
const PRICE_HISTORY: [(i32, u32, u32, u64); 7] = [
    (2025, 10, 20, 1_000_000),
    (2025, 10, 21, 1_100_000),
    (2025, 10, 22, 1_150_000),
    (2025, 10, 23, 1_200_000),
    (2025, 10, 24, 1_180_000),
    (2025, 10, 25, 1_220_000),
    (2025, 10, 26, 1_250_000),
];

/// Returns the fixed trending items, observed now.
pub fn mock_trending_items() -> Vec<Item> {
    let now = Utc::now();

    vec![
        Item {
            id: 1,
            name: "Golden Dominus".into(),
            price: 100_000,
            thumbnail_url: "https://tr.rbxcdn.com/42f5fbf6e9f9ca7435c5c4d9d22fb08c/420/420/Hat/Png".into(),
            demand: Demand::High,
            rarity: Rarity::Limited,
            recent_average_price: 95_000,
            price_change_percent: 5.2,
            volume: 12,
            updated_at: now,
        },
        Item {
            id: 2,
            name: "Valkyrie Helm".into(),
            price: 50_000,
            thumbnail_url: "https://tr.rbxcdn.com/5a1e2f5b96fcc3ef853886b158f23432/420/420/Hat/Png".into(),
            demand: Demand::Medium,
            rarity: Rarity::Limited,
            recent_average_price: 48_000,
            price_change_percent: -2.1,
            volume: 8,
            updated_at: now,
        },
        Item {
            id: 3,
            name: "Sparkle Time Fedora".into(),
            price: 75_000,
            thumbnail_url: "https://tr.rbxcdn.com/5751c5b3511955861c7a313c1c6e7164/420/420/Hat/Png".into(),
            demand: Demand::High,
            rarity: Rarity::Limited,
            recent_average_price: 72_000,
            price_change_percent: 1.8,
            volume: 15,
            updated_at: now,
        },
    ]
}

/// Returns the fixed market statistics.
pub fn mock_market_stats() -> MarketStats {
    MarketStats {
        total_volume: 1_250_000,
        active_items: 156,
        average_price: 65_000,
        price_history: PRICE_HISTORY
            .iter()
            .filter_map(|&(y, m, d, volume)| {
                NaiveDate::from_ymd_opt(y, m, d).map(|date| PricePoint::new(date, volume))
            })
            .collect(),
    }
}

/// Mock implementation of [`MarketDataSource`].
///
/// # Simulation knobs
///
/// - Latency: every call sleeps before answering, like a network round trip
/// - Failures: a feed marked as failing returns [`MarketError::ProducerFailed`]
///   until it is recovered
#[derive(Debug, Default)]
pub struct MockMarketSource {
    /// Simulated round-trip time
    latency: Option<Duration>,
    /// Feeds that currently fail
    failing: RwLock<HashSet<FeedKind>>,
    /// Calls served by the trending feed (including failures)
    trending_calls: AtomicU64,
    /// Calls served by the stats feed (including failures)
    stats_calls: AtomicU64,
}

impl MockMarketSource {
    /// Creates a source that answers immediately.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a simulated round-trip time.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes the given feed fail from now on.
    pub fn fail_feed(&self, feed: FeedKind) {
        self.failing.write().insert(feed);
    }

    /// Makes the given feed succeed again.
    pub fn recover_feed(&self, feed: FeedKind) {
        self.failing.write().remove(&feed);
    }

    /// Returns how many times the given feed was called.
    pub fn calls(&self, feed: FeedKind) -> u64 {
        match feed {
            FeedKind::Trending => self.trending_calls.load(Ordering::SeqCst),
            FeedKind::MarketStats => self.stats_calls.load(Ordering::SeqCst),
        }
    }

    async fn simulate(&self, feed: FeedKind) -> Result<()> {
        let counter = match feed {
            FeedKind::Trending => &self.trending_calls,
            FeedKind::MarketStats => &self.stats_calls,
        };
        counter.fetch_add(1, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        if self.failing.read().contains(&feed) {
            return Err(MarketError::producer(
                feed.cache_key(),
                "simulated upstream failure",
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl MarketDataSource for MockMarketSource {
    #[instrument(skip(self))]
    async fn trending_items(&self) -> Result<Vec<Item>> {
        self.simulate(FeedKind::Trending).await?;
        let items = mock_trending_items();
        debug!(count = items.len(), "Produced trending items");
        Ok(items)
    }

    #[instrument(skip(self))]
    async fn market_stats(&self) -> Result<MarketStats> {
        self.simulate(FeedKind::MarketStats).await?;
        let stats = mock_market_stats();
        debug!(history = stats.price_history.len(), "Produced market stats");
        Ok(stats)
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trending_items_fixture() {
        let source = MockMarketSource::new();
        let items = source.trending_items().await.unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].name, "Golden Dominus");
        assert_eq!(items[0].price, 100_000);
        assert_eq!(items[1].demand, Demand::Medium);
        assert!(items.iter().all(|i| i.rarity == Rarity::Limited));
    }

    #[tokio::test]
    async fn test_market_stats_fixture() {
        let source = MockMarketSource::new();
        let stats = source.market_stats().await.unwrap();

        assert_eq!(stats.total_volume, 1_250_000);
        assert_eq!(stats.active_items, 156);
        assert_eq!(stats.average_price, 65_000);
        assert_eq!(stats.price_history.len(), 7);
        assert_eq!(stats.latest_point().unwrap().volume, 1_250_000);
        assert!(stats.price_history.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[tokio::test]
    async fn test_each_call_produces_a_new_collection() {
        let source = MockMarketSource::new();
        let first = source.trending_items().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2)).await;
        let second = source.trending_items().await.unwrap();

        assert!(second[0].updated_at >= first[0].updated_at);
        assert_eq!(source.calls(FeedKind::Trending), 2);
        assert_eq!(source.calls(FeedKind::MarketStats), 0);
    }

    #[tokio::test]
    async fn test_failure_injection_is_per_feed() {
        let source = MockMarketSource::new();
        source.fail_feed(FeedKind::Trending);

        let err = source.trending_items().await.unwrap_err();
        assert!(err.is_producer_error());
        assert!(source.market_stats().await.is_ok());

        source.recover_feed(FeedKind::Trending);
        assert!(source.trending_items().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_latency() {
        let source = MockMarketSource::new().with_latency(Duration::from_millis(250));
        let start = tokio::time::Instant::now();

        source.market_stats().await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[test]
    fn test_source_usable_from_blocking_code() {
        let source = MockMarketSource::new();
        let stats = tokio_test::block_on(source.market_stats()).unwrap();
        assert!(!stats.is_empty());
        assert_eq!(source.name(), "mock");
    }
}
