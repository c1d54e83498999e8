//! The market feed: cached producers plus subscriber fan-out.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, instrument};

use marketfeed_cache::{CacheStats, TtlCache};
use marketfeed_core::error::Result;
use marketfeed_core::traits::MarketDataSource;
use marketfeed_core::types::{FeedKind, Item, MarketStats, MarketUpdate};

use crate::config::FeedConfig;
use crate::subscribers::{Subscribers, Subscription};

/// Owned instance of the refresh pipeline.
///
/// Holds the data source, one TTL cache per feed, and the subscribers that
/// receive each published [`MarketUpdate`]. Construct one per dashboard (or per
/// test) and share it behind an `Arc`.
pub struct MarketFeed {
    source: Arc<dyn MarketDataSource>,
    items_cache: TtlCache<Vec<Item>>,
    stats_cache: TtlCache<MarketStats>,
    subscribers: Subscribers<MarketUpdate>,
    config: FeedConfig,
    /// Held for the duration of one update cycle
    cycle_guard: AsyncMutex<()>,
    cycles_published: AtomicU64,
    cycles_skipped: AtomicU64,
}

impl MarketFeed {
    /// Creates a feed over `source`.
    pub fn new(source: Arc<dyn MarketDataSource>, config: FeedConfig) -> Self {
        let cache_config = config.cache_config();

        Self {
            source,
            items_cache: TtlCache::with_config(cache_config.clone()),
            stats_cache: TtlCache::with_config(cache_config),
            subscribers: Subscribers::new(),
            config,
            cycle_guard: AsyncMutex::new(()),
            cycles_published: AtomicU64::new(0),
            cycles_skipped: AtomicU64::new(0),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Name of the underlying data source.
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Trending items, served from cache while fresh.
    pub async fn trending_items(&self) -> Result<Vec<Item>> {
        self.items_cache
            .get_or_compute(
                FeedKind::Trending.cache_key(),
                self.config.cache_ttl,
                || self.source.trending_items(),
            )
            .await
    }

    /// Market statistics, served from cache while fresh.
    pub async fn market_stats(&self) -> Result<MarketStats> {
        self.stats_cache
            .get_or_compute(
                FeedKind::MarketStats.cache_key(),
                self.config.cache_ttl,
                || self.source.market_stats(),
            )
            .await
    }

    /// Fetches both feeds concurrently, failing if either fails.
    ///
    /// Nothing is published. Used for the initial load, where a failure is
    /// reported to the user instead of masked.
    pub async fn fetch(&self) -> Result<MarketUpdate> {
        let (items, stats) = tokio::try_join!(self.trending_items(), self.market_stats())?;
        Ok(MarketUpdate::new(items, stats))
    }

    /// Runs one update cycle and publishes the result.
    ///
    /// Both feeds are fetched concurrently and the payload is published once
    /// both have settled. A failed feed is logged and replaced by its default
    /// (no items, zeroed stats). Returns `None` without fetching if another
    /// cycle is still in flight.
    #[instrument(skip(self), fields(source = self.source.name()))]
    pub async fn update(&self) -> Option<MarketUpdate> {
        let Ok(_cycle) = self.cycle_guard.try_lock() else {
            self.cycles_skipped.fetch_add(1, Ordering::Relaxed);
            debug!("Update cycle already in flight, skipping");
            return None;
        };

        let (items, stats) = tokio::join!(self.trending_items(), self.market_stats());
        let mut failed_feeds = Vec::new();

        let items = items.unwrap_or_else(|e| {
            error!(feed = %FeedKind::Trending, error = %e, "Feed failed, publishing empty items");
            failed_feeds.push(FeedKind::Trending);
            Vec::new()
        });
        let stats = stats.unwrap_or_else(|e| {
            error!(feed = %FeedKind::MarketStats, error = %e, "Feed failed, publishing zeroed stats");
            failed_feeds.push(FeedKind::MarketStats);
            MarketStats::default()
        });

        let mut update = MarketUpdate::new(items, stats);
        update.failed_feeds = failed_feeds;

        let delivered = self.subscribers.notify(&update);
        self.cycles_published.fetch_add(1, Ordering::Relaxed);

        info!(
            items = update.items.len(),
            total_volume = update.stats.total_volume,
            failed = update.failed_feeds.len(),
            subscribers = delivered,
            "Published market update"
        );

        Some(update)
    }

    /// Registers a callback for every published update.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&MarketUpdate) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    /// Returns the subscriber registry.
    pub fn subscribers(&self) -> &Subscribers<MarketUpdate> {
        &self.subscribers
    }

    /// Drops both cached feeds so the next read calls the source.
    pub fn invalidate(&self) {
        self.items_cache.clear();
        self.stats_cache.clear();
        debug!("Feed caches invalidated");
    }

    /// Cache statistics for the given feed.
    pub fn cache_stats(&self, feed: FeedKind) -> CacheStats {
        match feed {
            FeedKind::Trending => self.items_cache.stats(),
            FeedKind::MarketStats => self.stats_cache.stats(),
        }
    }

    /// Number of cycles that published an update.
    pub fn cycles_published(&self) -> u64 {
        self.cycles_published.load(Ordering::Relaxed)
    }

    /// Number of cycles skipped because one was already in flight.
    pub fn cycles_skipped(&self) -> u64 {
        self.cycles_skipped.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for MarketFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketFeed")
            .field("source", &self.source.name())
            .field("config", &self.config)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Duration;

    use marketfeed_source::MockMarketSource;

    fn feed_over(source: Arc<MockMarketSource>) -> MarketFeed {
        MarketFeed::new(source, FeedConfig::default())
    }

    #[tokio::test]
    async fn test_update_publishes_both_feeds() {
        let feed = feed_over(Arc::new(MockMarketSource::new()));
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = received.clone();
        feed.subscribe(move |u: &MarketUpdate| sink.lock().push(u.clone()));

        let update = feed.update().await.unwrap();

        assert_eq!(update.items.len(), 3);
        assert_eq!(update.stats.total_volume, 1_250_000);
        assert!(!update.is_degraded());
        assert_eq!(*received.lock(), vec![update]);
        assert_eq!(feed.cycles_published(), 1);
    }

    #[tokio::test]
    async fn test_failed_items_feed_is_isolated() {
        let source = Arc::new(MockMarketSource::new());
        source.fail_feed(FeedKind::Trending);
        let feed = feed_over(source);

        let update = feed.update().await.unwrap();

        assert!(update.items.is_empty());
        assert_eq!(update.stats.active_items, 156);
        assert_eq!(update.failed_feeds, vec![FeedKind::Trending]);
    }

    #[tokio::test]
    async fn test_failed_stats_feed_is_isolated() {
        let source = Arc::new(MockMarketSource::new());
        source.fail_feed(FeedKind::MarketStats);
        let feed = feed_over(source);

        let update = feed.update().await.unwrap();

        assert_eq!(update.items.len(), 3);
        assert_eq!(update.stats, MarketStats::default());
        assert!(update.feed_failed(FeedKind::MarketStats));
        assert!(!update.feed_failed(FeedKind::Trending));
    }

    #[tokio::test]
    async fn test_fetch_is_strict() {
        let source = Arc::new(MockMarketSource::new());
        source.fail_feed(FeedKind::MarketStats);
        let feed = feed_over(source);
        let hits = Arc::new(Mutex::new(0));
        let counter = hits.clone();
        feed.subscribe(move |_| *counter.lock() += 1);

        let err = feed.fetch().await.unwrap_err();

        assert!(err.is_producer_error());
        assert_eq!(*hits.lock(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_serves_within_ttl() {
        let source = Arc::new(MockMarketSource::new());
        let feed = feed_over(source.clone());

        feed.update().await.unwrap();
        tokio::time::advance(Duration::from_secs(299)).await;
        feed.update().await.unwrap();
        assert_eq!(source.calls(FeedKind::Trending), 1);
        assert_eq!(source.calls(FeedKind::MarketStats), 1);

        tokio::time::advance(Duration::from_secs(2)).await;
        feed.update().await.unwrap();
        assert_eq!(source.calls(FeedKind::Trending), 2);
        assert_eq!(feed.cache_stats(FeedKind::Trending).hits, 1);
    }

    #[tokio::test]
    async fn test_failure_does_not_poison_cache() {
        let source = Arc::new(MockMarketSource::new());
        source.fail_feed(FeedKind::Trending);
        let feed = feed_over(source.clone());

        assert!(feed.update().await.unwrap().items.is_empty());

        source.recover_feed(FeedKind::Trending);
        let update = feed.update().await.unwrap();
        assert_eq!(update.items.len(), 3);
        assert_eq!(source.calls(FeedKind::Trending), 2);
        // stats were cached by the first cycle
        assert_eq!(source.calls(FeedKind::MarketStats), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_update_is_skipped() {
        let source = Arc::new(MockMarketSource::new().with_latency(Duration::from_secs(1)));
        let feed = Arc::new(feed_over(source.clone()));

        let in_flight = tokio::spawn({
            let feed = feed.clone();
            async move { feed.update().await }
        });
        tokio::task::yield_now().await;

        assert!(feed.update().await.is_none());
        assert!(in_flight.await.unwrap().is_some());
        assert_eq!(feed.cycles_skipped(), 1);
        assert_eq!(feed.cycles_published(), 1);
        assert_eq!(source.calls(FeedKind::Trending), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let source = Arc::new(MockMarketSource::new());
        let feed = feed_over(source.clone());

        feed.fetch().await.unwrap();
        feed.invalidate();
        feed.fetch().await.unwrap();

        assert_eq!(source.calls(FeedKind::Trending), 2);
        assert_eq!(source.calls(FeedKind::MarketStats), 2);
    }
}
