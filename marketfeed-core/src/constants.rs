//! Pipeline constants for marketfeed.
//!
//! Refresh timings match the dashboard's five minute cadence: the cache TTL and
//! the scheduler period are equal, so every scheduled cycle sees stale entries
//! and hits the producers once.

use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// TIMING
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum age of a cached feed before it is recomputed.
pub const CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Period of the scheduled update cycle.
pub const UPDATE_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// How long an on-screen notice stays visible before it expires.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE KEYS
// ═══════════════════════════════════════════════════════════════════════════════

/// Cache key of the trending items feed.
pub const TRENDING_CACHE_KEY: &str = "trending";

/// Cache key of the aggregate market statistics feed.
pub const MARKET_STATS_CACHE_KEY: &str = "market-stats";

/// Default capacity of a feed cache.
pub const DEFAULT_MAX_CACHE_ENTRIES: usize = 64;

// ═══════════════════════════════════════════════════════════════════════════════
// DISPLAY
// ═══════════════════════════════════════════════════════════════════════════════

/// Preference key under which the theme is persisted.
pub const THEME_PREFERENCE_KEY: &str = "theme";

/// Message shown when the first load of the dashboard fails.
pub const INITIAL_LOAD_ERROR_MESSAGE: &str = "Failed to load market data";

/// Prefix used when rendering prices.
pub const CURRENCY_PREFIX: &str = "R$";

/// Label of the market volume chart series.
pub const VOLUME_SERIES_LABEL: &str = "Market Volume";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_ttl_matches_update_interval() {
        assert_eq!(CACHE_TTL, UPDATE_INTERVAL);
        assert_eq!(CACHE_TTL.as_secs(), 300);
    }

    #[test]
    fn test_cache_keys_are_distinct() {
        assert_ne!(TRENDING_CACHE_KEY, MARKET_STATS_CACHE_KEY);
    }
}
