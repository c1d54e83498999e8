//! Pipeline configuration.

use std::time::Duration;

use marketfeed_cache::CacheConfig;
use marketfeed_core::constants::{CACHE_TTL, DEFAULT_MAX_CACHE_ENTRIES, UPDATE_INTERVAL};
use marketfeed_core::error::{MarketError, Result};

/// Environment variable overriding the cache TTL, in seconds.
const ENV_CACHE_TTL_SECS: &str = "MARKETFEED_CACHE_TTL_SECS";
/// Environment variable overriding the update period, in seconds.
const ENV_UPDATE_INTERVAL_SECS: &str = "MARKETFEED_UPDATE_INTERVAL_SECS";
/// Environment variable toggling single-flight cache misses.
const ENV_SINGLE_FLIGHT: &str = "MARKETFEED_SINGLE_FLIGHT";

/// Feed and scheduler configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedConfig {
    /// Maximum age of a cached feed
    pub cache_ttl: Duration,
    /// Period of the scheduled update cycle
    pub update_interval: Duration,
    /// Whether concurrent cache misses share one producer call
    pub single_flight_cache: bool,
    /// Capacity of each feed cache
    pub max_cache_entries: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            cache_ttl: CACHE_TTL,
            update_interval: UPDATE_INTERVAL,
            single_flight_cache: true,
            max_cache_entries: DEFAULT_MAX_CACHE_ENTRIES,
        }
    }
}

impl FeedConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cache TTL.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Sets the update period.
    pub fn update_interval(mut self, interval: Duration) -> Self {
        self.update_interval = interval;
        self
    }

    /// Enables or disables single-flight cache misses.
    pub fn single_flight(mut self, enabled: bool) -> Self {
        self.single_flight_cache = enabled;
        self
    }

    /// Sets the capacity of each feed cache.
    pub fn max_cache_entries(mut self, max: usize) -> Self {
        self.max_cache_entries = max;
        self
    }

    /// Reads overrides from the process environment on top of the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup` on top of the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_CACHE_TTL_SECS) {
            config.cache_ttl = Duration::from_secs(parse_secs(ENV_CACHE_TTL_SECS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_UPDATE_INTERVAL_SECS) {
            config.update_interval = Duration::from_secs(parse_secs(ENV_UPDATE_INTERVAL_SECS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_SINGLE_FLIGHT) {
            config.single_flight_cache = raw != "false" && raw != "0";
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks that the configuration can drive a scheduler.
    pub fn validate(&self) -> Result<()> {
        if self.update_interval.is_zero() {
            return Err(MarketError::ConfigError(
                "update interval must be greater than zero".into(),
            ));
        }
        if self.max_cache_entries == 0 {
            return Err(MarketError::ConfigError(
                "cache capacity must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Cache configuration derived from this feed configuration.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            max_entries: self.max_cache_entries,
            default_ttl_seconds: self.cache_ttl.as_secs(),
            single_flight: self.single_flight_cache,
        }
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| MarketError::ConfigError(format!("{key} must be a whole number of seconds, got '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_case::test_case;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_dashboard_cadence() {
        let config = FeedConfig::default();
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.update_interval, Duration::from_secs(300));
        assert!(config.single_flight_cache);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = FeedConfig::new()
            .cache_ttl(Duration::from_secs(30))
            .update_interval(Duration::from_secs(60))
            .single_flight(false)
            .max_cache_entries(8);

        let cache = config.cache_config();
        assert_eq!(cache.default_ttl_seconds, 30);
        assert_eq!(cache.max_entries, 8);
        assert!(!cache.single_flight);
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = FeedConfig::from_lookup(lookup_from(&[
            ("MARKETFEED_CACHE_TTL_SECS", "10"),
            ("MARKETFEED_UPDATE_INTERVAL_SECS", " 20 "),
            ("MARKETFEED_SINGLE_FLIGHT", "false"),
        ]))
        .unwrap();

        assert_eq!(config.cache_ttl, Duration::from_secs(10));
        assert_eq!(config.update_interval, Duration::from_secs(20));
        assert!(!config.single_flight_cache);
    }

    #[test]
    fn test_from_lookup_without_overrides_is_default() {
        let config = FeedConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, FeedConfig::default());
    }

    #[test_case("MARKETFEED_CACHE_TTL_SECS", "five" ; "non numeric ttl")]
    #[test_case("MARKETFEED_UPDATE_INTERVAL_SECS", "-1" ; "negative interval")]
    #[test_case("MARKETFEED_UPDATE_INTERVAL_SECS", "0" ; "zero interval")]
    fn test_from_lookup_rejects(key: &str, value: &str) {
        let err = FeedConfig::from_lookup(lookup_from(&[(key, value)])).unwrap_err();
        assert!(matches!(err, MarketError::ConfigError(_)));
    }
}
