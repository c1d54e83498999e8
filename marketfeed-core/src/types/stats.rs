//! Aggregate market statistics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Traded volume on a single day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Calendar day (serialized as `YYYY-MM-DD`)
    pub date: NaiveDate,
    /// Total volume traded that day
    pub volume: u64,
}

impl PricePoint {
    /// Creates a new history point.
    pub fn new(date: NaiveDate, volume: u64) -> Self {
        Self { date, volume }
    }
}

/// Market-wide statistics published alongside the trending items.
///
/// `Default` is the zeroed value a failed stats feed is masked with.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketStats {
    /// Total traded volume
    pub total_volume: u64,
    /// Number of items with active listings
    pub active_items: u64,
    /// Average price across active items
    pub average_price: u64,
    /// Daily volume, oldest first
    pub price_history: Vec<PricePoint>,
}

impl MarketStats {
    /// Returns true if this is the zeroed placeholder.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Most recent history point, if any.
    pub fn latest_point(&self) -> Option<&PricePoint> {
        self.price_history.last()
    }
}
