//! Item filtering and sorting.
//!
//! [`FilterState::apply`] is pure: the same items and state always produce the
//! same output, in the same order.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use marketfeed_core::error::MarketError;
use marketfeed_core::types::Item;

/// Sort order for the item list. All keys sort descending.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Highest price first
    #[default]
    Price,
    /// Highest demand first
    Demand,
    /// Rarest first
    Rarity,
    /// Source order
    #[serde(rename = "none")]
    Unsorted,
}

impl SortKey {
    /// Canonical filter value.
    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Price => "price",
            SortKey::Demand => "demand",
            SortKey::Rarity => "rarity",
            SortKey::Unsorted => "none",
        }
    }

    fn rank(self, item: &Item) -> u64 {
        match self {
            SortKey::Price => item.price,
            SortKey::Demand => u64::from(item.demand.rank()),
            SortKey::Rarity => u64::from(item.rarity.rank()),
            SortKey::Unsorted => 0,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "price" => Ok(SortKey::Price),
            "demand" => Ok(SortKey::Demand),
            "rarity" => Ok(SortKey::Rarity),
            "none" | "unsorted" => Ok(SortKey::Unsorted),
            other => Err(MarketError::InvalidFilter(format!("unknown sort key '{other}'"))),
        }
    }
}

/// Price bucket. Bounds are half-open: lower inclusive, upper exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceRange {
    /// Any price
    #[default]
    #[serde(rename = "all")]
    All,
    /// Below 1,000
    #[serde(rename = "under1k")]
    Under1k,
    /// 1,000 up to 10,000
    #[serde(rename = "1k-10k")]
    From1kTo10k,
    /// 10,000 up to 100,000
    #[serde(rename = "10k-100k")]
    From10kTo100k,
    /// 100,000 and above
    #[serde(rename = "over100k")]
    Over100k,
}

impl PriceRange {
    /// Every bucket, in ascending order.
    pub const ALL: [PriceRange; 5] = [
        PriceRange::All,
        PriceRange::Under1k,
        PriceRange::From1kTo10k,
        PriceRange::From10kTo100k,
        PriceRange::Over100k,
    ];

    /// Canonical filter value.
    pub fn as_str(self) -> &'static str {
        match self {
            PriceRange::All => "all",
            PriceRange::Under1k => "under1k",
            PriceRange::From1kTo10k => "1k-10k",
            PriceRange::From10kTo100k => "10k-100k",
            PriceRange::Over100k => "over100k",
        }
    }

    /// Returns true if `price` falls in this bucket.
    pub fn contains(self, price: u64) -> bool {
        match self {
            PriceRange::All => true,
            PriceRange::Under1k => price < 1_000,
            PriceRange::From1kTo10k => (1_000..10_000).contains(&price),
            PriceRange::From10kTo100k => (10_000..100_000).contains(&price),
            PriceRange::Over100k => price >= 100_000,
        }
    }
}

impl fmt::Display for PriceRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceRange {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PriceRange::ALL
            .into_iter()
            .find(|range| range.as_str() == wanted)
            .ok_or_else(|| MarketError::InvalidFilter(format!("unknown price range '{s}'")))
    }
}

/// User-chosen view parameters, read on every render pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Sort order
    pub sort: SortKey,
    /// Case-insensitive substring of the item name; empty matches everything
    pub search: String,
    /// Price bucket
    pub price_range: PriceRange,
}

impl FilterState {
    /// Default state: sorted by price, no search, all prices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sort order.
    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    /// Sets the search text.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// Sets the price bucket.
    pub fn with_price_range(mut self, range: PriceRange) -> Self {
        self.price_range = range;
        self
    }

    /// Returns true if `item` passes the search and price filters.
    pub fn matches(&self, item: &Item) -> bool {
        self.matches_needle(item, &self.search.to_lowercase())
    }

    /// `needle` is the lowercased search text.
    fn matches_needle(&self, item: &Item, needle: &str) -> bool {
        (needle.is_empty() || item.name.to_lowercase().contains(needle))
            && self.price_range.contains(item.price)
    }

    /// Filters then sorts `items`, leaving the input untouched.
    ///
    /// Ties keep their input order.
    pub fn apply(&self, items: &[Item]) -> Vec<Item> {
        let needle = self.search.to_lowercase();

        let mut filtered: Vec<Item> = items
            .iter()
            .filter(|item| self.matches_needle(item, &needle))
            .cloned()
            .collect();

        if self.sort != SortKey::Unsorted {
            let key = self.sort;
            filtered.sort_by(|a, b| key.rank(b).cmp(&key.rank(a)));
        }

        filtered
    }
}
