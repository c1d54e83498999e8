//! Trending item types.
//!
//! Items are produced whole by the data source on every cycle. Nothing mutates an
//! item after it is produced, and no identity is carried across cycles: a new
//! cycle yields an entirely new collection.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MarketError;

/// How actively an item is being traded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Demand {
    /// Rarely traded
    Low,
    /// Steady trading
    Medium,
    /// Actively traded
    High,
    /// Contested on every listing
    #[serde(rename = "Very High")]
    VeryHigh,
}

impl Demand {
    /// All demand levels, lowest first.
    pub const ALL: [Demand; 4] = [Demand::Low, Demand::Medium, Demand::High, Demand::VeryHigh];

    /// Ordinal used by the demand sort (higher is hotter).
    pub fn rank(self) -> u8 {
        match self {
            Demand::Low => 1,
            Demand::Medium => 2,
            Demand::High => 3,
            Demand::VeryHigh => 4,
        }
    }

    /// Display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Demand::Low => "Low",
            Demand::Medium => "Medium",
            Demand::High => "High",
            Demand::VeryHigh => "Very High",
        }
    }
}

impl fmt::Display for Demand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Demand {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Demand::Low),
            "medium" => Ok(Demand::Medium),
            "high" => Ok(Demand::High),
            "very high" | "veryhigh" | "very-high" => Ok(Demand::VeryHigh),
            _ => Err(MarketError::InvalidField {
                field: "demand",
                value: s.to_string(),
            }),
        }
    }
}

/// How scarce an item is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rarity {
    /// Freely available
    Common,
    /// Harder to find
    Uncommon,
    /// Seldom listed
    Rare,
    /// No longer sold by the marketplace
    Limited,
}

impl Rarity {
    /// All rarities, most common first.
    pub const ALL: [Rarity; 4] = [Rarity::Common, Rarity::Uncommon, Rarity::Rare, Rarity::Limited];

    /// Ordinal used by the rarity sort (higher is scarcer).
    pub fn rank(self) -> u8 {
        match self {
            Rarity::Common => 1,
            Rarity::Uncommon => 2,
            Rarity::Rare => 3,
            Rarity::Limited => 4,
        }
    }

    /// Display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::Limited => "Limited",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rarity {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "common" => Ok(Rarity::Common),
            "uncommon" => Ok(Rarity::Uncommon),
            "rare" => Ok(Rarity::Rare),
            "limited" => Ok(Rarity::Limited),
            _ => Err(MarketError::InvalidField {
                field: "rarity",
                value: s.to_string(),
            }),
        }
    }
}

/// A trending collectible item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Marketplace identifier
    pub id: u64,
    /// Display name
    pub name: String,
    /// Current lowest asking price
    pub price: u64,
    /// Thumbnail image URL
    pub thumbnail_url: String,
    /// Trading demand
    pub demand: Demand,
    /// Scarcity class
    pub rarity: Rarity,
    /// Recent average sale price
    pub recent_average_price: u64,
    /// Price change over the reporting window, in percent
    pub price_change_percent: f64,
    /// Units sold over the reporting window
    pub volume: u64,
    /// When the producer observed this item
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Creates an item with neutral market figures, observed now.
    ///
    /// Mostly useful for fixtures; producers fill every field explicitly.
    pub fn new(id: u64, name: impl Into<String>, price: u64, demand: Demand, rarity: Rarity) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            thumbnail_url: String::new(),
            demand,
            rarity,
            recent_average_price: price,
            price_change_percent: 0.0,
            volume: 0,
            updated_at: Utc::now(),
        }
    }

    /// Returns true if the price moved up over the reporting window.
    ///
    /// A flat price is shown as a decline, like any non-positive change.
    pub fn is_price_up(&self) -> bool {
        self.price_change_percent > 0.0
    }
}
