//! # Marketfeed Core
//!
//! Core types, errors, and traits for the marketfeed pipeline.
//!
//! This crate provides the foundational building blocks used by all other marketfeed crates:
//!
//! - **Types**: Trending items, market statistics, and the combined update payload
//! - **Errors**: One error taxonomy shared by producers, the cache, and renderers
//! - **Constants**: Cache keys, refresh periods, and display defaults
//! - **Traits**: The `MarketDataSource` producer interface
//!
//! ## Example
//!
//! ```rust
//! use marketfeed_core::{Demand, MarketStats, Rarity};
//!
//! // Enumerated fields parse from their display names
//! let demand: Demand = "Very High".parse().unwrap();
//! assert!(demand.rank() > Demand::High.rank());
//! assert!(Rarity::Limited.rank() > Rarity::Rare.rank());
//!
//! // Stats default to zeroed values, which is what a failed feed publishes
//! let stats = MarketStats::default();
//! let json = serde_json::to_string(&stats).unwrap();
//! assert!(json.contains("totalVolume"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{MarketError, Result};
pub use traits::*;
pub use types::*;
