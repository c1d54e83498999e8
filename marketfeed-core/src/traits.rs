//! Common traits for marketfeed.
//!
//! These traits define the interfaces that different implementations can satisfy,
//! enabling modularity and testing.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Item, MarketStats};

// ═══════════════════════════════════════════════════════════════════════════════
// DATA SOURCE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Interface for the producers behind the two market feeds.
///
/// Implementations might use:
/// - Static mock data (for development and the bundled dashboard)
/// - A marketplace HTTP API (for production)
/// - Scripted responses (for testing failure isolation)
///
/// Both calls are treated as remote: they may suspend and they may fail. Callers
/// own the failure policy; the update cycle masks a failed feed with its default.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Produces the current collection of trending items.
    async fn trending_items(&self) -> Result<Vec<Item>>;

    /// Produces the current aggregate market statistics.
    async fn market_stats(&self) -> Result<MarketStats>;

    /// Human-readable name used in logs.
    fn name(&self) -> &str {
        "market-data-source"
    }
}
