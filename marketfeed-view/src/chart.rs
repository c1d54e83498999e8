//! Volume chart series.

use serde::Serialize;

use marketfeed_core::constants::VOLUME_SERIES_LABEL;
use marketfeed_core::types::PricePoint;

/// One labelled line series, ready for a chart widget.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    /// Legend label
    pub label: String,
    /// X-axis labels (ISO dates)
    pub labels: Vec<String>,
    /// Y values, one per label
    pub values: Vec<u64>,
}

impl ChartSeries {
    /// Builds the market volume series from the stats price history.
    pub fn from_history(history: &[PricePoint]) -> Self {
        Self {
            label: VOLUME_SERIES_LABEL.to_string(),
            labels: history.iter().map(|p| p.date.format("%Y-%m-%d").to_string()).collect(),
            values: history.iter().map(|p| p.volume).collect(),
        }
    }

    /// Returns true if there are no points.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest value, or zero when empty. Axes start at zero.
    pub fn max_value(&self) -> u64 {
        self.values.iter().copied().max().unwrap_or(0)
    }
}
