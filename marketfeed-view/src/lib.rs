//! # Marketfeed View
//!
//! Everything between a published [`MarketUpdate`] and the pixels (or
//! terminal cells) that show it. Rendering itself is delegated to a
//! [`Renderer`]; this crate computes what the renderer receives.
//!
//! ## Modules
//!
//! - [`filter`]: search, price bucket and sort over the item list
//! - [`format`]: relative times, thousands separators, currency
//! - [`chart`]: the volume series derived from price history
//! - [`notice`]: dismissible, self-expiring notices
//! - [`theme`]: light/dark theme and its persisted preference
//! - [`dashboard`]: the view-model tying it together
//!
//! ## Example
//!
//! ```rust,ignore
//! use marketfeed_view::{Dashboard, FilterState, SortKey};
//!
//! let mut dashboard = Dashboard::new(renderer, theme_preference);
//! dashboard.load_initial(&feed).await;
//! dashboard.set_sort(SortKey::Demand)?;   // re-renders, no fetch
//! ```
//!
//! [`MarketUpdate`]: marketfeed_core::types::MarketUpdate

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

pub mod chart;
pub mod dashboard;
pub mod filter;
pub mod format;
pub mod notice;
pub mod theme;

pub use chart::ChartSeries;
pub use dashboard::{Dashboard, DashboardView, ItemCard, Renderer, StatCards};
pub use filter::{FilterState, PriceRange, SortKey};
pub use format::{format_currency, format_thousands, price_change_label, time_ago};
pub use notice::{Notice, NoticeBoard, NoticeId};
pub use theme::{FilePreferences, MemoryPreferences, PreferenceStore, Theme, ThemePreference};
