//! Dashboard view-model.
//!
//! [`Dashboard`] keeps the most recent [`MarketUpdate`] and the user's view
//! state, and hands a fully computed [`DashboardView`] to its [`Renderer`]
//! whenever either changes. Filter and theme changes re-render from the stored
//! update; only [`Dashboard::load_initial`] and the scheduler fetch.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error};

use marketfeed_core::constants::INITIAL_LOAD_ERROR_MESSAGE;
use marketfeed_core::error::Result;
use marketfeed_core::types::{FeedKind, Item, MarketStats, MarketUpdate};
use marketfeed_updater::MarketFeed;

use crate::chart::ChartSeries;
use crate::filter::{FilterState, PriceRange, SortKey};
use crate::format::{format_currency, format_thousands, price_change_label, time_ago};
use crate::notice::{Notice, NoticeBoard, NoticeId};
use crate::theme::{Theme, ThemePreference};

/// Output surface for a [`DashboardView`].
pub trait Renderer {
    /// Draws `view`. Failures are reported as [`MarketError::RenderError`].
    ///
    /// [`MarketError::RenderError`]: marketfeed_core::error::MarketError::RenderError
    fn render(&mut self, view: &DashboardView) -> Result<()>;
}

/// Formatted headline numbers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatCards {
    /// Total traded volume, as currency
    pub total_volume: String,
    /// Number of active items
    pub active_items: String,
    /// Average price, as currency
    pub average_price: String,
}

impl StatCards {
    fn from_stats(stats: &MarketStats) -> Self {
        Self {
            total_volume: format_currency(stats.total_volume),
            active_items: format_thousands(stats.active_items),
            average_price: format_currency(stats.average_price),
        }
    }
}

/// One item as displayed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemCard {
    /// Item id
    pub id: u64,
    /// Item name
    pub name: String,
    /// Price, as currency
    pub price: String,
    /// Thumbnail image URL
    pub thumbnail_url: String,
    /// Demand badge
    pub demand: String,
    /// Rarity badge
    pub rarity: String,
    /// Price change badge, e.g. "↑ 5.2%"
    pub price_change: String,
    /// Whether the change is shown as a rise
    pub price_up: bool,
    /// Relative update time, e.g. "2 minutes ago"
    pub updated: String,
}

impl ItemCard {
    fn from_item(item: &Item, now: DateTime<Utc>) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            price: format_currency(item.price),
            thumbnail_url: item.thumbnail_url.clone(),
            demand: item.demand.to_string(),
            rarity: item.rarity.to_string(),
            price_change: price_change_label(item.price_change_percent),
            price_up: item.is_price_up(),
            updated: time_ago(item.updated_at, now),
        }
    }
}

/// Everything a renderer needs for one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    /// Headline numbers
    pub stats: StatCards,
    /// Volume chart
    pub chart: ChartSeries,
    /// Filtered and sorted items
    pub items: Vec<ItemCard>,
    /// Items before filtering
    pub total_items: usize,
    /// Filter that produced `items`
    pub filter: FilterState,
    /// Active theme
    pub theme: Theme,
    /// Icon of the theme toggle
    pub theme_icon: &'static str,
    /// Visible notices, newest first
    pub notices: Vec<Notice>,
    /// Feeds masked with defaults in the shown update
    pub failed_feeds: Vec<FeedKind>,
    /// When the shown update was published, if any
    pub published_at: Option<DateTime<Utc>>,
}

/// Dashboard state driving a [`Renderer`].
pub struct Dashboard<R> {
    renderer: R,
    theme: ThemePreference,
    filter: FilterState,
    latest: Option<MarketUpdate>,
    notices: NoticeBoard,
    renders: u64,
}

impl<R: Renderer> Dashboard<R> {
    /// Creates an empty dashboard. Nothing is rendered until data arrives.
    pub fn new(renderer: R, theme: ThemePreference) -> Self {
        Self {
            renderer,
            theme,
            filter: FilterState::default(),
            latest: None,
            notices: NoticeBoard::new(),
            renders: 0,
        }
    }

    /// Starts from `filter` instead of the default. Does not render.
    pub fn with_filter(mut self, filter: FilterState) -> Self {
        self.filter = filter;
        self
    }

    /// Replaces the notice board, e.g. to change how long notices last.
    pub fn with_notices(mut self, notices: NoticeBoard) -> Self {
        self.notices = notices;
        self
    }

    /// Fetches both feeds and renders them.
    ///
    /// On failure posts the initial-load notice, renders it, and returns the
    /// fetch error.
    pub async fn load_initial(&mut self, feed: &MarketFeed) -> Result<()> {
        match feed.fetch().await {
            Ok(update) => self.apply_update(update),
            Err(e) => {
                error!(error = %e, "Initial load failed");
                self.notices.post(INITIAL_LOAD_ERROR_MESSAGE, Utc::now());
                self.render()?;
                Err(e)
            }
        }
    }

    /// Stores a published update and renders it.
    pub fn apply_update(&mut self, update: MarketUpdate) -> Result<()> {
        self.latest = Some(update);
        self.render()
    }

    /// Replaces the whole filter and re-renders.
    pub fn set_filter(&mut self, filter: FilterState) -> Result<()> {
        self.filter = filter;
        self.render()
    }

    /// Changes the sort order and re-renders.
    pub fn set_sort(&mut self, sort: SortKey) -> Result<()> {
        self.filter.sort = sort;
        self.render()
    }

    /// Changes the search text and re-renders.
    pub fn set_search(&mut self, search: impl Into<String>) -> Result<()> {
        self.filter.search = search.into();
        self.render()
    }

    /// Changes the price bucket and re-renders.
    pub fn set_price_range(&mut self, range: PriceRange) -> Result<()> {
        self.filter.price_range = range;
        self.render()
    }

    /// Switches theme, saves it and re-renders.
    pub fn toggle_theme(&mut self) -> Result<Theme> {
        let theme = self.theme.toggle()?;
        self.render()?;
        Ok(theme)
    }

    /// Dismisses a notice and re-renders if it was shown.
    pub fn dismiss_notice(&mut self, id: NoticeId) -> Result<bool> {
        if !self.notices.dismiss(id) {
            return Ok(false);
        }
        self.render()?;
        Ok(true)
    }

    /// Posts a notice and re-renders.
    pub fn post_notice(&mut self, message: impl Into<String>) -> Result<NoticeId> {
        let id = self.notices.post(message, Utc::now());
        self.render()?;
        Ok(id)
    }

    /// Computes the view at the current time and hands it to the renderer.
    pub fn render(&mut self) -> Result<()> {
        let now = Utc::now();
        self.notices.expire(now);
        let view = self.view_at(now);

        self.renderer.render(&view)?;
        self.renders += 1;
        debug!(items = view.items.len(), renders = self.renders, "Dashboard rendered");
        Ok(())
    }

    /// Computes the view as of `now` without rendering it.
    pub fn view_at(&self, now: DateTime<Utc>) -> DashboardView {
        let empty_stats = MarketStats::default();
        let (items, stats, failed_feeds, published_at) = match &self.latest {
            Some(update) => (
                update.items.as_slice(),
                &update.stats,
                update.failed_feeds.clone(),
                Some(update.published_at),
            ),
            None => (&[][..], &empty_stats, Vec::new(), None),
        };

        let theme = self.theme.current();

        DashboardView {
            stats: StatCards::from_stats(stats),
            chart: ChartSeries::from_history(&stats.price_history),
            items: self
                .filter
                .apply(items)
                .iter()
                .map(|item| ItemCard::from_item(item, now))
                .collect(),
            total_items: items.len(),
            filter: self.filter.clone(),
            theme,
            theme_icon: theme.icon(),
            notices: self.notices.active(now),
            failed_feeds,
            published_at,
        }
    }

    /// The most recently applied update.
    pub fn latest(&self) -> Option<&MarketUpdate> {
        self.latest.as_ref()
    }

    /// Current filter.
    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    /// Current theme.
    pub fn theme(&self) -> Theme {
        self.theme.current()
    }

    /// Number of completed renders.
    pub fn renders(&self) -> u64 {
        self.renders
    }

    /// The renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// The renderer, mutably.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use marketfeed_core::error::MarketError;
    use marketfeed_source::MockMarketSource;
    use marketfeed_updater::FeedConfig;

    use crate::theme::MemoryPreferences;

    #[derive(Default)]
    struct Recorder {
        views: Vec<DashboardView>,
        fail: bool,
    }

    impl Renderer for Recorder {
        fn render(&mut self, view: &DashboardView) -> Result<()> {
            if self.fail {
                return Err(MarketError::RenderError("surface gone".into()));
            }
            self.views.push(view.clone());
            Ok(())
        }
    }

    fn dashboard() -> Dashboard<Recorder> {
        Dashboard::new(
            Recorder::default(),
            ThemePreference::load(Box::new(MemoryPreferences::new())),
        )
    }

    fn feed(source: Arc<MockMarketSource>) -> MarketFeed {
        MarketFeed::new(source, FeedConfig::default())
    }

    #[tokio::test]
    async fn test_initial_load_renders_sorted_items() {
        let mut dashboard = dashboard();
        dashboard.load_initial(&feed(Arc::new(MockMarketSource::new()))).await.unwrap();

        let view = dashboard.renderer().views.last().unwrap();
        let names: Vec<_> = view.items.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Golden Dominus", "Sparkle Time Fedora", "Valkyrie Helm"]);
        assert_eq!(view.stats.total_volume, "R$ 1,250,000");
        assert_eq!(view.stats.active_items, "156");
        assert_eq!(view.stats.average_price, "R$ 65,000");
        assert_eq!(view.chart.values.len(), 7);
        assert_eq!(view.items[0].price_change, "↑ 5.2%");
        assert_eq!(view.items[2].price_change, "↓ 2.1%");
        assert!(!view.items[2].price_up);
    }

    #[tokio::test]
    async fn test_initial_load_failure_posts_notice() {
        let source = Arc::new(MockMarketSource::new());
        source.fail_feed(FeedKind::Trending);
        let mut dashboard = dashboard();

        let err = dashboard.load_initial(&feed(source)).await.unwrap_err();

        assert!(err.is_producer_error());
        let view = dashboard.renderer().views.last().unwrap();
        assert_eq!(view.notices.len(), 1);
        assert_eq!(view.notices[0].message, "Failed to load market data");
        assert!(view.items.is_empty());
    }

    #[tokio::test]
    async fn test_filter_change_rerenders_without_fetch() {
        let source = Arc::new(MockMarketSource::new());
        let feed = feed(source.clone());
        let mut dashboard = dashboard();
        dashboard.load_initial(&feed).await.unwrap();

        dashboard.set_search("helm").unwrap();
        dashboard.set_price_range(PriceRange::From10kTo100k).unwrap();
        dashboard.set_sort(SortKey::Demand).unwrap();

        assert_eq!(source.calls(FeedKind::Trending), 1);
        assert_eq!(dashboard.renders(), 4);

        let view = dashboard.renderer().views.last().unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].name, "Valkyrie Helm");
        assert_eq!(view.total_items, 3);
        assert_eq!(view.filter.sort, SortKey::Demand);
    }

    #[test]
    fn test_apply_update_shows_degraded_feeds() {
        let mut dashboard = dashboard();
        let mut update = MarketUpdate::new(Vec::new(), MarketStats::default());
        update.failed_feeds = vec![FeedKind::Trending];

        dashboard.apply_update(update).unwrap();

        let view = dashboard.renderer().views.last().unwrap();
        assert_eq!(view.failed_feeds, vec![FeedKind::Trending]);
        assert_eq!(view.stats.total_volume, "R$ 0");
        assert!(view.chart.is_empty());
    }

    #[test]
    fn test_toggle_theme_rerenders() {
        let mut dashboard = dashboard();
        assert_eq!(dashboard.theme(), Theme::Light);

        assert_eq!(dashboard.toggle_theme().unwrap(), Theme::Dark);

        let view = dashboard.renderer().views.last().unwrap();
        assert_eq!(view.theme, Theme::Dark);
        assert_eq!(view.theme_icon, "☀️");
    }

    #[test]
    fn test_notice_dismissal() {
        let mut dashboard = dashboard();
        let id = dashboard.post_notice("Failed to load market data").unwrap();

        assert!(dashboard.dismiss_notice(id).unwrap());
        assert!(!dashboard.dismiss_notice(id).unwrap());
        assert!(dashboard.renderer().views.last().unwrap().notices.is_empty());
    }

    #[test]
    fn test_view_expires_notices() {
        let dashboard = dashboard();
        let mut dashboard = dashboard.with_notices(NoticeBoard::with_ttl(std::time::Duration::from_secs(5)));
        dashboard.post_notice("stale").unwrap();

        let later = Utc::now() + chrono::Duration::seconds(6);
        assert!(dashboard.view_at(later).notices.is_empty());
    }

    #[test]
    fn test_render_error_propagates() {
        let mut dashboard = dashboard();
        dashboard.renderer_mut().fail = true;

        let err = dashboard.set_sort(SortKey::Rarity).unwrap_err();
        assert!(matches!(err, MarketError::RenderError(_)));
        assert_eq!(dashboard.renders(), 0);
    }
}
