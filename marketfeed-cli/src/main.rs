//! Marketfeed CLI
//!
//! Terminal dashboard for the simulated marketplace feed.

mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use marketfeed_source::MockMarketSource;
use marketfeed_updater::{FeedConfig, MarketFeed, MarketUpdater};
use marketfeed_view::{
    Dashboard, FilePreferences, FilterState, PriceRange, Renderer, SortKey, Theme,
    ThemePreference,
};

use render::{JsonRenderer, TerminalRenderer};

/// Marketfeed - cached marketplace dashboard
#[derive(Parser)]
#[command(name = "marketfeed")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Preference file holding the theme
    #[arg(
        long,
        global = true,
        env = "MARKETFEED_PREFS",
        default_value = ".marketfeed/preferences.json"
    )]
    prefs: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch once and print the dashboard
    Snapshot {
        #[command(flatten)]
        filters: FilterArgs,
        /// Print the computed view as JSON
        #[arg(long)]
        json: bool,
    },

    /// Keep the dashboard refreshed until Ctrl-C
    Watch {
        #[command(flatten)]
        filters: FilterArgs,
        /// Seconds between update cycles
        #[arg(long, env = "MARKETFEED_UPDATE_INTERVAL_SECS")]
        interval_secs: Option<u64>,
        /// Seconds a fetched feed stays fresh
        #[arg(long, env = "MARKETFEED_CACHE_TTL_SECS")]
        cache_ttl_secs: Option<u64>,
    },

    /// Show or toggle the saved theme
    Theme {
        #[command(subcommand)]
        action: Option<ThemeAction>,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum ThemeAction {
    /// Print the saved theme
    Show,
    /// Switch between light and dark
    Toggle,
}

#[derive(Args)]
struct FilterArgs {
    /// Sort order: price, demand, rarity or none
    #[arg(long, default_value = "price")]
    sort: SortKey,
    /// Case-insensitive name filter
    #[arg(long, default_value = "")]
    search: String,
    /// Price bucket: all, under1k, 1k-10k, 10k-100k or over100k
    #[arg(long, default_value = "all")]
    price_range: PriceRange,
}

impl FilterArgs {
    fn into_state(self) -> FilterState {
        FilterState::new()
            .with_sort(self.sort)
            .with_search(self.search)
            .with_price_range(self.price_range)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "marketfeed=debug,info"
    } else {
        "marketfeed=info,warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Snapshot { filters, json } => cmd_snapshot(&cli.prefs, filters, json).await,
        Commands::Watch {
            filters,
            interval_secs,
            cache_ttl_secs,
        } => cmd_watch(&cli.prefs, filters, interval_secs, cache_ttl_secs).await,
        Commands::Theme { action } => cmd_theme(&cli.prefs, action.unwrap_or(ThemeAction::Show)),
    }
}

fn theme_preference(path: &Path) -> ThemePreference {
    ThemePreference::load(Box::new(FilePreferences::new(path)))
}

fn feed_config(interval_secs: Option<u64>, cache_ttl_secs: Option<u64>) -> Result<FeedConfig> {
    let mut config = FeedConfig::from_env().context("Invalid feed configuration in environment")?;

    if let Some(secs) = interval_secs {
        config = config.update_interval(Duration::from_secs(secs));
    }
    if let Some(secs) = cache_ttl_secs {
        config = config.cache_ttl(Duration::from_secs(secs));
    }

    config.validate().context("Invalid feed configuration")?;
    Ok(config)
}

/// Fetch once and render
async fn cmd_snapshot(prefs: &Path, filters: FilterArgs, json: bool) -> Result<()> {
    let config = feed_config(None, None)?;
    let feed = MarketFeed::new(Arc::new(MockMarketSource::new()), config);
    let theme = theme_preference(prefs);

    if json {
        load_once(Dashboard::new(JsonRenderer, theme), &feed, filters).await
    } else {
        load_once(Dashboard::new(TerminalRenderer::new(), theme), &feed, filters).await
    }
}

async fn load_once<R: Renderer>(
    dashboard: Dashboard<R>,
    feed: &MarketFeed,
    filters: FilterArgs,
) -> Result<()> {
    let mut dashboard = dashboard.with_filter(filters.into_state());
    dashboard
        .load_initial(feed)
        .await
        .context("Failed to load market data")
}

/// Run the scheduler and re-render on every update
async fn cmd_watch(
    prefs: &Path,
    filters: FilterArgs,
    interval_secs: Option<u64>,
    cache_ttl_secs: Option<u64>,
) -> Result<()> {
    let config = feed_config(interval_secs, cache_ttl_secs)?;
    let interval = config.update_interval;
    let feed = Arc::new(MarketFeed::new(Arc::new(MockMarketSource::new()), config));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let subscription = feed.subscribe(move |update| {
        let _ = tx.send(update.clone());
    });

    let mut dashboard = Dashboard::new(TerminalRenderer::new(), theme_preference(prefs))
        .with_filter(filters.into_state());

    if let Err(e) = dashboard.load_initial(&feed).await {
        warn!(error = %e, "Initial load failed, waiting for the next cycle");
    }

    let updater = MarketUpdater::new(feed.clone()).context("Failed to create updater")?;
    updater
        .start()
        .await
        .context("Failed to start periodic updates")?;

    println!(
        "\n{} every {}s. Press Ctrl+C to stop.",
        "Refreshing".cyan().bold(),
        interval.as_secs()
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                result.context("Failed to listen for Ctrl+C")?;
                break;
            }
            Some(update) = rx.recv() => {
                match dashboard.apply_update(update) {
                    Ok(()) => {}
                    Err(e) if e.is_recoverable() => warn!(error = %e, "Render failed"),
                    Err(e) => {
                        updater.stop().await;
                        return Err(e).context("Dashboard stopped");
                    }
                }
            }
        }
    }

    updater.stop().await;
    subscription.unsubscribe();
    info!(
        cycles = feed.cycles_published(),
        skipped = feed.cycles_skipped(),
        "Stopped"
    );

    Ok(())
}

/// Show or toggle the saved theme
fn cmd_theme(prefs: &Path, action: ThemeAction) -> Result<()> {
    let mut preference = theme_preference(prefs);

    let theme = match action {
        ThemeAction::Show => preference.current(),
        ThemeAction::Toggle => preference
            .toggle()
            .with_context(|| format!("Failed to save theme to {}", prefs.display()))?,
    };

    let label = match theme {
        Theme::Light => theme.as_str().black().on_bright_white(),
        Theme::Dark => theme.as_str().bright_white().on_black(),
    };
    println!("{} {} {}", "Theme:".dimmed(), label, theme.icon());

    if matches!(action, ThemeAction::Toggle) {
        println!("   {} {}", "Saved to:".green(), prefs.display());
    }

    Ok(())
}
