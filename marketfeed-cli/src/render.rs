//! Terminal renderers.

use std::io::{self, Write};

use colored::*;

use marketfeed_core::error::{MarketError, Result};
use marketfeed_view::{DashboardView, Renderer, Theme};

/// Width of the longest bar in the volume chart.
const CHART_WIDTH: usize = 32;

/// Draws the dashboard as colored text on stdout.
#[derive(Debug, Default)]
pub struct TerminalRenderer;

impl TerminalRenderer {
    pub fn new() -> Self {
        Self
    }

    fn draw(&self, out: &mut impl Write, view: &DashboardView) -> io::Result<()> {
        let title = " Market Tracker ";
        let title = match view.theme {
            Theme::Light => title.black().on_bright_white().bold(),
            Theme::Dark => title.bright_white().on_black().bold(),
        };
        let updated = view
            .published_at
            .map(|at| at.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        writeln!(out, "\n{} {}  {} {}", title, view.theme_icon, "updated".dimmed(), updated)?;

        for notice in &view.notices {
            writeln!(out, "{} {}", "✖".red().bold(), notice.message.red())?;
        }
        for feed in &view.failed_feeds {
            writeln!(out, "{} {} feed unavailable, showing defaults", "⚠".yellow(), feed)?;
        }

        writeln!(out)?;
        writeln!(
            out,
            "  {} {}   {} {}   {} {}",
            "Total volume".dimmed(),
            view.stats.total_volume.bold(),
            "Active items".dimmed(),
            view.stats.active_items.bold(),
            "Average price".dimmed(),
            view.stats.average_price.bold(),
        )?;

        if !view.chart.is_empty() {
            writeln!(out, "\n  {}", view.chart.label.cyan().bold())?;
            let max = view.chart.max_value().max(1);
            for (label, value) in view.chart.labels.iter().zip(&view.chart.values) {
                let width = (*value as u128 * CHART_WIDTH as u128 / max as u128) as usize;
                writeln!(out, "  {}  {} {}", label.dimmed(), "█".repeat(width).cyan(), value)?;
            }
        }

        writeln!(
            out,
            "\n  {} ({} of {}, sort: {}, range: {}{})",
            "Trending".bold(),
            view.items.len(),
            view.total_items,
            view.filter.sort,
            view.filter.price_range,
            if view.filter.search.is_empty() {
                String::new()
            } else {
                format!(", search: \"{}\"", view.filter.search)
            },
        )?;

        if view.items.is_empty() {
            writeln!(out, "  {}", "No items match the current filters.".dimmed())?;
        }
        for card in &view.items {
            let change = if card.price_up {
                card.price_change.green()
            } else {
                card.price_change.red()
            };
            writeln!(out, "  {} {}  {}", card.name.bold(), change, card.price)?;
            writeln!(
                out,
                "    {} {}  {}",
                card.demand.blue(),
                card.rarity.magenta(),
                format!("Updated: {}", card.updated).dimmed(),
            )?;
        }

        out.flush()
    }
}

impl Renderer for TerminalRenderer {
    fn render(&mut self, view: &DashboardView) -> Result<()> {
        let stdout = io::stdout();
        self.draw(&mut stdout.lock(), view)
            .map_err(|e| MarketError::RenderError(e.to_string()))
    }
}

/// Prints each view as one JSON document.
#[derive(Debug, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&mut self, view: &DashboardView) -> Result<()> {
        let json = serde_json::to_string_pretty(view)?;
        let stdout = io::stdout();
        writeln!(stdout.lock(), "{json}").map_err(|e| MarketError::RenderError(e.to_string()))
    }
}
