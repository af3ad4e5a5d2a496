//! Extraction of the performance box and competitor table from a quote page.

use scraper::{ElementRef, Html, Selector};
use stock_core::{AnalyticsSnapshot, Competitor, PerformanceData};

use crate::parse::{parse_market_cap, parse_percent};

/// Markers of the anti-bot interstitial served instead of the quote page.
const BOT_MARKERS: [&str; 2] = [
    "Please enable JS and disable any ad blocker",
    "captcha-delivery.com",
];

pub fn is_bot_challenge(html: &str) -> bool {
    BOT_MARKERS.iter().any(|marker| html.contains(marker))
        || html.to_lowercase().contains("datadome")
}

/// Extract whatever analytics the page carries. Missing sections stay at
/// their defaults.
pub fn extract_analytics(html: &str) -> AnalyticsSnapshot {
    let document = Html::parse_document(html);
    AnalyticsSnapshot {
        performance: extract_performance(&document).unwrap_or_default(),
        competitors: extract_competitors(&document).unwrap_or_default(),
    }
}

/// Text content with whitespace runs collapsed to single spaces.
fn collapsed_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_performance(document: &Html) -> Option<PerformanceData> {
    let box_sel = Selector::parse("div.element--table.performance").ok()?;
    let row_sel = Selector::parse("tr.table__row").ok()?;
    let cell_sel = Selector::parse("td.table__cell").ok()?;
    let value_sel = Selector::parse("li.content__item.value").ok()?;

    let perf_box = document.select(&box_sel).next()?;
    let mut performance = PerformanceData::default();

    for row in perf_box.select(&row_sel) {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
        if cells.len() < 2 {
            continue;
        }

        let label = collapsed_text(cells[0]);
        let value_cell = cells[1].select(&value_sel).next().unwrap_or(cells[1]);
        performance.set_by_label(&label, parse_percent(&collapsed_text(value_cell)));
    }

    Some(performance)
}

/// The competitor table is the first table after a "Competitors" heading,
/// falling back to any table whose header names both "Name" and "Market Cap".
fn find_competitor_table<'a>(document: &'a Html) -> Option<ElementRef<'a>> {
    let outline_sel = Selector::parse("h2, h3, table").ok()?;
    let mut after_heading = false;
    for element in document.select(&outline_sel) {
        if element.value().name() == "table" {
            if after_heading {
                return Some(element);
            }
        } else if !after_heading && collapsed_text(element).contains("Competitors") {
            after_heading = true;
        }
    }

    let table_sel = Selector::parse("table").ok()?;
    let thead_sel = Selector::parse("thead").ok()?;
    document.select(&table_sel).find(|table| {
        table
            .select(&thead_sel)
            .next()
            .map(|head| {
                let text = collapsed_text(head);
                text.contains("Market Cap") && text.contains("Name")
            })
            .unwrap_or(false)
    })
}

fn extract_competitors(document: &Html) -> Option<Vec<Competitor>> {
    let table = find_competitor_table(document)?;
    let row_sel = Selector::parse("tbody tr").ok()?;
    let td_sel = Selector::parse("td").ok()?;

    let mut competitors = Vec::new();
    for row in table.select(&row_sel) {
        let cells: Vec<ElementRef<'_>> = row.select(&td_sel).collect();
        let Some(first) = cells.first() else {
            continue;
        };

        let name = collapsed_text(*first);
        if name.is_empty() {
            continue;
        }

        // Market cap is the last column; shorter rows carry no cap.
        let cap_text = match cells.last() {
            Some(last) if cells.len() >= 3 => collapsed_text(*last),
            _ => String::new(),
        };

        competitors.push(Competitor {
            name,
            market_cap: parse_market_cap(&cap_text),
        });
    }

    Some(competitors)
}
