//! Free-text parsers for values shown on the quote page.

use lazy_static::lazy_static;
use regex::Regex;
use stock_core::MarketCap;

lazy_static! {
    static ref PERCENT_RE: Option<Regex> = Regex::new(r"([+-]?\d+(?:[.,]\d+)?)\s*%").ok();
    static ref MARKET_CAP_RE: Option<Regex> =
        Regex::new(r"(?i)^(?P<cur>[^\d.,-]+)?\s*(?P<num>[\d.,]+)\s*(?P<suf>[KMBT])?$").ok();
}

const PLACEHOLDERS: [&str; 3] = ["—", "-", "N/A"];

/// Parse the first percentage in `text`, e.g. `"+3.25%"` -> `3.25`.
///
/// Accepts the unicode minus sign and a comma decimal separator.
pub fn parse_percent(text: &str) -> Option<f64> {
    let normalized = text.replace('\u{2212}', "-");
    let caps = PERCENT_RE.as_ref()?.captures(&normalized)?;
    caps.get(1)?.as_str().replace(',', ".").parse().ok()
}

/// Parse a market capitalisation such as `"$3.75T"` or `"US$ 2.37T"` into a
/// currency symbol and an absolute value.
pub fn parse_market_cap(text: &str) -> MarketCap {
    let trimmed = text.trim();
    if trimmed.is_empty() || PLACEHOLDERS.contains(&trimmed) {
        return MarketCap::default();
    }

    let normalized = trimmed.replace('\u{a0}', " ");
    let Some(caps) = MARKET_CAP_RE.as_ref().and_then(|re| re.captures(&normalized)) else {
        return MarketCap::default();
    };

    let Ok(number) = caps["num"].replace(',', "").parse::<f64>() else {
        return MarketCap::default();
    };

    let multiplier = match caps.name("suf").map(|m| m.as_str().to_ascii_uppercase()).as_deref() {
        Some("K") => 1e3,
        Some("M") => 1e6,
        Some("B") => 1e9,
        Some("T") => 1e12,
        _ => 1.0,
    };

    let currency = caps
        .name("cur")
        .map(|m| m.as_str().trim().to_string())
        .filter(|c| !c.is_empty());

    MarketCap {
        currency,
        value: Some(number * multiplier),
    }
}
