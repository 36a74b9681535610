//! Mount Rainier recreational forecast report.
//!
//! The page is a bold header (title lines separated by `<br>`) followed by
//! the NWS product text in a `<pre>` block:
//!
//! ```text
//! .SYNOPSIS...<text> &&
//! .TODAY...<text> .TONIGHT...<text> &&
//! .EXTENDED FORECAST... .SUNDAY...<text> $$
//! ```

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use super::{ParsedForecast, PeriodForecast};

static SYNOPSIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.SYNOPSIS\.\.\.(.*?)&&").expect("invalid regex"));
static NEAR_TERM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&&(.*?)&&").expect("invalid regex"));
static EXTENDED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.EXTENDED FORECAST\.\.\.(.*?)(?:\$\$|$)").expect("invalid regex"));
static PERIOD_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.([A-Z][A-Z0-9 /]*[A-Z0-9])\.\.\.").expect("invalid regex"));

pub(super) fn parse_into(parsed: &mut ParsedForecast, text: &str) {
    let document = Html::parse_document(text);

    let bold = Selector::parse("b").expect("invalid selector");
    let header: Vec<String> = document
        .select(&bold)
        .next()
        .map(|b| b.text().map(collapse).filter(|line| !line.is_empty()).collect())
        .unwrap_or_default();

    // Header lines: park name, product title, issue time.
    parsed.source_text = header.get(1).cloned();
    parsed.time_issued = header.get(2).cloned();
    if parsed.time_issued.is_none() {
        parsed.note("could not parse product title and issue time from header");
    }

    let pre = Selector::parse("pre").expect("invalid selector");
    let Some(body) = document.select(&pre).next().map(|p| collapse(&p.text().collect::<String>())) else {
        parsed.note("forecast body not found");
        return;
    };

    match SYNOPSIS.captures(&body) {
        Some(caps) => parsed.synopsis = Some(caps[1].trim().to_string()),
        None => parsed.note("could not parse synopsis from forecast"),
    }

    match NEAR_TERM.captures(&body) {
        Some(caps) => parsed.periods = split_periods(&caps[1]),
        None => parsed.note("could not parse near-term daily forecasts"),
    }

    match EXTENDED.captures(&body) {
        Some(caps) => parsed.extended = split_periods(&caps[1]),
        None => parsed.note("could not parse extended forecast"),
    }
}

/// Split `.LABEL...text .LABEL...text` into labelled blocks.
fn split_periods(block: &str) -> Vec<PeriodForecast> {
    let headers: Vec<_> = PERIOD_HEADER.captures_iter(block).collect();

    headers
        .iter()
        .enumerate()
        .map(|(i, caps)| {
            let start = caps.get(0).map_or(0, |m| m.end());
            let end = headers
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(block.len(), |m| m.start());
            PeriodForecast { label: caps[1].to_string(), text: block[start..end].trim().to_string() }
        })
        .collect()
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
