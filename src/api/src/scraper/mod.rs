//! Web scraper module for geny.com
//!
//! Provides browser automation, request pacing and HTML parsing.

pub mod browser;
pub mod fetcher;
pub mod parsers;
pub mod rate_limiter;

pub use browser::Browser;
pub use fetcher::{Fetcher, PageSource, ReadySignal, RenderStatus};
pub use rate_limiter::RateLimiter;

use chrono::NaiveDate;
use url::Url;

use parsers::values::title_case;

/// Base URL for geny.com
pub const BASE_URL: &str = "https://www.geny.com";

/// Race card rendered: some table cell holds a bare program number.
pub const RACE_CARD_READY: &str = r#"(() => {
    const cells = document.querySelectorAll('table td');
    for (const cell of cells) {
        if (/^\d+$/.test(cell.innerText.trim())) return true;
    }
    return false;
})()"#;

/// Programme rendered: at least one race card link is present.
pub const PROGRAMME_READY: &str =
    r#"document.querySelector("a[href*='/partants-pmu/']") !== null"#;

/// Results board rendered: an arrival label is present.
pub const RESULTS_READY: &str =
    r#"/arriv/i.test(document.body ? document.body.innerText : "")"#;

/// Build the daily programme URL
/// URL: https://www.geny.com/reunions-courses-pmu?date=YYYY-MM-DD
pub fn programme_url(base_url: &str, date: NaiveDate) -> String {
    format!("{}/reunions-courses-pmu?date={}", base_url.trim_end_matches('/'), date.format("%Y-%m-%d"))
}

/// Build the daily results board URL
/// URL: https://www.geny.com/arrivees-rapports-pmu?date=YYYY-MM-DD
pub fn results_url(base_url: &str, date: NaiveDate) -> String {
    format!("{}/arrivees-rapports-pmu?date={}", base_url.trim_end_matches('/'), date.format("%Y-%m-%d"))
}

/// Names carried by a race link slug
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RaceSlug {
    pub venue: Option<String>,
    pub prize_name: Option<String>,
}

/// Split a race URL slug into venue and prize name.
///
/// `/partants-pmu/2026-02-15-vincennes-pmu-prix-de-grenade_c1633331`
/// gives venue `Vincennes` and prize `Prix De Grenade`. Slugs without the
/// `-pmu-` separator only yield a venue (their first word).
pub fn parse_race_slug(url: &str, date: NaiveDate) -> RaceSlug {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url.split(['?', '#']).next().unwrap_or("").to_string(),
    };
    let slug = path.rsplit('/').find(|s| !s.is_empty()).unwrap_or("");

    // Trailing "_c<id>" is the site's race id
    let slug = match slug.rsplit_once("_c") {
        Some((head, id)) if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) => head,
        _ => slug,
    };
    let prefix = format!("{}-", date.format("%Y-%m-%d"));
    let rest = slug.strip_prefix(prefix.as_str()).unwrap_or(slug);

    match rest.split_once("-pmu-") {
        Some((venue, name)) => RaceSlug {
            venue: non_empty(title_case(venue)),
            prize_name: non_empty(title_case(name)),
        },
        None => RaceSlug {
            venue: rest.split('-').next().map(title_case).and_then(non_empty),
            prize_name: None,
        },
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
