//! Race list parser for the geny.com daily programme.
//!
//! Extracts race card links for a date, in page order.
//! URL: https://www.geny.com/reunions-courses-pmu?date=YYYY-MM-DD

use chrono::NaiveDate;
use scraper::{Html, Selector};
use tracing::{debug, info};
use url::Url;

use crate::scraper::parse_race_slug;

/// A race card discovered on the programme page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceLink {
    /// Absolute race card URL
    pub url: String,
    /// Venue derived from the link slug
    pub venue: Option<String>,
}

/// Parser for the daily programme page
pub struct RaceListParser;

impl RaceListParser {
    /// Parse programme HTML into unique race links, first occurrence first.
    pub fn parse(html: &str, date: NaiveDate, base_url: &str) -> Vec<RaceLink> {
        let document = Html::parse_document(html);
        let mut links: Vec<RaceLink> = Vec::new();

        let Ok(link_selector) = Selector::parse("a[href*='/partants-pmu/']") else {
            return links;
        };
        let base = Url::parse(base_url).ok();

        for elem in document.select(&link_selector) {
            let Some(href) = elem.value().attr("href") else {
                continue;
            };
            let absolute = match base.as_ref().and_then(|b| b.join(href).ok()) {
                Some(url) => url.to_string(),
                None => href.to_string(),
            };
            if links.iter().any(|l| l.url == absolute) {
                continue;
            }
            debug!("Found race link {}", absolute);
            links.push(RaceLink {
                venue: parse_race_slug(&absolute, date).venue,
                url: absolute,
            });
        }

        info!("  -> {} races on {}", links.len(), date);
        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.geny.com";

    const SAMPLE_HTML: &str = r#"<!DOCTYPE html>
<html>
<body>
<div class="reunion">
    <h2>R1 Vincennes</h2>
    <ul>
        <li><a href="/partants-pmu/2026-02-15-vincennes-pmu-prix-de-grenade_c1633331">C1 Prix de Grenade</a></li>
        <li><a href="/partants-pmu/2026-02-15-vincennes-pmu-prix-d-amerique_c1633332">C2 Prix d'Amérique</a></li>
    </ul>
</div>
<div class="reunion">
    <h2>R2 Cagnes-sur-Mer</h2>
    <ul>
        <li><a href="/partants-pmu/2026-02-15-cagnes-sur-mer-pmu-prix-de-nice_c1633400">C1 Prix de Nice</a></li>
        <li><a href="/arrivee-et-rapports-pmu/2026-02-15-cagnes-sur-mer-pmu-prix-de-nice_c1633400">Arrivée</a></li>
    </ul>
</div>
</body>
</html>"#;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 15).unwrap()
    }

    #[test]
    fn test_parse_race_list_in_page_order() {
        let links = RaceListParser::parse(SAMPLE_HTML, date(), BASE);

        assert_eq!(links.len(), 3);
        assert_eq!(
            links[0].url,
            "https://www.geny.com/partants-pmu/2026-02-15-vincennes-pmu-prix-de-grenade_c1633331"
        );
        assert_eq!(links[0].venue.as_deref(), Some("Vincennes"));
        assert!(links[1].url.ends_with("prix-d-amerique_c1633332"));
        assert_eq!(links[2].venue.as_deref(), Some("Cagnes Sur Mer"));
    }

    #[test]
    fn test_empty_html() {
        assert!(RaceListParser::parse("<html></html>", date(), BASE).is_empty());
    }

    #[test]
    fn test_no_duplicates() {
        let html = r#"
        <a href="/partants-pmu/2026-02-15-pau-pmu-prix-a_c1">Race 1</a>
        <a href="https://www.geny.com/partants-pmu/2026-02-15-pau-pmu-prix-a_c1">Race 1 Again</a>
        <a href="/partants-pmu/2026-02-15-pau-pmu-prix-b_c2">Race 2</a>
        "#;
        let links = RaceListParser::parse(html, date(), BASE);
        assert_eq!(links.len(), 2);
    }
}
