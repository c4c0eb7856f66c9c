//! Race card (partants) parser for geny.com.
//!
//! The entrant table is located by an ordered list of [`TableStrategy`]s;
//! the first strategy that yields at least one entrant wins. If none does,
//! no race record is produced.

use chrono::{NaiveDate, NaiveTime};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use super::values::{
    clean_text, is_placeholder_title, parse_amount, parse_chrono, parse_decimal, parse_form,
    parse_int, parse_odds, parse_sex_age,
};
use crate::finish_order::FinishOrder;
use crate::scraper::parse_race_slug;
use crate::types::{Actor, ActorRole, Discipline, EntrantRecord, RaceRecord};

static DISTANCE_RE: OnceLock<Regex> = OnceLock::new();
static PURSE_RE: OnceLock<Regex> = OnceLock::new();
static TERRAIN_RE: OnceLock<Regex> = OnceLock::new();
static TIME_RE: OnceLock<Regex> = OnceLock::new();

/// Rows with fewer cells are headers, separators or ads.
const MIN_ENTRANT_CELLS: usize = 6;
const MIN_RESULT_CELLS: usize = 7;

/// Ways of finding the entrant table, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableStrategy {
    /// Table whose header names a rider column and a horse/number column
    HeaderKeywords,
    /// First non-calendar, non-results table holding numbered rows
    FirstDataTable,
}

pub const ENTRANT_TABLE_STRATEGIES: [TableStrategy; 2] =
    [TableStrategy::HeaderKeywords, TableStrategy::FirstDataTable];

impl TableStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            TableStrategy::HeaderKeywords => "header-keywords",
            TableStrategy::FirstDataTable => "first-data-table",
        }
    }

    /// Locate the candidate entrant table in a document.
    pub fn locate<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        let table_sel = Selector::parse("table").ok()?;
        match self {
            TableStrategy::HeaderKeywords => document.select(&table_sel).find(|t| {
                let header = header_text(t);
                is_entrant_header(&header) && !is_results_header(&header)
            }),
            TableStrategy::FirstDataTable => document.select(&table_sel).find(|t| {
                let class = t.value().attr("class").unwrap_or("").to_lowercase();
                !class.contains("calendar")
                    && !is_results_header(&header_text(t))
                    && has_numbered_rows(t)
            }),
        }
    }
}

/// Column positions of an entrant table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnLayout {
    weight: Option<usize>,
    rider: usize,
    trainer: usize,
    form: usize,
    earnings: usize,
    odds: usize,
    rider_role: ActorRole,
}

impl ColumnLayout {
    /// Trot:   N° | Cheval | SA | Dist. | Driver | Entraîneur | Musique | Gains | cotes...
    /// Gallop: N° | Cheval | SA | Dist. | Poids | Jockey | Entraîneur | Musique | Gains | cotes...
    fn detect(header: &str) -> Self {
        if header.contains("poids") {
            Self {
                weight: Some(4),
                rider: 5,
                trainer: 6,
                form: 7,
                earnings: 8,
                odds: 9,
                rider_role: ActorRole::Jockey,
            }
        } else {
            Self {
                weight: None,
                rider: 4,
                trainer: 5,
                form: 6,
                earnings: 7,
                odds: 8,
                rider_role: ActorRole::Driver,
            }
        }
    }
}

/// Parser for race card pages
pub struct RaceCardParser;

impl RaceCardParser {
    /// Parse a rendered race card into a race record.
    ///
    /// Returns `None` when no name can be derived or no strategy finds a
    /// table with entrants.
    pub fn parse(html: &str, url: &str, date: NaiveDate) -> Option<RaceRecord> {
        let document = Html::parse_document(html);

        let slug = parse_race_slug(url, date);
        let prize_name = match slug.prize_name.filter(|n| !is_placeholder_title(n)) {
            Some(name) => name,
            None => match Self::heading_name(&document) {
                Some(name) => name,
                None => {
                    warn!("No race name for {}", url);
                    return None;
                }
            },
        };
        let venue = slug.venue.unwrap_or_default();
        info!("Race: {} @ {}", prize_name, venue);

        let Some((mut entrants, layout)) = Self::parse_entrants(&document) else {
            warn!("Entrant table not found for {}", url);
            return None;
        };

        let page_text = body_text(&document);
        let mut distance = find_distance(&page_text);
        apply_distance_handicap(&mut entrants, &mut distance);

        if let Some(results) = Self::locate_results_table(&document) {
            Self::merge_results(&results, &mut entrants, layout);
        }

        // Non-runners stay out of the record entirely
        entrants.retain(|e| !e.horse_name.is_empty());

        let finish_order = derive_finish_order(&entrants);
        let discipline = Discipline::infer(url, &prize_name, layout.rider_role);

        info!("  -> {} entrants", entrants.len());

        Some(RaceRecord {
            prize_name,
            date,
            time: find_start_time(&page_text),
            city: venue.clone(),
            venue,
            discipline,
            distance,
            terrain: find_terrain(&page_text),
            purse: find_purse(&page_text),
            entrants,
            finish_order,
            source_url: url.to_string(),
        })
    }

    /// `<h1>` text unless it is a consent banner or empty.
    fn heading_name(document: &Html) -> Option<String> {
        let selector = Selector::parse("h1").ok()?;
        let elem = document.select(&selector).next()?;
        let text = clean_text(&elem.text().collect::<String>());
        if text.is_empty() || is_placeholder_title(&text) {
            return None;
        }
        Some(text)
    }

    fn parse_entrants(document: &Html) -> Option<(Vec<EntrantRecord>, ColumnLayout)> {
        for strategy in ENTRANT_TABLE_STRATEGIES {
            let Some(table) = strategy.locate(document) else {
                debug!("Strategy {} found no table", strategy.name());
                continue;
            };
            let (entrants, layout) = Self::parse_entrant_table(&table);
            if entrants.is_empty() {
                debug!("Strategy {} found a table without entrants", strategy.name());
                continue;
            }
            if strategy != TableStrategy::HeaderKeywords {
                warn!("Entrant table found by fallback strategy {}", strategy.name());
            }
            return Some((entrants, layout));
        }
        None
    }

    fn parse_entrant_table(table: &ElementRef) -> (Vec<EntrantRecord>, ColumnLayout) {
        let layout = ColumnLayout::detect(&header_text(table));
        let mut entrants: Vec<EntrantRecord> = Vec::new();

        for row in rows(table) {
            let texts = cell_texts(&row);
            let Some(entrant) = Self::parse_entrant_row(&texts, layout) else {
                continue;
            };
            if entrants
                .iter()
                .any(|e| e.program_number == entrant.program_number)
            {
                debug!("Duplicate program number {}", entrant.program_number);
                continue;
            }
            entrants.push(entrant);
        }

        (entrants, layout)
    }

    fn parse_entrant_row(texts: &[String], layout: ColumnLayout) -> Option<EntrantRecord> {
        if texts.len() < MIN_ENTRANT_CELLS || !is_program_number(&texts[0]) {
            return None;
        }
        let program_number = parse_int(&texts[0])?;

        let horse_name = first_name_part(&texts[1]);
        let rider_text = cell(texts, layout.rider);
        if is_non_runner(&horse_name) || is_non_runner(rider_text) {
            debug!("Skipping non-runner #{}", program_number);
            return None;
        }
        if horse_name.is_empty() {
            return None;
        }

        let (sex, age) = parse_sex_age(cell(texts, 2));
        let odds_cells = texts.get(layout.odds..).unwrap_or(&[]);
        let (morning_odds, live_odds) = match odds_cells {
            [] => (None, None),
            [only] => (None, parse_odds(only)),
            [first, .., last] => (parse_odds(first), parse_odds(last)),
        };

        Some(EntrantRecord {
            program_number,
            horse_name,
            sex,
            age,
            own_distance: parse_int(cell(texts, 3)),
            distance_handicap: None,
            weight: layout.weight.and_then(|i| parse_decimal(cell(texts, i))),
            rider: Actor::named(rider_text, layout.rider_role),
            trainer: Actor::named(cell(texts, layout.trainer), ActorRole::Trainer),
            form: parse_form(cell(texts, layout.form)),
            earnings: parse_amount(cell(texts, layout.earnings)),
            morning_odds,
            live_odds,
            finish_position: None,
            elapsed_time: None,
        })
    }

    fn locate_results_table(document: &Html) -> Option<ElementRef<'_>> {
        let selector = Selector::parse("table").ok()?;
        document
            .select(&selector)
            .find(|t| is_results_header(&header_text(t)))
    }

    /// Rg. | N° | Chevaux | SA | Dist. | Drivers | Entraîneurs | Chronos | Cotes
    fn merge_results(table: &ElementRef, entrants: &mut Vec<EntrantRecord>, layout: ColumnLayout) {
        for row in rows(table) {
            let texts = cell_texts(&row);
            if texts.len() < MIN_RESULT_CELLS {
                continue;
            }
            // "1." for a finisher, "D"/"A"/"T" for disqualified or fallen
            let rank = parse_int(&texts[0].replace('.', ""));
            let Some(number) = parse_int(&texts[1]) else {
                continue;
            };
            let chrono = parse_chrono(cell(&texts, 7));
            let final_odds = parse_odds(cell(&texts, 8));

            if let Some(entrant) = entrants.iter_mut().find(|e| e.program_number == number) {
                entrant.finish_position = rank;
                entrant.elapsed_time = chrono;
                if final_odds.is_some() {
                    entrant.live_odds = final_odds;
                }
                continue;
            }

            // Finisher missing from the entrant table
            let (sex, age) = parse_sex_age(cell(&texts, 3));
            entrants.push(EntrantRecord {
                program_number: number,
                horse_name: first_name_part(&texts[2]),
                sex,
                age,
                own_distance: parse_int(cell(&texts, 4)),
                rider: Actor::named(cell(&texts, 5), layout.rider_role),
                trainer: Actor::named(cell(&texts, 6), ActorRole::Trainer),
                live_odds: final_odds,
                finish_position: rank,
                elapsed_time: chrono,
                ..Default::default()
            });
        }
    }
}

fn cell(texts: &[String], index: usize) -> &str {
    texts.get(index).map(String::as_str).unwrap_or("")
}

fn rows<'a>(table: &ElementRef<'a>) -> Vec<ElementRef<'a>> {
    match Selector::parse("tr") {
        Ok(sel) => table.select(&sel).collect(),
        Err(_) => Vec::new(),
    }
}

fn cell_texts(row: &ElementRef) -> Vec<String> {
    match Selector::parse("td") {
        Ok(sel) => row
            .select(&sel)
            .map(|c| clean_text(&c.text().collect::<String>()))
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Lower-cased text of the first two rows, th and td alike: the site
/// sometimes puts headers in `<td>` or splits them over two rows.
fn header_text(table: &ElementRef) -> String {
    let Ok(cell_sel) = Selector::parse("th, td") else {
        return String::new();
    };
    let mut parts = Vec::new();
    for row in rows(table).into_iter().take(2) {
        for c in row.select(&cell_sel) {
            let text = c.text().collect::<String>().to_lowercase();
            parts.push(text.split_whitespace().collect::<Vec<_>>().join(" "));
        }
    }
    parts.join(" ")
}

fn is_entrant_header(header: &str) -> bool {
    (header.contains("driver") || header.contains("jockey"))
        && (header.contains("cheval") || header.contains("n°"))
}

fn is_results_header(header: &str) -> bool {
    header.contains("chrono") && (header.contains("rg") || header.contains("rang"))
}

fn is_program_number(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

fn has_numbered_rows(table: &ElementRef) -> bool {
    rows(table).iter().any(|row| {
        let texts = cell_texts(row);
        texts.len() >= MIN_ENTRANT_CELLS && is_program_number(&texts[0])
    })
}

fn is_non_runner(text: &str) -> bool {
    text.to_lowercase().contains("non-part")
}

/// Horse cells append annotations after a run of spaces.
fn first_name_part(text: &str) -> String {
    text.split("  ").next().unwrap_or("").trim().to_string()
}

fn body_text(document: &Html) -> String {
    let root = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .unwrap_or_else(|| document.root_element());
    root.text().collect::<Vec<_>>().join(" ")
}

fn find_distance(text: &str) -> Option<u32> {
    let re = DISTANCE_RE.get_or_init(|| {
        Regex::new(r"(?i)\b(\d{1,2}[\s\u{a0}\u{202f}]?\d{3}|\d{3,4})\s*m(?:[eè]tres?)?\b")
            .expect("valid distance regex")
    });
    re.captures(text).and_then(|caps| parse_int(&caps[1]))
}

fn find_purse(text: &str) -> Option<u64> {
    let re = PURSE_RE.get_or_init(|| {
        Regex::new(r"(?i)(\d[\d\s\u{a0}\u{202f}]*\d|\d)\s*(?:euros?|€)").expect("valid purse regex")
    });
    let caps = re.captures(text)?;
    let digits: String = caps[1].chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn find_terrain(text: &str) -> Option<String> {
    let re = TERRAIN_RE.get_or_init(|| {
        Regex::new(r"[Tt]errain\s*[:\-]?\s*([A-Za-zÀ-ÿ]+)").expect("valid terrain regex")
    });
    re.captures(text).map(|caps| caps[1].trim().to_string())
}

/// Start time such as `15h20`, looked for near the top of the page only.
fn find_start_time(text: &str) -> Option<NaiveTime> {
    let re = TIME_RE.get_or_init(|| Regex::new(r"\b(\d{1,2})[hH](\d{2})\b").expect("valid time regex"));
    let head: String = text.chars().take(2000).collect();
    let caps = re.captures(&head)?;
    NaiveTime::from_hms_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, 0)
}

/// Handicap is each horse's distance over the shortest one; the shortest
/// distance also stands in for a race distance missing from the page.
fn apply_distance_handicap(entrants: &mut [EntrantRecord], distance: &mut Option<u32>) {
    let Some(base) = entrants.iter().filter_map(|e| e.own_distance).min() else {
        return;
    };
    if distance.is_none() {
        *distance = Some(base);
    }
    for entrant in entrants.iter_mut() {
        entrant.distance_handicap = entrant.own_distance.map(|d| d - base);
    }
}

fn derive_finish_order(entrants: &[EntrantRecord]) -> Option<FinishOrder> {
    let mut placed: Vec<(u32, u32)> = entrants
        .iter()
        .filter_map(|e| e.finish_position.map(|p| (p, e.program_number)))
        .collect();
    placed.sort();
    FinishOrder::new(placed.into_iter().map(|(_, n)| n).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str =
        "https://www.geny.com/partants-pmu/2026-02-15-vincennes-pmu-prix-de-grenade_c1633331";

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 15).unwrap()
    }

    const TROT_CARD: &str = r#"<!DOCTYPE html>
<html><body>
<h1>We respect your privacy</h1>
<p>Départ 15h20 - Attelé - 2 700 mètres - 90 000 euros - Terrain : Bon</p>
<table class="yui-calendar"><tr><td>1</td><td>2</td></tr></table>
<table id="partants">
  <tr><th>N°</th><th>Cheval</th><th>SA</th><th>Dist.</th><th>Driver</th><th>Entraîneur</th><th>Musique</th><th>Gains</th><th>Cote PMU</th><th>Cote direct</th></tr>
  <tr><td>1</td><td>Bold Eagle</td><td>H7</td><td>2700</td><td>F. Nivard</td><td>S. Guarato</td><td>1a2a(25)1a</td><td>151 180</td><td>4,5</td><td>3,9</td></tr>
  <tr><td>2</td><td>Face Time Bourbon</td><td>M5</td><td>2725</td><td>B. Goop</td><td>S. Guarato</td><td>2a1a</td><td>98 000</td><td>—</td><td>—</td></tr>
  <tr><td>3</td><td>Idao de Tillard</td><td>F5</td><td>2700</td><td>Non-partant</td><td>T. Duvaldestin</td><td>3a</td><td>10 000</td><td>12</td><td>15</td></tr>
</table>
</body></html>"#;

    #[test]
    fn test_parse_trot_card() {
        let race = RaceCardParser::parse(TROT_CARD, URL, date()).unwrap();

        assert_eq!(race.prize_name, "Prix De Grenade");
        assert_eq!(race.venue, "Vincennes");
        assert_eq!(race.city, "Vincennes");
        assert_eq!(race.date, date());
        assert_eq!(race.time, NaiveTime::from_hms_opt(15, 20, 0));
        assert_eq!(race.distance, Some(2700));
        assert_eq!(race.purse, Some(90_000));
        assert_eq!(race.terrain.as_deref(), Some("Bon"));
        assert_eq!(race.discipline, Discipline::Trot);
        assert_eq!(race.entrant_count(), 2);
        assert!(race.finish_order.is_none());

        let first = &race.entrants[0];
        assert_eq!(first.program_number, 1);
        assert_eq!(first.horse_name, "Bold Eagle");
        assert_eq!(first.sex.as_deref(), Some("H"));
        assert_eq!(first.age, Some(7));
        assert_eq!(first.rider.as_ref().unwrap().role, ActorRole::Driver);
        assert_eq!(first.rider.as_ref().unwrap().name, "F. Nivard");
        assert_eq!(first.trainer.as_ref().unwrap().name, "S. Guarato");
        assert_eq!(first.form.as_deref(), Some("1a2a(25)1a"));
        assert_eq!(first.earnings, Some(151_180.0));
        assert_eq!(first.morning_odds, Some(4.5));
        assert_eq!(first.live_odds, Some(3.9));
        assert_eq!(first.distance_handicap, Some(0));
        assert_eq!(first.weight, None);

        let second = &race.entrants[1];
        assert_eq!(second.distance_handicap, Some(25));
    }

    #[test]
    fn test_placeholder_odds_are_unknown() {
        let race = RaceCardParser::parse(TROT_CARD, URL, date()).unwrap();
        let second = &race.entrants[1];
        assert_eq!(second.morning_odds, None);
        assert_eq!(second.live_odds, None);
    }

    #[test]
    fn test_name_comes_from_url_not_banner() {
        let race = RaceCardParser::parse(TROT_CARD, URL, date()).unwrap();
        assert!(!race.prize_name.to_lowercase().contains("privacy"));
        assert_eq!(race.prize_name, "Prix De Grenade");
    }

    #[test]
    fn test_heading_used_when_url_has_no_name() {
        let html = TROT_CARD.replace("We respect your privacy", "Prix d'Essai");
        let race =
            RaceCardParser::parse(&html, "https://www.geny.com/partants-pmu/vincennes", date()).unwrap();
        assert_eq!(race.prize_name, "Prix d'Essai");
    }

    #[test]
    fn test_no_name_at_all_yields_none() {
        assert!(RaceCardParser::parse(TROT_CARD, "https://www.geny.com/partants-pmu/vincennes", date()).is_none());
    }

    const GALLOP_CARD: &str = r#"<html><body>
<p>Plat - 1 600 m</p>
<table>
  <tr><td>N°</td><td>Cheval</td><td>SA</td><td>Dist.</td><td>Poids</td><td>Jockey</td><td>Entraîneur</td><td>Musique</td><td>Gains</td><td>Cote</td></tr>
  <tr><td>4</td><td>Sottsass  (oeil.)</td><td>M4</td><td>1600</td><td>58,5</td><td>C. Demuro</td><td>J.-C. Rouget</td><td>1p1p</td><td>—</td><td>2,8</td></tr>
</table>
</body></html>"#;

    #[test]
    fn test_parse_gallop_layout() {
        let url = "https://www.geny.com/partants-pmu/2026-02-15-chantilly-pmu-prix-du-jockey-club_c42";
        let race = RaceCardParser::parse(GALLOP_CARD, url, date()).unwrap();

        assert_eq!(race.venue, "Chantilly");
        assert_eq!(race.prize_name, "Prix Du Jockey Club");
        assert_eq!(race.distance, Some(1600));
        assert_eq!(race.discipline, Discipline::Flat);

        let entrant = &race.entrants[0];
        assert_eq!(entrant.horse_name, "Sottsass");
        assert_eq!(entrant.weight, Some(58.5));
        assert_eq!(entrant.rider.as_ref().unwrap().role, ActorRole::Jockey);
        assert_eq!(entrant.rider.as_ref().unwrap().name, "C. Demuro");
        assert_eq!(entrant.earnings, None);
        assert_eq!(entrant.morning_odds, None);
        assert_eq!(entrant.live_odds, Some(2.8));
    }

    const HEADERLESS_CARD: &str = r#"<html><body>
<table class="yui-calendar"><tr><td>1</td><td>2</td></tr></table>
<table class="grid">
  <tr><td>1</td><td>Alpha</td><td>F4</td><td>2100</td><td>A. Abrivard</td><td>L. Baudron</td><td>1a</td><td>5 000</td><td>6,1</td><td>5,5</td></tr>
  <tr><td>2</td><td>Beta</td><td>H6</td><td>2100</td><td>J.-M. Bazire</td><td>J.-M. Bazire</td><td>Da</td><td>7 500</td><td>3,2</td><td>3,0</td></tr>
</table>
</body></html>"#;

    #[test]
    fn test_fallback_table_strategy() {
        let document = Html::parse_document(HEADERLESS_CARD);
        assert!(TableStrategy::HeaderKeywords.locate(&document).is_none());
        assert!(TableStrategy::FirstDataTable.locate(&document).is_some());

        let race = RaceCardParser::parse(HEADERLESS_CARD, URL, date()).unwrap();
        assert_eq!(race.entrant_count(), 2);
        assert_eq!(race.entrants[1].horse_name, "Beta");
        assert_eq!(race.entrants[1].form, None);
        assert_eq!(race.entrants[1].rider.as_ref().unwrap().role, ActorRole::Driver);
    }

    #[test]
    fn test_no_table_yields_none() {
        let html = "<html><body><h1>Prix X</h1><p>Loading...</p></body></html>";
        assert!(RaceCardParser::parse(html, URL, date()).is_none());
        assert!(RaceCardParser::parse("", URL, date()).is_none());
    }

    const FINISHED_CARD: &str = r#"<html><body>
<table>
  <tr><th>N°</th><th>Cheval</th><th>SA</th><th>Dist.</th><th>Driver</th><th>Entraîneur</th><th>Musique</th><th>Gains</th><th>Cote</th></tr>
  <tr><td>1</td><td>Alpha</td><td>F4</td><td>2100</td><td>A. Abrivard</td><td>L. Baudron</td><td>1a</td><td>5 000</td><td>6,1</td></tr>
  <tr><td>2</td><td>Beta</td><td>H6</td><td>2100</td><td>J.-M. Bazire</td><td>J.-M. Bazire</td><td>2a</td><td>7 500</td><td>3,2</td></tr>
</table>
<table>
  <tr><th>Rg.</th><th>N°</th><th>Chevaux</th><th>SA</th><th>Dist.</th><th>Drivers</th><th>Entraîneurs</th><th>Chronos</th><th>Cotes</th></tr>
  <tr><td>1.</td><td>2</td><td>Beta</td><td>H6</td><td>2100</td><td>J.-M. Bazire</td><td>J.-M. Bazire</td><td>1'13''8</td><td>2,9</td></tr>
  <tr><td>2.</td><td>3</td><td>Gamma</td><td>M5</td><td>2100</td><td>E. Raffin</td><td>P. Allaire</td><td>1'14''0</td><td>11</td></tr>
  <tr><td>D</td><td>1</td><td>Alpha</td><td>F4</td><td>2100</td><td>A. Abrivard</td><td>L. Baudron</td><td>DAI</td><td>6,1</td></tr>
</table>
</body></html>"#;

    #[test]
    fn test_results_table_merged_into_entrants() {
        let race = RaceCardParser::parse(FINISHED_CARD, URL, date()).unwrap();
        assert_eq!(race.entrant_count(), 3);

        let beta = race.entrants.iter().find(|e| e.program_number == 2).unwrap();
        assert_eq!(beta.finish_position, Some(1));
        assert_eq!(beta.elapsed_time.as_deref(), Some("1'13''8"));
        assert_eq!(beta.live_odds, Some(2.9));

        let alpha = race.entrants.iter().find(|e| e.program_number == 1).unwrap();
        assert_eq!(alpha.finish_position, None);
        assert_eq!(alpha.elapsed_time, None);

        let gamma = race.entrants.iter().find(|e| e.program_number == 3).unwrap();
        assert_eq!(gamma.horse_name, "Gamma");
        assert_eq!(gamma.finish_position, Some(2));

        assert_eq!(race.finish_order.unwrap().to_string(), "2-3");
    }
}
