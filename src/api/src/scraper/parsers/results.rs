//! Results board (arrivées) parser for geny.com.
//!
//! One page per date lists every race of every meeting with its official
//! finishing order. The parser maps each race to a [`FinishOrder`], keyed
//! by the normalized prize name so it can be matched against races stored
//! from the race cards.

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

use super::values::{clean_text, normalize_key};
use crate::finish_order::FinishOrder;
use crate::scraper::parse_race_slug;

static ARRIVAL_RE: OnceLock<Regex> = OnceLock::new();
static BARE_ORDER_RE: OnceLock<Regex> = OnceLock::new();

fn arrival_re() -> &'static Regex {
    ARRIVAL_RE.get_or_init(|| {
        // Numbers joined by dashes or a dead-heat "ex"/"et"; a bare space ends the order
        Regex::new(
            r"(?i)arriv[ée]e(?:\s+officielle)?\s*:?\s*(\d+(?:\s*(?:[-–—]|\b(?:ex|et)\b)\s*(?:\([^)]*\)\s*[-–—]?\s*)*\d+)*)",
        )
        .expect("valid arrival regex")
    })
}

fn bare_order_re() -> &'static Regex {
    BARE_ORDER_RE.get_or_init(|| {
        Regex::new(r"^\d+(?:\s*[-–]\s*\d+)+$").expect("valid bare order regex")
    })
}

/// Finishing order of one race on the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaceResult {
    /// Prize name as shown (or derived from the race link)
    pub prize_name: String,
    pub order: FinishOrder,
}

/// Results of one date keyed by [`normalize_key`] of the prize name
pub type ResultBoard = BTreeMap<String, RaceResult>;

/// Ways of reading race results off the board, tried in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardStrategy {
    /// Blocks holding exactly one race link and an "Arrivée" label
    LinkedBlocks,
    /// Table rows pairing a name cell with a bare `3-2-1` cell
    TableRows,
}

pub const BOARD_STRATEGIES: [BoardStrategy; 2] =
    [BoardStrategy::LinkedBlocks, BoardStrategy::TableRows];

impl BoardStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            BoardStrategy::LinkedBlocks => "linked-blocks",
            BoardStrategy::TableRows => "table-rows",
        }
    }

    pub fn extract(&self, document: &Html, date: NaiveDate) -> ResultBoard {
        match self {
            BoardStrategy::LinkedBlocks => extract_linked_blocks(document, date),
            BoardStrategy::TableRows => extract_table_rows(document),
        }
    }
}

/// Parser for results board pages
pub struct ResultBoardParser;

impl ResultBoardParser {
    /// Parse a results board; an empty map means nothing was published yet.
    pub fn parse(html: &str, date: NaiveDate) -> ResultBoard {
        let document = Html::parse_document(html);

        for strategy in BOARD_STRATEGIES {
            let board = strategy.extract(&document, date);
            if board.is_empty() {
                debug!("Board strategy {} found no results", strategy.name());
                continue;
            }
            info!(
                "  -> {} results on {} board ({})",
                board.len(),
                date,
                strategy.name()
            );
            return board;
        }

        ResultBoard::new()
    }
}

fn insert_result(board: &mut ResultBoard, prize_name: String, order: FinishOrder) {
    let key = normalize_key(&prize_name);
    if key.is_empty() {
        return;
    }
    board.entry(key).or_insert(RaceResult { prize_name, order });
}

fn extract_linked_blocks(document: &Html, date: NaiveDate) -> ResultBoard {
    let mut board = ResultBoard::new();
    let (Ok(block_sel), Ok(link_sel)) = (
        Selector::parse("div, li, tr, section, article"),
        Selector::parse("a[href*='-pmu-']"),
    ) else {
        return board;
    };

    for block in document.select(&block_sel) {
        let links: Vec<ElementRef> = block.select(&link_sel).collect();
        if links.len() != 1 {
            continue;
        }
        let text = block.text().collect::<Vec<_>>().join(" ");
        if !text.to_lowercase().contains("arriv") {
            continue;
        }

        let link = links[0];
        let name = link
            .value()
            .attr("href")
            .and_then(|href| parse_race_slug(href, date).prize_name)
            .or_else(|| {
                let text = clean_text(&link.text().collect::<String>());
                (!text.is_empty()).then_some(text)
            });
        let Some(name) = name else {
            continue;
        };

        match arrival_re()
            .captures(&text)
            .and_then(|caps| FinishOrder::parse(&caps[1]))
        {
            Some(order) => insert_result(&mut board, name, order),
            None => warn!("Unparseable finishing order for {} on {}", name, date),
        }
    }

    board
}

fn extract_table_rows(document: &Html) -> ResultBoard {
    let mut board = ResultBoard::new();
    let (Ok(row_sel), Ok(cell_sel)) = (Selector::parse("tr"), Selector::parse("td")) else {
        return board;
    };

    for row in document.select(&row_sel) {
        let cells: Vec<String> = row
            .select(&cell_sel)
            .map(|c| clean_text(&c.text().collect::<String>()))
            .collect();
        if cells.len() < 2 {
            continue;
        }
        let Some(name) = cells
            .iter()
            .find(|c| c.chars().any(char::is_alphabetic))
        else {
            continue;
        };
        let Some(order) = cells
            .iter()
            .filter(|c| bare_order_re().is_match(c))
            .find_map(|c| FinishOrder::parse(c))
        else {
            continue;
        };
        insert_result(&mut board, name.clone(), order);
    }

    board
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 15).unwrap()
    }

    const BOARD: &str = r#"<html><body>
<div class="reunion">
  <h2>R1 Vincennes</h2>
  <div class="course">
    <a href="/arrivee-et-rapports-pmu/2026-02-15-vincennes-pmu-prix-de-grenade_c1633331">Prix de Grenade</a>
    <p>Arrivée : 3 - 2 - 1 - 5 - 4</p>
  </div>
  <div class="course">
    <a href="/arrivee-et-rapports-pmu/2026-02-15-vincennes-pmu-prix-d-amerique_c1633332">Prix d'Amérique</a>
    <p>Arrivée officielle : 7 - 12 - (NP 4) - 1</p>
  </div>
  <div class="course">
    <a href="/arrivee-et-rapports-pmu/2026-02-15-vincennes-pmu-prix-de-paris_c1633333">Prix de Paris</a>
    <p>Arrivée : non disponible</p>
  </div>
</div>
</body></html>"#;

    #[test]
    fn test_parse_linked_blocks() {
        let board = ResultBoardParser::parse(BOARD, date());
        assert_eq!(board.len(), 2);

        let grenade = &board["prix de grenade"];
        assert_eq!(grenade.prize_name, "Prix De Grenade");
        assert_eq!(grenade.order.to_string(), "3-2-1-5-4");

        let amerique = &board["prix d amerique"];
        assert_eq!(amerique.order.to_string(), "7-12-1");

        assert!(!board.contains_key("prix de paris"));
    }

    #[test]
    fn test_table_rows_fallback() {
        let html = r#"<table>
            <tr><td>Prix de Grenade</td><td>3-2-1-5-4</td></tr>
            <tr><td>Prix X</td><td>—</td></tr>
        </table>"#;
        let document = Html::parse_document(html);
        assert!(BoardStrategy::LinkedBlocks.extract(&document, date()).is_empty());

        let board = ResultBoardParser::parse(html, date());
        assert_eq!(board.len(), 1);
        assert_eq!(board["prix de grenade"].order.numbers(), &[3, 2, 1, 5, 4]);
    }

    #[test]
    fn test_trailing_numbers_not_part_of_order() {
        let html = r#"<html><body>
<div class="course">
  <a href="/arrivee-et-rapports-pmu/2026-02-15-vincennes-pmu-prix-a_c1">Prix A</a>
  <span>Arrivée : 3 - 2 - 1</span> <span>14 partants</span> <span>2700 m</span>
</div>
<table>
  <tr>
    <td><a href="/arrivee-et-rapports-pmu/2026-02-15-vincennes-pmu-prix-b_c2">Prix B</a></td>
    <td>Arrivée</td><td>5 - 4 - 6</td><td>2700</td><td>1'14''2</td>
  </tr>
</table>
<div class="course">
  <a href="/arrivee-et-rapports-pmu/2026-02-15-vincennes-pmu-prix-c_c3">Prix C</a>
  <p>Arrivée : 8 - 1 ex 5 - (NP 9) - 2 R1C3 départ 15h20</p>
</div>
</body></html>"#;
        let board = ResultBoardParser::parse(html, date());
        assert_eq!(board["prix a"].order.to_string(), "3-2-1");
        assert_eq!(board["prix b"].order.to_string(), "5-4-6");
        assert_eq!(board["prix c"].order.to_string(), "8-1-5-2");
    }

    #[test]
    fn test_empty_board() {
        assert!(ResultBoardParser::parse("<html></html>", date()).is_empty());
        assert!(ResultBoardParser::parse("", date()).is_empty());
    }
}
