//! Date-range driver: walks dates, fetches pages, feeds the parsers and
//! writes through the repository.
//!
//! Every race (entrant pass) and every result (result pass) is its own unit
//! of work. A unit that fails is logged and counted, and the run moves on.

use chrono::{Days, NaiveDate};
use std::fmt;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::ScraperConfig;
use crate::scraper::parsers::{RaceCardParser, RaceLink, RaceListParser, ResultBoardParser};
use crate::scraper::{
    programme_url, results_url, Fetcher, PageSource, ReadySignal, RenderStatus, PROGRAMME_READY,
    RACE_CARD_READY, RESULTS_READY,
};
use crate::storage::RaceRepository;
use crate::types::RaceIdentity;

/// Dates to process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSpan {
    Single(NaiveDate),
    /// Inclusive; reversed bounds are swapped
    Range { start: NaiveDate, end: NaiveDate },
    /// The last `days` days up to and including today
    Trailing { days: u32 },
}

impl DateSpan {
    /// Dates in chronological order, earliest first.
    pub fn dates(&self, today: NaiveDate) -> Vec<NaiveDate> {
        let (start, end) = match *self {
            DateSpan::Single(date) => (date, date),
            DateSpan::Range { start, end } if start <= end => (start, end),
            DateSpan::Range { start, end } => (end, start),
            DateSpan::Trailing { days } => (
                today
                    .checked_sub_days(Days::new(u64::from(days)))
                    .unwrap_or(NaiveDate::MIN),
                today,
            ),
        };
        start.iter_days().take_while(|d| *d <= end).collect()
    }
}

/// What happened to one unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOutcome {
    /// Rows written or updated
    Written,
    /// The page had nothing usable (not published yet, or never rendered)
    NoData,
    /// Deliberately not written (e.g. a result that does not fit the race)
    Skipped,
    /// Fetch or write error
    Failed,
}

/// Counts reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub dates: usize,
    pub races_seen: usize,
    pub races_written: usize,
    pub races_without_data: usize,
    pub races_failed: usize,
    pub results_seen: usize,
    pub results_applied: usize,
    pub results_skipped: usize,
    pub results_failed: usize,
}

impl RunSummary {
    fn record_race(&mut self, outcome: UnitOutcome) {
        self.races_seen += 1;
        match outcome {
            UnitOutcome::Written => self.races_written += 1,
            UnitOutcome::NoData | UnitOutcome::Skipped => self.races_without_data += 1,
            UnitOutcome::Failed => self.races_failed += 1,
        }
    }

    fn record_result(&mut self, outcome: UnitOutcome) {
        self.results_seen += 1;
        match outcome {
            UnitOutcome::Written => self.results_applied += 1,
            UnitOutcome::NoData | UnitOutcome::Skipped => self.results_skipped += 1,
            UnitOutcome::Failed => self.results_failed += 1,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} date(s)", self.dates)?;
        if self.races_seen > 0 {
            write!(
                f,
                ", races: {} seen, {} written, {} without data, {} failed",
                self.races_seen, self.races_written, self.races_without_data, self.races_failed
            )?;
        }
        if self.results_seen > 0 {
            write!(
                f,
                ", results: {} seen, {} applied, {} skipped, {} failed",
                self.results_seen, self.results_applied, self.results_skipped, self.results_failed
            )?;
        }
        Ok(())
    }
}

/// Sequential scrape driver
pub struct Driver<'a, S> {
    fetcher: Fetcher<S>,
    repo: &'a mut RaceRepository,
    config: ScraperConfig,
}

impl<'a, S: PageSource> Driver<'a, S> {
    pub fn new(fetcher: Fetcher<S>, repo: &'a mut RaceRepository, config: ScraperConfig) -> Self {
        Self {
            fetcher,
            repo,
            config,
        }
    }

    /// Hand the page source back (to close the browser).
    pub fn into_source(self) -> S {
        self.fetcher.into_source()
    }

    /// Entrant pass: every race card of every date.
    pub async fn run_entrants(&mut self, span: DateSpan, today: NaiveDate) -> RunSummary {
        let dates = span.dates(today);
        let mut summary = RunSummary::default();

        for (i, date) in dates.iter().copied().enumerate() {
            info!("=== Entrants {} ({}/{}) ===", date, i + 1, dates.len());
            summary.dates += 1;

            let links = self.discover_races(date).await;
            for (j, link) in links.iter().enumerate() {
                info!(
                    "[{}/{}] {} {}",
                    j + 1,
                    links.len(),
                    link.venue.as_deref().unwrap_or("?"),
                    link.url
                );
                let outcome = self.scrape_race(link, date).await;
                summary.record_race(outcome);
                pause(self.config.race_delay()).await;
            }

            if i + 1 < dates.len() {
                pause(self.config.day_delay()).await;
            }
        }

        info!("Entrant pass done: {}", summary);
        summary
    }

    /// Result pass: the results board of every date.
    pub async fn run_results(&mut self, span: DateSpan, today: NaiveDate) -> RunSummary {
        let dates = span.dates(today);
        let mut summary = RunSummary::default();

        for (i, date) in dates.iter().copied().enumerate() {
            info!("=== Results {} ({}/{}) ===", date, i + 1, dates.len());
            summary.dates += 1;

            let url = results_url(&self.config.base_url, date);
            let doc = self.fetcher.fetch(&url, &self.signal(RESULTS_READY)).await;
            let board = ResultBoardParser::parse(&doc.html, date);
            if board.is_empty() {
                info!("No results published for {} at {} ({})", date, doc.url, doc.status.as_str());
            }

            for result in board.values() {
                let identity = RaceIdentity {
                    prize_name: result.prize_name.clone(),
                    date,
                };
                let outcome = match self.repo.upsert_result(&identity, &result.order) {
                    Ok(true) => {
                        info!("  {} -> {}", identity, result.order);
                        UnitOutcome::Written
                    }
                    Ok(false) => UnitOutcome::Skipped,
                    Err(e) => {
                        error!("Failed to apply result for {}: {:#}", identity, e);
                        UnitOutcome::Failed
                    }
                };
                summary.record_result(outcome);
            }

            if i + 1 < dates.len() {
                pause(self.config.day_delay()).await;
            }
        }

        info!("Result pass done: {}", summary);
        summary
    }

    fn signal(&self, script: &'static str) -> ReadySignal {
        ReadySignal::new(script, self.config.render_timeout())
    }

    async fn discover_races(&self, date: NaiveDate) -> Vec<RaceLink> {
        let url = programme_url(&self.config.base_url, date);
        let doc = self.fetcher.fetch(&url, &self.signal(PROGRAMME_READY)).await;
        if doc.is_empty() {
            warn!("Programme for {} unavailable at {} ({})", date, doc.url, doc.status.as_str());
            return Vec::new();
        }
        RaceListParser::parse(&doc.html, date, &self.config.base_url)
    }

    async fn scrape_race(&mut self, link: &RaceLink, date: NaiveDate) -> UnitOutcome {
        let doc = self.fetcher.fetch(&link.url, &self.signal(RACE_CARD_READY)).await;
        if doc.status == RenderStatus::Failed {
            return UnitOutcome::Failed;
        }

        let Some(race) = RaceCardParser::parse(&doc.html, &link.url, date) else {
            warn!("No race data at {} ({})", link.url, doc.status.as_str());
            return UnitOutcome::NoData;
        };

        match self.repo.upsert_race(&race) {
            Ok(stored) => {
                info!(
                    "  Saved {} with {} entrants (race #{})",
                    stored.identity,
                    race.entrant_count(),
                    stored.id
                );
                UnitOutcome::Written
            }
            Err(e) => {
                error!("Failed to store race from {}: {:#}", link.url, e);
                UnitOutcome::Failed
            }
        }
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
