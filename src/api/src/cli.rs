//! CLI commands for turf-scraper.
//!
//! Two passes share one date selection: `entrants` scrapes race cards,
//! `results` applies the official finishing orders. `schema` prints the DDL.

use anyhow::{bail, Result};
use chrono::{Days, NaiveDate};
use clap::{Args, Parser, Subcommand};

use crate::driver::DateSpan;

#[derive(Parser)]
#[command(name = "turf-scraper")]
#[command(version, about = "Scrape PMU race cards and results into SQLite", long_about = None)]
pub struct Cli {
    /// Database path override
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape race cards (entrants, odds, metadata)
    Entrants(DateArgs),

    /// Apply official finishing orders to stored races
    Results(DateArgs),

    /// Print the database schema with its uniqueness constraints
    Schema,
}

/// Date selection: one of --date, --start [--end], --days
#[derive(Args, Debug, Clone)]
pub struct DateArgs {
    /// Single date (YYYY-MM-DD)
    #[arg(long, conflicts_with_all = ["start", "end", "days"])]
    pub date: Option<NaiveDate>,

    /// First date of an inclusive range (YYYY-MM-DD)
    #[arg(long, conflicts_with = "days")]
    pub start: Option<NaiveDate>,

    /// Last date of the range; defaults to today
    #[arg(long, requires = "start")]
    pub end: Option<NaiveDate>,

    /// The last N days up to today
    #[arg(long, value_name = "N")]
    pub days: Option<u32>,
}

impl DateArgs {
    /// Resolve the flags into a span; exactly one selection is required.
    pub fn span(&self, today: NaiveDate) -> Result<DateSpan> {
        match (self.date, self.start, self.days) {
            (Some(date), None, None) => Ok(DateSpan::Single(date)),
            (None, Some(start), None) => Ok(DateSpan::Range {
                start,
                end: self.end.unwrap_or(today),
            }),
            (None, None, Some(days)) => {
                if today.checked_sub_days(Days::new(u64::from(days))).is_none() {
                    bail!("--days {} reaches before the earliest supported date", days);
                }
                Ok(DateSpan::Trailing { days })
            }
            (None, None, None) => bail!("Specify --date, --start [--end] or --days"),
            _ => bail!("--date, --start and --days are mutually exclusive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("turf-scraper").chain(args.iter().copied()))
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, day).unwrap()
    }

    fn span_of(args: &[&str]) -> Result<DateSpan> {
        match parse(args).unwrap().command {
            Commands::Entrants(a) | Commands::Results(a) => a.span(d(20)),
            Commands::Schema => bail!("no dates"),
        }
    }

    #[test]
    fn test_single_date() {
        assert_eq!(
            span_of(&["entrants", "--date", "2026-02-15"]).unwrap(),
            DateSpan::Single(d(15))
        );
    }

    #[test]
    fn test_range_defaults_end_to_today() {
        assert_eq!(
            span_of(&["results", "--start", "2026-02-10"]).unwrap(),
            DateSpan::Range { start: d(10), end: d(20) }
        );
        assert_eq!(
            span_of(&["results", "--start", "2026-02-10", "--end", "2026-02-12"]).unwrap(),
            DateSpan::Range { start: d(10), end: d(12) }
        );
    }

    #[test]
    fn test_trailing_days() {
        assert_eq!(
            span_of(&["entrants", "--days", "3"]).unwrap(),
            DateSpan::Trailing { days: 3 }
        );
        assert!(span_of(&["entrants", "--days", "4294967295"]).is_err());
    }

    #[test]
    fn test_selection_required() {
        assert!(span_of(&["entrants"]).is_err());
    }

    #[test]
    fn test_conflicting_flags_rejected() {
        assert!(parse(&["entrants", "--date", "2026-02-15", "--days", "2"]).is_err());
        assert!(parse(&["entrants", "--end", "2026-02-15"]).is_err());
        assert!(parse(&["entrants", "--date", "15/02/2026"]).is_err());
    }

    #[test]
    fn test_global_db_flag() {
        let cli = parse(&["schema", "--db", "/tmp/x.db"]).unwrap();
        assert_eq!(cli.db.as_deref(), Some("/tmp/x.db"));
        assert!(matches!(cli.command, Commands::Schema));
    }
}
