//! Turf scraper
//!
//! Scrapes PMU race cards and official results from geny.com and upserts
//! them into SQLite, one race or result at a time.

mod cli;
mod config;
mod driver;
mod finish_order;
mod retry;
mod scraper;
mod storage;
mod types;

use anyhow::Result;
use clap::Parser;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands, DateArgs};
use crate::config::AppConfig;
use crate::driver::{Driver, RunSummary};
use crate::scraper::{Browser, Fetcher, RateLimiter};
use crate::storage::{schema_sql, RaceRepository};

#[derive(Clone, Copy)]
enum Pass {
    Entrants,
    Results,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "turf_scraper=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Schema => {
            print!("{}", schema_sql());
            Ok(())
        }
        Commands::Entrants(args) => run_pass(Pass::Entrants, &args, cli.db).await,
        Commands::Results(args) => run_pass(Pass::Results, &args, cli.db).await,
    }
}

async fn run_pass(pass: Pass, args: &DateArgs, db_override: Option<String>) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let span = args.span(today)?;

    let mut config = AppConfig::load()?;
    if let Some(path) = db_override {
        config.database.path = path;
    }
    tracing::info!("Database: {}", config.database.path);

    let mut repo = RaceRepository::new(Path::new(&config.database.path))?;

    let browser = Browser::launch(&config.browser, config.scraper.navigation_timeout()).await?;
    let limiter = RateLimiter::new(
        config.scraper.min_request_delay(),
        config.scraper.max_request_delay(),
    );
    let mut driver = Driver::new(Fetcher::new(browser, limiter), &mut repo, config.scraper.clone());

    let summary = match pass {
        Pass::Entrants => driver.run_entrants(span, today).await,
        Pass::Results => driver.run_results(span, today).await,
    };

    if let Err(e) = driver.into_source().close().await {
        tracing::warn!("Browser did not close cleanly: {:#}", e);
    }

    print_summary(&summary, &repo);
    Ok(())
}

fn print_summary(summary: &RunSummary, repo: &RaceRepository) {
    println!();
    println!("=== Summary ===");
    println!("{}", summary);
    match repo.counts() {
        Ok(counts) => println!(
            "Database: {} races, {} entries, {} horses, {} actors, {} venues",
            counts.races, counts.entries, counts.horses, counts.actors, counts.venues
        ),
        Err(e) => tracing::warn!("Could not count stored rows: {:#}", e),
    }
}
