//! SQLite repository: natural-key identity resolution and idempotent upserts

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};

use super::schema::create_tables;
use crate::finish_order::FinishOrder;
use crate::scraper::parsers::values::normalize_key;
use crate::types::{Actor, EntrantRecord, RaceIdentity, RaceRecord};

/// A race row after an upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRace {
    pub id: i64,
    pub identity: RaceIdentity,
}

/// Row counts per table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub venues: i64,
    pub horses: i64,
    pub actors: i64,
    pub races: i64,
    pub entries: i64,
}

/// Repository for scraped race data
pub struct RaceRepository {
    conn: Connection,
}

impl RaceRepository {
    /// Create a new repository, initializing the database if needed
    pub fn new(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("Failed to create database directory")?;
            }
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database {}", db_path.display()))?;

        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;
        create_tables(&conn).context("Failed to create tables")?;

        Ok(Self { conn })
    }

    /// Create an in-memory repository (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        create_tables(&conn)?;
        Ok(Self { conn })
    }

    // ==================== Upserts ====================

    /// Write a race card and its entrants as one unit.
    ///
    /// Re-scraping the same race updates the existing rows in place. Known
    /// values are never overwritten by unknown ones.
    pub fn upsert_race(&mut self, race: &RaceRecord) -> Result<StoredRace> {
        let tx = self.conn.transaction()?;

        let venue_id = if race.venue.trim().is_empty() {
            None
        } else {
            let city = Some(race.city.as_str()).filter(|c| !c.trim().is_empty());
            Some(resolve_venue(&tx, &race.venue, city)?)
        };

        let race_id: i64 = tx
            .query_row(
                r#"
                INSERT INTO races
                (prize_name, prize_key, race_date, race_time, venue_id, discipline,
                 distance, terrain, purse, entrant_count, finish_order, source_url)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                ON CONFLICT(prize_name, race_date) DO UPDATE SET
                    prize_key = excluded.prize_key,
                    race_time = COALESCE(excluded.race_time, races.race_time),
                    venue_id = COALESCE(excluded.venue_id, races.venue_id),
                    discipline = excluded.discipline,
                    distance = COALESCE(excluded.distance, races.distance),
                    terrain = COALESCE(excluded.terrain, races.terrain),
                    purse = COALESCE(excluded.purse, races.purse),
                    entrant_count = excluded.entrant_count,
                    finish_order = COALESCE(excluded.finish_order, races.finish_order),
                    source_url = excluded.source_url,
                    updated_at = datetime('now')
                RETURNING id
                "#,
                params![
                    race.prize_name,
                    normalize_key(&race.prize_name),
                    race.date.format("%Y-%m-%d").to_string(),
                    race.time.map(|t| t.format("%H:%M").to_string()),
                    venue_id,
                    race.discipline.as_str(),
                    race.distance,
                    race.terrain,
                    race.purse.map(|p| p as i64),
                    race.entrant_count() as i64,
                    race.finish_order.as_ref().map(|o| o.to_string()),
                    race.source_url,
                ],
                |row| row.get(0),
            )
            .with_context(|| format!("Failed to upsert race {} ({})", race.prize_name, race.date))?;

        for entrant in &race.entrants {
            upsert_entry(&tx, race_id, entrant).with_context(|| {
                format!(
                    "Failed to upsert entry #{} of {} ({})",
                    entrant.program_number, race.prize_name, race.date
                )
            })?;
        }

        tx.commit()?;
        debug!(
            "Stored race {} ({}) as #{} with {} entries",
            race.prize_name,
            race.date,
            race_id,
            race.entrant_count()
        );

        Ok(StoredRace {
            id: race_id,
            identity: RaceIdentity {
                prize_name: race.prize_name.clone(),
                date: race.date,
            },
        })
    }

    /// Apply an official finishing order to a stored race.
    ///
    /// Returns `Ok(false)` without writing when the race is unknown or the
    /// order names a program number that has no entry in that race. On
    /// success the race's order string is set and every entry's finish
    /// position is rewritten (entries outside the order become NULL).
    pub fn upsert_result(&mut self, identity: &RaceIdentity, order: &FinishOrder) -> Result<bool> {
        let Some(race_id) = self.find_race(identity)? else {
            warn!("No stored race matches {}; result skipped", identity);
            return Ok(false);
        };

        let known = program_numbers(&self.conn, race_id)?;
        let missing: Vec<u32> = order
            .numbers()
            .iter()
            .copied()
            .filter(|n| !known.contains(n))
            .collect();
        if !missing.is_empty() {
            warn!(
                "Finish order {} for {} names unknown program numbers {:?}; positions left unchanged",
                order, identity, missing
            );
            return Ok(false);
        }

        if self.stored_order(race_id)?.as_ref() == Some(order)
            && self.stored_finish_order(race_id)?.as_ref() == Some(order)
        {
            debug!("Finish order {} for {} already stored", order, identity);
            return Ok(true);
        }

        let tx = self.conn.transaction()?;
        tx.execute(
            "UPDATE races SET finish_order = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![order.to_string(), race_id],
        )?;
        {
            let mut stmt = tx.prepare_cached(
                "UPDATE entries SET finish_position = ?1 WHERE race_id = ?2 AND program_number = ?3",
            )?;
            for program_number in &known {
                stmt.execute(params![order.rank_of(*program_number), race_id, program_number])?;
            }
        }
        tx.commit()?;

        Ok(true)
    }

    // ==================== Query Operations ====================

    /// Find a race by identity.
    ///
    /// An exact prize-name match wins; otherwise names are compared by
    /// their normalized key (case, accents and punctuation ignored).
    pub fn find_race(&self, identity: &RaceIdentity) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row(
                r#"
                SELECT id FROM races
                WHERE race_date = ?1 AND (prize_name = ?2 OR prize_key = ?3)
                ORDER BY prize_name = ?2 DESC, id
                LIMIT 1
                "#,
                params![
                    identity.date.format("%Y-%m-%d").to_string(),
                    identity.prize_name,
                    normalize_key(&identity.prize_name),
                ],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Finishing order rebuilt from the entries' finish positions
    pub fn stored_finish_order(&self, race_id: i64) -> Result<Option<FinishOrder>> {
        let mut stmt = self.conn.prepare_cached(
            r#"
            SELECT program_number FROM entries
            WHERE race_id = ?1 AND finish_position IS NOT NULL
            ORDER BY finish_position
            "#,
        )?;
        let numbers = stmt
            .query_map([race_id], |row| row.get::<_, u32>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(FinishOrder::new(numbers))
    }

    /// Finishing order recorded on the race row; an unreadable value counts as none.
    pub fn stored_order(&self, race_id: i64) -> Result<Option<FinishOrder>> {
        let text: Option<String> = self.conn.query_row(
            "SELECT finish_order FROM races WHERE id = ?1",
            [race_id],
            |row| row.get(0),
        )?;
        Ok(text.and_then(|t| match t.parse::<FinishOrder>() {
            Ok(order) => Some(order),
            Err(e) => {
                warn!("Ignoring stored finish order of race #{}: {:#}", race_id, e);
                None
            }
        }))
    }

    /// Row counts of every table
    pub fn counts(&self) -> Result<TableCounts> {
        let count = |table: &str| -> Result<i64> {
            let n: i64 = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
            Ok(n)
        };
        Ok(TableCounts {
            venues: count("venues")?,
            horses: count("horses")?,
            actors: count("actors")?,
            races: count("races")?,
            entries: count("entries")?,
        })
    }

    /// Stored entries of a race, by program number
    #[cfg(test)]
    pub fn entries_for(&self, race_id: i64) -> Result<Vec<StoredEntry>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT e.program_number, h.name, r.name, e.weight, e.morning_odds,
                   e.live_odds, e.form, e.finish_position, e.elapsed_time, e.earnings
            FROM entries e
            LEFT JOIN horses h ON h.id = e.horse_id
            LEFT JOIN actors r ON r.id = e.rider_id
            WHERE e.race_id = ?1
            ORDER BY e.program_number
            "#,
        )?;
        let entries = stmt
            .query_map([race_id], |row| {
                Ok(StoredEntry {
                    program_number: row.get(0)?,
                    horse_name: row.get(1)?,
                    rider_name: row.get(2)?,
                    weight: row.get(3)?,
                    morning_odds: row.get(4)?,
                    live_odds: row.get(5)?,
                    form: row.get(6)?,
                    finish_position: row.get(7)?,
                    elapsed_time: row.get(8)?,
                    earnings: row.get(9)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Raw access for assertions on columns without a query helper
    #[cfg(test)]
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Entry row joined with its horse and rider names
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    pub program_number: u32,
    pub horse_name: Option<String>,
    pub rider_name: Option<String>,
    pub weight: Option<f64>,
    pub morning_odds: Option<f64>,
    pub live_odds: Option<f64>,
    pub form: Option<String>,
    pub finish_position: Option<u32>,
    pub elapsed_time: Option<String>,
    pub earnings: Option<f64>,
}

fn resolve_venue(conn: &Connection, name: &str, city: Option<&str>) -> Result<i64> {
    let id = conn.prepare_cached(
        r#"
        INSERT INTO venues (name, city) VALUES (?1, ?2)
        ON CONFLICT(name) DO UPDATE SET city = COALESCE(excluded.city, venues.city)
        RETURNING id
        "#,
    )?
    .query_row(params![name.trim(), city], |row| row.get(0))?;
    Ok(id)
}

fn resolve_horse(conn: &Connection, name: &str, sex: Option<&str>, age: Option<u32>) -> Result<i64> {
    let id = conn.prepare_cached(
        r#"
        INSERT INTO horses (name, sex, age) VALUES (?1, ?2, ?3)
        ON CONFLICT(name) DO UPDATE SET
            sex = COALESCE(excluded.sex, horses.sex),
            age = COALESCE(excluded.age, horses.age)
        RETURNING id
        "#,
    )?
    .query_row(params![name.trim(), sex, age], |row| row.get(0))?;
    Ok(id)
}

fn resolve_actor(conn: &Connection, actor: &Actor) -> Result<i64> {
    // The no-op update makes RETURNING yield the existing row
    let id = conn.prepare_cached(
        r#"
        INSERT INTO actors (name, role) VALUES (?1, ?2)
        ON CONFLICT(name, role) DO UPDATE SET name = excluded.name
        RETURNING id
        "#,
    )?
    .query_row(params![actor.name.trim(), actor.role.as_str()], |row| row.get(0))?;
    Ok(id)
}

fn upsert_entry(conn: &Connection, race_id: i64, entrant: &EntrantRecord) -> Result<()> {
    let horse_id = if entrant.horse_name.trim().is_empty() {
        None
    } else {
        Some(resolve_horse(
            conn,
            &entrant.horse_name,
            entrant.sex.as_deref(),
            entrant.age,
        )?)
    };
    let rider_id = entrant.rider.as_ref().map(|a| resolve_actor(conn, a)).transpose()?;
    let trainer_id = entrant.trainer.as_ref().map(|a| resolve_actor(conn, a)).transpose()?;

    conn.prepare_cached(
        r#"
        INSERT INTO entries
        (race_id, program_number, horse_id, rider_id, trainer_id, horse_age, weight,
         own_distance, distance_handicap, morning_odds, live_odds, form,
         finish_position, elapsed_time, earnings)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        ON CONFLICT(race_id, program_number) DO UPDATE SET
            horse_id = COALESCE(excluded.horse_id, entries.horse_id),
            rider_id = COALESCE(excluded.rider_id, entries.rider_id),
            trainer_id = COALESCE(excluded.trainer_id, entries.trainer_id),
            horse_age = COALESCE(excluded.horse_age, entries.horse_age),
            weight = COALESCE(excluded.weight, entries.weight),
            own_distance = COALESCE(excluded.own_distance, entries.own_distance),
            distance_handicap = COALESCE(excluded.distance_handicap, entries.distance_handicap),
            morning_odds = COALESCE(excluded.morning_odds, entries.morning_odds),
            live_odds = COALESCE(excluded.live_odds, entries.live_odds),
            form = COALESCE(excluded.form, entries.form),
            finish_position = COALESCE(excluded.finish_position, entries.finish_position),
            elapsed_time = COALESCE(excluded.elapsed_time, entries.elapsed_time),
            earnings = COALESCE(excluded.earnings, entries.earnings)
        "#,
    )?
    .execute(params![
        race_id,
        entrant.program_number,
        horse_id,
        rider_id,
        trainer_id,
        entrant.age,
        entrant.weight,
        entrant.own_distance,
        entrant.distance_handicap,
        entrant.morning_odds,
        entrant.live_odds,
        entrant.form,
        entrant.finish_position,
        entrant.elapsed_time,
        entrant.earnings,
    ])?;
    Ok(())
}

fn program_numbers(conn: &Connection, race_id: i64) -> Result<HashSet<u32>> {
    let mut stmt = conn.prepare_cached("SELECT program_number FROM entries WHERE race_id = ?1")?;
    let numbers = stmt
        .query_map([race_id], |row| row.get::<_, u32>(0))?
        .collect::<std::result::Result<HashSet<_>, _>>()?;
    Ok(numbers)
}
