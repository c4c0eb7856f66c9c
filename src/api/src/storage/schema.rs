//! SQLite schema definitions for scraped race data
//!
//! Tables:
//! - venues: Racecourses, unique by name
//! - horses: Horses, unique by name
//! - actors: Drivers, jockeys and trainers, unique by (name, role)
//! - races: Race cards, unique by (prize_name, race_date)
//! - entries: Entrants of a race, unique by (race_id, program_number)
//!
//! The uniqueness constraints are what make every upsert idempotent.

use rusqlite::{Connection, Result};

/// DDL statements in creation order
pub const SCHEMA_STATEMENTS: [&str; 7] = [
    r#"CREATE TABLE IF NOT EXISTS venues (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    city TEXT
)"#,
    r#"CREATE TABLE IF NOT EXISTS horses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    sex TEXT,
    age INTEGER
)"#,
    r#"CREATE TABLE IF NOT EXISTS actors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('driver', 'jockey', 'trainer')),
    UNIQUE(name, role)
)"#,
    r#"CREATE TABLE IF NOT EXISTS races (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    prize_name TEXT NOT NULL,
    prize_key TEXT NOT NULL,
    race_date TEXT NOT NULL,
    race_time TEXT,
    venue_id INTEGER REFERENCES venues(id),
    discipline TEXT,
    distance INTEGER,
    terrain TEXT,
    purse INTEGER,
    entrant_count INTEGER,
    finish_order TEXT,
    source_url TEXT,
    updated_at TEXT DEFAULT (datetime('now')),
    UNIQUE(prize_name, race_date)
)"#,
    r#"CREATE TABLE IF NOT EXISTS entries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    race_id INTEGER NOT NULL REFERENCES races(id),
    program_number INTEGER NOT NULL,
    horse_id INTEGER REFERENCES horses(id),
    rider_id INTEGER REFERENCES actors(id),
    trainer_id INTEGER REFERENCES actors(id),
    horse_age INTEGER,
    weight REAL,
    own_distance INTEGER,
    distance_handicap INTEGER,
    morning_odds REAL,
    live_odds REAL,
    form TEXT,
    finish_position INTEGER,
    elapsed_time TEXT,
    earnings REAL,
    UNIQUE(race_id, program_number)
)"#,
    "CREATE INDEX IF NOT EXISTS idx_races_key_date ON races(prize_key, race_date)",
    "CREATE INDEX IF NOT EXISTS idx_entries_horse ON entries(horse_id)",
];

/// The full DDL as one script
pub fn schema_sql() -> String {
    let mut sql = SCHEMA_STATEMENTS.join(";\n\n");
    sql.push_str(";\n");
    sql
}

/// Create all tables in the database
pub fn create_tables(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }
    Ok(())
}
