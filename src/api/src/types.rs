//! Race and entrant records produced by the parsers and consumed by storage.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::finish_order::FinishOrder;

/// Racing discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Discipline {
    Trot,
    Flat,
    Obstacle,
}

impl Discipline {
    pub fn as_str(&self) -> &'static str {
        match self {
            Discipline::Trot => "trot",
            Discipline::Flat => "flat",
            Discipline::Obstacle => "obstacle",
        }
    }

    /// Infer the discipline from the race URL and name.
    ///
    /// Without a keyword the card's rider role decides: jockeys ride flat,
    /// drivers trot.
    pub fn infer(url: &str, name: &str, rider_role: ActorRole) -> Self {
        let text = format!("{} {}", url, name).to_lowercase();
        if text.contains("trot") {
            Discipline::Trot
        } else if text.contains("plat") {
            Discipline::Flat
        } else if text.contains("obstacle") || text.contains("haie") || text.contains("steeple") {
            Discipline::Obstacle
        } else if rider_role == ActorRole::Jockey {
            Discipline::Flat
        } else {
            Discipline::Trot
        }
    }
}

/// Role an actor holds on a given entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActorRole {
    Driver,
    Jockey,
    Trainer,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Driver => "driver",
            ActorRole::Jockey => "jockey",
            ActorRole::Trainer => "trainer",
        }
    }
}

/// A named person attached to an entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub role: ActorRole,
}

impl Actor {
    /// Build an actor, dropping blank names.
    pub fn named(name: &str, role: ActorRole) -> Option<Self> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            role,
        })
    }
}

/// One entrant row of a race card.
///
/// Every optional field is `None` when the page showed a placeholder or
/// nothing at all. A parsed zero is a real zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntrantRecord {
    pub program_number: u32,
    pub horse_name: String,
    pub sex: Option<String>,
    pub age: Option<u32>,
    /// Distance this horse runs, in metres
    pub own_distance: Option<u32>,
    /// Metres behind the shortest distance in the field
    pub distance_handicap: Option<u32>,
    pub weight: Option<f64>,
    /// Driver (trot) or jockey (flat/obstacle)
    pub rider: Option<Actor>,
    pub trainer: Option<Actor>,
    pub form: Option<String>,
    pub earnings: Option<f64>,
    pub morning_odds: Option<f64>,
    pub live_odds: Option<f64>,
    pub finish_position: Option<u32>,
    pub elapsed_time: Option<String>,
}

/// A race card with its ordered entrants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceRecord {
    pub prize_name: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub venue: String,
    pub city: String,
    pub discipline: Discipline,
    pub distance: Option<u32>,
    pub terrain: Option<String>,
    pub purse: Option<u64>,
    pub entrants: Vec<EntrantRecord>,
    /// Present when the card already carried a results table
    pub finish_order: Option<FinishOrder>,
    pub source_url: String,
}

impl RaceRecord {
    pub fn entrant_count(&self) -> usize {
        self.entrants.len()
    }
}

/// Natural identity of a race: prize name plus date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RaceIdentity {
    pub prize_name: String,
    pub date: NaiveDate,
}

impl std::fmt::Display for RaceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.prize_name, self.date)
    }
}
