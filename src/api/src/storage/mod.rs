//! SQLite storage for scraped race data
//!
//! Natural keys are enforced unique by the schema, so the repository can
//! resolve identities and upsert rows with single conflict-handling
//! statements.

pub mod repository;
pub mod schema;

pub use repository::RaceRepository;
pub use schema::schema_sql;
