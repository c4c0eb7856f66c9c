//! HTML parsers for geny.com pages.

pub mod race_card;
pub mod race_list;
pub mod results;
pub mod values;

pub use race_card::RaceCardParser;
pub use race_list::{RaceLink, RaceListParser};
pub use results::ResultBoardParser;
