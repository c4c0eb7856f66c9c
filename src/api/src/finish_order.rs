//! Finishing order: program numbers from winner down, encoded `3-2-1-5-4`.

use anyhow::{bail, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::debug;

static NUMBER_RE: OnceLock<Regex> = OnceLock::new();
static ANNOTATION_RE: OnceLock<Regex> = OnceLock::new();

fn number_re() -> &'static Regex {
    NUMBER_RE.get_or_init(|| Regex::new(r"\d+").expect("valid number regex"))
}

fn annotation_re() -> &'static Regex {
    ANNOTATION_RE.get_or_init(|| Regex::new(r"\([^)]*\)").expect("valid annotation regex"))
}

/// Ordered, duplicate-free list of positive program numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishOrder(Vec<u32>);

impl FinishOrder {
    /// Build from numbers, rejecting empty lists, zeros and repeats.
    pub fn new(numbers: Vec<u32>) -> Option<Self> {
        if numbers.is_empty() || numbers.contains(&0) {
            return None;
        }
        for (i, n) in numbers.iter().enumerate() {
            if numbers[..i].contains(n) {
                return None;
            }
        }
        Some(Self(numbers))
    }

    /// Best-effort normalization of scraped finishing-order text.
    ///
    /// Parenthesized annotations are dropped, tokens are split on dashes,
    /// and every integer inside a token is kept in order (so a dead heat
    /// `1 ex 5` yields `1-5`). Tokens without digits, zeros and repeated
    /// numbers are skipped. Returns `None` when nothing usable remains.
    pub fn parse(text: &str) -> Option<Self> {
        let stripped = annotation_re().replace_all(text, " ");
        let mut numbers = Vec::new();

        for token in stripped.split(['-', '–', '—']) {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let mut found = false;
            for m in number_re().find_iter(token) {
                found = true;
                match m.as_str().parse::<u32>() {
                    Ok(n) if n > 0 && !numbers.contains(&n) => numbers.push(n),
                    _ => debug!("Ignoring finish-order number {:?} in {:?}", m.as_str(), text),
                }
            }
            if !found {
                debug!("Ignoring finish-order token {:?} in {:?}", token, text);
            }
        }

        if numbers.is_empty() {
            None
        } else {
            Some(Self(numbers))
        }
    }

    pub fn numbers(&self) -> &[u32] {
        &self.0
    }

    /// 1-based rank of a program number in this order
    pub fn rank_of(&self, program_number: u32) -> Option<u32> {
        self.0
            .iter()
            .position(|&n| n == program_number)
            .map(|i| i as u32 + 1)
    }
}

impl fmt::Display for FinishOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|n| n.to_string()).collect();
        f.write_str(&parts.join("-"))
    }
}

/// Strict parse of the stored encoding.
impl FromStr for FinishOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut numbers = Vec::new();
        for part in s.split('-') {
            if part.is_empty() || part.starts_with('0') || !part.bytes().all(|b| b.is_ascii_digit()) {
                bail!("Invalid finish order segment {:?} in {:?}", part, s);
            }
            numbers.push(part.parse::<u32>()?);
        }
        match Self::new(numbers) {
            Some(order) => Ok(order),
            None => bail!("Invalid finish order {:?}", s),
        }
    }
}
