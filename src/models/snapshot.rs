// src/models/snapshot.rs

//! Snapshot items and their persisted line format.
//!
//! A snapshot is stored as one item per line:
//!
//! ```text
//! token|name|date|time|amount|phase
//! ```

use std::fmt;

use sha2::{Digest, Sha256};

use super::Airdrop;

/// Field delimiter of the persisted format.
pub const FIELD_DELIMITER: char = '|';

const FIELD_COUNT: usize = 6;

/// The unit of comparison between two runs.
///
/// Equality and hashing cover all six fields, so the item doubles as the
/// composite key for multiset and presence-set comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SnapshotItem {
    pub token: String,
    pub name: String,
    pub date: String,
    pub time: String,
    pub amount: String,
    pub phase: i32,
}

impl SnapshotItem {
    /// Parse one persisted line.
    ///
    /// Lines with fewer than six fields, or with an empty token or date,
    /// yield `None`. An unparsable phase becomes 0 instead of rejecting
    /// the line.
    pub fn parse_line(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.split(FIELD_DELIMITER).collect();
        if parts.len() < FIELD_COUNT || parts[0].is_empty() || parts[2].is_empty() {
            return None;
        }

        Some(Self {
            token: parts[0].to_string(),
            name: parts[1].to_string(),
            date: parts[2].to_string(),
            time: parts[3].to_string(),
            amount: parts[4].to_string(),
            phase: parts[5].parse().unwrap_or(0),
        })
    }

    /// Whether `airdrop` is the record this item was derived from.
    pub fn matches(&self, airdrop: &Airdrop) -> bool {
        self.token == airdrop.token
            && self.date == airdrop.date
            && self.time == airdrop.time
            && self.phase == airdrop.phase
    }
}

impl From<&Airdrop> for SnapshotItem {
    fn from(airdrop: &Airdrop) -> Self {
        Self {
            token: airdrop.token.clone(),
            name: airdrop.name.clone(),
            date: airdrop.date.clone(),
            time: airdrop.time.clone(),
            amount: airdrop.amount.clone(),
            phase: airdrop.phase,
        }
    }
}

impl fmt::Display for SnapshotItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}|{}|{}",
            self.token, self.name, self.date, self.time, self.amount, self.phase
        )
    }
}

/// An ordered sequence of snapshot items.
///
/// Order only matters for the persisted text; comparisons treat the
/// snapshot as a multiset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    items: Vec<SnapshotItem>,
}

impl Snapshot {
    pub fn new(items: Vec<SnapshotItem>) -> Self {
        Self { items }
    }

    /// Parse persisted text, skipping blank and malformed lines.
    pub fn parse(text: &str) -> Self {
        let items = text
            .trim()
            .lines()
            .filter(|line| !line.is_empty())
            .filter_map(SnapshotItem::parse_line)
            .collect();
        Self { items }
    }

    /// Render the persisted text form, newline separated, no trailing newline.
    pub fn to_text(&self) -> String {
        self.items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn items(&self) -> &[SnapshotItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<SnapshotItem> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// SHA-256 of the persisted text, for log correlation between runs.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_text().as_bytes());
        hex::encode(hasher.finalize())
    }
}
