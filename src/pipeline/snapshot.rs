// src/pipeline/snapshot.rs

//! Snapshot construction and canonical ordering.

use chrono::{NaiveDate, NaiveDateTime};

use super::filter::{DATE_FORMAT, DATE_TIME_FORMAT};
use crate::models::{Airdrop, Snapshot, SnapshotItem};

/// Build the canonically sorted snapshot of already-filtered records.
pub fn build_snapshot(airdrops: &[Airdrop]) -> Snapshot {
    let mut items: Vec<SnapshotItem> = airdrops.iter().map(SnapshotItem::from).collect();
    sort_items(&mut items);
    Snapshot::new(items)
}

/// Sort by scheduled moment ascending, then token.
pub fn sort_items(items: &mut [SnapshotItem]) {
    items.sort_by(|a, b| {
        scheduled_at(&a.date, &a.time)
            .cmp(&scheduled_at(&b.date, &b.time))
            .then_with(|| a.token.cmp(&b.token))
    });
}

/// Sort key for a date/time pair.
///
/// Falls back to midnight when the time is missing or invalid, and to the
/// minimum timestamp when the date itself does not parse.
pub fn scheduled_at(date: &str, time: &str) -> NaiveDateTime {
    if date.is_empty() {
        return NaiveDateTime::MIN;
    }

    if !time.is_empty() {
        let raw = format!("{date} {time}");
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&raw, DATE_TIME_FORMAT) {
            return parsed;
        }
    }

    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map(|d| d.and_time(chrono::NaiveTime::MIN))
        .unwrap_or(NaiveDateTime::MIN)
}
