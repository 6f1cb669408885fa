// src/pipeline/filter.rs

//! Record normalization and window filtering.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::models::Airdrop;

/// Phase whose upstream time is reported too early.
pub const SHIFTED_PHASE: i32 = 2;

/// Correction applied to [`SHIFTED_PHASE`] records.
pub const PHASE_SHIFT_HOURS: i64 = 18;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIME_FORMAT: &str = "%H:%M";
pub(crate) const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Move phase-2 records forward by 18 hours.
///
/// Records with an empty or unparsable date/time are left as they are.
/// Must run exactly once per fetched list, before filtering.
pub fn apply_phase_shift(airdrops: &mut [Airdrop]) {
    for airdrop in airdrops
        .iter_mut()
        .filter(|a| a.phase == SHIFTED_PHASE && !a.date.is_empty() && !a.time.is_empty())
    {
        let raw = format!("{} {}", airdrop.date, airdrop.time);
        match NaiveDateTime::parse_from_str(&raw, DATE_TIME_FORMAT) {
            Ok(parsed) => {
                let shifted = parsed + Duration::hours(PHASE_SHIFT_HOURS);
                airdrop.date = shifted.format(DATE_FORMAT).to_string();
                airdrop.time = shifted.format(TIME_FORMAT).to_string();
            }
            Err(e) => log::debug!("Not shifting {} ({}): {}", airdrop.token, raw, e),
        }
    }
}

/// Options for [`filter_airdrops`].
#[derive(Debug, Clone, Copy)]
pub struct FilterOptions {
    pub today: NaiveDate,
    /// Inclusive upper bound in days from `today`
    pub window_days: i64,
    pub exclude_tge: bool,
}

/// Keep records dated within `[today, today + window_days]`.
///
/// Records whose date does not parse are logged and dropped.
pub fn filter_airdrops(airdrops: &[Airdrop], options: FilterOptions) -> Vec<Airdrop> {
    airdrops
        .iter()
        .filter(|airdrop| {
            let date = match NaiveDate::parse_from_str(&airdrop.date, DATE_FORMAT) {
                Ok(date) => date,
                Err(e) => {
                    log::warn!(
                        "Skipping {} with unparsable date {:?}: {}",
                        airdrop.token,
                        airdrop.date,
                        e
                    );
                    return false;
                }
            };

            let days = (date - options.today).num_days();
            if !(0..=options.window_days).contains(&days) {
                return false;
            }

            if options.exclude_tge && airdrop.is_tge() {
                log::debug!("Filtered TGE record {} ({})", airdrop.token, airdrop.name);
                return false;
            }
            true
        })
        .cloned()
        .collect()
}
