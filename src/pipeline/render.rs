// src/pipeline/render.rs

//! Markdown summary of the current airdrops.

use crate::models::{Airdrop, Snapshot};
use crate::services::PriceSource;

const TABLE_HEADER: &str = "| Project | Time | Points | Amount | Phase | Value (USD) |\n\
                            |---|---|---|---|---|---|\n";

/// Render one table row per snapshot item.
///
/// Display-only fields come from the matching record in `airdrops`; items
/// without one are skipped. Unit prices come from `prices`, and a failed
/// lookup counts as zero rather than aborting the message.
pub async fn render_message(
    snapshot: &Snapshot,
    airdrops: &[Airdrop],
    prices: &dyn PriceSource,
) -> String {
    let mut message = String::from(TABLE_HEADER);

    for item in snapshot.items() {
        let Some(airdrop) = airdrops.iter().find(|a| item.matches(a)) else {
            log::debug!("No record behind snapshot item {}, skipping", item);
            continue;
        };

        let amount = parse_amount(&item.amount);
        let price = match prices.fetch_price(&item.token).await {
            Ok(price) => price,
            Err(e) => {
                log::warn!("{}", e);
                0.0
            }
        };

        let mut name = item.name.clone();
        if airdrop.is_tge() {
            name.push_str("(tge)");
        }

        message.push_str(&format!(
            "| {}({}) | {} {} | {} | {} | {} | {:.2} |\n",
            item.token,
            name,
            item.date,
            item.time,
            airdrop.points,
            item.amount,
            item.phase,
            price * amount as f64
        ));
    }

    message
}

/// Blank or non-integer amounts count as zero.
fn parse_amount(raw: &str) -> i64 {
    if raw.is_empty() {
        return 0;
    }
    raw.parse().unwrap_or_else(|e| {
        log::warn!("Amount {:?} is not an integer: {}", raw, e);
        0
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::{AppError, Result};
    use crate::services::PriceSource;

    /// Fixed price table; unknown tokens fail.
    #[derive(Default)]
    pub struct TablePrices {
        pub prices: HashMap<String, f64>,
        pub lookups: Mutex<Vec<String>>,
    }

    impl TablePrices {
        pub fn new(entries: &[(&str, f64)]) -> Self {
            Self {
                prices: entries.iter().map(|(t, p)| (t.to_string(), *p)).collect(),
                lookups: Mutex::new(Vec::new()),
            }
        }

        pub fn lookup_count(&self) -> usize {
            self.lookups.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl PriceSource for TablePrices {
        async fn fetch_price(&self, token: &str) -> Result<f64> {
            self.lookups.lock().unwrap().push(token.to_string());
            self.prices
                .get(token)
                .copied()
                .ok_or_else(|| AppError::price_unavailable(token, "not listed"))
        }
    }
}
