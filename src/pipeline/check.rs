// src/pipeline/check.rs

//! One fetch → filter → diff → notify/persist cycle.

use chrono::NaiveDate;

use super::diff::{Decision, added_items, decide};
use super::filter::{FilterOptions, apply_phase_shift, filter_airdrops};
use super::render::render_message;
use super::snapshot::build_snapshot;
use crate::models::{Config, Snapshot};
use crate::services::{AirdropSource, Notifier, PriceSource};
use crate::storage::SnapshotStore;

/// Collaborators of a check run.
pub struct CheckContext<'a> {
    pub config: &'a Config,
    pub source: &'a dyn AirdropSource,
    pub prices: &'a dyn PriceSource,
    pub store: &'a dyn SnapshotStore,
    pub notifier: &'a dyn Notifier,
}

/// What a check run ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Upstream unreachable; nothing rendered, sent or written
    FetchFailed,
    /// No qualifying records and no previous state
    NothingUpcoming,
    /// No qualifying records; previous state reset to empty
    Cleared,
    /// Same records as last time
    Unchanged,
    /// Records only disappeared; state written, no push
    PersistedOnly,
    /// New records; pushed and state written
    Notified,
}

/// Summary of a check run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub outcome: CheckOutcome,
    /// Qualifying records in this run
    pub item_count: usize,
    /// The snapshot should have been written but was not
    pub persist_failed: bool,
}

impl CheckReport {
    fn new(outcome: CheckOutcome, item_count: usize) -> Self {
        Self {
            outcome,
            item_count,
            persist_failed: false,
        }
    }
}

/// Run one check against the given collaborators.
///
/// Never fails: fetch, price, push and persistence problems are logged and
/// reflected in the returned report.
pub async fn run_check(ctx: &CheckContext<'_>, today: NaiveDate) -> CheckReport {
    log::info!("Checking airdrops for {}", today);

    let mut airdrops = match ctx.source.fetch_airdrops().await {
        Ok(airdrops) => airdrops,
        Err(e) => {
            log::error!("Could not fetch airdrops: {}", e);
            return CheckReport::new(CheckOutcome::FetchFailed, 0);
        }
    };

    apply_phase_shift(&mut airdrops);
    let filtered = filter_airdrops(
        &airdrops,
        FilterOptions {
            today,
            window_days: ctx.config.filter.window_days,
            exclude_tge: ctx.config.filter_tge,
        },
    );
    let current = build_snapshot(&filtered);
    log::info!(
        "{} of {} airdrops fall within {} days",
        current.len(),
        airdrops.len(),
        ctx.config.filter.window_days
    );

    let previous_text = ctx.store.load().await.unwrap_or_else(|e| {
        log::warn!("Could not read previous snapshot, treating as empty: {}", e);
        String::new()
    });
    let previous = Snapshot::parse(&previous_text);
    log::debug!(
        "Snapshot digest: previous {} current {}",
        previous.digest(),
        current.digest()
    );

    if current.is_empty() {
        if previous_text.is_empty() {
            log::info!("No upcoming airdrops");
            return CheckReport::new(CheckOutcome::NothingUpcoming, 0);
        }
        log::info!("No upcoming airdrops, clearing previous snapshot");
        return persist(ctx, "", CheckReport::new(CheckOutcome::Cleared, 0)).await;
    }

    let count = current.len();
    match decide(&previous, &current) {
        Decision::Unchanged => {
            log::info!("Airdrops unchanged, skipping push");
            CheckReport::new(CheckOutcome::Unchanged, count)
        }
        Decision::PersistOnly => {
            log::info!(
                "{} airdrop(s) removed, updating snapshot without push",
                previous.len() - current.len()
            );
            let report = CheckReport::new(CheckOutcome::PersistedOnly, count);
            persist(ctx, &current.to_text(), report).await
        }
        Decision::Notify => {
            let added = added_items(&previous, &current);
            log::info!("{} new airdrop(s), pushing notification", added.len());
            for item in &added {
                log::info!("  + {}", item);
            }

            let message = render_message(&current, &filtered, ctx.prices).await;
            ctx.notifier
                .notify(&ctx.config.notify.title, &message, &ctx.config.send_keys)
                .await;

            let report = CheckReport::new(CheckOutcome::Notified, count);
            persist(ctx, &current.to_text(), report).await
        }
    }
}

async fn persist(ctx: &CheckContext<'_>, text: &str, mut report: CheckReport) -> CheckReport {
    if let Err(e) = ctx.store.save(text).await {
        log::error!("Could not save snapshot: {}", e);
        report.persist_failed = true;
    }
    report
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::error::{AppError, FetchError, Result};
    use crate::models::{Airdrop, TGE_KIND};
    use crate::pipeline::render::testing::TablePrices;
    use crate::services::notifier::testing::RecordingNotifier;

    /// Serves a fixed list, or fails like an exhausted fetcher.
    struct FixedSource(Option<Vec<Airdrop>>);

    #[async_trait]
    impl AirdropSource for FixedSource {
        async fn fetch_airdrops(&self) -> Result<Vec<Airdrop>> {
            self.0.clone().ok_or_else(|| AppError::RetriesExhausted {
                url: "https://example.com/api/data".into(),
                attempts: 3,
                last: FetchError::Blocked,
            })
        }
    }

    /// In-memory store that can be told to fail.
    #[derive(Default)]
    struct MemoryStore {
        text: Mutex<String>,
        saves: Mutex<usize>,
        fail_save: bool,
        fail_load: bool,
    }

    impl MemoryStore {
        fn with(text: &str) -> Self {
            Self {
                text: Mutex::new(text.to_string()),
                ..Self::default()
            }
        }

        fn text(&self) -> String {
            self.text.lock().unwrap().clone()
        }

        fn saves(&self) -> usize {
            *self.saves.lock().unwrap()
        }
    }

    #[async_trait]
    impl SnapshotStore for MemoryStore {
        async fn load(&self) -> Result<String> {
            if self.fail_load {
                return Err(AppError::persistence(
                    "memory",
                    std::io::Error::other("disk on fire"),
                ));
            }
            Ok(self.text())
        }

        async fn save(&self, snapshot: &str) -> Result<()> {
            if self.fail_save {
                return Err(AppError::persistence(
                    "memory",
                    std::io::Error::other("read-only"),
                ));
            }
            *self.text.lock().unwrap() = snapshot.to_string();
            *self.saves.lock().unwrap() += 1;
            Ok(())
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn airdrop(token: &str, date: &str, time: &str, phase: i32) -> Airdrop {
        Airdrop {
            token: token.into(),
            name: format!("{token} Network"),
            date: date.into(),
            time: time.into(),
            points: "180".into(),
            amount: "50".into(),
            kind: "airdrop".into(),
            phase,
            ..Airdrop::default()
        }
    }

    async fn run(
        config: &Config,
        source: &FixedSource,
        store: &MemoryStore,
        notifier: &RecordingNotifier,
    ) -> CheckReport {
        let prices = TablePrices::new(&[("AAA", 2.0), ("BBB", 1.0)]);
        let ctx = CheckContext {
            config,
            source,
            prices: &prices,
            store,
            notifier,
        };
        run_check(&ctx, today()).await
    }

    #[tokio::test]
    async fn test_first_run_notifies_and_persists() {
        let config = Config {
            send_keys: vec!["key".into()],
            ..Config::default()
        };
        let source = FixedSource(Some(vec![
            airdrop("BBB", "2025-06-02", "12:00", 1),
            airdrop("AAA", "2025-06-01", "09:00", 1),
            airdrop("OLD", "2025-05-20", "09:00", 1),
        ]));
        let store = MemoryStore::default();
        let notifier = RecordingNotifier::default();

        let report = run(&config, &source, &store, &notifier).await;

        assert_eq!(report.outcome, CheckOutcome::Notified);
        assert_eq!(report.item_count, 2);
        assert!(!report.persist_failed);
        assert_eq!(
            store.text(),
            "AAA|AAA Network|2025-06-01|09:00|50|1\nBBB|BBB Network|2025-06-02|12:00|50|1"
        );

        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, config.notify.title);
        assert!(sent[0].1.contains("| AAA(AAA Network) | 2025-06-01 09:00 | 180 | 50 | 1 | 100.00 |"));
        assert_eq!(sent[0].2, vec!["key".to_string()]);
    }

    #[tokio::test]
    async fn test_same_items_in_other_order_is_unchanged() {
        let config = Config::default();
        let source = FixedSource(Some(vec![
            airdrop("AAA", "2025-06-01", "09:00", 1),
            airdrop("BBB", "2025-06-02", "12:00", 1),
        ]));
        let store = MemoryStore::with(
            "BBB|BBB Network|2025-06-02|12:00|50|1\nAAA|AAA Network|2025-06-01|09:00|50|1",
        );
        let notifier = RecordingNotifier::default();

        let report = run(&config, &source, &store, &notifier).await;

        assert_eq!(report.outcome, CheckOutcome::Unchanged);
        assert_eq!(notifier.count(), 0);
        assert_eq!(store.saves(), 0);
    }

    #[tokio::test]
    async fn test_deletion_persists_silently() {
        let config = Config::default();
        let source = FixedSource(Some(vec![airdrop("AAA", "2025-06-01", "09:00", 1)]));
        let store = MemoryStore::with(
            "AAA|AAA Network|2025-06-01|09:00|50|1\nBBB|BBB Network|2025-06-02|12:00|50|1",
        );
        let notifier = RecordingNotifier::default();

        let report = run(&config, &source, &store, &notifier).await;

        assert_eq!(report.outcome, CheckOutcome::PersistedOnly);
        assert_eq!(notifier.count(), 0);
        assert_eq!(store.text(), "AAA|AAA Network|2025-06-01|09:00|50|1");
    }

    #[tokio::test]
    async fn test_empty_result_clears_previous_state() {
        let config = Config::default();
        let source = FixedSource(Some(vec![airdrop("OLD", "2025-05-01", "09:00", 1)]));
        let store = MemoryStore::with("AAA|AAA Network|2025-06-01|09:00|50|1");
        let notifier = RecordingNotifier::default();

        let report = run(&config, &source, &store, &notifier).await;
        assert_eq!(report.outcome, CheckOutcome::Cleared);
        assert_eq!(store.text(), "");
        assert_eq!(notifier.count(), 0);

        // Same item reappearing afterwards is news again
        let source = FixedSource(Some(vec![airdrop("AAA", "2025-06-01", "09:00", 1)]));
        let report = run(&config, &source, &store, &notifier).await;
        assert_eq!(report.outcome, CheckOutcome::Notified);
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn test_empty_result_without_state_is_noop() {
        let config = Config::default();
        let source = FixedSource(Some(Vec::new()));
        let store = MemoryStore::default();
        let notifier = RecordingNotifier::default();

        let report = run(&config, &source, &store, &notifier).await;
        assert_eq!(report.outcome, CheckOutcome::NothingUpcoming);
        assert_eq!(store.saves(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_touches_nothing() {
        let config = Config::default();
        let source = FixedSource(None);
        let store = MemoryStore::with("AAA|AAA Network|2025-06-01|09:00|50|1");
        let notifier = RecordingNotifier::default();

        let report = run(&config, &source, &store, &notifier).await;

        assert_eq!(report.outcome, CheckOutcome::FetchFailed);
        assert_eq!(store.saves(), 0);
        assert_eq!(store.text(), "AAA|AAA Network|2025-06-01|09:00|50|1");
        assert_eq!(notifier.count(), 0);
    }

    #[tokio::test]
    async fn test_phase_two_shift_applied_once() {
        let config = Config::default();
        let source = FixedSource(Some(vec![airdrop("AAA", "2025-06-01", "20:00", 2)]));
        let store = MemoryStore::default();
        let notifier = RecordingNotifier::default();

        run(&config, &source, &store, &notifier).await;
        assert_eq!(store.text(), "AAA|AAA Network|2025-06-02|14:00|50|2");

        // Fetching the same raw record again must match the stored state
        let report = run(&config, &source, &store, &notifier).await;
        assert_eq!(report.outcome, CheckOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_tge_filter_from_config() {
        let config = Config {
            filter_tge: true,
            ..Config::default()
        };
        let mut tge = airdrop("TGE", "2025-06-01", "10:00", 1);
        tge.kind = TGE_KIND.into();
        let source = FixedSource(Some(vec![tge, airdrop("AAA", "2025-06-01", "09:00", 1)]));
        let store = MemoryStore::default();
        let notifier = RecordingNotifier::default();

        let report = run(&config, &source, &store, &notifier).await;
        assert_eq!(report.item_count, 1);
        assert!(!store.text().contains("TGE"));
    }

    #[tokio::test]
    async fn test_save_failure_is_reported_not_raised() {
        let config = Config::default();
        let source = FixedSource(Some(vec![airdrop("AAA", "2025-06-01", "09:00", 1)]));
        let store = MemoryStore {
            fail_save: true,
            ..MemoryStore::default()
        };
        let notifier = RecordingNotifier::default();

        let report = run(&config, &source, &store, &notifier).await;
        assert_eq!(report.outcome, CheckOutcome::Notified);
        assert!(report.persist_failed);
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test]
    async fn test_load_failure_treated_as_empty() {
        let config = Config::default();
        let source = FixedSource(Some(vec![airdrop("AAA", "2025-06-01", "09:00", 1)]));
        let store = MemoryStore {
            fail_load: true,
            ..MemoryStore::default()
        };
        let notifier = RecordingNotifier::default();

        let report = run(&config, &source, &store, &notifier).await;
        assert_eq!(report.outcome, CheckOutcome::Notified);
        assert_eq!(store.saves(), 1);
    }
}
