// src/services/mod.rs

//! Service layer for the watcher.
//!
//! - `fetcher`: Bounded-retry JSON fetching over an HTTP transport
//! - `airdrops`: Airdrop list and price endpoints
//! - `notifier`: Push delivery

pub mod airdrops;
pub mod fetcher;
pub mod notifier;

pub use airdrops::{AirdropClient, AirdropSource, PriceSource};
pub use fetcher::{Backoff, RawResponse, ReqwestTransport, ResilientFetcher, RetryPolicy, Transport};
pub use notifier::{LogNotifier, Notifier, ServerChanNotifier};
