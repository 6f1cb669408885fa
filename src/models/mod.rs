// src/models/mod.rs

//! Domain models for the airdrop watcher.

mod airdrop;
mod config;
mod snapshot;

// Re-export all public types
pub use airdrop::{Airdrop, AirdropResponse, PriceResponse, TGE_KIND};
pub use config::{Config, FetchConfig, FilterConfig, NotifyConfig, RetryConfig, StorageConfig};
pub use snapshot::{FIELD_DELIMITER, Snapshot, SnapshotItem};
