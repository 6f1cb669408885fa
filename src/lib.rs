// src/lib.rs

//! Airdrop watcher library.
//!
//! Polls the airdrop calendar, keeps a snapshot of the upcoming window,
//! and pushes a summary when new airdrops show up.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
