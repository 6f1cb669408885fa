// src/models/airdrop.rs

//! Raw records as published by the upstream airdrop API.

use serde::{Deserialize, Serialize};

/// Record subtype marking a token generation event.
pub const TGE_KIND: &str = "tge";

/// A single airdrop record.
///
/// Only `token`, `name`, `date`, `time`, `points`, `amount`, `kind` and
/// `phase` drive the watcher; the remaining fields are carried through
/// untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Airdrop {
    pub token: String,
    pub name: String,
    /// Calendar day, `YYYY-MM-DD`
    pub date: String,
    /// Time of day, `HH:MM`
    pub time: String,
    pub points: String,
    /// Numeric quantity transmitted as text, may be empty
    pub amount: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub phase: i32,
    pub status: String,
    pub system_timestamp: i64,
    pub completed: bool,
    pub contract_address: String,
    pub chain_id: String,
}

impl Airdrop {
    /// Whether this record is a token generation event.
    pub fn is_tge(&self) -> bool {
        self.kind == TGE_KIND
    }
}

/// Body of `GET /api/data`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AirdropResponse {
    #[serde(default)]
    pub airdrops: Vec<Airdrop>,
}

/// Body of `GET /api/price/<token>`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub price: f64,
}
