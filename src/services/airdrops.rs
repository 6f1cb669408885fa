// src/services/airdrops.rs

//! Airdrop API client.
//!
//! Wraps two [`ResilientFetcher`]s sharing one HTTP client: one for the
//! airdrop list and one for per-token prices, each with its own budget.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Airdrop, AirdropResponse, FetchConfig, PriceResponse};
use crate::services::fetcher::{ReqwestTransport, ResilientFetcher, Transport};
use crate::utils::{http, unix_millis};

/// Something that yields the current raw airdrop list.
#[async_trait]
pub trait AirdropSource: Send + Sync {
    /// Fails with [`AppError::RetriesExhausted`] when the upstream could not
    /// be reached; an empty list means the upstream answered with nothing.
    async fn fetch_airdrops(&self) -> Result<Vec<Airdrop>>;
}

/// Something that yields a unit price for a token.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_price(&self, token: &str) -> Result<f64>;
}

/// Client for `/api/data` and `/api/price/<token>`.
pub struct AirdropClient {
    base_url: Url,
    data: ResilientFetcher,
    price: ResilientFetcher,
}

impl AirdropClient {
    /// Build a client talking to the configured upstream over HTTP.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        let client = http::create_async_client(&base_url, Duration::from_secs(config.timeout_secs))?;

        let data: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(client.clone()));
        let price: Arc<dyn Transport> = Arc::new(
            ReqwestTransport::new(client)
                .with_timeout(Duration::from_secs(config.price_timeout_secs)),
        );

        Ok(Self::with_transports(base_url, config, data, price))
    }

    /// Build a client over caller-supplied transports.
    pub fn with_transports(
        base_url: Url,
        config: &FetchConfig,
        data: Arc<dyn Transport>,
        price: Arc<dyn Transport>,
    ) -> Self {
        Self {
            base_url,
            data: ResilientFetcher::new(data, config.data.policy(), "data"),
            price: ResilientFetcher::new(price, config.price.policy(), "price"),
        }
    }

    fn data_url(&self) -> Result<Url> {
        http::cache_busted_url(&self.base_url, "/api/data", unix_millis())
    }

    fn price_url(&self, token: &str) -> Result<Url> {
        let mut url = http::cache_busted_url(&self.base_url, "/api/price/", unix_millis())?;
        url.path_segments_mut()
            .map_err(|_| AppError::config(format!("Base URL {} cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .push(token);
        Ok(url)
    }
}

#[async_trait]
impl AirdropSource for AirdropClient {
    async fn fetch_airdrops(&self) -> Result<Vec<Airdrop>> {
        let url = self.data_url()?;
        log::info!("Fetching airdrop list from {}", url);

        let response: AirdropResponse = self.data.fetch_json(&url).await?;
        log::info!("Upstream returned {} airdrops", response.airdrops.len());
        Ok(response.airdrops)
    }
}

#[async_trait]
impl PriceSource for AirdropClient {
    async fn fetch_price(&self, token: &str) -> Result<f64> {
        let url = self.price_url(token)?;
        let response: PriceResponse = self
            .price
            .fetch_json(&url)
            .await
            .map_err(|e| AppError::price_unavailable(token, e))?;

        if !response.success {
            return Err(AppError::price_unavailable(token, "upstream reported failure"));
        }
        Ok(response.price)
    }
}
