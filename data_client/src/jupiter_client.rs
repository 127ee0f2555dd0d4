use async_trait::async_trait;
use config_manager::JupiterConfig;
use pnl_core::{AnalyzerError, PriceSource, TokenPrice};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio::time;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum JupiterError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
}

pub type Result<T> = std::result::Result<T, JupiterError>;

/// Jupiter price API response: `{"data": {"<mint>": {"id": ..., "price": ...}}}`.
#[derive(Debug, Deserialize)]
struct JupiterPriceResponse {
    #[serde(default)]
    data: HashMap<String, JupiterTokenPrice>,
}

#[derive(Debug, Deserialize)]
struct JupiterTokenPrice {
    price: f64,
}

/// Jupiter price API client for batched current-price lookups.
#[derive(Debug, Clone)]
pub struct JupiterPriceClient {
    http_client: Client,
    config: JupiterConfig,
}

impl JupiterPriceClient {
    pub fn new(config: JupiterConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent("walletscope/1.0")
            .build()
            .map_err(|e| JupiterError::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Fetch current USD prices for the given mints in a single batched
    /// request. Mints the API has no quote for are simply absent from the
    /// result map.
    pub async fn fetch_token_prices(&self, mints: &[String]) -> Result<HashMap<String, f64>> {
        if mints.is_empty() {
            return Ok(HashMap::new());
        }

        let url = format!(
            "{}/v4/price?ids={}",
            self.config.api_base_url,
            mints.join(",")
        );

        let mut attempt = 0;
        let response = loop {
            attempt += 1;
            debug!(
                "Fetching Jupiter prices for {} mints (attempt {}/{})",
                mints.len(),
                attempt,
                self.config.max_retries
            );

            match self.http_client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => break resp,
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    let message = resp
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());
                    if attempt >= self.config.max_retries {
                        return Err(JupiterError::ApiError { status, message });
                    }
                    warn!("Jupiter API error ({status}), retrying");
                }
                Err(e) => {
                    if attempt >= self.config.max_retries {
                        return Err(JupiterError::Http(e));
                    }
                    warn!("Jupiter request failed ({e}), retrying");
                }
            }

            time::sleep(Duration::from_millis(self.config.rate_limit_delay_ms)).await;
        };

        let parsed: JupiterPriceResponse = response.json().await?;
        debug!("Jupiter returned prices for {} mints", parsed.data.len());

        Ok(parsed
            .data
            .into_iter()
            .map(|(mint, quote)| (mint, quote.price))
            .collect())
    }
}

#[async_trait]
impl PriceSource for JupiterPriceClient {
    async fn fetch_prices(
        &self,
        mints: &[String],
    ) -> pnl_core::Result<HashMap<String, TokenPrice>> {
        let prices = self
            .fetch_token_prices(mints)
            .await
            .map_err(|e| AnalyzerError::PriceFetch(e.to_string()))?;

        Ok(prices
            .into_iter()
            .map(|(mint, price)| (mint, TokenPrice { price }))
            .collect())
    }
}
