use async_trait::async_trait;
use config_manager::HeliusConfig;
use pnl_core::{
    AnalyzerError, BalanceSource, FetchOptions, RawTransaction, TransactionSource,
};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tokio::time;
use tracing::{debug, error, warn};

/// Helius caps this endpoint at 100 transactions per request.
const BATCH_SIZE: u32 = 100;

#[derive(Error, Debug)]
pub enum HeliusError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
    #[error("Rate limit exceeded, retry after: {retry_after_ms}ms")]
    RateLimitExceeded { retry_after_ms: u64 },
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type Result<T> = std::result::Result<T, HeliusError>;

/// Helius API client for fetching enhanced transaction data and native
/// balances.
#[derive(Debug, Clone)]
pub struct HeliusClient {
    /// HTTP client for making requests
    http_client: Client,

    /// Helius API configuration
    config: HeliusConfig,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalancesResponse {
    #[serde(default)]
    native_balance: u64,
}

impl HeliusClient {
    /// Create a new Helius client with the given configuration
    pub fn new(config: HeliusConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(HeliusError::ConfigError(
                "Helius API key is required".to_string(),
            ));
        }

        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .user_agent("walletscope/1.0")
            .build()
            .map_err(|e| HeliusError::ConfigError(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    /// Fetch wallet transactions with pagination, newest first. Stops when
    /// `options.limit` transactions have been collected or the history runs
    /// out.
    pub async fn fetch_wallet_transactions(
        &self,
        wallet_address: &str,
        options: &FetchOptions,
    ) -> Result<Vec<RawTransaction>> {
        debug!(
            "Fetching up to {} transactions for wallet {}",
            options.limit, wallet_address
        );

        let mut all_transactions: Vec<RawTransaction> = Vec::new();
        let mut before = options.before.clone();

        loop {
            let remaining = options.limit.saturating_sub(all_transactions.len() as u32);
            if remaining == 0 {
                break;
            }

            let batch = self
                .fetch_transaction_batch(
                    wallet_address,
                    before.as_deref(),
                    remaining.min(BATCH_SIZE),
                    options.tx_type.as_deref(),
                )
                .await?;

            if batch.is_empty() {
                debug!("No more transactions available for {wallet_address}");
                break;
            }

            let batch_len = batch.len();
            before = batch.last().map(|tx| tx.signature.clone());
            all_transactions.extend(batch);

            // A short batch means the history is exhausted.
            if (batch_len as u32) < remaining.min(BATCH_SIZE) {
                break;
            }

            self.apply_rate_limit().await;
        }

        debug!(
            "Fetched {} total transactions for wallet {}",
            all_transactions.len(),
            wallet_address
        );

        Ok(all_transactions)
    }

    /// Fetch the wallet's native balance in lamports.
    pub async fn fetch_balance_lamports(&self, wallet_address: &str) -> Result<u64> {
        let url = format!(
            "{}/v0/addresses/{}/balances?api-key={}",
            self.config.api_base_url, wallet_address, self.config.api_key
        );

        let response = self.make_request(self.http_client.get(&url)).await?;
        let balances: BalancesResponse = response.json().await?;

        Ok(balances.native_balance)
    }

    async fn fetch_transaction_batch(
        &self,
        wallet_address: &str,
        before: Option<&str>,
        limit: u32,
        tx_type: Option<&str>,
    ) -> Result<Vec<RawTransaction>> {
        let url = self.build_transactions_url(wallet_address, before, limit, tx_type);

        let response = match self.make_request(self.http_client.get(&url)).await {
            Ok(response) => response,
            // Helius reports a wallet with no matching events as a 404
            // rather than an empty array.
            Err(HeliusError::ApiError { status: 404, message })
                if message.contains("Failed to find events") =>
            {
                debug!("No events found for {wallet_address}, treating as empty history");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let transactions: Vec<RawTransaction> = response.json().await.map_err(|e| {
            error!("Failed to parse Helius response as JSON: {e}");
            HeliusError::RequestFailed(e)
        })?;

        Ok(transactions)
    }

    fn build_transactions_url(
        &self,
        wallet_address: &str,
        before: Option<&str>,
        limit: u32,
        tx_type: Option<&str>,
    ) -> String {
        let mut url = format!(
            "{}/v0/addresses/{}/transactions?api-key={}&limit={}",
            self.config.api_base_url, wallet_address, self.config.api_key, limit
        );

        if let Some(tx_type) = tx_type {
            url.push_str(&format!("&type={tx_type}"));
        }

        if let Some(before_signature) = before {
            url.push_str(&format!("&before={before_signature}"));
        }

        url
    }

    /// Make a rate-limited HTTP request with retries. Client errors other
    /// than 429 are not retried.
    async fn make_request(&self, request_builder: RequestBuilder) -> Result<reqwest::Response> {
        let mut attempt = 0;
        let max_attempts = self.config.max_retry_attempts;

        loop {
            attempt += 1;

            let request = request_builder
                .try_clone()
                .ok_or_else(|| HeliusError::ConfigError("Failed to clone request".to_string()))?
                .build()
                .map_err(HeliusError::RequestFailed)?;

            debug!(
                "Making Helius API request (attempt {}/{})",
                attempt, max_attempts
            );

            match self.http_client.execute(request).await {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        return Ok(resp);
                    }

                    if status.as_u16() == 429 {
                        let retry_after_ms = self.config.rate_limit_delay_ms * 2;
                        warn!("Helius rate limit exceeded, retrying after {retry_after_ms}ms");

                        if attempt >= max_attempts {
                            return Err(HeliusError::RateLimitExceeded { retry_after_ms });
                        }

                        time::sleep(Duration::from_millis(retry_after_ms)).await;
                        continue;
                    }

                    let error_text = resp
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown error".to_string());

                    if status.is_client_error() {
                        return Err(HeliusError::ApiError {
                            status: status.as_u16(),
                            message: error_text,
                        });
                    }

                    error!("Helius API error: {status} - {error_text}");
                    if attempt >= max_attempts {
                        return Err(HeliusError::ApiError {
                            status: status.as_u16(),
                            message: error_text,
                        });
                    }

                    let delay_ms = self.config.rate_limit_delay_ms * attempt as u64;
                    time::sleep(Duration::from_millis(delay_ms)).await;
                }
                Err(e) => {
                    error!("Helius API request failed: {e}");

                    if attempt >= max_attempts {
                        return Err(HeliusError::RequestFailed(e));
                    }

                    let delay_ms = self.config.rate_limit_delay_ms * attempt as u64;
                    time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    async fn apply_rate_limit(&self) {
        if self.config.rate_limit_delay_ms > 0 {
            time::sleep(Duration::from_millis(self.config.rate_limit_delay_ms)).await;
        }
    }
}

#[async_trait]
impl TransactionSource for HeliusClient {
    async fn fetch_transactions(
        &self,
        wallet_address: &str,
        options: &FetchOptions,
    ) -> pnl_core::Result<Vec<RawTransaction>> {
        self.fetch_wallet_transactions(wallet_address, options)
            .await
            .map_err(|e| AnalyzerError::Upstream(e.to_string()))
    }
}

#[async_trait]
impl BalanceSource for HeliusClient {
    async fn fetch_native_balance(&self, wallet_address: &str) -> pnl_core::Result<u64> {
        self.fetch_balance_lamports(wallet_address)
            .await
            .map_err(|e| AnalyzerError::Upstream(e.to_string()))
    }
}
