//! Contracts for the external data collaborators. Concrete implementations
//! live in `data_client`; tests use in-memory mocks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::transaction::RawTransaction;
use crate::Result;

/// Options for a transaction history fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Maximum number of transactions to return.
    pub limit: u32,
    /// Optional server-side type filter (e.g. "SWAP").
    pub tx_type: Option<String>,
    /// Opaque pagination cursor: only return transactions before this
    /// signature.
    pub before: Option<String>,
}

impl FetchOptions {
    pub fn swaps(limit: u32) -> Self {
        Self {
            limit,
            tx_type: Some("SWAP".to_string()),
            before: None,
        }
    }
}

/// Current price of one token, in USD.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TokenPrice {
    pub price: f64,
}

/// Source of enhanced transaction history for a wallet. A wallet with no
/// matching activity yields an empty sequence, never an error.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn fetch_transactions(
        &self,
        wallet_address: &str,
        options: &FetchOptions,
    ) -> Result<Vec<RawTransaction>>;
}

/// Batched current-price lookup. Implementations must short-circuit an
/// empty mint set to an empty map without a network call.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_prices(&self, mints: &[String]) -> Result<HashMap<String, TokenPrice>>;
}

/// Native balance lookup, in lamports.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    async fn fetch_native_balance(&self, wallet_address: &str) -> Result<u64>;
}
