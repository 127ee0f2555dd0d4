//! Core P&L engine: trade classification, weighted-average cost-basis
//! accounting, portfolio aggregation and related-wallet risk detection for
//! Solana wallets.
//!
//! The crate is transport-agnostic. Everything network-shaped enters
//! through the [`sources`] traits; the HTTP clients live in `data_client`
//! and the REST surface in `api_server`.

use thiserror::Error;

pub mod aggregator;
pub mod analyzer;
pub mod classifier;
pub mod ledger;
pub mod related_wallets;
pub mod sources;
pub mod timeframe;
pub mod transaction;

pub use aggregator::{AccountingMode, BestPerformer, PnlPoint, PortfolioSummary, PositionSummary};
pub use analyzer::{AnalyzerSettings, WalletAnalyzer};
pub use classifier::{DirectionalSwap, NormalizedTrade, TradeLeg, TradeSide};
pub use ledger::{Position, PositionLedger};
pub use related_wallets::{RelatedWalletRecord, RiskLevel};
pub use sources::{BalanceSource, FetchOptions, PriceSource, TokenPrice, TransactionSource};
pub use timeframe::Timeframe;
pub use transaction::RawTransaction;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The address fails basic shape checks before any network call.
    #[error("Invalid wallet address: {0}")]
    InvalidWallet(String),

    /// An upstream data provider failed after retries.
    #[error("Upstream data source error: {0}")]
    Upstream(String),

    /// The wallet has no transaction history to analyze. Distinct from a
    /// flat portfolio, which is a successful zero-valued summary.
    #[error("No transactions found for this wallet")]
    NoTransactions,

    /// The price feed failed; simple mode degrades instead of surfacing
    /// this to callers.
    #[error("Price fetch error: {0}")]
    PriceFetch(String),

    #[error("{0}")]
    TimeframeParse(String),
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
