//! The analysis orchestrator: fetch, filter, classify, aggregate, enrich.
//!
//! `WalletAnalyzer` owns the data sources behind trait objects/generics and
//! drives one full analysis per call. It holds no per-request mutable state,
//! so a single instance is safely shared across concurrent requests.

use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::aggregator::{aggregate_simple, aggregate_strict, AccountingMode, PortfolioSummary};
use crate::classifier::classify_swap;
use crate::related_wallets::detect_related_wallets;
use crate::sources::{BalanceSource, FetchOptions, PriceSource, TransactionSource};
use crate::timeframe::{filter_by_timeframe, Timeframe};
use crate::transaction::{RawTransaction, LAMPORTS_PER_SOL, SOL_MINT};
use crate::{AnalyzerError, Result};

const MIN_WALLET_LEN: usize = 32;
const MAX_WALLET_LEN: usize = 44;

/// Tunables for one analyzer instance. Wired from `config_manager` in the
/// binaries; `Default` matches production settings.
#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    /// Transaction history depth for the main wallet.
    pub transaction_limit: u32,
    /// SOL/USD price used in simple mode when the price feed is down.
    pub sol_fallback_price: f64,
    /// Whether to fan out and compute P&L for each related wallet.
    pub enrich_related_wallets: bool,
    /// Shallower history depth for the enrichment fan-out.
    pub enrichment_transaction_limit: u32,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            transaction_limit: 1000,
            sol_fallback_price: 100.0,
            enrich_related_wallets: true,
            enrichment_transaction_limit: 100,
        }
    }
}

pub struct WalletAnalyzer {
    transaction_source: Arc<dyn TransactionSource>,
    price_source: Arc<dyn PriceSource>,
    balance_source: Option<Arc<dyn BalanceSource>>,
    /// Secondary transaction source, consulted in simple mode when the
    /// primary fails (e.g. the synthetic generator behind the live API).
    fallback_source: Option<Arc<dyn TransactionSource>>,
    settings: AnalyzerSettings,
}

impl WalletAnalyzer {
    pub fn new(
        transaction_source: Arc<dyn TransactionSource>,
        price_source: Arc<dyn PriceSource>,
        settings: AnalyzerSettings,
    ) -> Self {
        Self {
            transaction_source,
            price_source,
            balance_source: None,
            fallback_source: None,
            settings,
        }
    }

    pub fn with_balance_source(mut self, source: Arc<dyn BalanceSource>) -> Self {
        self.balance_source = Some(source);
        self
    }

    pub fn with_fallback_source(mut self, source: Arc<dyn TransactionSource>) -> Self {
        self.fallback_source = Some(source);
        self
    }

    /// Run one full analysis for `wallet`.
    ///
    /// Strict mode treats an empty history as a legitimate zero-valued
    /// result; simple mode reports it as [`AnalyzerError::NoTransactions`]
    /// so interactive callers can distinguish "nothing to show" from a
    /// flat portfolio.
    pub async fn analyze(
        &self,
        wallet: &str,
        timeframe: Timeframe,
        mode: AccountingMode,
    ) -> Result<PortfolioSummary> {
        validate_wallet(wallet)?;
        info!("Analyzing wallet {wallet} ({timeframe}, {mode:?})");

        let transactions = self.fetch_history(wallet, mode).await?;
        info!("Fetched {} transactions for {wallet}", transactions.len());

        if transactions.is_empty() && mode == AccountingMode::Simple {
            return Err(AnalyzerError::NoTransactions);
        }

        let now = chrono::Utc::now().timestamp();
        let filtered = filter_by_timeframe(transactions.clone(), timeframe, now);

        let mut summary = match mode {
            AccountingMode::Strict => aggregate_strict(&filtered, wallet),
            AccountingMode::Simple => self.aggregate_simple_mode(&filtered, wallet).await,
        };

        // Related wallets are detected over the full history: a counterparty
        // that went quiet last month is still a counterparty.
        summary.related_wallets = detect_related_wallets(&transactions, wallet, now);
        if self.settings.enrich_related_wallets && !summary.related_wallets.is_empty() {
            self.enrich_related_wallets(&mut summary).await;
        }

        summary.balance = self.fetch_balance(wallet).await;

        Ok(summary)
    }

    async fn fetch_history(&self, wallet: &str, mode: AccountingMode) -> Result<Vec<RawTransaction>> {
        let options = FetchOptions::swaps(self.settings.transaction_limit);
        match self
            .transaction_source
            .fetch_transactions(wallet, &options)
            .await
        {
            Ok(transactions) => Ok(transactions),
            Err(err) => match (&self.fallback_source, mode) {
                (Some(fallback), AccountingMode::Simple) => {
                    warn!("Primary transaction source failed ({err}), using fallback");
                    fallback.fetch_transactions(wallet, &options).await
                }
                _ => Err(err),
            },
        }
    }

    async fn aggregate_simple_mode(
        &self,
        transactions: &[RawTransaction],
        wallet: &str,
    ) -> PortfolioSummary {
        let trades: Vec<_> = transactions
            .iter()
            .filter_map(|tx| classify_swap(tx, wallet))
            .collect();

        let mut mints: HashSet<String> = trades
            .iter()
            .flat_map(|t| [t.token_in.mint.clone(), t.token_out.mint.clone()])
            .filter(|m| !m.is_empty())
            .collect();
        mints.insert(SOL_MINT.to_string());
        let mints: Vec<String> = mints.into_iter().collect();

        // Price feed failure degrades to the fallback SOL price and zero
        // marks, never a request failure.
        let prices = if trades.is_empty() {
            Default::default()
        } else {
            match self.price_source.fetch_prices(&mints).await {
                Ok(prices) => prices,
                Err(err) => {
                    warn!("Price fetch failed ({err}), falling back to configured SOL price");
                    Default::default()
                }
            }
        };

        aggregate_simple(&trades, &prices, self.settings.sol_fallback_price)
    }

    /// Fan out over the detected wallets (at most 10) and attach each one's
    /// strict realized P&L. Enriched wallets are aggregated directly, never
    /// re-analyzed, so the fan-out cannot recurse.
    async fn enrich_related_wallets(&self, summary: &mut PortfolioSummary) {
        let options = FetchOptions::swaps(self.settings.enrichment_transaction_limit);
        let fetches = summary.related_wallets.iter().map(|record| {
            let source = Arc::clone(&self.transaction_source);
            let address = record.address.clone();
            let options = options.clone();
            async move {
                let transactions = source.fetch_transactions(&address, &options).await?;
                Ok::<_, AnalyzerError>(aggregate_strict(&transactions, &address))
            }
        });

        let results = join_all(fetches.collect::<Vec<_>>()).await;
        for (record, result) in summary.related_wallets.iter_mut().zip(results) {
            match result {
                Ok(wallet_summary) => {
                    record.pnl = wallet_summary.total_pnl;
                    record.pnl_percent = if wallet_summary.total_volume > 0.0 {
                        wallet_summary.total_pnl / wallet_summary.total_volume * 100.0
                    } else {
                        0.0
                    };
                }
                Err(err) => {
                    warn!("Enrichment failed for {} ({err})", record.address);
                }
            }
        }
    }

    async fn fetch_balance(&self, wallet: &str) -> Option<f64> {
        let source = self.balance_source.as_ref()?;
        match source.fetch_native_balance(wallet).await {
            Ok(lamports) => Some(lamports as f64 / LAMPORTS_PER_SOL),
            Err(err) => {
                warn!("Balance fetch failed for {wallet} ({err})");
                None
            }
        }
    }
}

fn validate_wallet(wallet: &str) -> Result<()> {
    let plausible = (MIN_WALLET_LEN..=MAX_WALLET_LEN).contains(&wallet.len())
        && wallet.chars().all(|c| c.is_ascii_alphanumeric());
    if plausible {
        Ok(())
    } else {
        Err(AnalyzerError::InvalidWallet(wallet.to_string()))
    }
}
