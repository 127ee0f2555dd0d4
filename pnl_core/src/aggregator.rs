//! Portfolio aggregation: rolls classified trades into a ranked,
//! portfolio-level summary.
//!
//! Two accounting modes are exposed explicitly rather than hybridized:
//!
//! - [`AccountingMode::Strict`] (batch default): realized P&L only, priced
//!   from the actual base-currency amounts of each swap. Deterministic and
//!   feed-independent.
//! - [`AccountingMode::Simple`] (interactive): approximates USD values from
//!   a current SOL price (with a configured fallback when the feed is
//!   unavailable) and adds a mark-to-market unrealized component. Its
//!   timeline spreads the final total evenly across trades; it is a visual
//!   approximation, not a backtest.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use tracing::debug;

use crate::classifier::{classify_directional, NormalizedTrade, TradeSide};
use crate::ledger::PositionLedger;
use crate::related_wallets::RelatedWalletRecord;
use crate::sources::TokenPrice;
use crate::transaction::{RawTransaction, SOL_MINT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountingMode {
    #[default]
    Strict,
    Simple,
}

/// The output record consumed by the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    #[serde(rename = "totalPnL")]
    pub total_pnl: f64,
    pub win_rate: f64,
    pub winners: u32,
    pub losers: u32,
    pub total_trades: u32,
    pub total_volume: f64,
    pub best_performer: Option<BestPerformer>,
    pub positions: Vec<PositionSummary>,
    pub pnl_history: Vec<PnlPoint>,
    pub related_wallets: Vec<RelatedWalletRecord>,
    /// Native balance in SOL, when the balance source is available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<f64>,
}

impl PortfolioSummary {
    /// Zero-valued summary: the legitimate result for a wallet with no
    /// classifiable activity in the window.
    pub fn empty() -> Self {
        Self {
            total_pnl: 0.0,
            win_rate: 0.0,
            winners: 0,
            losers: 0,
            total_trades: 0,
            total_volume: 0.0,
            best_performer: None,
            positions: Vec::new(),
            pnl_history: Vec::new(),
            related_wallets: Vec::new(),
            balance: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BestPerformer {
    pub symbol: String,
    #[serde(rename = "realizedPnL")]
    pub pnl: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSummary {
    pub symbol: String,
    pub mint: String,
    pub trades: u32,
    pub avg_entry: f64,
    pub avg_exit: f64,
    pub volume: f64,
    pub pnl: f64,
    pub roi: f64,
}

/// One point of the cumulative P&L timeline. Timestamps are milliseconds,
/// matching what the chart layer consumes.
#[derive(Debug, Clone, Serialize)]
pub struct PnlPoint {
    pub timestamp: i64,
    pub pnl: f64,
}

/// Strict-mode aggregation over an already time-filtered transaction set.
/// Realized P&L only; anomalous records classify to `None` and are skipped,
/// never aborting the batch.
pub fn aggregate_strict(transactions: &[RawTransaction], wallet: &str) -> PortfolioSummary {
    let mut swaps: Vec<_> = transactions
        .iter()
        .filter_map(|tx| classify_directional(tx, wallet))
        .collect();

    // Chronological application is required for weighted-average cost
    // basis and gives the timeline its monotonic ordering.
    swaps.sort_by_key(|s| s.timestamp);

    debug!(
        "Strict aggregation: {} swaps from {} transactions",
        swaps.len(),
        transactions.len()
    );

    let mut ledger = PositionLedger::new();
    let mut history = Vec::with_capacity(swaps.len());

    for swap in &swaps {
        let position = ledger.position_mut(&swap.mint, &swap.symbol);
        match swap.side {
            TradeSide::Buy => position.buy(
                swap.amount,
                swap.price_per_token,
                swap.timestamp,
                &swap.signature,
            ),
            TradeSide::Sell => position.sell(
                swap.amount,
                swap.price_per_token,
                swap.timestamp,
                &swap.signature,
            ),
        }
        history.push(PnlPoint {
            timestamp: swap.timestamp * 1000,
            pnl: ledger.realized_total(),
        });
    }

    let positions: Vec<PositionSummary> = ledger
        .into_positions()
        .into_iter()
        .map(|p| PositionSummary {
            symbol: p.symbol.clone(),
            mint: p.mint.clone(),
            trades: p.trades.len() as u32,
            avg_entry: p.avg_entry_price(),
            avg_exit: p.avg_exit_price(),
            volume: p.volume(),
            pnl: p.realized_pnl,
            roi: p.roi(),
        })
        .collect();

    finish_summary(positions, swaps.len() as u32, history)
}

/// Simple-mode aggregation over normalized trades plus a current-price map.
/// Values are approximated from the SOL side of each trade; `sol_fallback`
/// is used when the price feed had no SOL quote.
pub fn aggregate_simple(
    trades: &[NormalizedTrade],
    prices: &HashMap<String, TokenPrice>,
    sol_fallback: f64,
) -> PortfolioSummary {
    let sol_price = prices
        .get(SOL_MINT)
        .map(|p| p.price)
        .unwrap_or(sol_fallback);

    struct TokenStats {
        symbol: String,
        mint: String,
        trades: u32,
        total_bought: f64,
        total_sold: f64,
        cost_basis: f64,
        realized_gain: f64,
        volume: f64,
    }

    let mut stats: HashMap<String, TokenStats> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for trade in trades {
        let sol_in =
            trade.token_in.symbol == "SOL" || trade.token_in.mint == SOL_MINT;
        let target = if sol_in {
            &trade.token_out
        } else {
            &trade.token_in
        };

        let entry = stats.entry(target.mint.clone()).or_insert_with(|| {
            order.push(target.mint.clone());
            TokenStats {
                symbol: target.symbol.clone(),
                mint: target.mint.clone(),
                trades: 0,
                total_bought: 0.0,
                total_sold: 0.0,
                cost_basis: 0.0,
                realized_gain: 0.0,
                volume: 0.0,
            }
        });
        entry.trades += 1;

        if sol_in {
            // Bought the target token with SOL.
            let usd_value = trade.token_in.amount * sol_price;
            entry.total_bought += target.amount;
            entry.cost_basis += usd_value;
            entry.volume += usd_value;
        } else {
            // Sold the target token.
            let usd_value = trade.token_out.amount * sol_price;
            entry.total_sold += target.amount;
            entry.realized_gain += usd_value;
            entry.volume += usd_value;
        }
    }

    let positions: Vec<PositionSummary> = order
        .iter()
        .filter_map(|mint| stats.remove(mint))
        .map(|s| {
            let current_price = prices.get(&s.mint).map(|p| p.price).unwrap_or(0.0);
            let unrealized_value = (s.total_bought - s.total_sold) * current_price;
            let pnl = s.realized_gain + unrealized_value - s.cost_basis;
            PositionSummary {
                symbol: s.symbol,
                mint: s.mint,
                trades: s.trades,
                avg_entry: if s.total_bought > 0.0 {
                    s.cost_basis / s.total_bought
                } else {
                    0.0
                },
                avg_exit: if s.total_sold > 0.0 {
                    s.realized_gain / s.total_sold
                } else {
                    0.0
                },
                volume: s.volume,
                pnl,
                roi: if s.cost_basis > 0.0 {
                    pnl / s.cost_basis * 100.0
                } else {
                    0.0
                },
            }
        })
        .collect();

    let total_pnl: f64 = positions.iter().map(|p| p.pnl).sum();
    let history = spread_timeline(trades, total_pnl);

    finish_summary(positions, trades.len() as u32, history)
}

/// Evenly spread the final total across trades, sorted ascending by
/// timestamp. An explicit approximation: without per-trade P&L the curve
/// shape is synthetic, only the endpoint is real.
fn spread_timeline(trades: &[NormalizedTrade], total_pnl: f64) -> Vec<PnlPoint> {
    if trades.is_empty() {
        return Vec::new();
    }

    let mut timestamps: Vec<i64> = trades.iter().map(|t| t.timestamp).collect();
    timestamps.sort_unstable();

    let step = total_pnl / trades.len() as f64;
    let mut cumulative = 0.0;
    timestamps
        .into_iter()
        .map(|ts| {
            cumulative += step;
            PnlPoint {
                timestamp: ts * 1000,
                pnl: cumulative,
            }
        })
        .collect()
}

fn finish_summary(
    mut positions: Vec<PositionSummary>,
    total_trades: u32,
    history: Vec<PnlPoint>,
) -> PortfolioSummary {
    let total_pnl: f64 = positions.iter().map(|p| p.pnl).sum();
    let winners = positions.iter().filter(|p| p.pnl > 0.0).count() as u32;
    let losers = positions.iter().filter(|p| p.pnl < 0.0).count() as u32;
    let decided = winners + losers;
    let win_rate = if decided > 0 {
        winners as f64 / decided as f64 * 100.0
    } else {
        0.0
    };
    let total_volume: f64 = positions.iter().map(|p| p.volume).sum();

    // Stable sort: insertion-order ties stay deterministic.
    positions.sort_by(|a, b| b.pnl.partial_cmp(&a.pnl).unwrap_or(Ordering::Equal));

    let best_performer = positions.first().map(|p| BestPerformer {
        symbol: p.symbol.clone(),
        pnl: p.pnl,
    });

    PortfolioSummary {
        total_pnl,
        win_rate,
        winners,
        losers,
        total_trades,
        total_volume,
        best_performer,
        positions,
        pnl_history: history,
        related_wallets: Vec::new(),
        balance: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::TradeLeg;
    use crate::transaction::{TokenTransfer, USDC_MINT};

    const WALLET: &str = "GBJ4MZe8fqpA6UVgjh19BwJPMb79KDfMv78XnFVxgH2Q";
    const BONK: &str = "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263";
    const WIF: &str = "EKpQGSJtjMFqKZ9KQanSqYXRcF8fBopzLHYxdM65zcjm";

    fn swap_tx(
        signature: &str,
        timestamp: i64,
        from: (&str, &str, f64),
        to: (&str, &str, f64),
    ) -> RawTransaction {
        let transfer = |(from, mint, amount): (&str, &str, f64), to: &str| TokenTransfer {
            from_user_account: from.to_string(),
            to_user_account: to.to_string(),
            mint: mint.to_string(),
            token_amount: amount,
            token_symbol: None,
        };
        RawTransaction {
            signature: signature.to_string(),
            timestamp: Some(timestamp),
            transaction_type: "SWAP".to_string(),
            source: "JUPITER".to_string(),
            description: String::new(),
            fee: 5000,
            fee_payer: WALLET.to_string(),
            token_transfers: vec![
                transfer((from.0, from.1, from.2), "pool"),
                transfer(("pool", to.1, to.2), to.0),
            ],
            native_transfers: vec![],
            account_data: vec![],
            events: None,
            transaction_error: None,
        }
    }

    fn buy(signature: &str, timestamp: i64, mint: &str, amount: f64, usdc: f64) -> RawTransaction {
        swap_tx(
            signature,
            timestamp,
            (WALLET, USDC_MINT, usdc),
            (WALLET, mint, amount),
        )
    }

    fn sell(signature: &str, timestamp: i64, mint: &str, amount: f64, usdc: f64) -> RawTransaction {
        swap_tx(
            signature,
            timestamp,
            (WALLET, mint, amount),
            (WALLET, USDC_MINT, usdc),
        )
    }

    #[test]
    fn strict_empty_input_yields_zero_summary() {
        let summary = aggregate_strict(&[], WALLET);
        assert_eq!(summary.total_trades, 0);
        assert_eq!(summary.total_pnl, 0.0);
        assert_eq!(summary.win_rate, 0.0);
        assert!(summary.positions.is_empty());
        assert!(summary.pnl_history.is_empty());
        assert!(summary.best_performer.is_none());
    }

    #[test]
    fn strict_weighted_average_example() {
        // buy 100 @ $1, buy 100 @ $3, sell 150 @ $4.
        let txs = vec![
            buy("s1", 100, BONK, 100.0, 100.0),
            buy("s2", 200, BONK, 100.0, 300.0),
            sell("s3", 300, BONK, 150.0, 600.0),
        ];

        let summary = aggregate_strict(&txs, WALLET);
        assert_eq!(summary.total_trades, 3);
        assert!((summary.total_pnl - 300.0).abs() < 1e-9);

        let pos = &summary.positions[0];
        assert!((pos.avg_entry - 2.0).abs() < 1e-9);
        assert!((pos.avg_exit - 4.0).abs() < 1e-9);
        assert!((pos.roi - 75.0).abs() < 1e-9);
        assert!((pos.volume - 1000.0).abs() < 1e-9);

        assert_eq!(summary.winners, 1);
        assert_eq!(summary.losers, 0);
        assert!((summary.win_rate - 100.0).abs() < 1e-9);
    }

    #[test]
    fn strict_history_is_cumulative_and_ascending() {
        // Deliberately out of order: timeline must still come out sorted.
        let txs = vec![
            sell("s3", 300, BONK, 50.0, 200.0),
            buy("s1", 100, BONK, 100.0, 100.0),
        ];

        let summary = aggregate_strict(&txs, WALLET);
        assert_eq!(summary.pnl_history.len(), 2);
        assert_eq!(summary.pnl_history[0].timestamp, 100 * 1000);
        assert_eq!(summary.pnl_history[1].timestamp, 300 * 1000);
        // buy realizes nothing; sell 50 @ 4 with avg cost 1 realizes 150.
        assert!((summary.pnl_history[0].pnl - 0.0).abs() < 1e-9);
        assert!((summary.pnl_history[1].pnl - 150.0).abs() < 1e-9);
    }

    #[test]
    fn strict_ranks_tokens_by_pnl_descending() {
        let txs = vec![
            buy("s1", 100, BONK, 100.0, 100.0),
            sell("s2", 200, BONK, 100.0, 150.0), // +50
            buy("s3", 300, WIF, 100.0, 100.0),
            sell("s4", 400, WIF, 100.0, 400.0), // +300
        ];

        let summary = aggregate_strict(&txs, WALLET);
        assert_eq!(summary.positions[0].mint, WIF);
        assert_eq!(summary.positions[1].mint, BONK);
        assert_eq!(summary.best_performer.as_ref().unwrap().pnl, 300.0);
        assert_eq!(summary.winners, 2);
    }

    #[test]
    fn win_rate_with_no_decided_positions_is_zero() {
        // A single buy: pnl == 0, neither winner nor loser.
        let txs = vec![buy("s1", 100, BONK, 100.0, 100.0)];
        let summary = aggregate_strict(&txs, WALLET);
        assert_eq!(summary.winners, 0);
        assert_eq!(summary.losers, 0);
        assert_eq!(summary.win_rate, 0.0);
        assert!(summary.win_rate.is_finite());
    }

    #[test]
    fn strict_skips_unclassifiable_records() {
        let mut broken = buy("s1", 100, BONK, 100.0, 100.0);
        broken.token_transfers.clear();
        let txs = vec![broken, buy("s2", 200, BONK, 10.0, 20.0)];

        let summary = aggregate_strict(&txs, WALLET);
        assert_eq!(summary.total_trades, 1);
    }

    fn simple_trade(signature: &str, timestamp: i64, sol_in: bool) -> NormalizedTrade {
        let sol = TradeLeg {
            mint: SOL_MINT.to_string(),
            symbol: "SOL".to_string(),
            amount: 2.0,
        };
        let bonk = TradeLeg {
            mint: BONK.to_string(),
            symbol: "BONK".to_string(),
            amount: 1000.0,
        };
        let (token_in, token_out) = if sol_in {
            (sol, bonk)
        } else {
            (bonk, sol)
        };
        NormalizedTrade {
            signature: signature.to_string(),
            timestamp,
            token_in,
            token_out,
            fee: 5000,
            success: true,
        }
    }

    #[test]
    fn simple_mode_uses_fallback_sol_price_when_feed_is_empty() {
        let trades = vec![simple_trade("s1", 100, true)];
        let summary = aggregate_simple(&trades, &HashMap::new(), 100.0);

        // 2 SOL * $100 fallback spent; no current price -> unrealized 0.
        let pos = &summary.positions[0];
        assert!((pos.volume - 200.0).abs() < 1e-9);
        assert!((pos.pnl - -200.0).abs() < 1e-9);
    }

    #[test]
    fn simple_mode_marks_holdings_to_market() {
        let mut prices = HashMap::new();
        prices.insert(SOL_MINT.to_string(), TokenPrice { price: 150.0 });
        prices.insert(BONK.to_string(), TokenPrice { price: 0.5 });

        // Buy 1000 BONK for 2 SOL ($300), still held at $0.50 each.
        let trades = vec![simple_trade("s1", 100, true)];
        let summary = aggregate_simple(&trades, &prices, 100.0);

        let pos = &summary.positions[0];
        assert!((pos.pnl - (1000.0 * 0.5 - 300.0)).abs() < 1e-9);
        assert!((summary.total_pnl - 200.0).abs() < 1e-9);
    }

    #[test]
    fn simple_timeline_spreads_total_evenly() {
        let mut prices = HashMap::new();
        prices.insert(SOL_MINT.to_string(), TokenPrice { price: 100.0 });

        let trades = vec![
            simple_trade("s1", 300, false),
            simple_trade("s2", 100, true),
        ];
        let summary = aggregate_simple(&trades, &prices, 100.0);

        assert_eq!(summary.pnl_history.len(), 2);
        assert_eq!(summary.pnl_history[0].timestamp, 100 * 1000);
        assert_eq!(summary.pnl_history[1].timestamp, 300 * 1000);
        let step = summary.total_pnl / 2.0;
        assert!((summary.pnl_history[0].pnl - step).abs() < 1e-9);
        assert!((summary.pnl_history[1].pnl - summary.total_pnl).abs() < 1e-9);
    }

    #[test]
    fn simple_mode_empty_trades_yield_zero_summary() {
        let summary = aggregate_simple(&[], &HashMap::new(), 100.0);
        assert_eq!(summary.total_trades, 0);
        assert!(summary.positions.is_empty());
        assert!(summary.pnl_history.is_empty());
    }
}
