//! Position ledger: weighted-average cost-basis accounting per token.
//!
//! A ledger is owned by exactly one analysis run; there is no cross-request
//! sharing, so no interior locking. All monetary math is `f64`. A negative
//! `remaining` is legal: it means the queried window missed earlier buys,
//! and downstream readers must cope, not crash.

use serde::Serialize;
use std::collections::HashMap;

use crate::classifier::TradeSide;

/// One entry in a position's trade log, kept for trade counts and audit
/// display.
#[derive(Debug, Clone, Serialize)]
pub struct LoggedTrade {
    pub side: TradeSide,
    pub amount: f64,
    pub price: f64,
    pub timestamp: i64,
    pub signature: String,
}

/// Running accumulator for a single token mint.
#[derive(Debug, Clone)]
pub struct Position {
    pub mint: String,
    pub symbol: String,
    pub total_bought: f64,
    /// Base-currency cost of all buys.
    pub total_spent: f64,
    pub total_sold: f64,
    /// Base-currency proceeds of all sells.
    pub total_received: f64,
    pub remaining: f64,
    pub realized_pnl: f64,
    pub trades: Vec<LoggedTrade>,
}

impl Position {
    pub fn new(mint: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            mint: mint.into(),
            symbol: symbol.into(),
            total_bought: 0.0,
            total_spent: 0.0,
            total_sold: 0.0,
            total_received: 0.0,
            remaining: 0.0,
            realized_pnl: 0.0,
            trades: Vec::new(),
        }
    }

    /// Record a buy. P&L realizes only on sells.
    pub fn buy(&mut self, amount: f64, price_per_unit: f64, timestamp: i64, signature: &str) {
        let cost = amount * price_per_unit;
        self.total_spent += cost;
        self.total_bought += amount;
        self.remaining += amount;
        self.trades.push(LoggedTrade {
            side: TradeSide::Buy,
            amount,
            price: price_per_unit,
            timestamp,
            signature: signature.to_string(),
        });
    }

    /// Record a sell at the weighted-average cost of all prior buys
    /// (not FIFO/LIFO lot matching).
    pub fn sell(&mut self, amount: f64, price_per_unit: f64, timestamp: i64, signature: &str) {
        let avg_cost = if self.total_bought > 0.0 {
            self.total_spent / self.total_bought
        } else {
            0.0
        };
        let revenue = amount * price_per_unit;
        let cost = amount * avg_cost;

        self.realized_pnl += revenue - cost;
        self.total_sold += amount;
        self.total_received += revenue;
        self.remaining -= amount;
        self.trades.push(LoggedTrade {
            side: TradeSide::Sell,
            amount,
            price: price_per_unit,
            timestamp,
            signature: signature.to_string(),
        });
    }

    pub fn avg_entry_price(&self) -> f64 {
        if self.total_bought > 0.0 {
            self.total_spent / self.total_bought
        } else {
            0.0
        }
    }

    pub fn avg_exit_price(&self) -> f64 {
        if self.total_sold > 0.0 {
            self.total_received / self.total_sold
        } else {
            0.0
        }
    }

    pub fn roi(&self) -> f64 {
        if self.total_spent > 0.0 {
            self.realized_pnl / self.total_spent * 100.0
        } else {
            0.0
        }
    }

    /// Buy plus sell notional.
    pub fn volume(&self) -> f64 {
        self.total_spent + self.total_received
    }
}

/// Per-token positions for one analysis run, keyed by mint and remembered
/// in first-seen order so downstream ranking can break ties stably.
#[derive(Debug, Default)]
pub struct PositionLedger {
    positions: HashMap<String, Position>,
    order: Vec<String>,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the position for `mint`, creating it on first sight.
    pub fn position_mut(&mut self, mint: &str, symbol: &str) -> &mut Position {
        self.positions.entry(mint.to_string()).or_insert_with(|| {
            self.order.push(mint.to_string());
            Position::new(mint, symbol)
        })
    }

    pub fn realized_total(&self) -> f64 {
        self.positions.values().map(|p| p.realized_pnl).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Consume the ledger, yielding positions in first-seen order.
    pub fn into_positions(mut self) -> Vec<Position> {
        self.order
            .iter()
            .filter_map(|mint| self.positions.remove(mint))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_average_end_to_end() {
        // buy 100 @ $1, buy 100 @ $3, sell 150 @ $4:
        // avg cost = 400/200 = 2, realized = 600 - 150*2 = 300, roi = 75%.
        let mut pos = Position::new("mintX", "X");
        pos.buy(100.0, 1.0, 1, "s1");
        pos.buy(100.0, 3.0, 2, "s2");
        pos.sell(150.0, 4.0, 3, "s3");

        assert!((pos.realized_pnl - 300.0).abs() < 1e-9);
        assert!((pos.remaining - 50.0).abs() < 1e-9);
        assert!((pos.roi() - 75.0).abs() < 1e-9);
        assert!((pos.avg_entry_price() - 2.0).abs() < 1e-9);
        assert!((pos.avg_exit_price() - 4.0).abs() < 1e-9);
        assert_eq!(pos.trades.len(), 3);
    }

    #[test]
    fn sell_realizes_exactly_revenue_minus_avg_cost() {
        let mut pos = Position::new("mintX", "X");
        pos.buy(10.0, 5.0, 1, "s1");
        pos.buy(30.0, 7.0, 2, "s2");

        let avg_before = pos.total_spent / pos.total_bought;
        let pnl_before = pos.realized_pnl;
        pos.sell(8.0, 9.0, 3, "s3");

        let expected = 8.0 * 9.0 - 8.0 * avg_before;
        assert!((pos.realized_pnl - pnl_before - expected).abs() < 1e-9);
    }

    #[test]
    fn remaining_is_bought_minus_sold_even_when_overselling() {
        let mut pos = Position::new("mintX", "X");
        pos.buy(5.0, 1.0, 1, "s1");
        pos.sell(12.0, 2.0, 2, "s2");
        pos.buy(3.0, 1.5, 3, "s3");

        assert!((pos.remaining - (pos.total_bought - pos.total_sold)).abs() < 1e-12);
        assert!(pos.remaining < 0.0);
    }

    #[test]
    fn sell_without_buys_uses_zero_cost_basis() {
        let mut pos = Position::new("mintX", "X");
        pos.sell(10.0, 2.0, 1, "s1");
        assert!((pos.realized_pnl - 20.0).abs() < 1e-9);
        assert_eq!(pos.avg_entry_price(), 0.0);
        assert_eq!(pos.roi(), 0.0);
    }

    #[test]
    fn ledger_preserves_first_seen_order() {
        let mut ledger = PositionLedger::new();
        ledger.position_mut("b", "B").buy(1.0, 1.0, 1, "s1");
        ledger.position_mut("a", "A").buy(1.0, 1.0, 2, "s2");
        ledger.position_mut("b", "B").sell(1.0, 2.0, 3, "s3");

        let positions = ledger.into_positions();
        let mints: Vec<_> = positions.iter().map(|p| p.mint.as_str()).collect();
        assert_eq!(mints, vec!["b", "a"]);
        assert_eq!(positions[0].trades.len(), 2);
    }

    #[test]
    fn repeat_lookups_reuse_the_same_position() {
        let mut ledger = PositionLedger::new();
        ledger.position_mut("a", "A").buy(1.0, 1.0, 1, "s1");
        ledger.position_mut("a", "A").buy(2.0, 1.0, 2, "s2");

        let positions = ledger.into_positions();
        assert_eq!(positions.len(), 1);
        assert!((positions[0].total_bought - 3.0).abs() < 1e-9);
    }
}
