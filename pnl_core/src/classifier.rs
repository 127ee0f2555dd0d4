//! Trade classification: one raw transaction in, at most one trade out.
//!
//! Two independent modes exist because the two aggregation paths need
//! different shapes. `classify_swap` produces a two-legged
//! [`NormalizedTrade`] for the interactive path; `classify_directional`
//! resolves an explicit buy/sell against the base-currency set for the
//! strict accounting path. Both are pure functions and both return `None`
//! instead of failing on partial records.

use serde::Serialize;

use crate::transaction::{
    base_token_symbol, is_base_token, RawTransaction, TokenTransfer, LAMPORTS_PER_SOL, SOL_MINT,
    UNKNOWN_SYMBOL,
};

/// One side of a normalized swap. Amounts are unsigned magnitudes;
/// direction is carried by which field of the trade the leg sits in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TradeLeg {
    pub mint: String,
    pub symbol: String,
    pub amount: f64,
}

/// A swap normalized relative to the analyzed wallet. `token_in` is the leg
/// the wallet paid into the swap; `token_out` is the leg it received.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedTrade {
    pub signature: String,
    pub timestamp: i64,
    pub token_in: TradeLeg,
    pub token_out: TradeLeg,
    /// Fee in lamports.
    pub fee: u64,
    pub success: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TradeSide {
    Buy,
    Sell,
}

/// Strict-mode classification: a buy or sell of a target (non-base) token,
/// priced from the base-currency leg of the same transaction.
#[derive(Debug, Clone)]
pub struct DirectionalSwap {
    pub signature: String,
    pub timestamp: i64,
    pub side: TradeSide,
    pub mint: String,
    pub symbol: String,
    /// Target-token amount.
    pub amount: f64,
    /// Base-currency amount on the other side of the swap.
    pub base_amount: f64,
    /// base_amount / amount.
    pub price_per_token: f64,
}

/// Classify a transaction as a swap, preferring the pre-parsed swap event
/// and falling back to manual transfer matching for transactions that are
/// marked as swaps by type or description.
pub fn classify_swap(tx: &RawTransaction, wallet: &str) -> Option<NormalizedTrade> {
    if let Some(swap) = tx.events.as_ref().and_then(|e| e.swap.as_ref()) {
        if let Some(trade) = trade_from_swap_event(tx, swap) {
            return Some(trade);
        }
        // A swap event with unresolvable legs falls through to the manual
        // path rather than classifying a half-trade.
    }

    let marked_as_swap =
        tx.transaction_type == "SWAP" || tx.description.to_lowercase().contains("swap");
    if !marked_as_swap {
        return None;
    }

    let token_in = leg_sent_by(tx, wallet)?;
    let token_out = leg_received_by(tx, wallet)?;

    Some(NormalizedTrade {
        signature: tx.signature.clone(),
        timestamp: tx.timestamp.unwrap_or(0),
        token_in,
        token_out,
        fee: tx.fee,
        success: tx.succeeded(),
    })
}

fn trade_from_swap_event(
    tx: &RawTransaction,
    swap: &crate::transaction::SwapEvent,
) -> Option<NormalizedTrade> {
    let token_in = match &swap.native_input {
        Some(native) => native_leg(&native.amount)?,
        None => token_leg_from_event(swap.token_inputs.first()?)?,
    };
    let token_out = match &swap.native_output {
        Some(native) => native_leg(&native.amount)?,
        None => token_leg_from_event(swap.token_outputs.first()?)?,
    };

    Some(NormalizedTrade {
        signature: tx.signature.clone(),
        timestamp: tx.timestamp.unwrap_or(0),
        token_in,
        token_out,
        fee: tx.fee,
        success: tx.succeeded(),
    })
}

/// Native swap-event legs carry lamports as strings; scale to whole SOL.
fn native_leg(lamports: &str) -> Option<TradeLeg> {
    let raw: f64 = lamports.parse().ok()?;
    Some(TradeLeg {
        mint: SOL_MINT.to_string(),
        symbol: "SOL".to_string(),
        amount: raw.abs() / LAMPORTS_PER_SOL,
    })
}

fn token_leg_from_event(leg: &crate::transaction::TokenSwapLeg) -> Option<TradeLeg> {
    let amount = leg.raw_token_amount.ui_amount()?;
    Some(TradeLeg {
        mint: leg.mint.clone(),
        symbol: base_token_symbol(&leg.mint)
            .unwrap_or(UNKNOWN_SYMBOL)
            .to_string(),
        amount: amount.abs(),
    })
}

fn leg_sent_by(tx: &RawTransaction, wallet: &str) -> Option<TradeLeg> {
    if let Some(transfer) = tx
        .token_transfers
        .iter()
        .find(|t| t.from_user_account == wallet && t.to_user_account != wallet && t.token_amount > 0.0)
    {
        return Some(token_transfer_leg(transfer));
    }
    tx.native_transfers
        .iter()
        .find(|t| t.from_user_account == wallet && t.to_user_account != wallet && t.amount > 0)
        .map(|t| sol_leg(t.amount))
}

fn leg_received_by(tx: &RawTransaction, wallet: &str) -> Option<TradeLeg> {
    if let Some(transfer) = tx
        .token_transfers
        .iter()
        .find(|t| t.to_user_account == wallet && t.from_user_account != wallet && t.token_amount > 0.0)
    {
        return Some(token_transfer_leg(transfer));
    }
    tx.native_transfers
        .iter()
        .find(|t| t.to_user_account == wallet && t.from_user_account != wallet && t.amount > 0)
        .map(|t| sol_leg(t.amount))
}

fn token_transfer_leg(transfer: &TokenTransfer) -> TradeLeg {
    let symbol = transfer
        .token_symbol
        .clone()
        .or_else(|| base_token_symbol(&transfer.mint).map(str::to_string))
        .unwrap_or_else(|| UNKNOWN_SYMBOL.to_string());
    TradeLeg {
        mint: transfer.mint.clone(),
        symbol,
        amount: transfer.token_amount.abs(),
    }
}

fn sol_leg(lamports: u64) -> TradeLeg {
    TradeLeg {
        mint: SOL_MINT.to_string(),
        symbol: "SOL".to_string(),
        amount: lamports as f64 / LAMPORTS_PER_SOL,
    }
}

/// Strict-mode classification. Requires one token-transfer leg in the base
/// set and one outside it: base flowing out of the wallet is a buy of the
/// target token, base flowing in is a sell.
pub fn classify_directional(tx: &RawTransaction, wallet: &str) -> Option<DirectionalSwap> {
    let transfers = &tx.token_transfers;

    let base_out = transfers
        .iter()
        .find(|t| t.from_user_account == wallet && is_base_token(&t.mint) && t.token_amount > 0.0);
    let base_in = transfers
        .iter()
        .find(|t| t.to_user_account == wallet && is_base_token(&t.mint) && t.token_amount > 0.0);

    let (side, base, target) = if let Some(base) = base_out {
        let target = transfers.iter().find(|t| {
            t.to_user_account == wallet && !is_base_token(&t.mint) && t.token_amount > 0.0
        })?;
        (TradeSide::Buy, base, target)
    } else if let Some(base) = base_in {
        let target = transfers.iter().find(|t| {
            t.from_user_account == wallet && !is_base_token(&t.mint) && t.token_amount > 0.0
        })?;
        (TradeSide::Sell, base, target)
    } else {
        return None;
    };

    let symbol = target
        .token_symbol
        .clone()
        .unwrap_or_else(|| UNKNOWN_SYMBOL.to_string());

    Some(DirectionalSwap {
        signature: tx.signature.clone(),
        timestamp: tx.timestamp.unwrap_or(0),
        side,
        mint: target.mint.clone(),
        symbol,
        amount: target.token_amount,
        base_amount: base.token_amount,
        price_per_token: base.token_amount / target.token_amount,
    })
}
