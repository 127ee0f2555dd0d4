//! Wire model for Helius enhanced transactions.
//!
//! Every collection field defaults to empty and the timestamp is optional:
//! the API omits fields freely depending on transaction type, and a record
//! that fails to carry a field must degrade, never abort the batch.

use serde::{Deserialize, Serialize};

/// Canonical wrapped-SOL mint address.
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";
/// USDC mint address.
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
/// USDT mint address.
pub const USDT_MINT: &str = "Es9vMFrzaCERmJfrF4H2FYD4KCoNkY11McCe8BenwNYB";

pub const LAMPORTS_PER_SOL: f64 = 1_000_000_000.0;

/// Placeholder symbol for tokens whose symbol cannot be resolved.
pub const UNKNOWN_SYMBOL: &str = "UNKNOWN";

/// Base currencies: the native token plus designated stables. Whichever side
/// of a transfer pair is NOT in this set is the target token being tracked.
pub fn is_base_token(mint: &str) -> bool {
    matches!(mint, SOL_MINT | USDC_MINT | USDT_MINT)
}

pub fn base_token_symbol(mint: &str) -> Option<&'static str> {
    match mint {
        SOL_MINT => Some("SOL"),
        USDC_MINT => Some("USDC"),
        USDT_MINT => Some("USDT"),
        _ => None,
    }
}

/// One enhanced transaction as returned by the Helius
/// `/v0/addresses/{address}/transactions` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub signature: String,

    /// Block time in epoch seconds. Absent for some unconfirmed records.
    #[serde(default)]
    pub timestamp: Option<i64>,

    #[serde(rename = "type", default)]
    pub transaction_type: String,

    /// DEX / program source label (JUPITER, RAYDIUM, ...).
    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub description: String,

    /// Transaction fee in lamports.
    #[serde(default)]
    pub fee: u64,

    #[serde(default)]
    pub fee_payer: String,

    #[serde(default)]
    pub token_transfers: Vec<TokenTransfer>,

    #[serde(default)]
    pub native_transfers: Vec<NativeTransfer>,

    #[serde(default)]
    pub account_data: Vec<AccountData>,

    /// Pre-parsed event substructure (present when Helius already
    /// classified the transaction, e.g. a SWAP).
    #[serde(default)]
    pub events: Option<TransactionEvents>,

    #[serde(default)]
    pub transaction_error: Option<TransactionError>,
}

impl RawTransaction {
    pub fn succeeded(&self) -> bool {
        self.transaction_error.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    #[serde(default)]
    pub from_user_account: String,
    #[serde(default)]
    pub to_user_account: String,
    pub mint: String,
    /// UI amount (already scaled by token decimals).
    #[serde(default)]
    pub token_amount: f64,
    #[serde(default)]
    pub token_symbol: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeTransfer {
    #[serde(default)]
    pub from_user_account: String,
    #[serde(default)]
    pub to_user_account: String,
    /// Lamports.
    #[serde(default)]
    pub amount: u64,
}

/// Per-account balance deltas for one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountData {
    pub account: String,
    /// Native balance delta in lamports (signed).
    #[serde(default)]
    pub native_balance_change: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionEvents {
    #[serde(default)]
    pub swap: Option<SwapEvent>,
}

/// Swap legs as pre-parsed by Helius. Native legs carry lamport amounts as
/// strings; token legs carry raw amounts plus decimals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapEvent {
    #[serde(default)]
    pub native_input: Option<NativeSwapLeg>,
    #[serde(default)]
    pub native_output: Option<NativeSwapLeg>,
    #[serde(default)]
    pub token_inputs: Vec<TokenSwapLeg>,
    #[serde(default)]
    pub token_outputs: Vec<TokenSwapLeg>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NativeSwapLeg {
    #[serde(default)]
    pub account: String,
    /// Lamports, as a decimal string.
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSwapLeg {
    #[serde(default)]
    pub user_account: String,
    pub mint: String,
    pub raw_token_amount: RawTokenAmount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTokenAmount {
    /// Raw integer amount as a string; can be negative.
    pub token_amount: String,
    pub decimals: u8,
}

impl RawTokenAmount {
    /// UI amount scaled by decimals; None when the raw string is malformed.
    pub fn ui_amount(&self) -> Option<f64> {
        let raw: f64 = self.token_amount.parse().ok()?;
        Some(raw / 10f64.powi(self.decimals as i32))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionError {
    #[serde(default)]
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_enhanced_transaction_fixture() {
        let json = r#"
        {
            "signature": "58Y6ScVvkFutzKp57dX5xfLfxvw6e9pMYeK5vBbAb3fW",
            "timestamp": 1751414738,
            "type": "SWAP",
            "source": "JUPITER",
            "description": "wallet swapped 1.5 SOL for 1000 BONK",
            "fee": 5000,
            "feePayer": "GBJ4MZe8fqpA6UVgjh19BwJPMb79KDfMv78XnFVxgH2Q",
            "tokenTransfers": [
                {
                    "fromUserAccount": "GBJ4MZe8fqpA6UVgjh19BwJPMb79KDfMv78XnFVxgH2Q",
                    "toUserAccount": "pool",
                    "mint": "So11111111111111111111111111111111111111112",
                    "tokenAmount": 1.5
                }
            ],
            "accountData": [
                {"account": "abc", "nativeBalanceChange": -1500000000}
            ],
            "events": {
                "swap": {
                    "nativeInput": {"account": "GBJ4", "amount": "1500000000"},
                    "tokenOutputs": [
                        {
                            "userAccount": "GBJ4",
                            "mint": "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263",
                            "rawTokenAmount": {"tokenAmount": "100000000", "decimals": 5}
                        }
                    ]
                }
            }
        }"#;

        let tx: RawTransaction = serde_json::from_str(json).unwrap();
        assert_eq!(tx.transaction_type, "SWAP");
        assert_eq!(tx.timestamp, Some(1751414738));
        assert!(tx.succeeded());
        assert_eq!(tx.token_transfers.len(), 1);
        assert_eq!(tx.account_data[0].native_balance_change, -1_500_000_000);

        let swap = tx.events.unwrap().swap.unwrap();
        assert_eq!(swap.native_input.unwrap().amount, "1500000000");
        let out = &swap.token_outputs[0];
        assert_eq!(out.raw_token_amount.ui_amount(), Some(1000.0));
    }

    #[test]
    fn tolerates_sparse_records() {
        // Minimal record: only a signature. Everything else defaults.
        let tx: RawTransaction = serde_json::from_str(r#"{"signature": "abc"}"#).unwrap();
        assert!(tx.timestamp.is_none());
        assert!(tx.token_transfers.is_empty());
        assert!(tx.native_transfers.is_empty());
        assert!(tx.events.is_none());
        assert!(tx.succeeded());
    }

    #[test]
    fn base_token_set() {
        assert!(is_base_token(SOL_MINT));
        assert!(is_base_token(USDC_MINT));
        assert!(is_base_token(USDT_MINT));
        assert!(!is_base_token("DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263"));
        assert_eq!(base_token_symbol(SOL_MINT), Some("SOL"));
        assert_eq!(base_token_symbol("other"), None);
    }
}
