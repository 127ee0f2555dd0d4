//! Related-wallet detection: counterparties that interact with the target
//! wallet suspiciously often, scored 0-100 from four additive bands.

use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::transaction::{RawTransaction, LAMPORTS_PER_SOL};

const DAY_SECONDS: f64 = 86_400.0;
const MIN_INTERACTIONS: u32 = 2;
const MAX_RELATED_WALLETS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    fn from_score(score: u32) -> Self {
        if score >= 70 {
            RiskLevel::High
        } else if score >= 40 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedWalletRecord {
    pub address: String,
    pub interactions: u32,
    pub sol_transferred: f64,
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub last_seen: i64,
    pub first_seen: i64,
    /// Filled by the enrichment fan-out; 0 when enrichment is disabled or
    /// failed for this wallet.
    pub pnl: f64,
    pub pnl_percent: f64,
}

#[derive(Debug)]
struct Interaction {
    count: u32,
    sol_transferred: f64,
    first_seen: i64,
    last_seen: i64,
}

/// Scan the full (time-unfiltered) transaction set for counterparty
/// addresses in the account-level balance deltas, score them, and return at
/// most the top 10 by descending risk score.
pub fn detect_related_wallets(
    transactions: &[RawTransaction],
    main_wallet: &str,
    now: i64,
) -> Vec<RelatedWalletRecord> {
    let mut interactions: HashMap<String, Interaction> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for tx in transactions {
        let timestamp = tx.timestamp.unwrap_or(0);
        for account in &tx.account_data {
            if account.account.is_empty() || account.account == main_wallet {
                continue;
            }

            let entry = interactions
                .entry(account.account.clone())
                .or_insert_with(|| {
                    order.push(account.account.clone());
                    Interaction {
                        count: 0,
                        sol_transferred: 0.0,
                        first_seen: timestamp,
                        last_seen: timestamp,
                    }
                });

            entry.count += 1;
            entry.sol_transferred +=
                (account.native_balance_change as f64 / LAMPORTS_PER_SOL).abs();
            entry.first_seen = entry.first_seen.min(timestamp);
            entry.last_seen = entry.last_seen.max(timestamp);
        }
    }

    // Iterate in first-seen order so ties in the stable sort below are
    // deterministic.
    let mut records: Vec<RelatedWalletRecord> = order
        .into_iter()
        .filter_map(|address| {
            let data = interactions.remove(&address)?;
            if data.count < MIN_INTERACTIONS {
                return None;
            }
            let score = risk_score(&data, now);
            Some(RelatedWalletRecord {
                address,
                interactions: data.count,
                sol_transferred: data.sol_transferred,
                risk_score: score,
                risk_level: RiskLevel::from_score(score),
                last_seen: data.last_seen,
                first_seen: data.first_seen,
                pnl: 0.0,
                pnl_percent: 0.0,
            })
        })
        .collect();

    records.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
    records.truncate(MAX_RELATED_WALLETS);

    debug!("Detected {} related wallets", records.len());
    records
}

fn risk_score(data: &Interaction, now: i64) -> u32 {
    let mut score = 0u32;

    // Interaction volume (max 40).
    if data.count > 10 {
        score += 40;
    } else if data.count > 5 {
        score += 25;
    } else {
        score += 10;
    }

    // Native transfer volume (max 30).
    if data.sol_transferred > 100.0 {
        score += 30;
    } else if data.sol_transferred > 10.0 {
        score += 20;
    } else {
        score += 10;
    }

    // Recency (max 20).
    let days_since_last = (now - data.last_seen) as f64 / DAY_SECONDS;
    if days_since_last < 1.0 {
        score += 20;
    } else if days_since_last < 7.0 {
        score += 10;
    }

    // Burst frequency over the observed window (max 10).
    let period = data.last_seen - data.first_seen;
    let per_day = if period > 0 {
        data.count as f64 / (period as f64 / DAY_SECONDS)
    } else {
        0.0
    };
    if per_day > 5.0 {
        score += 10;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::AccountData;

    const MAIN: &str = "MainWallet1111111111111111111111111111111111";

    fn tx_with_accounts(timestamp: i64, accounts: Vec<(&str, i64)>) -> RawTransaction {
        RawTransaction {
            signature: format!("sig-{timestamp}"),
            timestamp: Some(timestamp),
            transaction_type: "SWAP".to_string(),
            source: String::new(),
            description: String::new(),
            fee: 0,
            fee_payer: MAIN.to_string(),
            token_transfers: vec![],
            native_transfers: vec![],
            account_data: accounts
                .into_iter()
                .map(|(account, delta)| AccountData {
                    account: account.to_string(),
                    native_balance_change: delta,
                })
                .collect(),
            events: None,
            transaction_error: None,
        }
    }

    fn interaction(count: u32, sol: f64, first: i64, last: i64) -> Interaction {
        Interaction {
            count,
            sol_transferred: sol,
            first_seen: first,
            last_seen: last,
        }
    }

    #[test]
    fn single_interaction_wallets_are_noise() {
        let now = 100 * 86_400;
        let txs = vec![
            tx_with_accounts(now - 10, vec![("walletA", 1_000_000_000)]),
            tx_with_accounts(now - 5, vec![("walletA", -500_000_000), ("walletB", 1)]),
        ];

        let related = detect_related_wallets(&txs, MAIN, now);
        assert_eq!(related.len(), 1);
        assert_eq!(related[0].address, "walletA");
        assert_eq!(related[0].interactions, 2);
        assert!((related[0].sol_transferred - 1.5).abs() < 1e-9);
    }

    #[test]
    fn main_wallet_is_never_its_own_counterparty() {
        let now = 100 * 86_400;
        let txs = vec![
            tx_with_accounts(now - 10, vec![(MAIN, -1_000_000_000)]),
            tx_with_accounts(now - 5, vec![(MAIN, -1_000_000_000)]),
        ];
        assert!(detect_related_wallets(&txs, MAIN, now).is_empty());
    }

    #[test]
    fn score_bands_are_additive() {
        let now = 100 * 86_400;
        // 12 interactions (+40), 150 SOL (+30), seen within a day (+20),
        // burst: 12 interactions over half a day -> 24/day (+10) = 100.
        let data = interaction(12, 150.0, now - 43_200, now - 100);
        assert_eq!(risk_score(&data, now), 100);

        // 3 interactions (+10), 1 SOL (+10), last seen 30 days ago (+0),
        // spread over 20 days (+0) = 20.
        let data = interaction(3, 1.0, now - 50 * 86_400, now - 30 * 86_400);
        assert_eq!(risk_score(&data, now), 20);
    }

    #[test]
    fn score_is_monotonic_in_each_factor() {
        let now = 100 * 86_400;
        let base = interaction(3, 1.0, now - 30 * 86_400, now - 10 * 86_400);
        let base_score = risk_score(&base, now);

        let more_interactions = interaction(11, 1.0, base.first_seen, base.last_seen);
        assert!(risk_score(&more_interactions, now) >= base_score);

        let more_volume = interaction(3, 200.0, base.first_seen, base.last_seen);
        assert!(risk_score(&more_volume, now) >= base_score);

        let more_recent = interaction(3, 1.0, base.first_seen, now - 100);
        assert!(risk_score(&more_recent, now) >= base_score);
    }

    #[test]
    fn risk_levels_follow_thresholds() {
        assert_eq!(RiskLevel::from_score(70), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(69), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(40), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(39), RiskLevel::Low);
    }

    #[test]
    fn results_are_capped_at_ten_and_sorted() {
        let now = 100 * 86_400;
        // 15 counterparties, each with 2+ interactions and varying volume.
        let mut txs = Vec::new();
        for i in 0..15i64 {
            let name = format!("wallet{i:02}");
            let delta = (i + 1) * 20_000_000_000; // 20..300 SOL per hit
            txs.push(tx_with_accounts(now - 10, vec![(name.as_str(), delta)]));
            txs.push(tx_with_accounts(now - 5, vec![(name.as_str(), delta)]));
        }

        let related = detect_related_wallets(&txs, MAIN, now);
        assert_eq!(related.len(), 10);
        for pair in related.windows(2) {
            assert!(pair[0].risk_score >= pair[1].risk_score);
        }
    }
}
