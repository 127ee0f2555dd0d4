//! Analysis timeframes: a fixed enumerated window applied before
//! classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{AnalyzerError, Result};
use crate::transaction::RawTransaction;

const DAY_SECONDS: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Timeframe {
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
    #[serde(rename = "30d")]
    Month,
    #[serde(rename = "all")]
    #[default]
    All,
}

impl Timeframe {
    pub fn window_seconds(&self) -> Option<i64> {
        match self {
            Timeframe::Day => Some(DAY_SECONDS),
            Timeframe::Week => Some(7 * DAY_SECONDS),
            Timeframe::Month => Some(30 * DAY_SECONDS),
            Timeframe::All => None,
        }
    }

    /// Inclusive lower bound for transaction timestamps; 0 for `all`.
    pub fn cutoff(&self, now: i64) -> i64 {
        self.window_seconds().map(|w| now - w).unwrap_or(0)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Day => "24h",
            Timeframe::Week => "7d",
            Timeframe::Month => "30d",
            Timeframe::All => "all",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = AnalyzerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "24h" => Ok(Timeframe::Day),
            "7d" => Ok(Timeframe::Week),
            "30d" => Ok(Timeframe::Month),
            "all" => Ok(Timeframe::All),
            other => Err(AnalyzerError::TimeframeParse(format!(
                "Unknown timeframe: {other}"
            ))),
        }
    }
}

/// Keep transactions with `timestamp >= cutoff`. Records without a
/// timestamp count as epoch 0 and survive only under `all`.
pub fn filter_by_timeframe(
    transactions: Vec<RawTransaction>,
    timeframe: Timeframe,
    now: i64,
) -> Vec<RawTransaction> {
    let cutoff = timeframe.cutoff(now);
    transactions
        .into_iter()
        .filter(|tx| tx.timestamp.unwrap_or(0) >= cutoff)
        .collect()
}
