use chrono::{DateTime, Utc};
use pnl_core::{AccountingMode, Timeframe};
use serde::{Deserialize, Serialize};

/// Standard API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// Standard API success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub data: T,
    pub timestamp: DateTime<Utc>,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Request body for wallet analysis
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub wallet_address: String,
    /// Defaults to the configured timeframe when omitted.
    pub timeframe: Option<Timeframe>,
    /// Defaults to strict accounting when omitted.
    #[serde(default)]
    pub mode: AccountingMode,
}
