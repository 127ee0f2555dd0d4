use axum::extract::State;
use axum::response::Json;
use tracing::info;

use crate::types::{AnalyzeRequest, HealthResponse, SuccessResponse};
use crate::{ApiError, AppState};
use pnl_core::{PortfolioSummary, Timeframe};

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Run a full wallet analysis and return the portfolio summary.
pub async fn analyze_wallet(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<SuccessResponse<PortfolioSummary>>, ApiError> {
    let timeframe = match request.timeframe {
        Some(timeframe) => timeframe,
        None => state
            .config
            .analysis
            .default_timeframe
            .parse::<Timeframe>()
            .unwrap_or_default(),
    };

    info!(
        "Analysis requested for {} ({timeframe}, {:?})",
        request.wallet_address, request.mode
    );

    let summary = state
        .analyzer
        .analyze(&request.wallet_address, timeframe, request.mode)
        .await?;

    Ok(Json(SuccessResponse::new(summary)))
}
