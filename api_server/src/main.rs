use anyhow::Context;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use config_manager::{ConfigurationError, SystemConfig};
use data_client::{HeliusClient, JupiterPriceClient, SyntheticSource};
use pnl_core::{
    AnalyzerError, AnalyzerSettings, PriceSource, TransactionSource, WalletAnalyzer,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::info;

mod handlers;
mod types;

use handlers::*;
use types::ErrorResponse;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: SystemConfig,
    pub analyzer: Arc<WalletAnalyzer>,
}

/// Main application error type
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigurationError),
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Analyzer(AnalyzerError::InvalidWallet(_)) => StatusCode::BAD_REQUEST,
            ApiError::Analyzer(AnalyzerError::TimeframeParse(_)) => StatusCode::BAD_REQUEST,
            ApiError::Analyzer(AnalyzerError::NoTransactions) => StatusCode::NOT_FOUND,
            ApiError::Analyzer(AnalyzerError::Upstream(_)) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            error: self.to_string(),
            timestamp: chrono::Utc::now(),
        });

        (status, body).into_response()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,api_server=debug".into()),
        )
        .init();

    info!("Starting wallet analysis API server...");

    let config = SystemConfig::load().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    let analyzer = Arc::new(build_analyzer(&config)?);
    info!("Wallet analyzer initialized");

    let app_state = AppState {
        config: config.clone(),
        analyzer,
    };

    let app = create_router(app_state);

    info!("Available endpoints:");
    info!("   • POST /api/analyze - Full wallet P&L analysis");
    info!("   • GET /health - Health check");

    let bind_addr = format!("{}:{}", config.api.host, config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Server listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Wire the analyzer from configuration. With `use_synthetic_data` set the
/// generator replaces Helius entirely; otherwise Helius is primary and the
/// generator only backs up simple-mode requests.
fn build_analyzer(config: &SystemConfig) -> Result<WalletAnalyzer, ApiError> {
    let settings = AnalyzerSettings {
        transaction_limit: config.analysis.transaction_limit,
        sol_fallback_price: config.analysis.sol_fallback_price_usd,
        enrich_related_wallets: config.analysis.enrich_related_wallets,
        ..AnalyzerSettings::default()
    };

    let price_source: Arc<dyn PriceSource> = Arc::new(
        JupiterPriceClient::new(config.jupiter.clone())
            .map_err(|e| ApiError::Internal(e.to_string()))?,
    );

    if config.analysis.use_synthetic_data {
        info!("Running with synthetic transaction data");
        let source: Arc<dyn TransactionSource> = Arc::new(SyntheticSource::new());
        return Ok(WalletAnalyzer::new(source, price_source, settings));
    }

    let helius = HeliusClient::new(config.helius.clone())
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(
        WalletAnalyzer::new(Arc::new(helius.clone()), price_source, settings)
            .with_balance_source(Arc::new(helius))
            .with_fallback_source(Arc::new(SyntheticSource::new())),
    )
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/analyze", post(analyze_wallet))
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .into_inner(),
        )
        .with_state(state)
}
