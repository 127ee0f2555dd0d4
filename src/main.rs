//! One-shot CLI analysis: `walletscope <wallet> [timeframe] [mode]`.
//! The long-running REST surface lives in the `api_server` binary.

use anyhow::{bail, Context, Result};
use config_manager::SystemConfig;
use data_client::{HeliusClient, JupiterPriceClient, SyntheticSource};
use pnl_core::{
    AccountingMode, AnalyzerSettings, PriceSource, Timeframe, TransactionSource, WalletAnalyzer,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let Some(wallet) = args.get(1) else {
        bail!("Usage: walletscope <wallet-address> [24h|7d|30d|all] [strict|simple]");
    };

    let config = SystemConfig::load().context("Failed to load configuration")?;

    let timeframe = match args.get(2) {
        Some(raw) => raw.parse::<Timeframe>()?,
        None => config
            .analysis
            .default_timeframe
            .parse::<Timeframe>()
            .unwrap_or_default(),
    };
    let mode = match args.get(3).map(String::as_str) {
        Some("simple") => AccountingMode::Simple,
        Some("strict") | None => AccountingMode::Strict,
        Some(other) => bail!("Unknown accounting mode: {other}"),
    };

    let analyzer = build_analyzer(&config)?;
    info!("Analyzing {wallet} over {timeframe}");

    let summary = analyzer.analyze(wallet, timeframe, mode).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

fn build_analyzer(config: &SystemConfig) -> Result<WalletAnalyzer> {
    let settings = AnalyzerSettings {
        transaction_limit: config.analysis.transaction_limit,
        sol_fallback_price: config.analysis.sol_fallback_price_usd,
        enrich_related_wallets: config.analysis.enrich_related_wallets,
        ..AnalyzerSettings::default()
    };

    let price_source: Arc<dyn PriceSource> =
        Arc::new(JupiterPriceClient::new(config.jupiter.clone())?);

    if config.analysis.use_synthetic_data {
        info!("Running with synthetic transaction data");
        let source: Arc<dyn TransactionSource> = Arc::new(SyntheticSource::new());
        return Ok(WalletAnalyzer::new(source, price_source, settings));
    }

    let helius = HeliusClient::new(config.helius.clone())?;
    Ok(
        WalletAnalyzer::new(Arc::new(helius.clone()), price_source, settings)
            .with_balance_source(Arc::new(helius))
            .with_fallback_source(Arc::new(SyntheticSource::new())),
    )
}
