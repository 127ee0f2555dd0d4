use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] ConfigError),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

pub type Result<T> = std::result::Result<T, ConfigurationError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    /// General system settings
    pub system: SystemSettings,

    /// Helius API configuration (enhanced transactions and native balances)
    pub helius: HeliusConfig,

    /// Jupiter price API configuration
    pub jupiter: JupiterConfig,

    /// Analysis engine configuration
    pub analysis: AnalysisConfig,

    /// API server configuration
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemSettings {
    /// Enable debug mode
    pub debug_mode: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeliusConfig {
    /// Helius API key
    pub api_key: String,

    /// Helius API base URL
    pub api_base_url: String,

    /// Request timeout in seconds
    pub request_timeout_seconds: u64,

    /// Maximum retry attempts for failed requests
    pub max_retry_attempts: u32,

    /// Rate limit delay between paginated requests in milliseconds
    pub rate_limit_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JupiterConfig {
    /// Jupiter price API base URL
    pub api_base_url: String,

    /// Request timeout in seconds
    pub request_timeout_seconds: u64,

    /// Maximum retry attempts for failed requests
    pub max_retries: u32,

    /// Rate limit delay between requests in milliseconds
    pub rate_limit_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Default analysis timeframe ("24h", "7d", "30d", "all")
    pub default_timeframe: String,

    /// Maximum transactions fetched per wallet
    pub transaction_limit: u32,

    /// Compute P&L for each detected related wallet
    pub enrich_related_wallets: bool,

    /// SOL/USD price used when the price feed is unavailable
    pub sol_fallback_price_usd: f64,

    /// Serve generated demo data instead of calling Helius
    pub use_synthetic_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API server host
    pub host: String,

    /// API server port
    pub port: u16,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            system: SystemSettings { debug_mode: false },
            helius: HeliusConfig {
                api_key: "".to_string(), // Must be set in .env or config file
                api_base_url: "https://api.helius.xyz".to_string(),
                request_timeout_seconds: 30,
                max_retry_attempts: 3,
                rate_limit_delay_ms: 200,
            },
            jupiter: JupiterConfig {
                api_base_url: "https://price.jup.ag".to_string(),
                request_timeout_seconds: 15,
                max_retries: 3,
                rate_limit_delay_ms: 500,
            },
            analysis: AnalysisConfig {
                default_timeframe: "all".to_string(),
                transaction_limit: 1000,
                enrich_related_wallets: true,
                sol_fallback_price_usd: 100.0,
                use_synthetic_data: false,
            },
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
        }
    }
}

impl HeliusConfig {
    /// Validate Helius configuration
    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_seconds == 0 {
            return Err(ConfigurationError::InvalidValue(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl AnalysisConfig {
    /// Validate analysis configuration
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.default_timeframe.as_str(), "24h" | "7d" | "30d" | "all") {
            return Err(ConfigurationError::InvalidValue(format!(
                "Unknown default_timeframe: '{}'",
                self.default_timeframe
            )));
        }

        if self.transaction_limit == 0 {
            return Err(ConfigurationError::InvalidValue(
                "transaction_limit must be greater than 0".to_string(),
            ));
        }

        if self.sol_fallback_price_usd <= 0.0 {
            return Err(ConfigurationError::InvalidValue(
                "sol_fallback_price_usd must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

impl SystemConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let mut config_builder = Config::builder()
            // Start with defaults
            .add_source(Config::try_from(&SystemConfig::default())?);

        // Add config file if it exists
        if config_path.as_ref().exists() {
            info!(
                "Loading configuration from: {}",
                config_path.as_ref().display()
            );
            config_builder = config_builder.add_source(File::from(config_path.as_ref()));
        } else {
            debug!("Config file not found, using defaults and environment variables");
        }

        // Add environment variables with prefix
        config_builder = config_builder.add_source(
            Environment::with_prefix("WALLETSCOPE")
                .try_parsing(true)
                .separator("__"),
        );

        let config = config_builder.build()?;
        let system_config: SystemConfig = config.try_deserialize()?;

        system_config.validate()?;

        Ok(system_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.helius.validate()?;
        self.analysis.validate()?;

        if self.api.port == 0 {
            return Err(ConfigurationError::InvalidValue(
                "API port cannot be 0".to_string(),
            ));
        }

        // A Helius key is only optional when running on synthetic data
        if self.helius.api_key.is_empty() && !self.analysis.use_synthetic_data {
            return Err(ConfigurationError::InvalidValue(
                "Helius API key is required unless analysis.use_synthetic_data is set".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fail_validation_without_an_api_key() {
        let config = SystemConfig::default();
        assert!(config.validate().is_err());
    }

    #[test]
    fn synthetic_mode_does_not_require_an_api_key() {
        let mut config = SystemConfig::default();
        config.analysis.use_synthetic_data = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_default_timeframe() {
        let mut config = SystemConfig::default();
        config.analysis.use_synthetic_data = true;
        config.analysis.default_timeframe = "1h".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_port() {
        let mut config = SystemConfig::default();
        config.analysis.use_synthetic_data = true;
        config.api.port = 0;
        assert!(config.validate().is_err());
    }
}
