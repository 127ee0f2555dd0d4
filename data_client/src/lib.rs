//! Concrete data sources behind the `pnl_core` source traits: the Helius
//! enhanced-transaction client, the Jupiter price client, and a synthetic
//! generator for running without API keys.

pub mod helius_client;
pub mod jupiter_client;
pub mod synthetic;

pub use helius_client::{HeliusClient, HeliusError};
pub use jupiter_client::{JupiterError, JupiterPriceClient};
pub use synthetic::SyntheticSource;
