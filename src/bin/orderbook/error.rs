//! Error types for the order book CLI.

use orderbook_sdk::error::DexError;

use crate::config::ConfigError;

/// Main error type for the order book CLI.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Environment configuration error: {0}")]
    EnvConfig(#[from] envy::Error),

    #[error("Alloy signer error: {0}")]
    AlloySigner(#[from] alloy::signers::local::LocalSignerError),

    #[error("Order book SDK error: {0}")]
    Dex(#[from] DexError),

    #[error("Invalid RPC URL: {0}")]
    InvalidRpcUrl(#[from] url::ParseError),

    #[error("Invalid address: {0}")]
    InvalidAddress(#[from] alloy::primitives::hex::FromHexError),

    #[error("PRIVATE_KEY is required to place orders")]
    MissingPrivateKey,

    #[error("Order stream closed unexpectedly")]
    StreamClosed,
}

pub type Result<T> = std::result::Result<T, Error>;
