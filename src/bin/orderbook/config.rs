//! Configuration for the order book CLI.
//!
//! Configuration comes from two sources:
//! - Environment variables (via .env file or shell): connection details, keys
//! - CLI arguments: the command and its parameters

use std::time::Duration;

use alloy::primitives::Address;
use clap::{Args, Parser, Subcommand, ValueEnum};
use orderbook_sdk::{
    Chain,
    history::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_ORDERS, HistoryConfig},
    num,
    submit::DEFAULT_TIMEOUT,
    types::{LimitOrderRequest, MarginType, MarketOrderRequest, OrderSide, TimeInForce, TimeUnit},
};

/// Environment configuration (connection details, credentials).
#[derive(Debug, serde::Deserialize)]
pub struct EnvConfig {
    /// Chain ID (e.g., 421614 for Arbitrum Sepolia)
    pub chain_id: u64,

    /// Order book contract address
    pub orderbook_address: String,

    /// Block number when the order book was deployed
    pub deployed_at_block: u64,

    /// RPC URL for the node
    pub node_rpc_url: String,

    /// Private key for signing transactions, required to place orders
    pub private_key: Option<String>,

    /// Optional timeout for transaction inclusion (default: 30s)
    pub timeout_seconds: Option<u64>,
}

impl EnvConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// Parse the order book address.
    pub fn orderbook_address(&self) -> Result<Address, alloy::primitives::hex::FromHexError> {
        self.orderbook_address.parse()
    }

    pub fn chain(&self) -> Result<Chain, alloy::primitives::hex::FromHexError> {
        Ok(Chain::custom(
            self.chain_id,
            self.orderbook_address()?,
            self.deployed_at_block,
        ))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT)
    }
}

#[derive(Debug, Parser)]
#[command(name = "orderbook")]
#[command(about = "Place orders on the order book and watch placed ones")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the most recently placed orders as an order book
    Book(BookArgs),
    /// Place a market order
    Market(OrderArgs),
    /// Place a limit order
    Limit(LimitArgs),
    /// Print orders as they are placed
    Watch {
        /// First block to watch (default: next block)
        #[arg(long)]
        from_block: Option<u64>,
    },
}

#[derive(Debug, Args)]
pub struct BookArgs {
    /// Blocks requested per log query
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    pub chunk_size: u64,

    /// Orders to show
    #[arg(long, default_value_t = DEFAULT_MAX_ORDERS)]
    pub max_orders: usize,

    /// First block to scan (default: order book deployment block)
    #[arg(long)]
    pub from_block: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum SideArg {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum MarginArg {
    #[default]
    Isolated,
    Cross,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
pub enum UnitArg {
    Mins,
    Hours,
    #[default]
    Days,
    Weeks,
}

#[derive(Debug, Args)]
pub struct OrderArgs {
    #[arg(long, value_enum)]
    pub side: SideArg,

    /// Order size in USDC (e.g., 5 or 0.25)
    #[arg(long)]
    pub amount: String,

    /// Leverage multiplier
    #[arg(long, default_value_t = 1)]
    pub leverage: u32,

    #[arg(long, value_enum, default_value = "isolated")]
    pub margin_type: MarginArg,
}

#[derive(Debug, Args)]
pub struct LimitArgs {
    #[command(flatten)]
    pub order: OrderArgs,

    /// Limit price in USDC
    #[arg(long)]
    pub price: String,

    /// Take-profit price, 0 to disable
    #[arg(long, default_value = "0")]
    pub take_profit: String,

    /// Stop-loss price, 0 to disable
    #[arg(long, default_value = "0")]
    pub stop_loss: String,

    /// Time the order rests on the book, in `expires_unit`
    #[arg(long, default_value_t = 28)]
    pub expires_in: u64,

    #[arg(long, value_enum, default_value = "days")]
    pub expires_unit: UnitArg,

    /// Keep the order until cancelled
    #[arg(long, conflicts_with_all = ["expires_in", "expires_unit"])]
    pub gtc: bool,
}

impl BookArgs {
    pub fn to_history_config(&self) -> Result<HistoryConfig, ConfigError> {
        let mut config = HistoryConfig::default()
            .with_chunk_size(self.chunk_size)
            .with_max_orders(self.max_orders);
        if let Some(block) = self.from_block {
            config = config.with_from_block(block);
        }
        config
            .validate()
            .map_err(|e| ConfigError::InvalidHistory(e.to_string()))?;
        Ok(config)
    }
}

impl OrderArgs {
    pub fn to_market_request(&self) -> Result<MarketOrderRequest, ConfigError> {
        let amount = num::parse_decimal(&self.amount)
            .map_err(|_| ConfigError::InvalidValue("amount".to_string()))?;
        if amount == fastnum::UD128::ZERO {
            return Err(ConfigError::ZeroAmount);
        }
        if self.leverage == 0 {
            return Err(ConfigError::ZeroLeverage);
        }
        Ok(MarketOrderRequest::new(
            self.side.into(),
            amount,
            self.leverage,
            self.margin_type.into(),
        ))
    }
}

impl LimitArgs {
    pub fn to_limit_request(&self) -> Result<LimitOrderRequest, ConfigError> {
        let market = self.order.to_market_request()?;
        let price = |field: &str, value: &str| {
            num::parse_price(value).map_err(|_| ConfigError::InvalidValue(field.to_string()))
        };
        let time_in_force = if self.gtc {
            TimeInForce::GoodTillCancelled
        } else {
            TimeInForce::For(self.expires_in, self.expires_unit.into())
        };

        Ok(LimitOrderRequest::new(
            market.side(),
            price("price", &self.price)?,
            market.amount(),
            self.order.leverage,
            self.order.margin_type.into(),
        )
        .with_take_profit(price("take_profit", &self.take_profit)?)
        .with_stop_loss(price("stop_loss", &self.stop_loss)?)
        .with_time_in_force(time_in_force))
    }
}

impl From<SideArg> for OrderSide {
    fn from(value: SideArg) -> Self {
        match value {
            SideArg::Buy => OrderSide::Buy,
            SideArg::Sell => OrderSide::Sell,
        }
    }
}

impl From<MarginArg> for MarginType {
    fn from(value: MarginArg) -> Self {
        match value {
            MarginArg::Isolated => MarginType::Isolated,
            MarginArg::Cross => MarginType::Cross,
        }
    }
}

impl From<UnitArg> for TimeUnit {
    fn from(value: UnitArg) -> Self {
        match value {
            UnitArg::Mins => TimeUnit::Minutes,
            UnitArg::Hours => TimeUnit::Hours,
            UnitArg::Days => TimeUnit::Days,
            UnitArg::Weeks => TimeUnit::Weeks,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid decimal value for {0}")]
    InvalidValue(String),

    #[error("amount cannot be zero")]
    ZeroAmount,

    #[error("leverage cannot be zero")]
    ZeroLeverage,

    #[error("Invalid history parameters: {0}")]
    InvalidHistory(String),
}
