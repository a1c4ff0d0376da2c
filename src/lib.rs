//! Order book client SDK.
//!
//! # Overview
//!
//! Thin client of an on-chain perpetuals order book contract.
//!
//! Use [`types::MarketOrderRequest`] and [`types::LimitOrderRequest`] to
//! describe orders and [`submit::OrderSubmitter`] to send them through a
//! signing provider.
//!
//! Use [`history::fetch`] to load the most recent placed orders in bounded
//! block windows and aggregate them into an order book view, then
//! [`stream::order_placed`] to follow newly placed orders.
//!
//! See `./tests` for examples.
//!
//! # Testing
//!
//! [`testing`] module provides a local Anvil environment with stand-in
//! order book contracts deployed.
//!
//! # Limitations/follow-ups
//!
//! * Order matching, margin accounting and expiration enforcement are done by
//!   the contract, the SDK only observes `OrderPlaced` events.
//!
//! * New orders are followed by log polling, WebSocket subscriptions could
//!   reduce latency.

pub mod abi;
pub mod error;
pub mod history;
pub mod num;
pub mod stream;
pub mod submit;
pub mod testing;
pub mod types;

use alloy::primitives::{Address, address};

/// Chain the order book is operating on.
#[derive(Clone, Debug)]
pub struct Chain {
    chain_id: u64,
    orderbook: Address,
    deployed_at_block: u64,
}

impl Chain {
    /// Anvil dev node with the order book deployed by the first dev account
    /// as its first transaction.
    pub fn local() -> Self {
        Self {
            chain_id: 31337,
            orderbook: address!("0x5FbDB2315678afecb367f032d93F642f64180aa3"),
            deployed_at_block: 0,
        }
    }

    pub fn custom(chain_id: u64, orderbook: Address, deployed_at_block: u64) -> Self {
        Self {
            chain_id,
            orderbook,
            deployed_at_block,
        }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Address of the order book contract.
    pub fn orderbook(&self) -> Address {
        self.orderbook
    }

    /// First block worth scanning for order book events.
    pub fn deployed_at_block(&self) -> u64 {
        self.deployed_at_block
    }
}
