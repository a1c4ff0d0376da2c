//! Local Anvil-based testing environment and test utilities.
//!
//! [`TestOrderbook`] spins up an Anvil instance with two stand-in contracts
//! deployed in place of the order book:
//!
//! * a log emitter, which emits whatever `OrderPlaced` event
//!   [`TestOrderbook::emit`] asks for, so history and stream tests control
//!   the exact order flow;
//! * a contract reverting every call, to exercise failed submissions.
//!
//! [`order_placed`] builds events with decimal values converted to the
//! order book fixed point.

use std::time::Duration;

use alloy::{
    network::TransactionBuilder,
    node_bindings::{Anvil, AnvilInstance},
    primitives::{Address, Bytes, U256, address, hex},
    providers::{DynProvider, Provider, ProviderBuilder, ext::AnvilApi},
    rpc::{client::RpcClient, types::TransactionRequest},
    sol_types::SolEvent,
};
use fastnum::{UD64, UD128};

use crate::{Chain, abi::orderbook::Orderbook::OrderPlaced, num, types::OrderSide};

const CHAIN_ID: u64 = 1337;
const POLL_INTERVAL_MS: u64 = 50;

/// Copies calldata to memory and emits `LOG3` with the first three words as
/// topics and the rest as data.
const LOG_EMITTER_CODE: [u8; 35] = hex!(
    "6017600c60003960176000f3366000600037604051602051600051606036036060a300"
);

/// Reverts every call with empty data.
const REVERTER_CODE: [u8; 17] = hex!("6005600c60003960056000f360006000fd");

/// Asset address put into test events.
pub const TEST_ASSET: Address = address!("0x0000000000000000000000000000000000000e7d");

#[derive(Debug)]
pub struct TestOrderbook {
    pub chain_id: u64,
    pub rpc_url: String,
    pub provider: DynProvider,
    pub orderbook: Address,
    pub reverter: Address,
    pub trader: Address,
    _anvil: AnvilInstance,
}

impl TestOrderbook {
    pub async fn new() -> Self {
        let anvil = Anvil::new().chain_id(CHAIN_ID).try_spawn().unwrap();
        let client = RpcClient::builder().http(anvil.endpoint_url());
        client.set_poll_interval(Duration::from_millis(POLL_INTERVAL_MS));
        let provider = DynProvider::new(
            ProviderBuilder::new()
                .wallet(anvil.wallet().unwrap())
                .connect_client(client),
        );

        let orderbook = deploy(&provider, &LOG_EMITTER_CODE).await;
        let reverter = deploy(&provider, &REVERTER_CODE).await;

        Self {
            chain_id: anvil.chain_id(),
            rpc_url: anvil.endpoint_url().to_string(),
            provider,
            orderbook,
            reverter,
            trader: anvil.addresses()[0],
            _anvil: anvil,
        }
    }

    /// Chain with the log emitter as the order book.
    pub fn chain(&self) -> Chain {
        Chain::custom(self.chain_id, self.orderbook, 0)
    }

    /// Chain with the always reverting contract as the order book.
    pub fn reverting_chain(&self) -> Chain {
        Chain::custom(self.chain_id, self.reverter, 0)
    }

    /// Emits the event from the order book address, returns the block it was
    /// included in.
    pub async fn emit(&self, event: &OrderPlaced) -> u64 {
        let log = event.encode_log_data();
        let mut input = Vec::with_capacity(log.topics().len() * 32 + log.data.len());
        for topic in log.topics() {
            input.extend_from_slice(topic.as_slice());
        }
        input.extend_from_slice(&log.data);

        let receipt = self
            .provider
            .send_transaction(
                TransactionRequest::default()
                    .with_to(self.orderbook)
                    .with_input(Bytes::from(input)),
            )
            .await
            .unwrap()
            .get_receipt()
            .await
            .unwrap();
        assert!(receipt.status());
        receipt.block_number.unwrap()
    }

    /// Mines empty blocks.
    pub async fn mine(&self, blocks: u64) {
        self.provider.anvil_mine(Some(blocks), None).await.unwrap();
    }

    pub async fn block_number(&self) -> u64 {
        self.provider.get_block_number().await.unwrap()
    }
}

async fn deploy(provider: &DynProvider, code: &[u8]) -> Address {
    provider
        .send_transaction(TransactionRequest::default().with_deploy_code(code.to_vec()))
        .await
        .unwrap()
        .get_receipt()
        .await
        .unwrap()
        .contract_address
        .unwrap()
}

/// `OrderPlaced` event of a good-till-cancelled order without triggers.
pub fn order_placed(order_id: u64, side: OrderSide, price: UD64, amount: UD128) -> OrderPlaced {
    let converter = num::Converter::usd();
    OrderPlaced {
        orderId: U256::from(order_id),
        trader: address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"),
        orderType: side.code(),
        price: converter.to_unsigned(price),
        amount: converter.to_unsigned(amount),
        stoploss: U256::ZERO,
        takeprofit: U256::ZERO,
        expiration: U256::ZERO,
        asset: TEST_ASSET,
    }
}
