//! Order submission through a signing provider.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy::{
    network::Ethereum,
    primitives::TxHash,
    providers::{PendingTransactionBuilder, Provider},
};
use tracing::{debug, error, info};

use crate::{
    Chain,
    abi::orderbook::Orderbook::{OrderPlaced, OrderbookInstance},
    error::DexError,
    num,
    types::{LimitOrderRequest, MarketOrderRequest, OrderId},
};

/// Gas ceiling of every order placement transaction.
pub const GAS_LIMIT: u64 = 1_000_000;

/// Default time to wait for the transaction to be included.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of a successfully included order placement.
#[derive(Clone, Debug)]
pub struct Placement {
    tx_hash: TxHash,
    block_number: Option<u64>,
    order_id: Option<OrderId>,
}

impl Placement {
    pub fn tx_hash(&self) -> TxHash {
        self.tx_hash
    }

    pub fn block_number(&self) -> Option<u64> {
        self.block_number
    }

    /// Order ID assigned by the contract, if the receipt carries the
    /// `OrderPlaced` event.
    pub fn order_id(&self) -> Option<OrderId> {
        self.order_id
    }
}

/// Sends order requests to the order book contract.
///
/// The provider must be able to sign transactions, see
/// [`alloy::providers::ProviderBuilder::wallet`]. Submissions are never
/// retried: a failed placement is reported to the caller, who may submit it
/// again.
#[derive(Debug)]
pub struct OrderSubmitter<P> {
    instance: OrderbookInstance<P>,
    converter: num::Converter,
    timeout: Duration,
}

impl<P: Provider> OrderSubmitter<P> {
    pub fn new(chain: &Chain, provider: P) -> Self {
        Self {
            instance: OrderbookInstance::new(chain.orderbook(), provider),
            converter: num::Converter::usd(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Maximum time to wait for the inclusion of a sent transaction.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn place_market(&self, request: &MarketOrderRequest) -> Result<Placement, DexError> {
        info!(?request, "Placing market order");
        let call = request.to_call(self.converter);
        let pending = self
            .instance
            .call_builder(&call)
            .gas(GAS_LIMIT)
            .send()
            .await
            .inspect_err(|e| error!(%e, "Failed to send market order"))?;
        self.confirm(pending).await
    }

    /// Places the limit order with the expiration counted from now.
    pub async fn place_limit(&self, request: &LimitOrderRequest) -> Result<Placement, DexError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.place_limit_at(request, now).await
    }

    /// Places the limit order with the expiration counted from `now` (unix
    /// seconds).
    pub async fn place_limit_at(
        &self,
        request: &LimitOrderRequest,
        now: u64,
    ) -> Result<Placement, DexError> {
        info!(?request, now, "Placing limit order");
        let call = request.to_call(self.converter, now);
        let pending = self
            .instance
            .call_builder(&call)
            .gas(GAS_LIMIT)
            .send()
            .await
            .inspect_err(|e| error!(%e, "Failed to send limit order"))?;
        self.confirm(pending).await
    }

    async fn confirm(
        &self,
        pending: PendingTransactionBuilder<Ethereum>,
    ) -> Result<Placement, DexError> {
        let tx_hash = *pending.tx_hash();
        debug!(%tx_hash, "Order transaction sent, waiting for inclusion");

        let receipt = pending
            .with_timeout(Some(self.timeout))
            .get_receipt()
            .await
            .inspect_err(|e| error!(%tx_hash, %e, "Order transaction failed"))?;

        if !receipt.status() {
            error!(%tx_hash, "Order transaction reverted");
            return Err(DexError::TransactionReverted(tx_hash));
        }

        let placement = Placement {
            tx_hash,
            block_number: receipt.block_number,
            order_id: receipt.decoded_log::<OrderPlaced>().map(|log| log.orderId),
        };
        info!(
            %tx_hash,
            block_number = ?placement.block_number,
            order_id = ?placement.order_id,
            "Order placed"
        );
        Ok(placement)
    }
}
