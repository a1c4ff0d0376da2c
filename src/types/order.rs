use alloy::primitives::Address;
use fastnum::{UD64, UD128};

use crate::{abi::orderbook::Orderbook::OrderPlaced, error::DexError, num};

use super::{OrderId, OrderTypeCode};

/// Side of the order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Decodes the side code of the `OrderPlaced` event, `None` for codes
    /// belonging to neither side.
    pub fn from_code(code: OrderTypeCode) -> Option<Self> {
        match code {
            1 => Some(OrderSide::Buy),
            2 => Some(OrderSide::Sell),
            _ => None,
        }
    }

    pub fn code(&self) -> OrderTypeCode {
        match self {
            OrderSide::Buy => 1,
            OrderSide::Sell => 2,
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, OrderSide::Buy)
    }
}

/// Margin mode of the position the order opens or changes.
///
/// * [`MarginType::Isolated`] restricts the margin to the collateral posted
///   for this position.
/// * [`MarginType::Cross`] shares the account's free collateral across
///   positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MarginType {
    #[default]
    Isolated = 0,
    Cross = 1,
}

impl TryFrom<u8> for MarginType {
    type Error = DexError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MarginType::Isolated),
            1 => Ok(MarginType::Cross),
            _ => Err(DexError::ValueOutOfRange(format!("margin type {value}"))),
        }
    }
}

/// Order as announced by the `OrderPlaced` event, with fixed-point
/// fields converted to decimals.
#[derive(Clone, PartialEq, Eq, derive_more::Debug)]
pub struct PlacedOrder {
    order_id: OrderId,
    trader: Address,
    order_type: OrderTypeCode,
    #[debug("{price}")]
    price: UD64,
    #[debug("{amount}")]
    amount: UD128,
    #[debug("{stoploss}")]
    stoploss: UD64,
    #[debug("{takeprofit}")]
    takeprofit: UD64,
    expiration: u64,
    asset: Address,
}

impl PlacedOrder {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        order_id: OrderId,
        trader: Address,
        order_type: OrderTypeCode,
        price: UD64,
        amount: UD128,
        stoploss: UD64,
        takeprofit: UD64,
        expiration: u64,
        asset: Address,
    ) -> Self {
        Self {
            order_id,
            trader,
            order_type,
            price,
            amount,
            stoploss,
            takeprofit,
            expiration,
            asset,
        }
    }

    pub(crate) fn from_event(e: &OrderPlaced, converter: num::Converter) -> Result<Self, DexError> {
        Ok(Self {
            order_id: e.orderId,
            trader: e.trader,
            order_type: e.orderType,
            price: converter.from_unsigned(e.price)?,
            amount: converter.from_unsigned(e.amount)?,
            stoploss: converter.from_unsigned(e.stoploss)?,
            takeprofit: converter.from_unsigned(e.takeprofit)?,
            expiration: e.expiration.saturating_to(),
            asset: e.asset,
        })
    }

    pub fn order_id(&self) -> OrderId {
        self.order_id
    }

    pub fn trader(&self) -> Address {
        self.trader
    }

    /// Raw side code as emitted by the contract.
    pub fn order_type(&self) -> OrderTypeCode {
        self.order_type
    }

    pub fn side(&self) -> Option<OrderSide> {
        OrderSide::from_code(self.order_type)
    }

    pub fn price(&self) -> UD64 {
        self.price
    }

    pub fn amount(&self) -> UD128 {
        self.amount
    }

    pub fn stoploss(&self) -> UD64 {
        self.stoploss
    }

    pub fn takeprofit(&self) -> UD64 {
        self.takeprofit
    }

    /// Expiration as unix seconds, zero if the order never expires.
    pub fn expiration(&self) -> u64 {
        self.expiration
    }

    /// Address of the traded asset.
    pub fn asset(&self) -> Address {
        self.asset
    }
}
