mod event;
mod order;
mod request;

pub use event::*;
pub use order::{MarginType, OrderSide, PlacedOrder};
pub use request::{LimitOrderRequest, MarketOrderRequest, TimeInForce, TimeUnit};

/// Order ID assigned by the order book contract.
pub type OrderId = alloy::primitives::U256;

/// Raw side code of the `OrderPlaced` event.
pub type OrderTypeCode = u8;
