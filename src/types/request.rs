use alloy::primitives::U256;
use fastnum::{UD64, UD128};

use crate::{
    abi::orderbook::Orderbook::{placeLimitOrderCall, placeMarketOrderCall},
    num,
};

use super::*;

/// Unit of a [`TimeInForce::For`] duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
}

impl TimeUnit {
    pub fn seconds(&self) -> u64 {
        match self {
            TimeUnit::Minutes => 60,
            TimeUnit::Hours => 60 * 60,
            TimeUnit::Days => 24 * 60 * 60,
            TimeUnit::Weeks => 7 * 24 * 60 * 60,
        }
    }
}

/// How long a limit order rests on the book.
///
/// Expiration itself is enforced by the contract, the SDK only computes the
/// timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimeInForce {
    GoodTillCancelled,
    For(u64, TimeUnit),
}

impl Default for TimeInForce {
    fn default() -> Self {
        TimeInForce::For(28, TimeUnit::Days)
    }
}

impl TimeInForce {
    /// Expiration timestamp for an order submitted at `now` (unix seconds),
    /// zero for orders that never expire.
    pub fn expiration_at(&self, now: u64) -> u64 {
        match self {
            TimeInForce::GoodTillCancelled => 0,
            TimeInForce::For(amount, unit) => {
                now.saturating_add(amount.saturating_mul(unit.seconds()))
            }
        }
    }
}

/// Request to buy or sell at the best available price.
#[derive(Clone, derive_more::Debug)]
pub struct MarketOrderRequest {
    side: OrderSide,
    #[debug("{amount}")]
    amount: UD128,
    leverage: u32,
    margin_type: MarginType,
}

impl MarketOrderRequest {
    pub fn new(side: OrderSide, amount: UD128, leverage: u32, margin_type: MarginType) -> Self {
        Self {
            side,
            amount,
            leverage,
            margin_type,
        }
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    pub fn amount(&self) -> UD128 {
        self.amount
    }

    /// Prepare the `placeMarketOrder` call with the monetary fields
    /// converted by `converter`.
    pub fn to_call(&self, converter: num::Converter) -> placeMarketOrderCall {
        placeMarketOrderCall {
            amount: converter.to_unsigned(self.amount),
            isBuy: self.side.is_buy(),
            leverage: U256::from(self.leverage),
            marginType: self.margin_type as u8,
        }
    }
}

/// Request to rest an order on the book at a limit price.
#[derive(Clone, derive_more::Debug)]
pub struct LimitOrderRequest {
    side: OrderSide,
    #[debug("{price}")]
    price: UD64,
    #[debug("{amount}")]
    amount: UD128,
    leverage: u32,
    margin_type: MarginType,
    #[debug("{take_profit}")]
    take_profit: UD64,
    #[debug("{stop_loss}")]
    stop_loss: UD64,
    time_in_force: TimeInForce,
}

impl LimitOrderRequest {
    /// Create a limit order without take-profit/stop-loss triggers, resting
    /// for the default [`TimeInForce`].
    pub fn new(
        side: OrderSide,
        price: UD64,
        amount: UD128,
        leverage: u32,
        margin_type: MarginType,
    ) -> Self {
        Self {
            side,
            price,
            amount,
            leverage,
            margin_type,
            take_profit: UD64::ZERO,
            stop_loss: UD64::ZERO,
            time_in_force: TimeInForce::default(),
        }
    }

    pub fn with_take_profit(mut self, price: UD64) -> Self {
        self.take_profit = price;
        self
    }

    pub fn with_stop_loss(mut self, price: UD64) -> Self {
        self.stop_loss = price;
        self
    }

    pub fn with_time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = time_in_force;
        self
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    pub fn price(&self) -> UD64 {
        self.price
    }

    pub fn amount(&self) -> UD128 {
        self.amount
    }

    pub fn time_in_force(&self) -> TimeInForce {
        self.time_in_force
    }

    /// Prepare the `placeLimitOrder` call for submission at `now` (unix
    /// seconds).
    pub fn to_call(&self, converter: num::Converter, now: u64) -> placeLimitOrderCall {
        placeLimitOrderCall {
            price: converter.to_unsigned(self.price),
            takeProfit: converter.to_unsigned(self.take_profit),
            stopLoss: converter.to_unsigned(self.stop_loss),
            amount: converter.to_unsigned(self.amount),
            isBuy: self.side.is_buy(),
            expiration: U256::from(self.time_in_force.expiration_at(now)),
            leverage: U256::from(self.leverage),
            marginType: self.margin_type as u8,
        }
    }
}

#[cfg(test)]
mod tests {
    use fastnum::{udec64, udec128};

    use super::*;

    const NOW: u64 = 1_700_000_000;

    #[test]
    fn test_time_in_force_expiration() {
        assert_eq!(TimeInForce::GoodTillCancelled.expiration_at(NOW), 0);
        assert_eq!(
            TimeInForce::For(15, TimeUnit::Minutes).expiration_at(NOW),
            NOW + 900
        );
        assert_eq!(TimeInForce::For(2, TimeUnit::Hours).expiration_at(NOW), NOW + 7200);
        assert_eq!(
            TimeInForce::default().expiration_at(NOW),
            NOW + 28 * 86400
        );
        assert_eq!(
            TimeInForce::For(1, TimeUnit::Weeks).expiration_at(NOW),
            NOW + 604800
        );
        assert_eq!(
            TimeInForce::For(u64::MAX, TimeUnit::Days).expiration_at(NOW),
            u64::MAX
        );
    }

    #[test]
    fn test_market_order_call() {
        let call = MarketOrderRequest::new(OrderSide::Sell, udec128!(5), 10, MarginType::Cross)
            .to_call(num::Converter::usd());
        assert_eq!(call.amount, U256::from(5_000_000));
        assert!(!call.isBuy);
        assert_eq!(call.leverage, U256::from(10));
        assert_eq!(call.marginType, 1);
    }

    #[test]
    fn test_limit_order_call() {
        let call = LimitOrderRequest::new(
            OrderSide::Buy,
            udec64!(3800),
            udec128!(0.5),
            5,
            MarginType::Isolated,
        )
        .with_take_profit(udec64!(4200.5))
        .with_stop_loss(udec64!(3500))
        .with_time_in_force(TimeInForce::For(3, TimeUnit::Hours))
        .to_call(num::Converter::usd(), NOW);

        assert_eq!(call.price, U256::from(3_800_000_000u64));
        assert_eq!(call.takeProfit, U256::from(4_200_500_000u64));
        assert_eq!(call.stopLoss, U256::from(3_500_000_000u64));
        assert_eq!(call.amount, U256::from(500_000));
        assert!(call.isBuy);
        assert_eq!(call.expiration, U256::from(NOW + 3 * 3600));
        assert_eq!(call.leverage, U256::from(5));
        assert_eq!(call.marginType, 0);
    }

    #[test]
    fn test_limit_order_defaults() {
        let call = LimitOrderRequest::new(
            OrderSide::Sell,
            udec64!(1),
            udec128!(1),
            1,
            MarginType::default(),
        )
        .to_call(num::Converter::usd(), NOW);
        assert_eq!(call.takeProfit, U256::ZERO);
        assert_eq!(call.stopLoss, U256::ZERO);
        assert_eq!(call.expiration, U256::from(NOW + 28 * 86400));
    }
}
