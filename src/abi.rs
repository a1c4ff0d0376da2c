#[allow(clippy::too_many_arguments)]
pub mod orderbook {
    alloy::sol!(
        #[derive(Debug)]
        #[sol(rpc)]
        interface Orderbook {
            /// Emitted for every order accepted by the book, market and limit alike.
            ///
            /// `orderType` is `1` for buy and `2` for sell orders, monetary
            /// fields are 6-decimal fixed point.
            event OrderPlaced(
                uint256 indexed orderId,
                address indexed trader,
                uint8 orderType,
                uint256 price,
                uint256 amount,
                uint256 stoploss,
                uint256 takeprofit,
                uint256 expiration,
                address asset
            );

            function placeLimitOrder(
                uint256 price,
                uint256 takeProfit,
                uint256 stopLoss,
                uint256 amount,
                bool isBuy,
                uint256 expiration,
                uint256 leverage,
                uint8 marginType
            ) external;

            function placeMarketOrder(
                uint256 amount,
                bool isBuy,
                uint256 leverage,
                uint8 marginType
            ) external;
        }
    );
}
